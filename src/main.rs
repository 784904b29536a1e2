#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // Logging is filtered through RUST_LOG
    env_logger::init();

    // File dialogs are spawned on the tokio runtime entered here
    decision_tree_viewer::run_app()
}
