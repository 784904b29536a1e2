//! File operations: loading an analysis and exporting the PDF report.
//!
//! Dialogs and disk access run on the tokio runtime; their results come back
//! through the app's channel and are applied at the start of the next frame.

use super::state::{Alert, DecisionTreeApp, FileOperationResult};
use crate::report::{self, ReportMetadata};
use crate::types::AnalysisSession;
use eframe::egui;
use std::path::PathBuf;

impl DecisionTreeApp {
    /// Applies the results of finished async file operations.
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        let mut results = Vec::new();
        if let Some(receiver) = &self.file.file_operation_receiver {
            while let Ok(result) = receiver.try_recv() {
                results.push(result);
            }
        }
        if !results.is_empty() {
            ctx.request_repaint();
        }

        for result in results {
            match result {
                FileOperationResult::LoadCompleted(path, content) => {
                    self.file.is_loading = false;
                    self.file.last_load_path = Some(path.clone());
                    match AnalysisSession::from_json(&content) {
                        Ok(session) => {
                            self.install_session(session, Some(path.clone()));
                            self.file.alert = None;
                            self.file.status = Some(format!("Loaded {}", path.display()));
                        }
                        Err(e) => {
                            log::error!("failed to decode {}: {}", path.display(), e);
                            self.show_load_error(e.to_string());
                        }
                    }
                }
                FileOperationResult::LoadFailed(path, error) => {
                    self.file.is_loading = false;
                    self.file.last_load_path = Some(path.clone());
                    log::error!("failed to read {}: {}", path.display(), error);
                    self.show_load_error(error);
                }
                FileOperationResult::LoadCancelled => {
                    self.file.is_loading = false;
                }
                FileOperationResult::ExportCompleted(path) => {
                    self.file.is_exporting = false;
                    self.file.status = Some(format!("Report saved to {}", path.display()));
                }
                FileOperationResult::ExportFailed(error) => {
                    self.file.is_exporting = false;
                    log::error!("report export failed: {}", error);
                    self.file.alert = Some(Alert {
                        title: "Export failed".to_string(),
                        message: error,
                        retry: false,
                    });
                }
                FileOperationResult::ExportCancelled => {
                    self.file.is_exporting = false;
                    log::info!("report export cancelled");
                }
            }
        }
    }

    fn show_load_error(&mut self, message: String) {
        self.file.alert = Some(Alert {
            title: "Could not load the analysis".to_string(),
            message,
            retry: self.file.last_load_path.is_some(),
        });
    }

    /// Asks for an analysis file and loads it in the background.
    pub fn open_analysis(&mut self) {
        if self.file.is_loading {
            return;
        }
        self.file.is_loading = true;
        let sender = self.file.file_operation_sender.clone();
        tokio::spawn(async move {
            let picked = rfd::AsyncFileDialog::new()
                .add_filter("JSON", &["json"])
                .pick_file()
                .await;
            let result = match picked {
                Some(handle) => read_analysis(handle.path().to_path_buf()),
                None => FileOperationResult::LoadCancelled,
            };
            if let Some(sender) = sender {
                let _ = sender.send(result);
            }
        });
    }

    /// Reloads the last file a load was attempted from.
    pub fn retry_load(&mut self) {
        let Some(path) = self.file.last_load_path.clone() else {
            return;
        };
        if self.file.is_loading {
            return;
        }
        self.file.is_loading = true;
        self.file.alert = None;
        let sender = self.file.file_operation_sender.clone();
        tokio::spawn(async move {
            let result = read_analysis(path);
            if let Some(sender) = sender {
                let _ = sender.send(result);
            }
        });
    }

    /// Builds the report of the loaded forest and asks where to save it.
    pub fn export_pdf(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if self.file.is_exporting {
            return;
        }
        let meta = ReportMetadata::from_session(session);
        let bytes = match report::export_report(session.forest(), &meta) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("report generation failed: {}", e);
                self.file.alert = Some(Alert {
                    title: "Export failed".to_string(),
                    message: e.to_string(),
                    retry: false,
                });
                return;
            }
        };

        self.file.is_exporting = true;
        let file_name = report::report_filename(&meta.filename);
        let sender = self.file.file_operation_sender.clone();
        tokio::spawn(async move {
            let result = match rfd::AsyncFileDialog::new()
                .add_filter("PDF", &["pdf"])
                .set_file_name(&file_name)
                .save_file()
                .await
            {
                Some(handle) => {
                    let path = handle.path().to_path_buf();
                    match report::save_report(&path, &bytes) {
                        Ok(()) => FileOperationResult::ExportCompleted(path),
                        Err(e) => FileOperationResult::ExportFailed(e.to_string()),
                    }
                }
                None => FileOperationResult::ExportCancelled,
            };
            if let Some(sender) = sender {
                let _ = sender.send(result);
            }
        });
    }
}

fn read_analysis(path: PathBuf) -> FileOperationResult {
    match std::fs::read_to_string(&path) {
        Ok(content) => FileOperationResult::LoadCompleted(path, content),
        Err(e) => FileOperationResult::LoadFailed(path, format!("Failed to read file: {}", e)),
    }
}
