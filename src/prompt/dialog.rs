use std::path::PathBuf;
use tracing::info;

use super::SavePrompt;
use crate::error::RecorderResult;

/// Native save dialog
pub struct DialogSavePrompt {
    default_dir: Option<PathBuf>,
    extension: String,
}

impl DialogSavePrompt {
    pub fn new(default_dir: Option<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            default_dir,
            extension: extension.into(),
        }
    }
}

#[async_trait::async_trait]
impl SavePrompt for DialogSavePrompt {
    async fn show(&self, default_filename: &str) -> RecorderResult<Option<PathBuf>> {
        let mut dialog = rfd::AsyncFileDialog::new()
            .set_title("Save Video")
            .set_file_name(default_filename)
            .add_filter("Video", &[self.extension.as_str()]);

        if let Some(dir) = &self.default_dir {
            dialog = dialog.set_directory(dir);
        }

        let chosen = dialog.save_file().await.map(|handle| handle.path().to_path_buf());
        if chosen.is_none() {
            info!("Save dialog dismissed");
        }

        Ok(chosen)
    }
}
