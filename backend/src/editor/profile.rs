//! Profile image slot: one optional pending file plus a cosmetic preview.

use crate::storage::UploadFile;

/// The preview is either a session-local reference to the freshly selected
/// file or the previously persisted URL. It is never persisted itself and
/// is discarded with the session on cancel.
#[derive(Debug, Clone, Default)]
pub struct ProfileImage {
    pending: Option<UploadFile>,
    preview_url: Option<String>,
    persisted_url: Option<String>,
}

impl ProfileImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_existing(url: Option<String>) -> Self {
        Self {
            pending: None,
            preview_url: url.clone(),
            persisted_url: url,
        }
    }

    /// Select a new file, replacing any earlier selection and its preview
    pub fn change(&mut self, file: UploadFile) {
        self.preview_url = Some(format!("preview://{}", file.name));
        self.pending = Some(file);
    }

    /// Drop the selection and fall back to the persisted image, if any
    pub fn reset(&mut self) {
        self.pending = None;
        self.preview_url = self.persisted_url.clone();
    }

    pub fn pending(&self) -> Option<&UploadFile> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    pub fn persisted_url(&self) -> Option<&str> {
        self.persisted_url.as_deref()
    }

    /// Record the URL the save coordinator resolved the pending file to
    pub fn mark_uploaded(&mut self, url: String) {
        self.pending = None;
        self.preview_url = Some(url.clone());
        self.persisted_url = Some(url);
    }

    pub(crate) fn take_pending(&mut self) -> Option<UploadFile> {
        self.pending.take()
    }
}
