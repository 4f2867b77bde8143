//! Stencil reference attached to a shape

use serde::{Deserialize, Serialize};

/// The stencil file a shape was uploaded as part of
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StencilRef {
    pub stencil_id: u64,
    pub file_name: String,
    pub title: Option<String>,
}

impl StencilRef {
    pub fn new(stencil_id: u64, file_name: impl Into<String>) -> Self {
        Self {
            stencil_id,
            file_name: file_name.into(),
            title: None,
        }
    }

    /// Builder method to add a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// File extension including the leading dot, if any
    pub fn extension(&self) -> Option<&str> {
        let dot = self.file_name.rfind('.')?;
        if dot == 0 {
            return None;
        }
        Some(&self.file_name[dot..])
    }
}
