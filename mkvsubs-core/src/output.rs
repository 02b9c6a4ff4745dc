//! Output records produced by an extraction pass.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputData {
    /// Rendered subtitle document
    Text(String),
    /// Attachment payload, verbatim from the container
    Binary(Bytes),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub data: OutputData,
}

impl OutputFile {
    pub fn text(name: impl Into<String>, content: String) -> Self {
        Self {
            name: name.into(),
            data: OutputData::Text(content),
        }
    }

    pub fn binary(name: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            data: OutputData::Binary(data),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, OutputData::Text(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            OutputData::Text(text) => text.as_bytes(),
            OutputData::Binary(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> OutputSummary {
        OutputSummary {
            name: self.name.clone(),
            kind: if self.is_text() {
                OutputKind::Subtitle
            } else {
                OutputKind::Attachment
            },
            size: self.len() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Subtitle,
    Attachment,
}

/// Manifest entry describing one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSummary {
    pub name: String,
    pub kind: OutputKind,
    pub size: u64,
}
