//! Attachment collector: pairs FileName and FileData leaves into files.

use bytes::Bytes;

use crate::error::ExtractError;
use crate::output::OutputFile;

#[derive(Debug, Default)]
struct Slot {
    name: Option<String>,
    data: Option<Bytes>,
}

#[derive(Debug, Default)]
pub struct AttachmentCollector {
    current: Slot,
    files: Vec<OutputFile>,
}

impl AttachmentCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: String) -> Result<(), ExtractError> {
        if self.current.name.is_some() {
            return Err(ExtractError::InterleavedAttachment { field: "FileName" });
        }
        self.current.name = Some(name);
        self.advance_if_complete();
        Ok(())
    }

    pub fn set_data(&mut self, data: Bytes) -> Result<(), ExtractError> {
        if self.current.data.is_some() {
            return Err(ExtractError::InterleavedAttachment { field: "FileData" });
        }
        self.current.data = Some(data);
        self.advance_if_complete();
        Ok(())
    }

    fn advance_if_complete(&mut self) {
        if self.current.name.is_some() && self.current.data.is_some() {
            let slot = std::mem::take(&mut self.current);
            if let (Some(name), Some(data)) = (slot.name, slot.data) {
                tracing::debug!("Collected attachment {} ({} bytes)", name, data.len());
                self.files.push(OutputFile::binary(name, data));
            }
        }
    }

    /// End of an AttachedFile element. Complete slots were already moved out,
    /// so whatever is left is half-filled and dropped.
    pub fn end_file(&mut self) {
        let slot = std::mem::take(&mut self.current);
        if let Some(name) = slot.name {
            tracing::warn!("Attachment {} has no FileData, skipping", name);
        } else if let Some(data) = slot.data {
            tracing::warn!("Attachment of {} bytes has no FileName, skipping", data.len());
        }
    }

    pub fn into_files(self) -> Vec<OutputFile> {
        self.files
    }
}
