/// Outcome of a successful ingestion, by text or by file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadResult {
    chunks_created: u64,
    total_tokens: u64,
}

impl UploadResult {
    /// Creates a new upload result.
    pub fn new(chunks_created: u64, total_tokens: u64) -> Self {
        Self {
            chunks_created,
            total_tokens,
        }
    }

    /// Returns how many chunks the backend stored.
    pub fn chunks_created(&self) -> u64 {
        self.chunks_created
    }

    /// Returns the token count across all stored chunks.
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }
}
