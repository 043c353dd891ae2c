//! Token and storage-key generation.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generator for session tokens and upload file names.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a random bearer token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // v4 carries no time component
        Uuid::new_v4().simple().to_string()
    }

    /// Name under which an uploaded file is stored.
    ///
    /// SHA-256 (hex) of the original file name followed by the upload's unix
    /// timestamp, so the same file uploaded twice gets two names.
    #[must_use]
    pub fn upload_file_name(&self, original_name: &str, unix_timestamp: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(original_name.as_bytes());
        hasher.update(unix_timestamp.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}
