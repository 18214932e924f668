use std::fmt;
use std::hash::{Hash, Hasher};

use sha2::{Digest, Sha256};

use crate::models::ResizeRequest;

/// Opaque cache key: SHA-256 over the normalized request fields.
///
/// The source path is hashed both lower-cased and as given. Sources may be
/// case-sensitive, so `/Cat.png` and `/cat.png` never share an entry. The
/// request the key was
/// derived from travels with it so backends can rebuild a
/// [`CachedImageItem`](super::CachedImageItem) from storage alone.
#[derive(Debug, Clone)]
pub struct CacheKey {
    value: String,
    request: ResizeRequest,
}

impl CacheKey {
    pub fn new(request: &ResizeRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"resize\0");
        hasher.update(request.source_path.to_lowercase().as_bytes());
        hasher.update(b"\0");
        hasher.update(request.source_path.as_bytes());
        hasher.update(b"\0");
        hasher.update(request.width.to_le_bytes());
        hasher.update(request.height.to_le_bytes());
        hasher.update(request.mode.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(request.format.as_str().as_bytes());

        Self {
            value: format!("{:x}", hasher.finalize()),
            request: request.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn request(&self) -> &ResizeRequest {
        &self.request
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
