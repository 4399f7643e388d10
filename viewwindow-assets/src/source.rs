use std::collections::HashMap;

use bytes::Bytes;

use crate::{AssetError, AssetId};

/// Turns resolved bytes into a displayable source and takes it back.
///
/// This is the seam for the platform's object-URL (or texture/buffer) allocator. Every source
/// returned by `create` must be passed to `revoke` exactly once; owners guard this with
/// [`OwnedSource`].
pub trait SourceRegistry {
    /// Fails with [`AssetError::Decode`] when the bytes cannot be displayed.
    fn create(&mut self, id: &AssetId, bytes: Bytes) -> Result<String, AssetError>;

    fn revoke(&mut self, source: &str);
}

/// In-memory `blob:` handle registry.
///
/// Keeps the set of live handles, which makes leaks and double revocations observable.
#[derive(Debug, Default)]
pub struct ObjectUrls {
    next: u64,
    /// Live handle -> payload size.
    live: HashMap<String, usize>,
    double_revokes: usize,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, source: &str) -> bool {
        self.live.contains_key(source)
    }

    /// Payload bytes held by live handles.
    pub fn live_bytes(&self) -> usize {
        self.live.values().sum()
    }

    /// Revocations of handles that were unknown or already revoked.
    pub fn double_revokes(&self) -> usize {
        self.double_revokes
    }
}

impl SourceRegistry for ObjectUrls {
    fn create(&mut self, id: &AssetId, bytes: Bytes) -> Result<String, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::decode(format!("`{id}` resolved to an empty payload")));
        }
        self.next += 1;
        let url = format!("blob:viewwindow/{}", self.next);
        self.live.insert(url.clone(), bytes.len());
        Ok(url)
    }

    fn revoke(&mut self, source: &str) {
        if self.live.remove(source).is_none() {
            self.double_revokes += 1;
            awarn!(source, "revoke of an unknown or already revoked source");
        }
    }
}

/// A source created by a [`SourceRegistry`], released at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct OwnedSource {
    src: String,
    released: bool,
}

impl OwnedSource {
    pub fn new(src: String) -> Self {
        Self {
            src,
            released: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.src
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Revokes the source. Returns `false` (and does not touch the registry) if it was already
    /// released.
    pub fn release<R: SourceRegistry + ?Sized>(&mut self, registry: &mut R) -> bool {
        if self.released {
            awarn!(source = self.src.as_str(), "source already released");
            return false;
        }
        self.released = true;
        registry.revoke(&self.src);
        true
    }
}
