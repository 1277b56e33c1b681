use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::foundation::error::{BackdropError, BackdropResult};
use crate::foundation::math::Fnv1a64;
use crate::model::options::ExportFormat;

const URL_PREFIX: &str = "artifact://backdrop/";

/// A finished encode, held in memory for the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Concatenated container bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime_type: String,
    /// Container format.
    pub format: ExportFormat,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target bitrate the encoder was configured with.
    pub bitrate_bps: u64,
    /// Frames captured into the stream.
    pub frames: u64,
}

/// Opaque reference to an artifact in an [`ArtifactStore`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ArtifactUrl(String);

impl ArtifactUrl {
    /// Parse a previously minted reference.
    pub fn parse(s: &str) -> BackdropResult<Self> {
        let Some(rest) = s.strip_prefix(URL_PREFIX) else {
            return Err(BackdropError::validation(format!("not an artifact url: '{s}'")));
        };
        let valid = rest.split_once('-').is_some_and(|(n, h)| {
            !n.is_empty()
                && n.bytes().all(|b| b.is_ascii_digit())
                && h.len() == 16
                && h.bytes().all(|b| b.is_ascii_hexdigit())
        });
        if !valid {
            return Err(BackdropError::validation(format!("malformed artifact url: '{s}'")));
        }
        Ok(Self(s.to_string()))
    }

    /// The reference as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    next_id: u64,
    items: HashMap<ArtifactUrl, Arc<Artifact>>,
}

/// Session-scoped registry of finished artifacts. Clones share the same registry.
#[derive(Clone, Debug, Default)]
pub struct ArtifactStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl ArtifactStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `artifact` and return a fresh reference to it.
    ///
    /// Every call mints a distinct reference, even for identical bytes.
    pub fn mint(&self, artifact: Artifact) -> ArtifactUrl {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;

        let mut h = Fnv1a64::new_default();
        h.write_u64(id);
        h.write_u64(artifact.bytes.len() as u64);
        h.write_bytes(&artifact.bytes);
        let url = ArtifactUrl(format!("{URL_PREFIX}{id}-{:016x}", h.finish()));

        inner.items.insert(url.clone(), Arc::new(artifact));
        url
    }

    /// The artifact behind `url`, if it has not been revoked.
    pub fn resolve(&self, url: &ArtifactUrl) -> Option<Arc<Artifact>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.items.get(url).cloned()
    }

    /// Release the artifact behind `url`. Returns whether it was still registered.
    pub fn revoke(&self, url: &ArtifactUrl) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.items.remove(url).is_some()
    }

    /// Number of live artifacts.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.items.len()
    }

    /// Whether no artifacts are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/artifact.rs"]
mod tests;
