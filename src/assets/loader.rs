use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::assets::decode::{PreparedImage, decode_image};
use crate::assets::validate::{MAX_IMAGE_BYTES, guess_mime_type, validate_background_upload};
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::pipeline::cancel::CancelToken;

const CANCEL_POLL: Duration = Duration::from_millis(25);

/// Loads background pictures by URL.
pub trait ImageLoader: Send + Sync {
    /// Fetch and decode the picture at `url`.
    fn load(&self, url: &str) -> BackdropResult<PreparedImage>;
}

/// Loads pictures from the local filesystem (plain paths and `file://` URLs).
#[derive(Clone, Debug, Default)]
pub struct FsImageLoader {
    root: Option<PathBuf>,
}

impl FsImageLoader {
    /// Resolve relative paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> BackdropResult<PathBuf> {
        let raw = if let Some(rest) = url.strip_prefix("file://") {
            rest
        } else if let Some((scheme, _)) = url.split_once("://") {
            return Err(BackdropError::media_load(format!(
                "unsupported url scheme '{scheme}' for '{url}'"
            )));
        } else {
            url
        };
        let path = Path::new(raw);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, url: &str) -> BackdropResult<PreparedImage> {
        let path = self.resolve(url)?;
        let bytes = std::fs::read(&path).map_err(|e| {
            BackdropError::media_load(format!(
                "failed to read background '{}': {e}",
                path.display()
            ))
        })?;
        let mime = guess_mime_type(&path).unwrap_or("image/unknown");
        validate_background_upload(mime, bytes.len() as u64).map_err(|e| {
            BackdropError::media_load(format!(
                "background '{}' rejected (limit {MAX_IMAGE_BYTES} bytes): {e}",
                path.display()
            ))
        })?;
        decode_image(&bytes).map_err(|e| {
            BackdropError::media_load(format!(
                "failed to decode background '{}': {e}",
                path.display()
            ))
        })
    }
}

/// Run `load` on a helper thread and wait at most `timeout` for it.
///
/// The wait also ends early when `cancel` fires. A load that overruns keeps running on its
/// thread; its result is dropped.
pub fn load_with_timeout<T, F>(
    what: &str,
    timeout: Duration,
    cancel: &CancelToken,
    load: F,
) -> BackdropResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> BackdropResult<T> + Send + 'static,
{
    cancel.check()?;
    let (tx, rx) = mpsc::sync_channel(1);
    std::thread::Builder::new()
        .name(format!("backdrop-load-{what}"))
        .spawn(move || {
            let _ = tx.send(load());
        })
        .map_err(|e| BackdropError::media_load(format!("failed to spawn {what} loader: {e}")))?;

    let deadline = Instant::now() + timeout;
    loop {
        cancel.check()?;
        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(what, timeout_ms = timeout.as_millis() as u64, "load timed out");
            return Err(BackdropError::media_load(format!(
                "{what} did not load within {} ms",
                timeout.as_millis()
            )));
        }
        match rx.recv_timeout(CANCEL_POLL.min(deadline - now)) {
            Ok(result) => return result,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(BackdropError::media_load(format!(
                    "{what} loader stopped without a result"
                )));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
