use std::path::Path;

use crate::foundation::error::{BackdropError, BackdropResult};

/// Largest accepted video upload (100 MiB).
pub const MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

/// Largest accepted background image upload (10 MiB).
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Check an uploaded video before it enters the pipeline.
pub fn validate_video_upload(mime_type: &str, byte_size: u64) -> BackdropResult<()> {
    if !mime_type.starts_with("video/") {
        return Err(BackdropError::validation(format!(
            "unsupported video type '{mime_type}'"
        )));
    }
    if byte_size > MAX_VIDEO_BYTES {
        return Err(BackdropError::validation(format!(
            "video is {byte_size} bytes, the limit is {MAX_VIDEO_BYTES}"
        )));
    }
    Ok(())
}

/// Check an uploaded background image.
pub fn validate_background_upload(mime_type: &str, byte_size: u64) -> BackdropResult<()> {
    if !mime_type.starts_with("image/") {
        return Err(BackdropError::validation(format!(
            "unsupported image type '{mime_type}'"
        )));
    }
    if byte_size > MAX_IMAGE_BYTES {
        return Err(BackdropError::validation(format!(
            "image is {byte_size} bytes, the limit is {MAX_IMAGE_BYTES}"
        )));
    }
    Ok(())
}

/// Guess a MIME type from the file extension.
pub fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/validate.rs"]
mod tests;
