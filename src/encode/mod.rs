pub(crate) mod artifact;
pub(crate) mod capture;
pub(crate) mod encoder;
#[cfg(feature = "media-ffmpeg")]
pub(crate) mod ffmpeg;
