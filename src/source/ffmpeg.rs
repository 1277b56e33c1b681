use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::assets::decode::PreparedImage;
use crate::config::FfmpegConfig;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::model::media::{VideoAsset, VideoMetadata};
use crate::source::{FrameSource, VideoFrame, VideoLoader};

#[derive(serde::Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

impl ProbeStream {
    /// Display rotation in degrees, normalised to `0..360`.
    fn rotation_degrees(&self) -> i64 {
        let from_side_data = self.side_data_list.iter().find_map(|d| d.rotation);
        let from_tag = self.tags.get("rotate").and_then(|r| r.trim().parse::<f64>().ok());
        let deg = from_side_data.or(from_tag).unwrap_or(0.0).round() as i64;
        deg.rem_euclid(360)
    }
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Read duration, display size and frame rate of the first video stream with `ffprobe`.
///
/// Width and height are reported as displayed: a stream rotated by 90 or 270 degrees has them
/// swapped relative to the coded size.
pub fn probe_video(cfg: &FfmpegConfig, source_path: &Path) -> BackdropResult<VideoMetadata> {
    let out = Command::new(&cfg.ffprobe_bin)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| BackdropError::media_load(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(BackdropError::media_load(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    metadata_from_probe_json(&out.stdout)
}

fn metadata_from_probe_json(json: &[u8]) -> BackdropResult<VideoMetadata> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| BackdropError::media_load(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| BackdropError::media_load("no video stream found"))?;
    let coded_width = stream
        .width
        .ok_or_else(|| BackdropError::media_load("missing video width from ffprobe"))?;
    let coded_height = stream
        .height
        .ok_or_else(|| BackdropError::media_load("missing video height from ffprobe"))?;
    let rotation = stream.rotation_degrees();
    let (width, height) = if rotation == 90 || rotation == 270 {
        (coded_height, coded_width)
    } else {
        (coded_width, coded_height)
    };
    let fps = stream.r_frame_rate.as_deref().and_then(Fps::parse_ratio);
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(stream.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let meta = VideoMetadata {
        duration_secs,
        width,
        height,
        fps,
    };
    meta.validate()?;
    if rotation != 0 {
        tracing::debug!(rotation, width, height, "rotated video stream");
    }
    Ok(meta)
}

/// Whether `bin -version` runs successfully.
pub fn is_tool_on_path(bin: &str) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Streams raw RGBA frames out of a running `ffmpeg` decoder.
pub struct FfmpegFrameSource {
    path: PathBuf,
    meta: VideoMetadata,
    frame_secs: f64,
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    next_index: u64,
}

impl FfmpegFrameSource {
    /// Probe `path` and start decoding it from the beginning.
    pub fn open(cfg: &FfmpegConfig, path: &Path) -> BackdropResult<Self> {
        let meta = probe_video(cfg, path)?;
        let fps = meta.fps.unwrap_or(Fps { num: 30, den: 1 });

        let mut child = Command::new(&cfg.ffmpeg_bin)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args([
                "-an",
                "-vf",
                &format!("scale={}:{}", meta.width, meta.height),
                "-r",
                &format!("{}/{}", fps.num, fps.den),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                BackdropError::media_load(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BackdropError::media_load("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        tracing::debug!(
            path = %path.display(),
            width = meta.width,
            height = meta.height,
            duration_secs = meta.duration_secs,
            "opened ffmpeg frame source"
        );

        Ok(Self {
            path: path.to_path_buf(),
            frame_secs: fps.frame_duration_secs(),
            meta,
            child,
            stdout: Some(stdout),
            stderr,
            next_index: 0,
        })
    }

    fn finish_decoder(&mut self) -> BackdropResult<()> {
        drop(self.stdout.take());
        let status = self
            .child
            .wait()
            .map_err(|e| BackdropError::media_load(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(BackdropError::media_load(format!(
                "ffmpeg decode failed for '{}' ({status}): {}",
                self.path.display(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegFrameSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.meta
    }

    fn next_frame(&mut self) -> BackdropResult<Option<VideoFrame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let frame_len = self.meta.width as usize * self.meta.height as usize * 4;
        let mut buf = vec![0u8; frame_len];
        let mut filled = 0usize;
        while filled < frame_len {
            let n = stdout.read(&mut buf[filled..]).map_err(|e| {
                BackdropError::media_load(format!("failed to read ffmpeg output: {e}"))
            })?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            self.finish_decoder()?;
            return Ok(None);
        }
        if filled < frame_len {
            self.finish_decoder()?;
            return Err(BackdropError::media_load(format!(
                "truncated frame from ffmpeg: got {filled} bytes, expected {frame_len}"
            )));
        }

        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(VideoFrame {
            index: FrameIndex(index),
            timestamp_secs: index as f64 * self.frame_secs,
            image: PreparedImage::from_straight_rgba8(self.meta.width, self.meta.height, buf)?,
        }))
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        if self.stdout.is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Opens videos from local files through ffprobe/ffmpeg.
#[derive(Clone, Debug, Default)]
pub struct FfmpegVideoLoader {
    cfg: FfmpegConfig,
}

impl FfmpegVideoLoader {
    /// Loader using the given tool locations.
    pub fn new(cfg: FfmpegConfig) -> Self {
        Self { cfg }
    }
}

impl VideoLoader for FfmpegVideoLoader {
    fn open(&self, video: &VideoAsset) -> BackdropResult<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegFrameSource::open(&self.cfg, &video.source)?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/ffmpeg.rs"]
mod tests;
