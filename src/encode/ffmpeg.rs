use std::io::{Read, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

use crate::config::FfmpegConfig;
use crate::encode::encoder::{EncodedChunk, EncoderConfig, EncoderFactory, StreamEncoder};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{BackdropError, BackdropResult};
use crate::foundation::math::mul_div255_u16;
use crate::model::options::ExportFormat;
use crate::render::surface::FrameRGBA;

const READ_CHUNK: usize = 64 * 1024;

/// Output arguments for `format`, everything after the raw input.
pub fn output_args(cfg: &EncoderConfig) -> Vec<String> {
    let bitrate = cfg.bitrate_bps.to_string();
    let mut args: Vec<String> = vec!["-an".into()];
    match cfg.format {
        ExportFormat::Mp4 | ExportFormat::Mov => {
            args.extend(
                [
                    "-c:v",
                    "libx264",
                    "-preset",
                    "veryfast",
                    "-b:v",
                    bitrate.as_str(),
                    "-pix_fmt",
                    "yuv420p",
                    "-movflags",
                    "frag_keyframe+empty_moov+default_base_moof",
                    "-f",
                    cfg.format.extension(),
                ]
                .map(String::from),
            );
        }
        ExportFormat::WebM => {
            args.extend(
                [
                    "-c:v",
                    "libvpx-vp9",
                    "-b:v",
                    bitrate.as_str(),
                    "-deadline",
                    "realtime",
                    "-cpu-used",
                    "8",
                    "-pix_fmt",
                    "yuv420p",
                    "-f",
                    "webm",
                ]
                .map(String::from),
            );
        }
        ExportFormat::Gif => {
            args.extend(
                [
                    "-filter_complex",
                    "split[a][b];[a]palettegen[p];[b][p]paletteuse",
                    "-f",
                    "gif",
                ]
                .map(String::from),
            );
        }
    }
    args.push("pipe:1".into());
    args
}

/// Encodes through a system `ffmpeg` process: raw RGBA in on stdin, container bytes out on
/// stdout.
pub struct FfmpegStreamEncoder {
    tools: FfmpegConfig,
    cfg: Option<EncoderConfig>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    chunks: Option<Receiver<std::io::Result<Vec<u8>>>>,
    stdout_reader: Option<JoinHandle<()>>,
    stderr_reader: Option<JoinHandle<String>>,
    scratch: Vec<u8>,
    next_seq: u64,
}

impl FfmpegStreamEncoder {
    /// Encoder using the given tool locations. Nothing runs until `begin`.
    pub fn new(tools: FfmpegConfig) -> Self {
        Self {
            tools,
            cfg: None,
            child: None,
            stdin: None,
            chunks: None,
            stdout_reader: None,
            stderr_reader: None,
            scratch: Vec::new(),
            next_seq: 0,
        }
    }

    fn wrap(&mut self, bytes: Vec<u8>) -> EncodedChunk {
        let chunk = EncodedChunk {
            seq: self.next_seq,
            bytes,
        };
        self.next_seq += 1;
        chunk
    }

    fn drain(&mut self, block: bool) -> BackdropResult<Vec<EncodedChunk>> {
        let Some(rx) = self.chunks.take() else {
            return Ok(Vec::new());
        };
        let mut ready: Vec<Vec<u8>> = Vec::new();
        let mut open = true;
        loop {
            let next = if block {
                rx.recv().map_err(|_| TryRecvError::Disconnected)
            } else {
                rx.try_recv()
            };
            match next {
                Ok(Ok(bytes)) => ready.push(bytes),
                Ok(Err(e)) => {
                    return Err(BackdropError::encoding(format!(
                        "failed to read ffmpeg output: {e}"
                    )));
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    open = false;
                    break;
                }
            }
        }
        if open {
            self.chunks = Some(rx);
        }
        Ok(ready.into_iter().map(|b| self.wrap(b)).collect())
    }
}

impl StreamEncoder for FfmpegStreamEncoder {
    fn begin(&mut self, cfg: &EncoderConfig) -> BackdropResult<()> {
        cfg.validate()?;
        if self.child.is_some() {
            return Err(BackdropError::encoding("ffmpeg encoder already started"));
        }

        let mut cmd = Command::new(&self.tools.ffmpeg_bin);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .args([
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", cfg.width, cfg.height),
                "-r",
                &format!("{}/{}", cfg.fps.num, cfg.fps.den),
                "-i",
                "pipe:0",
            ])
            .args(output_args(cfg));

        let mut child = cmd.spawn().map_err(|e| {
            BackdropError::encoding(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BackdropError::encoding("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| BackdropError::encoding("failed to open ffmpeg stdout (unexpected)"))?;
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        let (tx, rx) = mpsc::channel();
        let stdout_reader = std::thread::spawn(move || {
            let mut buf = vec![0u8; READ_CHUNK];
            loop {
                match stdout.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Ok(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            bitrate_bps = cfg.bitrate_bps,
            format = ?cfg.format,
            "spawned ffmpeg encoder"
        );

        self.scratch = vec![0u8; cfg.frame_len()];
        self.cfg = Some(*cfg);
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.chunks = Some(rx);
        self.stdout_reader = Some(stdout_reader);
        self.stderr_reader = stderr_reader;
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRGBA) -> BackdropResult<()> {
        let Some(cfg) = self.cfg else {
            return Err(BackdropError::encoding("push_frame before begin"));
        };
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(BackdropError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            [0, 0, 0, 255],
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(BackdropError::encoding("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            BackdropError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn poll_chunks(&mut self) -> BackdropResult<Vec<EncodedChunk>> {
        self.drain(false)
    }

    fn finish(&mut self) -> BackdropResult<Vec<EncodedChunk>> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Err(BackdropError::encoding("finish before begin"));
        };

        let rest = self.drain(true)?;
        if let Some(h) = self.stdout_reader.take() {
            let _ = h.join();
        }
        let status = child
            .wait()
            .map_err(|e| BackdropError::encoding(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = self
            .stderr_reader
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(BackdropError::encoding(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        Ok(rest)
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.chunks = None;
    }
}

impl Drop for FfmpegStreamEncoder {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Builds [`FfmpegStreamEncoder`]s.
#[derive(Clone, Debug, Default)]
pub struct FfmpegEncoderFactory {
    tools: FfmpegConfig,
}

impl FfmpegEncoderFactory {
    /// Factory using the given tool locations.
    pub fn new(tools: FfmpegConfig) -> Self {
        Self { tools }
    }
}

impl EncoderFactory for FfmpegEncoderFactory {
    fn create(&self) -> BackdropResult<Box<dyn StreamEncoder>> {
        Ok(Box::new(FfmpegStreamEncoder::new(self.tools.clone())))
    }
}

fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> BackdropResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(BackdropError::encoding(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - a;
        for c in 0..3 {
            let fg = if src_is_premul {
                u16::from(s[c])
            } else {
                mul_div255_u16(u16::from(s[c]), a)
            };
            d[c] = (fg + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
