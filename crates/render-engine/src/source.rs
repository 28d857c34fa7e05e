//! Frame sources.
//!
//! A frame source is a sequential, ordered, finite, non-restartable
//! supply of frames that exposes its geometry, frame rate, and total
//! frame count up front. The ffmpeg implementation decodes any
//! container ffmpeg understands into raw rgb24 frames over a pipe.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use hyperlapse_common::{HyperlapseError, HyperlapseResult};
use hyperlapse_video_model::{Frame, VideoMeta};

/// Sequential supply of frames.
pub trait FrameSource: Send {
    /// Stream metadata, known before the first read.
    fn meta(&self) -> VideoMeta;

    /// The next frame, or `None` once the stream is exhausted.
    fn read_frame(&mut self) -> HyperlapseResult<Option<Frame>>;
}

/// Check whether an executable is reachable on PATH.
pub fn command_exists(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Decoding frame source backed by an ffmpeg child process.
pub struct FfmpegFrameSource {
    path: PathBuf,
    meta: VideoMeta,
    child: Child,
    stdout: ChildStdout,
    frame_bytes: usize,
}

impl FfmpegFrameSource {
    /// Probe the stream and spawn the decoder.
    pub fn open(path: &Path) -> HyperlapseResult<Self> {
        if !path.exists() {
            return Err(HyperlapseError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let meta = probe_video(path)?;

        let mut child = Command::new("ffmpeg")
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| HyperlapseError::source(format!("Failed to start ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HyperlapseError::source("Failed to capture ffmpeg stdout"))?;

        tracing::debug!(
            path = %path.display(),
            width = meta.width,
            height = meta.height,
            fps = meta.fps,
            total_frames = meta.total_frames,
            "Opened frame source"
        );

        Ok(Self {
            path: path.to_path_buf(),
            meta,
            child,
            stdout,
            frame_bytes: meta.width as usize * meta.height as usize * 3,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for FfmpegFrameSource {
    fn meta(&self) -> VideoMeta {
        self.meta
    }

    fn read_frame(&mut self) -> HyperlapseResult<Option<Frame>> {
        let mut buf = vec![0u8; self.frame_bytes];
        let mut filled = 0usize;

        while filled < buf.len() {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => {
                    if filled == 0 {
                        return Ok(None);
                    }
                    // A truncated trailing frame counts as end of stream.
                    tracing::warn!(
                        got = filled,
                        expected = self.frame_bytes,
                        "Discarding truncated final frame"
                    );
                    return Ok(None);
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(HyperlapseError::source(format!(
                        "Failed reading decoded frame: {e}"
                    )))
                }
            }
        }

        let frame = Frame::new(
            self.meta.width as usize,
            self.meta.height as usize,
            3,
            buf,
        )
        .map_err(|e| HyperlapseError::source(format!("Bad frame buffer: {e}")))?;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        // Scoped acquisition: the decoder dies with the source.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Probe a video file with ffprobe.
pub fn probe_video(path: &Path) -> HyperlapseResult<VideoMeta> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-select_streams")
        .arg("v:0")
        .arg("-count_packets")
        .arg("-show_entries")
        .arg("stream=width,height,r_frame_rate,nb_frames,nb_read_packets,duration")
        .arg("-of")
        .arg("json")
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| HyperlapseError::source(format!("Failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(HyperlapseError::source(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| HyperlapseError::source(format!("Unparsable ffprobe output: {e}")))?;

    let stream = parsed
        .get("streams")
        .and_then(|s| s.get(0))
        .ok_or_else(|| HyperlapseError::source("No video stream found"))?;

    let width = stream
        .get("width")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HyperlapseError::source("Stream has no width"))? as u32;
    let height = stream
        .get("height")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HyperlapseError::source("Stream has no height"))? as u32;

    let fps = stream
        .get("r_frame_rate")
        .and_then(|v| v.as_str())
        .and_then(parse_rate)
        .ok_or_else(|| HyperlapseError::source("Stream has no usable frame rate"))?;

    let total_frames = frame_count(stream, fps)
        .ok_or_else(|| HyperlapseError::source("Could not determine total frame count"))?;

    Ok(VideoMeta {
        width,
        height,
        fps,
        total_frames,
    })
}

/// Parse an ffprobe rational like `"30000/1001"`.
fn parse_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    s.parse().ok()
}

/// Frame count from the most reliable field available: declared frame
/// count, counted packets, then duration times fps.
fn frame_count(stream: &serde_json::Value, fps: f64) -> Option<u64> {
    for key in ["nb_frames", "nb_read_packets"] {
        if let Some(n) = stream
            .get(key)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<u64>().ok())
        {
            if n > 0 {
                return Some(n);
            }
        }
    }

    stream
        .get("duration")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .map(|d| (d * fps).round() as u64)
        .filter(|&n| n > 0)
}
