//! Frame sinks.
//!
//! A frame sink accepts fixed-geometry frames in order and encodes
//! them into an output file. The ffmpeg implementation feeds raw rgb24
//! bytes to an encoder over a pipe and finalizes the container on
//! `finish`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use hyperlapse_common::{HyperlapseError, HyperlapseResult};
use hyperlapse_video_model::Frame;

/// Ordered consumer of rendered frames.
pub trait FrameSink: Send {
    /// Append one frame. Geometry must match the sink's configuration.
    fn write_frame(&mut self, frame: &Frame) -> HyperlapseResult<()>;

    /// Flush, finalize the container, and release the encoder.
    fn finish(&mut self) -> HyperlapseResult<()>;
}

/// Encoding frame sink backed by an ffmpeg child process.
pub struct FfmpegFrameSink {
    path: PathBuf,
    width: u32,
    height: u32,
    child: Child,
    stdin: Option<ChildStdin>,
    finished: bool,
}

impl FfmpegFrameSink {
    /// Spawn the encoder for the given geometry, frame rate, and codec.
    pub fn create(
        path: &Path,
        width: u32,
        height: u32,
        fps: f64,
        codec: &str,
    ) -> HyperlapseResult<Self> {
        let codec_args = codec_args(codec)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-y")
            .arg("-v")
            .arg("error")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-s")
            .arg(format!("{width}x{height}"))
            .arg("-r")
            .arg(format!("{fps}"))
            .arg("-i")
            .arg("pipe:0")
            .arg("-an");
        cmd.args(&codec_args);
        cmd.arg("-pix_fmt").arg("yuv420p").arg(path);

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HyperlapseError::sink(format!("Failed to start ffmpeg: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HyperlapseError::sink("Failed to open ffmpeg stdin"))?;

        tracing::debug!(
            path = %path.display(),
            width,
            height,
            fps,
            codec,
            "Opened frame sink"
        );

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            child,
            stdin: Some(stdin),
            finished: false,
        })
    }
}

impl FrameSink for FfmpegFrameSink {
    fn write_frame(&mut self, frame: &Frame) -> HyperlapseResult<()> {
        if frame.width() != self.width as usize || frame.height() != self.height as usize {
            return Err(HyperlapseError::sink(format!(
                "Frame geometry {}x{} does not match sink {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        if frame.channels() != 3 {
            return Err(HyperlapseError::sink(format!(
                "Sink expects 3-channel frames, got {}",
                frame.channels()
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| HyperlapseError::sink("Sink already finished"))?;

        stdin
            .write_all(frame.as_slice())
            .map_err(|e| HyperlapseError::sink(format!("Failed writing frame to encoder: {e}")))
    }

    fn finish(&mut self) -> HyperlapseResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        // Closing stdin signals end of stream to the encoder.
        drop(self.stdin.take());

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            use std::io::Read;
            let _ = pipe.read_to_string(&mut stderr);
        }

        let status = self
            .child
            .wait()
            .map_err(|e| HyperlapseError::sink(format!("Failed waiting for encoder: {e}")))?;

        if !status.success() {
            return Err(HyperlapseError::sink(format!(
                "Encoder exited with failure for {}: {}",
                self.path.display(),
                stderr.trim()
            )));
        }

        tracing::info!(path = %self.path.display(), "Encoded output finalized");
        Ok(())
    }
}

impl Drop for FfmpegFrameSink {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Map a codec name to ffmpeg encoder arguments.
fn codec_args(codec: &str) -> HyperlapseResult<Vec<String>> {
    let args: &[&str] = match codec {
        "h264" => &["-c:v", "libx264", "-preset", "medium", "-crf", "18"],
        "h265" | "hevc" => &["-c:v", "libx265", "-preset", "medium", "-crf", "24"],
        "vp9" => &["-c:v", "libvpx-vp9", "-b:v", "0", "-crf", "30"],
        "mpeg4" => &["-c:v", "mpeg4", "-q:v", "5"],
        other => {
            return Err(HyperlapseError::unsupported(format!(
                "Unknown codec '{other}' (expected h264, h265, vp9, or mpeg4)"
            )))
        }
    };
    Ok(args.iter().map(|s| s.to_string()).collect())
}
