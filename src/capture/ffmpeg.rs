use crate::capture::encoder::{EncoderEvent, EncoderFactory, MediaEncoder};
use crate::capture::format::{BASELINE, CodecSupport, FormatDescriptor, descriptor_for_mime};
use crate::capture::stream::CaptureStream;
use crate::foundation::error::{SpectroError, SpectroResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::FrameRGBA;
use std::collections::BTreeSet;
use std::io::Read;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Encoders and muxers compiled into the local `ffmpeg`.
#[derive(Clone, Debug, Default)]
pub struct FfmpegCapabilities {
    encoders: BTreeSet<String>,
    muxers: BTreeSet<String>,
}

impl FfmpegCapabilities {
    /// Query `ffmpeg -encoders` and `ffmpeg -muxers`.
    pub fn probe() -> SpectroResult<Self> {
        if !is_ffmpeg_on_path() {
            return Err(SpectroError::unsupported(
                "ffmpeg is required for export, but was not found on PATH",
            ));
        }
        let encoders = run_listing("-encoders")?;
        let muxers = run_listing("-muxers")?;
        let caps = Self::from_listings(&encoders, &muxers);
        tracing::debug!(
            encoders = caps.encoders.len(),
            muxers = caps.muxers.len(),
            "probed ffmpeg capabilities"
        );
        Ok(caps)
    }

    pub fn from_listings(encoders: &str, muxers: &str) -> Self {
        Self {
            encoders: parse_listing(encoders, |flags| {
                flags.starts_with('V') || flags.starts_with('A')
            }),
            muxers: parse_listing(muxers, |flags| flags.contains('E')),
        }
    }

    pub fn has_encoder(&self, name: &str) -> bool {
        self.encoders.contains(name)
    }

    pub fn has_muxer(&self, name: &str) -> bool {
        self.muxers.contains(name)
    }

    pub fn supports(&self, format: &FormatDescriptor) -> bool {
        self.has_muxer(format.muxer)
            && format.video_codec.is_none_or(|c| self.has_encoder(c))
            && format.audio_codec.is_none_or(|c| self.has_encoder(c))
    }
}

impl CodecSupport for FfmpegCapabilities {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        descriptor_for_mime(mime_type).is_some_and(|f| self.supports(&f))
    }
}

fn run_listing(flag: &str) -> SpectroResult<String> {
    let out = Command::new("ffmpeg")
        .args(["-hide_banner", flag])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| SpectroError::unsupported(format!("failed to run ffmpeg {flag}: {e}")))?;
    if !out.status.success() {
        return Err(SpectroError::unsupported(format!(
            "ffmpeg {flag} exited with status {}",
            out.status
        )));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Entries follow a line of dashes; each is `<flags> <name[,name...]> <description>`.
fn parse_listing(text: &str, keep: impl Fn(&str) -> bool) -> BTreeSet<String> {
    text.lines()
        .skip_while(|l| {
            let t = l.trim();
            t.is_empty() || !t.chars().all(|c| c == '-')
        })
        .skip(1)
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let flags = parts.next()?;
            let names = parts.next()?;
            keep(flags).then_some(names)
        })
        .flat_map(|names| names.split(',').map(str::to_owned))
        .collect()
}

/// Encoder that spawns the system `ffmpeg`, streams raw frames to stdin and reads the container
/// back from stdout.
pub struct FfmpegEncoder {
    format: FormatDescriptor,
    stream: CaptureStream,
    bg_rgba: [u8; 4],

    stdin: Option<ChildStdin>,
    events: Option<mpsc::Receiver<EncoderEvent>>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    /// Validate the stream and format. Nothing is spawned until `start`.
    pub fn new(stream: &CaptureStream, format: FormatDescriptor) -> SpectroResult<Self> {
        let vp = stream.viewport;
        if stream.fps == 0 {
            return Err(SpectroError::validation("capture fps must be non-zero"));
        }
        if !vp.width.is_multiple_of(2) || !vp.height.is_multiple_of(2) {
            return Err(SpectroError::validation(format!(
                "capture size {}x{} must be even (required for yuv420p output)",
                vp.width, vp.height
            )));
        }
        if let Some(audio) = stream.audio_path.as_deref()
            && !audio.is_file()
        {
            return Err(SpectroError::capture(format!(
                "audio track source '{}' does not exist",
                audio.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(SpectroError::unsupported(
                "ffmpeg is required for export, but was not found on PATH",
            ));
        }
        Ok(Self {
            format,
            stream: stream.clone(),
            bg_rgba: [0, 0, 0, 255],
            stdin: None,
            events: None,
            scratch: Vec::new(),
        })
    }

    /// Background the premultiplied canvas is flattened over (straight RGBA8).
    pub fn with_background(mut self, bg_rgba: [u8; 4]) -> Self {
        self.bg_rgba = bg_rgba;
        self
    }

    fn command(&self) -> Command {
        let vp = self.stream.viewport;
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input 0: raw RGBA8 frames, already flattened to opaque in push_frame.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", vp.width, vp.height),
            "-r",
            &self.stream.fps.to_string(),
            "-i",
            "pipe:0",
        ]);
        if let Some(audio) = self.stream.audio_path.as_deref() {
            cmd.arg("-i").arg(audio);
            cmd.args(["-map", "0:v:0", "-map", "1:a:0"]);
        } else {
            cmd.arg("-an");
        }

        if let Some(codec) = self.format.video_codec {
            cmd.args(["-c:v", codec]);
        }
        cmd.args(["-pix_fmt", "yuv420p"]);
        if self.stream.audio_path.is_some()
            && let Some(codec) = self.format.audio_codec
        {
            cmd.args(["-c:a", codec]);
        }
        if self.format.muxer == "mp4" {
            // A pipe cannot be seeked back to write the index.
            cmd.args(["-movflags", "frag_keyframe+empty_moov+default_base_moof"]);
        }
        cmd.args(["-f", self.format.muxer, "pipe:1"]);
        cmd
    }
}

impl MediaEncoder for FfmpegEncoder {
    fn mime_type(&self) -> &str {
        self.format.mime_type
    }

    #[tracing::instrument(skip_all, fields(mime = self.format.mime_type))]
    fn start(&mut self) -> SpectroResult<()> {
        if self.events.is_some() {
            return Err(SpectroError::capture("encoder already started"));
        }

        let mut child = self.command().spawn().map_err(|e| {
            SpectroError::capture(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SpectroError::capture("failed to open ffmpeg stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SpectroError::capture("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SpectroError::capture("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok::<_, std::io::Error>(stderr_bytes)
        });

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || pump_stdout(child, stdout, stderr_drain, tx));

        self.scratch = vec![0u8; self.stream.viewport.pixel_len()];
        self.stdin = Some(stdin);
        self.events = Some(rx);
        tracing::info!("ffmpeg encoder started");
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> SpectroResult<()> {
        let vp = self.stream.viewport;
        if frame.width != vp.width || frame.height != vp.height {
            return Err(SpectroError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, vp.width, vp.height
            )));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SpectroError::capture("ffmpeg encoder is not accepting frames"));
        };

        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, &frame.data, self.bg_rgba)?;

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            SpectroError::capture(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn request_stop(&mut self) -> SpectroResult<()> {
        // Closing stdin lets ffmpeg flush and exit; the reader thread reports `Stopped`.
        if self.stdin.take().is_some() {
            tracing::debug!("closed ffmpeg stdin");
        }
        Ok(())
    }

    fn try_event(&mut self) -> Option<EncoderEvent> {
        self.events.as_ref()?.try_recv().ok()
    }
}

fn pump_stdout(
    mut child: Child,
    mut stdout: impl Read,
    stderr_drain: std::thread::JoinHandle<std::io::Result<Vec<u8>>>,
    tx: mpsc::Sender<EncoderEvent>,
) {
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    let read_result = loop {
        match stdout.read(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(n) => {
                if tx.send(EncoderEvent::Data(buf[..n].to_vec())).is_err() {
                    break Err("encoder output receiver dropped".to_owned());
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => break Err(format!("failed to read ffmpeg output: {e}")),
        }
    };

    let status = child.wait();
    let stderr_bytes = match stderr_drain.join() {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => format!("ffmpeg stderr read failed: {e}").into_bytes(),
        Err(_) => b"ffmpeg stderr drain thread panicked".to_vec(),
    };

    let outcome = match (read_result, status) {
        (Err(e), _) => Err(e),
        (Ok(()), Err(e)) => Err(format!("failed to wait for ffmpeg to finish: {e}")),
        (Ok(()), Ok(status)) if !status.success() => Err(format!(
            "ffmpeg exited with status {}: {}",
            status,
            String::from_utf8_lossy(&stderr_bytes).trim()
        )),
        (Ok(()), Ok(_)) => Ok(()),
    };
    // The recorder may already be gone.
    let _ = tx.send(EncoderEvent::Stopped(outcome));
}

/// Builds [`FfmpegEncoder`]s; the unparameterized request maps to the baseline format.
#[derive(Clone, Copy, Debug)]
pub struct FfmpegEncoderFactory {
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegEncoderFactory {
    fn default() -> Self {
        Self {
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

impl EncoderFactory for FfmpegEncoderFactory {
    fn create(
        &self,
        stream: &CaptureStream,
        format: Option<&FormatDescriptor>,
    ) -> SpectroResult<Box<dyn MediaEncoder>> {
        let format = format.copied().unwrap_or(BASELINE);
        Ok(Box::new(
            FfmpegEncoder::new(stream, format)?.with_background(self.bg_rgba),
        ))
    }
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> SpectroResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(SpectroError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let [bg_r, bg_g, bg_b, _] = bg_rgba.map(u16::from);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/ffmpeg.rs"]
mod tests;
