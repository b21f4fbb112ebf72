//! Clip concatenation.
//!
//! A merge first runs the concat demuxer with stream copy, which is fast but
//! only works when every clip shares codecs and parameters. When FFmpeg
//! rejects that, the clips are fed as separate inputs through the `concat`
//! filter and re-encoded to H.264/AAC. Phone recordings of the same routine
//! often differ in resolution or orientation, so the re-encode path scales
//! and pads every clip onto the first clip's frame when the inputs can be
//! probed.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use choreo_models::export::{concat_list_name, export_file_name};
use choreo_models::{EncodingConfig, ExportMode, ExportResult};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;
use crate::progress::ProgressCallback;

/// Stream layout shared by all inputs, used to shape the re-encode filter graph.
#[derive(Debug, Clone, PartialEq)]
struct InputLayout {
    /// Frame every input is normalized onto, when all inputs could be probed
    target: Option<(u32, u32)>,
    /// Whether every input carries audio
    has_audio: bool,
}

impl Default for InputLayout {
    fn default() -> Self {
        // Unprobed inputs are assumed to be ordinary phone clips with sound
        Self {
            target: None,
            has_audio: true,
        }
    }
}

/// Merges clips into a single export file.
#[derive(Clone, Default)]
pub struct ClipMerger {
    runner: FfmpegRunner,
    encoding: EncodingConfig,
    progress: Option<ProgressCallback>,
}

impl ClipMerger {
    /// Create a merger using the given runner and default encoding.
    pub fn new(runner: FfmpegRunner) -> Self {
        Self {
            runner,
            encoding: EncodingConfig::default(),
            progress: None,
        }
    }

    /// Receive FFmpeg progress from both paths.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Merge `inputs` in order into `exports_dir/choreo_<user>_<ms>.mp4`.
    ///
    /// The concat list written next to the output is removed whether the
    /// merge succeeds or not.
    pub async fn merge(
        &self,
        user_id: &str,
        inputs: &[PathBuf],
        exports_dir: &Path,
    ) -> MediaResult<ExportResult> {
        if inputs.is_empty() {
            return Err(MediaError::NoInputs);
        }

        let inputs = absolute_inputs(inputs).await?;
        fs::create_dir_all(exports_dir).await?;

        let (timestamp, output_name) =
            reserve_output(exports_dir, user_id, Utc::now().timestamp_millis()).await?;
        let output_path = exports_dir.join(&output_name);
        let nonce = Uuid::new_v4().simple().to_string();
        let list_path = exports_dir.join(concat_list_name(user_id, timestamp, &nonce[..8]));

        info!(
            user_id = %user_id,
            clips = inputs.len(),
            output = %output_path.display(),
            "Merging clips"
        );

        let result = match write_concat_list(&list_path, &inputs).await {
            Ok(()) => self.run_merge(&list_path, &inputs, &output_path).await,
            Err(e) => {
                let _ = fs::remove_file(&output_path).await;
                Err(e)
            }
        };

        if let Err(e) = fs::remove_file(&list_path).await {
            warn!("Failed to remove concat list {}: {}", list_path.display(), e);
        }

        let mode = result?;
        info!(user_id = %user_id, mode = %mode, output = %output_name, "Merge complete");

        Ok(ExportResult {
            output_name,
            mode,
            clip_count: inputs.len(),
        })
    }

    async fn run_merge(
        &self,
        list_path: &Path,
        inputs: &[PathBuf],
        output: &Path,
    ) -> MediaResult<ExportMode> {
        let copy = FfmpegCommand::new(list_path, output)
            .concat_demuxer()
            .codec_copy();

        match self.run(&copy).await {
            Ok(()) => return Ok(ExportMode::Copy),
            Err(e) if e.is_retryable() => {
                warn!(
                    error = %e,
                    stderr = e.stderr().unwrap_or(""),
                    "Concat stream copy failed; re-encoding"
                );
            }
            Err(e) => {
                // A killed or unspawnable run may still have left a truncated file
                let _ = fs::remove_file(output).await;
                return Err(e);
            }
        }

        // The re-encode overwrites any partial copy output in place so the
        // reserved name stays claimed
        let layout = probe_layout(inputs).await;
        debug!(?layout, "Re-encode input layout");

        let reencode = self.reencode_command(inputs, output, &layout);
        if let Err(e) = self.run(&reencode).await {
            let _ = fs::remove_file(output).await;
            return Err(e);
        }

        Ok(ExportMode::Reencode)
    }

    fn reencode_command(&self, inputs: &[PathBuf], output: &Path, layout: &InputLayout) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(&inputs[0], output);
        for input in &inputs[1..] {
            cmd = cmd.add_input(input);
        }

        let filter = build_concat_filter(inputs.len(), layout.has_audio, layout.target);
        cmd = cmd
            .filter_complex(filter)
            .map("[outv]")
            .video_codec(&self.encoding.codec)
            .preset(&self.encoding.preset)
            .crf(self.encoding.crf)
            .output_args(["-pix_fmt", "yuv420p"]);

        cmd = if layout.has_audio {
            cmd.map("[outa]")
                .audio_codec(&self.encoding.audio_codec)
                .audio_bitrate(&self.encoding.audio_bitrate)
        } else {
            cmd.no_audio()
        };

        cmd.faststart().format("mp4")
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let progress = self.progress.clone();
        self.runner
            .run_with_progress(cmd, move |p| {
                if let Some(callback) = &progress {
                    callback(p);
                }
            })
            .await
    }
}

/// Claim an unused export name by creating it empty, moving to the next
/// millisecond while the name is taken. FFmpeg overwrites the placeholder.
async fn reserve_output(
    exports_dir: &Path,
    user_id: &str,
    mut timestamp: i64,
) -> MediaResult<(i64, String)> {
    loop {
        let name = export_file_name(user_id, timestamp);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(exports_dir.join(&name))
            .await
        {
            Ok(_) => return Ok((timestamp, name)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => timestamp += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Build the `-filter_complex` graph joining `count` inputs.
///
/// Each video stream is first normalized (scaled and padded onto `target`
/// when given, square pixels always), then all segments are joined by the
/// `concat` filter into `[outv]` (and `[outa]` when `with_audio`).
pub fn build_concat_filter(count: usize, with_audio: bool, target: Option<(u32, u32)>) -> String {
    let mut graph = String::new();

    for i in 0..count {
        match target {
            Some((w, h)) => graph.push_str(&format!(
                "[{i}:v:0]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1[v{i}];"
            )),
            None => graph.push_str(&format!("[{i}:v:0]setsar=1[v{i}];")),
        }
    }

    for i in 0..count {
        graph.push_str(&format!("[v{i}]"));
        if with_audio {
            graph.push_str(&format!("[{i}:a:0]"));
        }
    }

    if with_audio {
        graph.push_str(&format!("concat=n={count}:v=1:a=1[outv][outa]"));
    } else {
        graph.push_str(&format!("concat=n={count}:v=1:a=0[outv]"));
    }

    graph
}

/// Write an FFmpeg concat demuxer list, one `file '<path>'` line per input.
pub async fn write_concat_list(list_path: &Path, inputs: &[PathBuf]) -> MediaResult<()> {
    let mut content = String::new();
    for input in inputs {
        content.push_str(&format!("file '{}'\n", escape_concat_path(input)));
    }
    fs::write(list_path, content).await?;
    Ok(())
}

/// Quote a path for the concat demuxer: `'` becomes `'\''`.
fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Resolve every input to an absolute path, failing on the first missing one.
async fn absolute_inputs(inputs: &[PathBuf]) -> MediaResult<Vec<PathBuf>> {
    let mut resolved = Vec::with_capacity(inputs.len());
    for input in inputs {
        match fs::canonicalize(input).await {
            Ok(path) => resolved.push(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaError::FileNotFound(input.clone()));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(resolved)
}

/// Probe every input; fall back to [`InputLayout::default`] if any probe fails.
async fn probe_layout(inputs: &[PathBuf]) -> InputLayout {
    let mut infos = Vec::with_capacity(inputs.len());
    for input in inputs {
        match probe_video(input).await {
            Ok(info) => infos.push(info),
            Err(e) => {
                debug!("Probe failed for {}: {}", input.display(), e);
                return InputLayout::default();
            }
        }
    }

    let target = infos
        .first()
        .filter(|first| first.width > 0 && first.height > 0)
        .map(|first| (even(first.width), even(first.height)));

    InputLayout {
        target,
        has_audio: infos.iter().all(|i| i.has_audio),
    }
}

/// Round down to an even dimension (required by yuv420p).
fn even(n: u32) -> u32 {
    (n & !1).max(2)
}
