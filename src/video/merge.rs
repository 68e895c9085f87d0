use crate::core::MergeRequest;
use crate::engine::{scale_filter, Engine, FilterCaps};
use crate::video::probe::{self, VideoInfo};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One complete merge run: probe the video, mix the music (and optionally
/// the ducked original audio) into a temporary AAC track, then encode the
/// final MP4. Runs synchronously; the runner puts it on a worker thread.
pub struct MergeJob {
    engine: Engine,
    caps: FilterCaps,
    request: MergeRequest,
}

/// The audio filter graph for one merge, plus the stream/pad to map into
/// the output.
#[derive(Debug)]
struct MixGraph {
    filter_complex: Option<String>,
    map: String,
}

impl MergeJob {
    pub fn new(engine: Engine, caps: FilterCaps, request: MergeRequest) -> Self {
        Self { engine, caps, request }
    }

    /// Progress values are the coarse advisory checkpoints the UI's bar
    /// shows; they are not proportional to encode work.
    pub fn run(&self, progress: &dyn Fn(u8)) -> anyhow::Result<PathBuf> {
        progress(5);

        let info = probe::probe_video(&self.engine, &self.request.video_path)?;
        log::info!(
            "Merging {} ({}s @ {:.3} fps, audio: {}) with {}",
            self.request.video_path.display(),
            info.duration,
            info.fps,
            info.has_audio,
            self.request.music_path.display()
        );
        progress(20);

        let graph = build_mix_graph(&self.caps, &info, &self.request)?;
        progress(55);

        let temp_audio = TempAudio::new();
        self.render_audio(&graph, &temp_audio.path)?;

        if let Err(e) = self.mux(&info, &temp_audio.path) {
            // A failed encode must not leave a partial export behind.
            let _ = std::fs::remove_file(&self.request.output_path);
            return Err(e);
        }

        progress(100);
        Ok(self.request.output_path.clone())
    }

    /// Pass 1: render the mixed audio to the intermediate AAC file.
    fn render_audio(&self, graph: &MixGraph, temp_path: &Path) -> anyhow::Result<()> {
        let mut cmd = Command::new(&self.engine.ffmpeg);
        cmd.arg("-y")
            .arg("-loglevel").arg("error")
            .arg("-i").arg(&self.request.video_path)
            .arg("-i").arg(&self.request.music_path);

        if let Some(filter_complex) = &graph.filter_complex {
            cmd.arg("-filter_complex").arg(filter_complex);
        }

        cmd.arg("-map").arg(&graph.map)
            .arg("-vn")
            .arg("-c:a").arg("aac")
            .arg(temp_path);

        run_engine(cmd, "audio mix")
    }

    /// Pass 2: re-encode the video and mux the rendered audio alongside it.
    fn mux(&self, info: &VideoInfo, temp_audio: &Path) -> anyhow::Result<()> {
        let mut cmd = Command::new(&self.engine.ffmpeg);
        cmd.arg("-y")
            .arg("-loglevel").arg("error")
            .arg("-i").arg(&self.request.video_path)
            .arg("-i").arg(temp_audio)
            .arg("-map").arg("0:v")
            .arg("-map").arg("1:a")
            .arg("-c:v").arg("libx264")
            .arg("-pix_fmt").arg("yuv420p")
            .arg("-c:a").arg("copy")
            .arg("-r").arg(format!("{:.3}", info.fps))
            .arg("-threads").arg("0")
            .arg(&self.request.output_path);

        run_engine(cmd, "video encode")
    }
}

/// Build the `-filter_complex` graph. Input 0 is the video, input 1 the
/// music. The music is scaled and, when the duration is known and the loop
/// filters exist, repeated out to the video's length; with ducking on and
/// original audio present, the scaled bed is mixed additively under it.
fn build_mix_graph(
    caps: &FilterCaps,
    info: &VideoInfo,
    request: &MergeRequest,
) -> anyhow::Result<MixGraph> {
    let mut music_chain: Vec<String> = Vec::new();
    if let Some(filter) = scale_filter(caps, request.music_level)? {
        music_chain.push(filter);
    }

    if info.duration > 0.0 {
        if caps.supports("aloop") && caps.supports("atrim") {
            music_chain.push("aloop=loop=-1:size=2147483647".to_string());
            music_chain.push(format!("atrim=duration={:.3}", info.duration));
        } else {
            // Best effort only: a build without loop filters still merges,
            // the music just ends at its natural length.
            log::warn!("aloop/atrim filters unavailable; music keeps its natural length");
        }
    }

    if request.duck && info.has_audio {
        let mut bed_chain: Vec<String> = Vec::new();
        if let Some(filter) = scale_filter(caps, request.original_level)? {
            bed_chain.push(filter);
        }

        let mut parts = Vec::new();
        let bed_label = labeled_chain(&mut parts, "0:a", &bed_chain, "bed");
        let music_label = labeled_chain(&mut parts, "1:a", &music_chain, "mus");
        parts.push(format!(
            "{}{}amix=inputs=2:duration=longest:normalize=0[aout]",
            bed_label, music_label
        ));

        Ok(MixGraph {
            filter_complex: Some(parts.join(";")),
            map: "[aout]".to_string(),
        })
    } else if music_chain.is_empty() {
        // Nothing to filter: map the music stream straight through.
        Ok(MixGraph {
            filter_complex: None,
            map: "1:a".to_string(),
        })
    } else {
        Ok(MixGraph {
            filter_complex: Some(format!("[1:a]{}[aout]", music_chain.join(","))),
            map: "[aout]".to_string(),
        })
    }
}

/// Append `[input]filters[label]` to the graph and return the label to
/// reference it by, or the bare input pad when there is nothing to apply.
fn labeled_chain(parts: &mut Vec<String>, input: &str, filters: &[String], label: &str) -> String {
    if filters.is_empty() {
        format!("[{}]", input)
    } else {
        parts.push(format!("[{}]{}[{}]", input, filters.join(","), label));
        format!("[{}]", label)
    }
}

/// Intermediate audio artifact; removed when the guard goes out of scope,
/// on the success and the failure path alike.
struct TempAudio {
    path: PathBuf,
}

impl TempAudio {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("soundbed-mix-{}.m4a", uuid::Uuid::new_v4()));
        Self { path }
    }
}

impl Drop for TempAudio {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                log::warn!("Could not remove temp audio {}: {}", self.path.display(), e);
            } else {
                log::debug!("Removed temp audio {}", self.path.display());
            }
        }
    }
}

fn run_engine(mut cmd: Command, what: &str) -> anyhow::Result<()> {
    log::debug!("Running ffmpeg for {}: {:?}", what, cmd);

    let output = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| anyhow::anyhow!("Failed to launch ffmpeg for {}: {}", what, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        if detail.is_empty() {
            return Err(anyhow::anyhow!("ffmpeg {} failed with {}", what, output.status));
        }
        return Err(anyhow::anyhow!("ffmpeg {} failed: {}", what, detail));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(duck: bool, music_level: f64, original_level: f64) -> MergeRequest {
        MergeRequest {
            video_path: PathBuf::from("/in/video.mp4"),
            music_path: PathBuf::from("/in/music.mp3"),
            output_path: PathBuf::from("/out/video_with_music.mp4"),
            music_level,
            original_level,
            duck,
        }
    }

    fn info(duration: f64, has_audio: bool) -> VideoInfo {
        VideoInfo {
            duration,
            fps: 30.0,
            has_audio,
        }
    }

    fn full_caps() -> FilterCaps {
        FilterCaps::from_names(["volume", "aeval", "aloop", "atrim", "amix"])
    }

    #[test]
    fn test_ducked_graph_mixes_both_sources() {
        let graph = build_mix_graph(&full_caps(), &info(10.0, true), &request(true, 0.8, 0.2)).unwrap();

        let fc = graph.filter_complex.unwrap();
        assert!(fc.contains("[0:a]volume=0.2[bed]"));
        assert!(fc.contains("[1:a]volume=0.8,aloop=loop=-1:size=2147483647,atrim=duration=10.000[mus]"));
        assert!(fc.contains("[bed][mus]amix=inputs=2:duration=longest:normalize=0[aout]"));
        assert_eq!(graph.map, "[aout]");
    }

    #[test]
    fn test_unducked_graph_replaces_original_audio() {
        let graph = build_mix_graph(&full_caps(), &info(10.0, true), &request(false, 0.8, 0.2)).unwrap();

        let fc = graph.filter_complex.unwrap();
        assert!(!fc.contains("[0:a]"));
        assert!(!fc.contains("amix"));
        assert!(fc.starts_with("[1:a]volume=0.8,"));
        assert_eq!(graph.map, "[aout]");
    }

    #[test]
    fn test_ducking_without_original_audio_degrades_to_replace() {
        let graph = build_mix_graph(&full_caps(), &info(10.0, false), &request(true, 0.8, 0.2)).unwrap();

        let fc = graph.filter_complex.unwrap();
        assert!(!fc.contains("amix"));
        assert!(!fc.contains("[0:a]"));
    }

    #[test]
    fn test_loop_skipped_when_filters_missing() {
        let caps = FilterCaps::from_names(["volume", "amix"]);
        let graph = build_mix_graph(&caps, &info(10.0, true), &request(false, 0.8, 0.2)).unwrap();

        let fc = graph.filter_complex.unwrap();
        assert!(!fc.contains("aloop"));
        assert!(!fc.contains("atrim"));
        assert!(fc.contains("volume=0.8"));
    }

    #[test]
    fn test_loop_skipped_for_unknown_duration() {
        let graph = build_mix_graph(&full_caps(), &info(0.0, true), &request(false, 0.8, 0.2)).unwrap();

        assert!(!graph.filter_complex.unwrap().contains("aloop"));
    }

    #[test]
    fn test_identity_passthrough_maps_music_directly() {
        let caps = FilterCaps::default();
        let graph = build_mix_graph(&caps, &info(0.0, false), &request(false, 1.0, 1.0)).unwrap();

        assert_eq!(graph.filter_complex, None);
        assert_eq!(graph.map, "1:a");
    }

    #[test]
    fn test_ducked_passthrough_still_mixes() {
        let caps = FilterCaps::from_names(["amix"]);
        let graph = build_mix_graph(&caps, &info(0.0, true), &request(true, 1.0, 1.0)).unwrap();

        assert_eq!(
            graph.filter_complex.unwrap(),
            "[0:a][1:a]amix=inputs=2:duration=longest:normalize=0[aout]"
        );
    }

    #[test]
    fn test_capability_error_propagates() {
        let caps = FilterCaps::default();
        let err = build_mix_graph(&caps, &info(10.0, true), &request(false, 0.5, 1.0)).unwrap_err();
        assert!(err.to_string().contains("volume filter"));
    }

    #[test]
    fn test_temp_audio_removed_on_drop() {
        let path = {
            let temp = TempAudio::new();
            std::fs::write(&temp.path, b"fake aac").unwrap();
            assert!(temp.path.exists());
            temp.path.clone()
        };
        assert!(!path.exists());
    }
}
