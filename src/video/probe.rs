use crate::engine::Engine;
use std::path::Path;
use std::process::Command;

/// Frame rate used when the source does not report one.
pub const FALLBACK_FPS: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub duration: f64,
    pub fps: f64,
    pub has_audio: bool,
}

/// Ask ffprobe about a container: duration, frame rate and whether it has
/// an embedded audio track. Decodability beyond this is decided by ffmpeg
/// itself when the merge runs.
pub fn probe_video(engine: &Engine, file_path: &Path) -> anyhow::Result<VideoInfo> {
    let ffprobe = engine.ffprobe.as_ref().ok_or_else(|| {
        anyhow::anyhow!("ffprobe executable not found; reinstall ffmpeg to enable probing")
    })?;

    let output = Command::new(ffprobe)
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(file_path)
        .output()
        .map_err(|e| anyhow::anyhow!("Failed to launch ffprobe: {}", e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "ffprobe failed for {}",
            file_path.display()
        ));
    }

    let json_str = String::from_utf8(output.stdout)?;
    parse_probe_output(&json_str)
}

pub(crate) fn parse_probe_output(json_str: &str) -> anyhow::Result<VideoInfo> {
    let info: serde_json::Value = serde_json::from_str(json_str)?;

    let duration = info["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let empty_vec = vec![];
    let streams = info["streams"].as_array().unwrap_or(&empty_vec);

    let mut fps = None;
    let mut has_audio = false;

    for stream in streams.iter() {
        match stream["codec_type"].as_str() {
            Some("video") => {
                if fps.is_none() {
                    fps = stream["r_frame_rate"]
                        .as_str()
                        .and_then(parse_frame_rate);
                }
            }
            Some("audio") => has_audio = true,
            _ => {}
        }
    }

    Ok(VideoInfo {
        duration,
        fps: fps.unwrap_or(FALLBACK_FPS),
        has_audio,
    })
}

/// ffprobe reports rates as fractions ("30000/1001", "25/1") or plain
/// numbers. Zero and negative rates are treated as unreported.
fn parse_frame_rate(raw: &str) -> Option<f64> {
    let value = match raw.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse::<f64>().ok()?,
    };
    (value > 0.0).then_some(value)
}
