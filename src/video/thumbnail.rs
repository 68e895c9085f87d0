use crate::engine::Engine;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

const PREVIEW_MAX_WIDTH: u32 = 640;
const PREVIEW_MAX_HEIGHT: u32 = 360;

/// Which preview pane a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSlot {
    Video,
    Output,
}

/// Decoded RGBA frame, ready to become an egui texture on the UI thread.
pub struct PreviewFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
struct FrameRequest {
    slot: PreviewSlot,
    video_path: PathBuf,
    timestamp: f64,
}

pub struct FrameResult {
    pub slot: PreviewSlot,
    pub result: Result<PreviewFrame, String>,
}

/// Extracts still frames for the preview panes on a background worker.
/// Frame extraction is cosmetic: failures are reported but never affect
/// merging.
pub struct PreviewLoader {
    request_sender: mpsc::Sender<FrameRequest>,
    result_receiver: mpsc::Receiver<FrameResult>,
}

impl PreviewLoader {
    pub fn new(engine: Engine) -> Self {
        let (request_sender, request_receiver) = mpsc::channel::<FrameRequest>();
        let (result_sender, result_receiver) = mpsc::channel::<FrameResult>();

        thread::spawn(move || {
            while let Ok(request) = request_receiver.recv() {
                let result = extract_frame(&engine.ffmpeg, &request.video_path, request.timestamp)
                    .map_err(|e| {
                        log::warn!(
                            "Preview frame for {} failed: {}",
                            request.video_path.display(),
                            e
                        );
                        e.to_string()
                    });

                if result_sender
                    .send(FrameResult {
                        slot: request.slot,
                        result,
                    })
                    .is_err()
                {
                    break;
                }
            }
        });

        Self {
            request_sender,
            result_receiver,
        }
    }

    pub fn request(&self, slot: PreviewSlot, video_path: PathBuf, timestamp: f64) {
        let _ = self.request_sender.send(FrameRequest {
            slot,
            video_path,
            timestamp,
        });
    }

    /// Completed frames, non-blocking.
    pub fn poll(&mut self) -> Vec<FrameResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            results.push(result);
        }
        results
    }
}

fn extract_frame(ffmpeg: &Path, video_path: &Path, timestamp: f64) -> Result<PreviewFrame> {
    let temp_file = std::env::temp_dir().join(format!("soundbed-frame-{}.jpg", uuid::Uuid::new_v4()));

    // Seek before the input for fast positioning.
    let output = std::process::Command::new(ffmpeg)
        .arg("-ss").arg(format!("{:.3}", timestamp))
        .arg("-i").arg(video_path)
        .arg("-vframes").arg("1")
        .arg("-vf").arg(format!(
            "scale={}:{}:force_original_aspect_ratio=decrease",
            PREVIEW_MAX_WIDTH, PREVIEW_MAX_HEIGHT
        ))
        .arg("-q:v").arg("2")
        .arg("-y")
        .arg(&temp_file)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped())
        .output()?;

    let frame = (|| {
        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!("FFmpeg failed: {}", error.trim()));
        }

        let img = image::open(&temp_file)?;
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        Ok(PreviewFrame {
            rgba: rgba_img.into_raw(),
            width,
            height,
        })
    })();

    let _ = std::fs::remove_file(&temp_file);
    frame
}
