use crate::engine::Engine;
use crate::video::probe::{self, VideoInfo};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::mpsc;

/// Request to probe one media file.
#[derive(Debug, Clone)]
pub struct InfoRequest {
    pub file_path: PathBuf,
    pub request_id: u64,
}

/// Outcome of a probe request.
#[derive(Debug, Clone)]
pub struct InfoResult {
    pub request_id: u64,
    pub file_path: PathBuf,
    pub result: Result<VideoInfo, String>,
}

/// Probes media files on a background worker so picking a file never
/// stalls the UI; the app drains completed results each frame.
pub struct VideoInfoLoader {
    request_sender: mpsc::UnboundedSender<InfoRequest>,
    result_receiver: Arc<Mutex<mpsc::UnboundedReceiver<InfoResult>>>,
    next_request_id: u64,
}

impl VideoInfoLoader {
    pub fn new(engine: Engine) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<InfoRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<InfoResult>();

        thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create probe runtime: {}", e);
                    return;
                }
            };

            rt.block_on(async {
                while let Some(request) = request_rx.recv().await {
                    let result_tx = result_tx.clone();
                    let engine = engine.clone();

                    // Each ffprobe call blocks, so push it off the runtime.
                    tokio::task::spawn_blocking(move || {
                        log::debug!("Probing {}", request.file_path.display());

                        let result = probe::probe_video(&engine, &request.file_path)
                            .map_err(|e| e.to_string());

                        let response = InfoResult {
                            request_id: request.request_id,
                            file_path: request.file_path,
                            result,
                        };

                        if result_tx.send(response).is_err() {
                            log::debug!("Probe result receiver dropped");
                        }
                    });
                }
            });
        });

        Self {
            request_sender: request_tx,
            result_receiver: Arc::new(Mutex::new(result_rx)),
            next_request_id: 0,
        }
    }

    /// Queue a probe; returns the id to match the eventual result against.
    pub fn request(&mut self, file_path: PathBuf) -> u64 {
        self.next_request_id += 1;
        let request = InfoRequest {
            file_path,
            request_id: self.next_request_id,
        };

        if self.request_sender.send(request).is_err() {
            log::error!("Probe worker is gone; request dropped");
        }

        self.next_request_id
    }

    /// Completed probe results, non-blocking.
    pub fn poll(&self) -> Vec<InfoResult> {
        let mut results = Vec::new();

        if let Ok(mut receiver) = self.result_receiver.lock() {
            while let Ok(result) = receiver.try_recv() {
                results.push(result);
            }
        }

        results
    }
}
