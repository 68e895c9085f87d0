use crate::audio::MusicPreview;
use crate::core::{ensure_mp4_extension, AppConfig, JobEvent, MergeRequest, Selection};
use crate::engine::{Engine, EngineSource, FilterCaps};
use crate::video::{JobRunner, MergeJob, PreviewLoader, PreviewSlot, VideoInfo, VideoInfoLoader};
use eframe::egui;
use std::path::PathBuf;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi"];
const MUSIC_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "flac"];

/// Where preview still-frames are grabbed from.
const PREVIEW_TIMESTAMP: f64 = 0.5;

/// One-time advisory shown on the first frame after startup.
enum StartupNotice {
    BundledEngine,
    NoEngine,
}

pub struct SoundbedApp {
    pub config: AppConfig,
    pub selection: Selection,
    pub engine: Option<Engine>,
    pub caps: FilterCaps,
    pub runner: JobRunner,
    pub music_preview: MusicPreview,
    pub music_level: u8,
    pub original_level: u8,
    pub duck: bool,
    pub progress: u8,
    pub status_message: String,
    pub video_info: Option<VideoInfo>,
    pub last_output: Option<PathBuf>,
    info_loader: Option<VideoInfoLoader>,
    preview_loader: Option<PreviewLoader>,
    pending_info_request: Option<u64>,
    video_texture: Option<egui::TextureHandle>,
    output_texture: Option<egui::TextureHandle>,
    startup_notice: Option<StartupNotice>,
}

/// The merge trigger is only live when both inputs are picked, an engine
/// exists, and no job is currently in flight.
pub(crate) fn merge_enabled(selection: &Selection, engine: Option<&Engine>, job_active: bool) -> bool {
    selection.ready() && engine.is_some() && !job_active
}

impl SoundbedApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let mut visuals = egui::Visuals::dark();
        visuals.override_text_color = Some(egui::Color32::WHITE);
        cc.egui_ctx.set_visuals(visuals);

        let config = AppConfig::load()?;

        let engine = Engine::locate();
        let caps = match &engine {
            Some(engine) => {
                engine.export_env();
                FilterCaps::probe(&engine.ffmpeg)
            }
            None => FilterCaps::default(),
        };

        let startup_notice = match &engine {
            Some(e) if e.source == EngineSource::Bundled => Some(StartupNotice::BundledEngine),
            None => Some(StartupNotice::NoEngine),
            _ => None,
        };

        let info_loader = engine.clone().map(VideoInfoLoader::new);
        let preview_loader = engine.clone().map(PreviewLoader::new);

        Ok(Self {
            music_level: config.music_level_percent.min(100),
            original_level: config.original_level_percent.min(100),
            duck: config.duck_by_default,
            config,
            selection: Selection::default(),
            engine,
            caps,
            runner: JobRunner::new(),
            music_preview: MusicPreview::new(),
            progress: 0,
            status_message: "Select a video and a music track".to_string(),
            video_info: None,
            last_output: None,
            info_loader,
            preview_loader,
            pending_info_request: None,
            video_texture: None,
            output_texture: None,
            startup_notice,
        })
    }

    fn show_startup_notice(&mut self) {
        match self.startup_notice.take() {
            Some(StartupNotice::BundledEngine) => {
                rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Info)
                    .set_title("Speed tip")
                    .set_description("Bundled FFmpeg (slower). Install system FFmpeg for better speed.")
                    .show();
            }
            Some(StartupNotice::NoEngine) => {
                rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Warning)
                    .set_title("FFmpeg missing")
                    .set_description("Install FFmpeg to enable merging.")
                    .show();
            }
            None => {}
        }
    }

    fn process_job_events(&mut self) {
        for event in self.runner.poll() {
            match event {
                JobEvent::Progress(pct) => self.progress = pct,
                JobEvent::Finished(path) => {
                    self.progress = 100;
                    self.status_message = format!("Output: {}", file_name(&path));

                    rfd::MessageDialog::new()
                        .set_level(rfd::MessageLevel::Info)
                        .set_title("Done")
                        .set_description(format!("Merged video saved to:\n{}", path.display()))
                        .show();

                    if let Some(loader) = &self.preview_loader {
                        loader.request(PreviewSlot::Output, path.clone(), PREVIEW_TIMESTAMP);
                    }
                    self.last_output = Some(path);
                }
                JobEvent::Failed(message) => {
                    self.progress = 0;
                    self.status_message = "Merge failed".to_string();

                    rfd::MessageDialog::new()
                        .set_level(rfd::MessageLevel::Error)
                        .set_title("Merge failed")
                        .set_description(message)
                        .show();
                }
            }
        }
    }

    fn process_info_results(&mut self) {
        let results = match &self.info_loader {
            Some(loader) => loader.poll(),
            None => return,
        };

        for result in results {
            if Some(result.request_id) != self.pending_info_request {
                continue; // stale answer for a file picked earlier
            }
            self.pending_info_request = None;

            match result.result {
                Ok(info) => self.video_info = Some(info),
                Err(e) => {
                    log::warn!("Could not probe {}: {}", result.file_path.display(), e);
                    self.video_info = None;
                }
            }
        }
    }

    fn process_preview_frames(&mut self, ctx: &egui::Context) {
        let results = match &mut self.preview_loader {
            Some(loader) => loader.poll(),
            None => return,
        };

        for frame in results {
            let Ok(preview) = frame.result else {
                continue; // already logged by the loader; placeholder stays
            };

            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [preview.width as usize, preview.height as usize],
                &preview.rgba,
            );

            let name = match frame.slot {
                PreviewSlot::Video => "video-preview",
                PreviewSlot::Output => "output-preview",
            };
            let texture = ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR);

            match frame.slot {
                PreviewSlot::Video => self.video_texture = Some(texture),
                PreviewSlot::Output => self.output_texture = Some(texture),
            }
        }
    }

    fn pick_video(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Video Files", VIDEO_EXTENSIONS);
        if let Some(dir) = &self.config.last_video_directory {
            dialog = dialog.set_directory(dir);
        }

        if let Some(path) = dialog.pick_file() {
            if let Some(parent) = path.parent() {
                self.config.last_video_directory = Some(parent.to_path_buf());
            }
            self.save_config();

            self.video_info = None;
            self.video_texture = None;
            self.pending_info_request = self.info_loader.as_mut().map(|l| l.request(path.clone()));
            if let Some(loader) = &self.preview_loader {
                loader.request(PreviewSlot::Video, path.clone(), PREVIEW_TIMESTAMP);
            }

            self.selection.video_path = Some(path);
        }
    }

    fn pick_music(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Audio Files", MUSIC_EXTENSIONS);
        if let Some(dir) = &self.config.last_music_directory {
            dialog = dialog.set_directory(dir);
        }

        if let Some(path) = dialog.pick_file() {
            if let Some(parent) = path.parent() {
                self.config.last_music_directory = Some(parent.to_path_buf());
            }
            self.save_config();

            self.music_preview.stop();
            self.selection.music_path = Some(path);
        }
    }

    fn start_merge(&mut self) {
        if !self.selection.ready() {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Warning)
                .set_title("Missing files")
                .set_description("Select both video and music first.")
                .show();
            return;
        }
        let Some(engine) = self.engine.clone() else {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Warning)
                .set_title("FFmpeg missing")
                .set_description("Install FFmpeg to enable export.")
                .show();
            return;
        };
        let (Some(video), Some(music)) = (
            self.selection.video_path.clone(),
            self.selection.music_path.clone(),
        ) else {
            return;
        };

        let mut dialog = rfd::FileDialog::new().add_filter("MP4 Video", &["mp4"]);
        if let Some(suggested) = self.selection.suggested_output() {
            if let Some(dir) = suggested.parent() {
                dialog = dialog.set_directory(dir);
            }
            if let Some(name) = suggested.file_name().and_then(|n| n.to_str()) {
                dialog = dialog.set_file_name(name);
            }
        }
        let Some(picked) = dialog.save_file() else {
            return;
        };
        let output = ensure_mp4_extension(&picked);

        if let Some(dir) = output.parent() {
            self.config.last_output_directory = Some(dir.to_path_buf());
        }
        self.config.music_level_percent = self.music_level;
        self.config.original_level_percent = self.original_level;
        self.config.duck_by_default = self.duck;
        self.save_config();

        self.selection.output_path = Some(output.clone());
        self.music_preview.stop();
        self.progress = 0;
        self.output_texture = None;
        self.status_message = "Merging…".to_string();

        let request = MergeRequest {
            video_path: video,
            music_path: music,
            output_path: output,
            music_level: self.music_level as f64 / 100.0,
            original_level: self.original_level as f64 / 100.0,
            duck: self.duck,
        };
        let caps = self.caps.clone();

        if let Err(e) = self
            .runner
            .spawn(move |report| MergeJob::new(engine, caps, request).run(report))
        {
            log::error!("Could not start merge: {}", e);
            self.status_message = format!("Could not start merge: {}", e);
        }
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            log::warn!("Failed to save config: {}", e);
        }
    }

    fn engine_label(&self) -> &'static str {
        match &self.engine {
            Some(engine) => engine.source.label(),
            None => "unavailable",
        }
    }

    fn video_label(&self) -> String {
        match &self.selection.video_path {
            Some(path) => match &self.video_info {
                Some(info) => format!(
                    "Video: {} ({:.1}s, {})",
                    file_name(path),
                    info.duration,
                    if info.has_audio { "with audio" } else { "no audio" }
                ),
                None => format!("Video: {}", file_name(path)),
            },
            None => "No video selected".to_string(),
        }
    }

    fn music_label(&self) -> String {
        match &self.selection.music_path {
            Some(path) => format!("Music: {}", file_name(path)),
            None => "No music selected".to_string(),
        }
    }

    fn draw(&mut self, ui: &mut egui::Ui) {
        ui.heading("Video + Music Merger");
        ui.add_space(8.0);

        ui.group(|ui| {
            ui.label(egui::RichText::new("Video").strong());
            if let Some(texture) = &self.video_texture {
                ui.add(egui::Image::new(texture).max_size(egui::vec2(480.0, 270.0)));
            }
            ui.label(self.video_label());
            if ui.button("Select Video…").clicked() {
                self.pick_video();
            }
        });
        ui.add_space(8.0);

        ui.group(|ui| {
            ui.label(egui::RichText::new("Music").strong());
            ui.label(self.music_label());
            ui.horizontal(|ui| {
                if ui.button("Select Music…").clicked() {
                    self.pick_music();
                }

                let label = if self.music_preview.is_playing() {
                    "Stop Music"
                } else {
                    "Preview Music"
                };
                let enabled = self.selection.music_path.is_some();
                if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                    if let Some(path) = self.selection.music_path.clone() {
                        if let Err(e) = self.music_preview.toggle(&path) {
                            self.status_message = format!("Preview failed: {}", e);
                        }
                    }
                }
            });
        });
        ui.add_space(8.0);

        ui.group(|ui| {
            ui.label(egui::RichText::new("Mixing & Ducking").strong());
            ui.checkbox(&mut self.duck, "Keep original video audio (duck under music)");
            ui.add(egui::Slider::new(&mut self.music_level, 0..=100).suffix("%").text("Music level"));
            ui.add(egui::Slider::new(&mut self.original_level, 0..=100).suffix("%").text("Original level"));
        });
        ui.add_space(8.0);

        ui.group(|ui| {
            ui.label(egui::RichText::new("Output").strong());
            if let Some(texture) = &self.output_texture {
                ui.add(egui::Image::new(texture).max_size(egui::vec2(480.0, 270.0)));
            }
            match &self.last_output {
                Some(path) => ui.label(format!("Output: {}", file_name(path))),
                None => ui.label("Output: not created yet"),
            };
        });
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            if ui.button("Get FFmpeg…").clicked() {
                show_engine_help();
            }

            let can_merge = merge_enabled(&self.selection, self.engine.as_ref(), self.runner.is_active());
            if ui.add_enabled(can_merge, egui::Button::new("Merge & Export…")).clicked() {
                self.start_merge();
            }

            ui.add(
                egui::ProgressBar::new(self.progress as f32 / 100.0)
                    .show_percentage()
                    .desired_width(220.0),
            );
        });

        ui.label(format!("Engine: {}", self.engine_label()));
        ui.label(&self.status_message);
    }
}

impl eframe::App for SoundbedApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show_startup_notice();
        self.process_job_events();
        self.process_info_results();
        self.process_preview_frames(ctx);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Video…").clicked() {
                        self.pick_video();
                        ui.close_menu();
                    }
                    if ui.button("Open Music…").clicked() {
                        self.pick_music();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("Get FFmpeg…").clicked() {
                        show_engine_help();
                        ui.close_menu();
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| self.draw(ui));

        // Keep polling the worker channels while anything is in flight.
        if self.runner.is_active() || self.pending_info_request.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

fn show_engine_help() {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Info)
        .set_title("Get FFmpeg")
        .set_description(
            "Install FFmpeg for better performance. Use winget/choco/scoop on Windows, \
             brew on macOS; most Linux distributions package it as 'ffmpeg'.",
        )
        .show();
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
