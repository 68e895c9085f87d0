mod audio;
mod core;
mod engine;
mod gui;
mod video;

use eframe::egui;
use gui::SoundbedApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 640.0])
            .with_min_inner_size([720.0, 480.0])
            .with_title("Soundbed - Video + Music Merger"),
        ..Default::default()
    };

    eframe::run_native(
        "Soundbed",
        options,
        Box::new(|cc| {
            match SoundbedApp::new(cc) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    eprintln!("Failed to initialize app: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
