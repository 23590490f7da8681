#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use cutstudio::app::StudioApp;
use cutstudio::persist::JsonFileSink;
use cutstudio::session::StudioSession;

fn main() -> eframe::Result {
    env_logger::init();

    let sink = JsonFileSink::new("cutstudio_project.json");
    let initial = match sink.load() {
        Ok(payload) => payload,
        Err(err) => {
            log::warn!("could not load saved project, starting fresh: {err}");
            None
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "cutstudio",
        native_options,
        Box::new(move |cc| {
            let session = StudioSession::new(initial, Box::new(sink), None);
            Ok(Box::new(StudioApp::new(cc, session)))
        }),
    )
}
