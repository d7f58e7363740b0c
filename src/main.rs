use box_annotate::app::BoxAnnotateApp;
use box_annotate::client::HttpPredictor;
use box_annotate::config::Config;
use box_annotate::session::Session;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;

// ── Main ────────────────────────────────────────────────────────────────────

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config_path = Config::default_path();
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        log::warn!("{e}; using defaults");
        Config::default()
    });

    let predictor = match HttpPredictor::new(&config) {
        Ok(p) => p,
        Err(e) => {
            log::error!("cannot build HTTP client: {e}");
            std::process::exit(1);
        }
    };
    log::info!("predictions from {}", config.predict_url);

    // Optional image to preselect.
    let initial_image = std::env::args().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_title("box-annotate"),
        ..Default::default()
    };

    eframe::run_native(
        "box-annotate",
        options,
        Box::new(move |cc| {
            let mut session = Session::new(Arc::new(predictor));
            session.set_repaint_context(cc.egui_ctx.clone());
            if let Some(path) = initial_image {
                let _ = session.choose_file(&path);
            }
            Ok(Box::new(BoxAnnotateApp::new(session)))
        }),
    )
}
