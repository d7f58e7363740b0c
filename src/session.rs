use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::annotation::Prediction;
use crate::client::{ImageUpload, PredictError, Predictor};
use crate::editor::BoxEditor;

pub const NO_FILE_NOTICE: &str = "Please select an image first.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no image selected")]
    UserInputMissing,
    #[error("failed to open image {0}: {1}")]
    Image(PathBuf, image::ImageError),
}

type UploadOutcome = Result<Prediction, PredictError>;

/// The decoded image currently shown on the canvas.
pub struct LoadedImage {
    pub path: PathBuf,
    pub color: egui::ColorImage,
    /// Changes every time a file is chosen, even the same one again.
    pub serial: u64,
}

impl LoadedImage {
    pub fn size(&self) -> egui::Vec2 {
        egui::vec2(self.color.size[0] as f32, self.color.size[1] as f32)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Chosen file, in-flight uploads and the box editor, without any UI.
pub struct Session {
    predictor: Arc<dyn Predictor>,
    image: Option<LoadedImage>,
    image_serial: u64,
    image_id: Option<String>,
    editor: BoxEditor,
    notice: Option<String>,

    results_tx: Sender<UploadOutcome>,
    results_rx: Receiver<UploadOutcome>,
    in_flight: usize,
    repaint: Option<egui::Context>,
}

impl Session {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            predictor,
            image: None,
            image_serial: 0,
            image_id: None,
            editor: BoxEditor::new(),
            notice: None,
            results_tx,
            results_rx,
            in_flight: 0,
            repaint: None,
        }
    }

    /// Workers wake the UI through this context when they finish.
    pub fn set_repaint_context(&mut self, ctx: egui::Context) {
        self.repaint = Some(ctx);
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    pub fn editor(&self) -> &BoxEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut BoxEditor {
        &mut self.editor
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Loads a new image and forgets the previous prediction.
    pub fn choose_file(&mut self, path: &Path) -> Result<(), SessionError> {
        let decoded = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                let err = SessionError::Image(path.to_path_buf(), e);
                log::error!("{err}");
                self.notice = Some(err.to_string());
                return Err(err);
            }
        };
        let rgba = decoded.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_flat_samples().as_slice());

        log::info!("chose {} ({}x{})", path.display(), size[0], size[1]);
        self.image_serial += 1;
        self.image = Some(LoadedImage {
            path: path.to_path_buf(),
            color,
            serial: self.image_serial,
        });
        self.image_id = None;
        self.editor.replace(None);
        Ok(())
    }

    /// Sends the chosen image to the predictor on a worker thread.
    ///
    /// Without a chosen image this raises the notice and sends nothing.
    pub fn request_upload(&mut self) -> Result<(), SessionError> {
        let Some(image) = self.image.as_ref() else {
            self.notice = Some(NO_FILE_NOTICE.to_string());
            return Err(SessionError::UserInputMissing);
        };

        let path = image.path.clone();
        let predictor = Arc::clone(&self.predictor);
        let tx = self.results_tx.clone();
        let repaint = self.repaint.clone();

        log::info!("uploading {}", path.display());
        thread::spawn(move || {
            let outcome = ImageUpload::from_path(&path).and_then(|u| predictor.predict(&u));
            // The receiver only goes away when the session does.
            let _ = tx.send(outcome);
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
        self.in_flight += 1;
        Ok(())
    }

    /// Applies finished uploads in the order they resolved. Returns how many
    /// were received.
    pub fn poll(&mut self) -> usize {
        let mut received = 0;
        while let Ok(outcome) = self.results_rx.try_recv() {
            received += 1;
            self.apply(outcome);
        }
        received
    }

    /// Like [`Session::poll`] but blocks until nothing is in flight or
    /// `timeout` passes. Returns whether everything resolved.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.results_rx.recv_timeout(left) {
                Ok(outcome) => self.apply(outcome),
                Err(_) => return false,
            }
        }
        true
    }

    fn apply(&mut self, outcome: UploadOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let annotations = outcome.and_then(|p| p.into_annotations().map_err(PredictError::from));
        match annotations {
            Ok((set, image_id)) => {
                log::info!("prediction with {} boxes", set.len());
                self.editor.replace(Some(set));
                self.image_id = image_id;
            }
            Err(e) => log::error!("Error uploading image: {e}"),
        }
    }
}
