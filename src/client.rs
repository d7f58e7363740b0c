//! Talks to the object-detection service.
//!
//! One multipart POST per upload; the response body is decoded into a
//! [`Prediction`].

use reqwest::blocking::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::annotation::{LengthMismatch, Prediction};
use crate::config::Config;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service answered with status {0}")]
    Status(u16),
    #[error("malformed prediction: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("malformed prediction: {0}")]
    Mismatch(#[from] LengthMismatch),
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
}

/// The image file as it goes over the wire.
#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn from_path(path: &Path) -> Result<Self, PredictError> {
        let bytes = std::fs::read(path).map_err(|e| PredictError::Read(path.to_path_buf(), e))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }
}

/// Anything that can turn an image into boxes and labels.
pub trait Predictor: Send + Sync {
    fn predict(&self, upload: &ImageUpload) -> Result<Prediction, PredictError>;
}

pub struct HttpPredictor {
    client: reqwest::blocking::Client,
    url: String,
    field_name: String,
}

impl HttpPredictor {
    pub fn new(config: &Config) -> Result<Self, PredictError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.predict_url.clone(),
            field_name: config.field_name.clone(),
        })
    }
}

impl Predictor for HttpPredictor {
    fn predict(&self, upload: &ImageUpload) -> Result<Prediction, PredictError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)?;
        let form = Form::new().part(self.field_name.clone(), part);

        let response = self.client.post(&self.url).multipart(form).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(PredictError::Status(status.as_u16()));
        }
        decode_prediction(&response.bytes()?)
    }
}

/// Shape check only; pairing of boxes and labels is enforced by
/// [`Prediction::into_annotations`].
pub fn decode_prediction(body: &[u8]) -> Result<Prediction, PredictError> {
    Ok(serde_json::from_slice(body)?)
}
