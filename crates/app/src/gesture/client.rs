//! HTTP client for the external inference endpoint.
//!
//! The pipeline only sees the [`InferenceService`] trait; the reqwest-backed
//! [`HttpInference`] posts each frame as a multipart upload to `/predict`.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

use crate::gesture::data::RawPrediction;

const UPLOAD_FIELD: &str = "file";
const UPLOAD_FILENAME: &str = "webcam_frame.png";

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Wire shape of a `/predict` response. `confidence` may arrive as a JSON
/// number or a formatted string; a present `error` field marks an advisory
/// payload failure with no gesture attached.
#[derive(Clone, Debug, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predicted_gesture: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Number(f64),
    Text(String),
}

impl Confidence {
    /// Coerce to numeric; unparseable text counts as zero confidence.
    pub fn as_f64(&self) -> f64 {
        match self {
            Confidence::Number(value) => *value,
            Confidence::Text(text) => text.trim().parse().unwrap_or(0.0),
        }
    }
}

impl PredictResponse {
    /// Extract the gesture/confidence pair when a gesture is present. A
    /// missing confidence coerces to zero and falls to the gate downstream.
    pub fn prediction(&self) -> Option<RawPrediction> {
        let label = self.predicted_gesture.clone()?;
        let confidence = self
            .confidence
            .as_ref()
            .map(Confidence::as_f64)
            .unwrap_or(0.0);
        Some(RawPrediction { label, confidence })
    }
}

/// Boundary to the external classifier.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Submit one PNG-encoded frame and await the service verdict.
    async fn classify(&self, png: Vec<u8>) -> Result<PredictResponse, InferenceError>;
}

/// reqwest-backed client for `POST /predict` multipart uploads.
pub struct HttpInference {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpInference {
    pub fn new(endpoint: &str) -> Result<Self, InferenceError> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl InferenceService for HttpInference {
    async fn classify(&self, png: Vec<u8>) -> Result<PredictResponse, InferenceError> {
        let part = Part::bytes(png)
            .file_name(UPLOAD_FILENAME)
            .mime_str("image/png")?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let started = Instant::now();
        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        metrics::histogram!("gesture_inference_seconds").record(started.elapsed().as_secs_f64());

        if !response.status().is_success() {
            return Err(InferenceError::Status(response.status()));
        }
        Ok(response.json::<PredictResponse>().await?)
    }
}
