use std::future::Future;

use crate::error::RemoteError;
use crate::models::{DetectionInstance, ImageDescription, Tag, TextRegion};

/// Attributes requested from the face service for every face-based operation.
pub const FACE_ATTRIBUTES: [&str; 7] = [
    "age",
    "gender",
    "headPose",
    "smile",
    "facialHair",
    "glasses",
    "emotion",
];

pub trait EmotionRecognizer: Send + Sync + 'static {
    /// Faces with their emotion scores.
    fn recognize_emotions(
        &self,
        image_url: &str,
    ) -> impl Future<Output = Result<Vec<DetectionInstance>, RemoteError>> + Send;
}

pub trait FaceDetector: Send + Sync + 'static {
    /// Faces with landmarks and the requested attributes.
    fn detect_faces(
        &self,
        image_url: &str,
        attributes: &[&str],
    ) -> impl Future<Output = Result<Vec<DetectionInstance>, RemoteError>> + Send;
}

pub trait ImageAnalyzer: Send + Sync + 'static {
    fn describe(
        &self,
        image_url: &str,
    ) -> impl Future<Output = Result<ImageDescription, RemoteError>> + Send;

    fn recognize_text(
        &self,
        image_url: &str,
    ) -> impl Future<Output = Result<Vec<TextRegion>, RemoteError>> + Send;

    /// Recognized handwritten lines, top to bottom.
    fn recognize_handwriting(
        &self,
        image_url: &str,
    ) -> impl Future<Output = Result<Vec<String>, RemoteError>> + Send;

    fn tag(&self, image_url: &str) -> impl Future<Output = Result<Vec<Tag>, RemoteError>> + Send;
}

/// All three vision capabilities.
pub trait Vision: EmotionRecognizer + FaceDetector + ImageAnalyzer {}

impl<T> Vision for T where T: EmotionRecognizer + FaceDetector + ImageAnalyzer {}
