pub mod geometry;
pub mod report;
pub mod steps;

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use ab_glyph::FontArc;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use crate::error::{ConfigurationError, RenderError};
use crate::models::DetectionInstance;
use crate::operation::OperationKind;

use geometry::{ColorCycle, MASK_COLOR};
use report::ReportKind;
use steps::{AnnotationStep, BoxLabelStep, EyeMaskStep, LandmarkStep, PixelateStep, StepContext};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Read-only rendering resources shared by every request.
#[derive(Clone)]
pub struct RenderContext {
    font: FontArc,
    colors: ColorCycle,
    mask_color: Rgb<u8>,
    jpeg_quality: u8,
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("colors", &self.colors)
            .field("mask_color", &self.mask_color)
            .field("jpeg_quality", &self.jpeg_quality)
            .finish()
    }
}

impl RenderContext {
    pub fn new(font: FontArc) -> Self {
        Self {
            font,
            colors: ColorCycle::default(),
            mask_color: MASK_COLOR,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Loads the label font. A failure here is fatal to startup.
    pub fn from_font_file(path: &Path) -> Result<Self, ConfigurationError> {
        let data = std::fs::read(path).map_err(|source| ConfigurationError::ReadFont {
            path: path.to_path_buf(),
            source,
        })?;
        let font = FontArc::try_from_vec(data).map_err(|_| ConfigurationError::ParseFont {
            path: path.to_path_buf(),
        })?;
        Ok(Self::new(font))
    }

    pub fn with_colors(mut self, colors: ColorCycle) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn colors(&self) -> &ColorCycle {
        &self.colors
    }

    pub fn mask_color(&self) -> Rgb<u8> {
        self.mask_color
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
}

/// The annotated copy of the source image plus its optional text report.
#[derive(Debug, Clone)]
pub struct RenderedResult {
    pub image: RgbImage,
    pub report: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AnnotationOutcome {
    Rendered(RenderedResult),
    /// Nothing was detected; there is no image to send.
    Empty,
}

/// Ordered annotation steps for one operation, applied per instance.
pub struct AnnotationPipeline {
    steps: Vec<Box<dyn AnnotationStep>>,
    report: Option<ReportKind>,
}

impl AnnotationPipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            report: None,
        }
    }

    pub fn add_step(mut self, step: Box<dyn AnnotationStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_report(mut self, report: ReportKind) -> Self {
        self.report = Some(report);
        self
    }

    /// `None` for operations whose result is text only.
    pub fn for_operation(operation: OperationKind) -> Option<Self> {
        let pipeline = match operation {
            OperationKind::FaceDetection => Self::new()
                .add_step(Box::new(BoxLabelStep))
                .add_step(Box::new(LandmarkStep))
                .with_report(ReportKind::FaceAttributes),
            OperationKind::EmotionRecognition => Self::new()
                .add_step(Box::new(BoxLabelStep))
                .with_report(ReportKind::Emotion),
            OperationKind::EyeCensoring => Self::new().add_step(Box::new(EyeMaskStep)),
            OperationKind::FacePixelation => Self::new().add_step(Box::new(PixelateStep)),
            OperationKind::Describe
            | OperationKind::PlainTextRecognition
            | OperationKind::HandwritingRecognition
            | OperationKind::TagImage => return None,
        };
        Some(pipeline)
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Draws on a fresh copy of `source`; the source is never modified.
    pub fn run(
        &self,
        source: &DynamicImage,
        instances: &[DetectionInstance],
        context: &RenderContext,
    ) -> RenderedResult {
        let mut canvas = source.to_rgb8();
        let step_context = StepContext::for_canvas(context, &canvas);

        for (index, instance) in instances.iter().enumerate() {
            for step in &self.steps {
                debug!(step = step.name(), index, "Applying annotation step");
                step.apply(&mut canvas, instance, index, &step_context);
            }
        }

        RenderedResult {
            image: canvas,
            report: self.report.map(|kind| kind.build(instances)),
        }
    }
}

impl Default for AnnotationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationEngine {
    context: Arc<RenderContext>,
}

impl AnnotationEngine {
    pub fn new(context: Arc<RenderContext>) -> Self {
        Self { context }
    }

    pub fn annotate(
        &self,
        image: &DynamicImage,
        instances: &[DetectionInstance],
        operation: OperationKind,
    ) -> Result<AnnotationOutcome, RenderError> {
        let pipeline = AnnotationPipeline::for_operation(operation)
            .ok_or(RenderError::Unsupported(operation))?;
        if instances.is_empty() {
            return Ok(AnnotationOutcome::Empty);
        }
        Ok(AnnotationOutcome::Rendered(pipeline.run(
            image,
            instances,
            &self.context,
        )))
    }

    /// Decodes `bytes` and annotates them. Nothing is decoded when there are
    /// no instances.
    pub fn annotate_bytes(
        &self,
        bytes: &[u8],
        instances: &[DetectionInstance],
        operation: OperationKind,
    ) -> Result<AnnotationOutcome, RenderError> {
        if instances.is_empty() && operation.renders_image() {
            return Ok(AnnotationOutcome::Empty);
        }
        let image = decode_image(bytes)?;
        self.annotate(&image, instances, operation)
    }

    pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>, RenderError> {
        encode_jpeg(image, self.context.jpeg_quality())
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, RenderError> {
    image::load_from_memory(bytes).map_err(RenderError::Decode)
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(image)
        .map_err(RenderError::Encode)?;
    Ok(buf.into_inner())
}
