use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use vision_bot::models::{FaceAttributes, Landmarks, Scores};
use vision_bot::{
    AnnotationEngine, DetectionInstance, DispatchProtocol, FaceRectangle, Point, RenderContext,
};

pub const FONT_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fonts/DejaVuSansCondensed.ttf");

pub const BACKGROUND: Rgb<u8> = Rgb([128, 128, 128]);

/// A file reference shaped like the ones the messaging platform hands out.
pub const FILE_REFERENCE: &str = "AgACAgIAAxkBAAIBZ2Vx";

pub fn render_context() -> RenderContext {
    RenderContext::from_font_file(Path::new(FONT_PATH)).expect("Failed to load test font")
}

pub fn engine() -> AnnotationEngine {
    AnnotationEngine::new(Arc::new(render_context()))
}

pub fn protocol() -> DispatchProtocol {
    DispatchProtocol::standard().expect("Standard operation table must be valid")
}

/// Plain gray canvas.
pub fn gray_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_pixel(width, height, BACKGROUND)
}

/// Canvas whose pixels all differ from their neighbours.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
    })
}

pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode test image");
    buf.into_inner()
}

pub fn landmarks(points: &[(&str, f64, f64)]) -> Landmarks {
    points
        .iter()
        .map(|(name, x, y)| (name.to_string(), Point::new(*x, *y)))
        .collect()
}

pub fn scores(pairs: &[(&str, f64)]) -> Scores {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Every landmark the markers and the eye mask need, laid out inside `rect`.
pub fn full_landmarks(rect: &FaceRectangle) -> Landmarks {
    let (l, t) = (rect.left as f64, rect.top as f64);
    let (w, h) = (rect.width as f64, rect.height as f64);
    landmarks(&[
        ("pupilLeft", l + w * 0.3, t + h * 0.35),
        ("pupilRight", l + w * 0.7, t + h * 0.35),
        ("noseTip", l + w * 0.5, t + h * 0.55),
        ("mouthLeft", l + w * 0.3, t + h * 0.75),
        ("mouthRight", l + w * 0.7, t + h * 0.75),
        ("eyeLeftOuter", l + w * 0.2, t + h * 0.35),
        ("eyeLeftTop", l + w * 0.3, t + h * 0.31),
        ("eyeLeftBottom", l + w * 0.3, t + h * 0.39),
        ("eyeRightOuter", l + w * 0.8, t + h * 0.35),
        ("eyeRightTop", l + w * 0.7, t + h * 0.31),
        ("eyeRightBottom", l + w * 0.7, t + h * 0.39),
    ])
}

pub fn face_attributes() -> FaceAttributes {
    FaceAttributes {
        facial_hair: Some(scores(&[("moustache", 0.1), ("beard", 0.2), ("sideburns", 0.0)])),
        head_pose: Some(scores(&[("roll", -1.5), ("yaw", 12.25), ("pitch", 0.0)])),
        emotion: Some(scores(&[("happiness", 0.9), ("neutral", 0.1)])),
    }
}

pub fn face(left: i32, top: i32, width: u32, height: u32) -> DetectionInstance {
    let rect = FaceRectangle::new(left, top, width, height);
    DetectionInstance::new(rect)
        .with_landmarks(full_landmarks(&rect))
        .with_attributes(face_attributes())
}

/// Two fully described faces for a 400x300 canvas.
pub fn two_faces() -> Vec<DetectionInstance> {
    vec![face(40, 60, 100, 120), face(240, 50, 110, 130)]
}

pub fn without_landmark(mut instance: DetectionInstance, name: &str) -> DetectionInstance {
    if let Some(landmarks) = instance.landmarks.as_mut() {
        landmarks.shift_remove(name);
    }
    instance
}
