use image::Rgb;

use crate::error::ConfigurationError;
use crate::models::{FaceRectangle, Landmarks, Point};

pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
pub const CYAN: Rgb<u8> = Rgb([0, 255, 255]);
pub const PURPLE: Rgb<u8> = Rgb([255, 0, 255]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);

pub const MASK_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Landmark markers are drawn only when every one of these is present.
pub const MARKER_LANDMARKS: [&str; 5] = [
    "noseTip",
    "pupilRight",
    "pupilLeft",
    "mouthRight",
    "mouthLeft",
];

/// Eye occlusion needs all six of these.
pub const EYE_LANDMARKS: [&str; 6] = [
    "eyeLeftTop",
    "eyeLeftBottom",
    "eyeLeftOuter",
    "eyeRightTop",
    "eyeRightBottom",
    "eyeRightOuter",
];

/// Fixed-length color sequence indexed modulo its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorCycle {
    colors: Vec<Rgb<u8>>,
}

impl ColorCycle {
    pub fn new(colors: Vec<Rgb<u8>>) -> Result<Self, ConfigurationError> {
        if colors.is_empty() {
            return Err(ConfigurationError::EmptyColorCycle);
        }
        Ok(Self { colors })
    }

    pub fn color_for_index(&self, index: usize) -> Rgb<u8> {
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self {
            colors: vec![YELLOW, CYAN, PURPLE, GREEN, BLUE, RED],
        }
    }
}

/// Looks up every key at once; `None` as soon as one is missing.
pub fn landmark_points<const N: usize>(
    keys: &[&str; N],
    landmarks: Option<&Landmarks>,
) -> Option<[Point; N]> {
    let points = landmarks?;
    let mut found = [Point::new(0.0, 0.0); N];
    for (slot, key) in found.iter_mut().zip(keys.iter()) {
        *slot = *points.get(*key)?;
    }
    Some(found)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePoints {
    pub left_top: Point,
    pub left_bottom: Point,
    pub left_outer: Point,
    pub right_top: Point,
    pub right_bottom: Point,
    pub right_outer: Point,
}

impl EyePoints {
    pub fn from_landmarks(landmarks: Option<&Landmarks>) -> Option<Self> {
        let [lt, lb, lo, rt, rb, ro] = landmark_points(&EYE_LANDMARKS, landmarks)?;
        Some(Self {
            left_top: lt,
            left_bottom: lb,
            left_outer: lo,
            right_top: rt,
            right_bottom: rb,
            right_outer: ro,
        })
    }
}

/// Quadrilateral covering both eyes plus a margin.
///
/// Returned as left-upper, left-lower, right-lower, right-upper. The offsets
/// come from whichever eye is taller; on a tie the right eye is used.
pub fn eye_mask(eyes: &EyePoints) -> [Point; 4] {
    let left_height = eyes.left_top.distance(&eyes.left_bottom);
    let right_height = eyes.right_top.distance(&eyes.right_bottom);
    let eyes_width = eyes.left_outer.distance(&eyes.right_outer);

    let margin_x = eyes_width * 0.2;
    let margin_y = left_height.max(right_height) * 0.3;

    let (top, bottom, outer) = if left_height > right_height {
        (eyes.left_top, eyes.left_bottom, eyes.left_outer)
    } else {
        (eyes.right_top, eyes.right_bottom, eyes.right_outer)
    };
    let dx = (top.x - outer.x).abs().max((bottom.x - outer.x).abs()) + margin_x;
    let dy = (top.y - outer.y).abs().max((bottom.y - outer.y).abs()) + margin_y;

    [
        eyes.left_top.offset(-dx, -dy),
        eyes.left_bottom.offset(-dx, dy),
        eyes.right_bottom.offset(dx, dy),
        eyes.right_top.offset(dx, -dy),
    ]
}

pub fn pixelate_block_size(width: u32) -> u32 {
    (width / 8).max(1)
}

pub fn label_font_size(image_height: u32) -> f32 {
    image_height as f32 / 24.0
}

/// Roughly one pixel of stroke per hundred pixels of height, kept in 2..=7.
pub fn stroke_width(image_height: u32) -> u32 {
    (image_height / 100).clamp(2, 7)
}

/// Baseline origin of the face label: the rectangle's bottom-left corner,
/// one font size further down.
pub fn label_baseline(rect: &FaceRectangle, font_size: f32) -> Point {
    Point::new(rect.left as f64, rect.bottom() as f64 + font_size as f64)
}

pub fn face_label(index: usize) -> String {
    format!("Face #{}", index + 1)
}
