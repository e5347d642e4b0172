use indexmap::IndexMap;
use serde::Deserialize;

/// Named landmark points of one face, in the order the service returned them.
pub type Landmarks = IndexMap<String, Point>;

/// Named attribute scores (probabilities or angles), in received order.
pub type Scores = IndexMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Face bounding box in source pixels, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FaceRectangle {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl FaceRectangle {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Bottom edge; `top + height` may exceed `i32`.
    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAttributes {
    #[serde(default)]
    pub facial_hair: Option<Scores>,
    #[serde(default)]
    pub head_pose: Option<Scores>,
    #[serde(default)]
    pub emotion: Option<Scores>,
}

/// One detected face as returned by the emotion or face service.
///
/// Landmarks and attributes are partial by nature: any name may be missing
/// for any instance, and consumers must check before use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawDetection")]
pub struct DetectionInstance {
    pub rectangle: FaceRectangle,
    pub landmarks: Option<Landmarks>,
    pub attributes: FaceAttributes,
}

impl DetectionInstance {
    pub fn new(rectangle: FaceRectangle) -> Self {
        Self {
            rectangle,
            landmarks: None,
            attributes: FaceAttributes::default(),
        }
    }

    pub fn with_landmarks(mut self, landmarks: Landmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn with_attributes(mut self, attributes: FaceAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Shorthand for emotion results, which carry nothing but scores.
    pub fn with_emotion(mut self, scores: Scores) -> Self {
        self.attributes.emotion = Some(scores);
        self
    }

    pub fn landmark(&self, name: &str) -> Option<Point> {
        self.landmarks.as_ref().and_then(|l| l.get(name)).copied()
    }
}

/// Wire shape shared by both services: face detection nests its scores under
/// `faceAttributes`, emotion recognition returns a flat `scores` mapping.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDetection {
    face_rectangle: FaceRectangle,
    #[serde(default)]
    face_landmarks: Option<Landmarks>,
    #[serde(default)]
    face_attributes: Option<FaceAttributes>,
    #[serde(default)]
    scores: Option<Scores>,
}

impl From<RawDetection> for DetectionInstance {
    fn from(raw: RawDetection) -> Self {
        let mut attributes = raw.face_attributes.unwrap_or_default();
        if attributes.emotion.is_none() {
            attributes.emotion = raw.scores;
        }
        Self {
            rectangle: raw.face_rectangle,
            landmarks: raw.face_landmarks,
            attributes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageDescription {
    pub captions: Vec<Caption>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRegion {
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub confidence: f64,
}
