use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::dispatch::CANCEL_TOKEN;
use crate::error::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    EmotionRecognition,
    FaceDetection,
    Describe,
    PlainTextRecognition,
    HandwritingRecognition,
    TagImage,
    EyeCensoring,
    FacePixelation,
}

impl OperationKind {
    /// Catalogue order, which is also the order of the prompt controls.
    pub const ALL: [OperationKind; 8] = [
        OperationKind::EmotionRecognition,
        OperationKind::FaceDetection,
        OperationKind::Describe,
        OperationKind::PlainTextRecognition,
        OperationKind::HandwritingRecognition,
        OperationKind::TagImage,
        OperationKind::EyeCensoring,
        OperationKind::FacePixelation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OperationKind::EmotionRecognition => "Emotion Recognition",
            OperationKind::FaceDetection => "Face Detection",
            OperationKind::Describe => "Describe This Image",
            OperationKind::PlainTextRecognition => "OCR",
            OperationKind::HandwritingRecognition => "Handwritten Text Recognition",
            OperationKind::TagImage => "Tag This Image",
            OperationKind::EyeCensoring => "Censor Eyes",
            OperationKind::FacePixelation => "Mask Faces",
        }
    }

    /// Stable kebab-case name, used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::EmotionRecognition => "emotion-recognition",
            OperationKind::FaceDetection => "face-detection",
            OperationKind::Describe => "describe",
            OperationKind::PlainTextRecognition => "ocr",
            OperationKind::HandwritingRecognition => "handwriting",
            OperationKind::TagImage => "tag",
            OperationKind::EyeCensoring => "censor-eyes",
            OperationKind::FacePixelation => "mask-faces",
        }
    }

    /// First character of the label.
    pub fn default_code(self) -> char {
        self.label().chars().next().unwrap_or('?')
    }

    /// Whether the result is an annotated copy of the submitted image.
    pub fn renders_image(self) -> bool {
        matches!(
            self,
            OperationKind::EmotionRecognition
                | OperationKind::FaceDetection
                | OperationKind::EyeCensoring
                | OperationKind::FacePixelation
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OperationKind::ALL
            .into_iter()
            .find(|op| op.name() == wanted || op.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown operation: {}", wanted))
    }
}

/// Bijection between operations and their single-character codes.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct OperationTable {
    order: Vec<OperationKind>,
    codes: HashMap<OperationKind, char>,
    operations: HashMap<char, OperationKind>,
}

impl OperationTable {
    /// Table over the full catalogue, codes derived from the labels.
    pub fn standard() -> Result<Self, ConfigurationError> {
        Self::from_operations(&OperationKind::ALL)
    }

    pub fn from_operations(operations: &[OperationKind]) -> Result<Self, ConfigurationError> {
        Self::from_codes(operations.iter().map(|op| (*op, op.default_code())))
    }

    pub fn from_codes(
        entries: impl IntoIterator<Item = (OperationKind, char)>,
    ) -> Result<Self, ConfigurationError> {
        let reserved = CANCEL_TOKEN.chars().next();
        let mut table = Self {
            order: Vec::new(),
            codes: HashMap::new(),
            operations: HashMap::new(),
        };

        for (operation, code) in entries {
            if Some(code) == reserved {
                return Err(ConfigurationError::ReservedCode { code, operation });
            }
            if table.codes.contains_key(&operation) {
                return Err(ConfigurationError::DuplicateOperation(operation));
            }
            if let Some(first) = table.operations.get(&code) {
                return Err(ConfigurationError::CodeCollision {
                    code,
                    first: *first,
                    second: operation,
                });
            }
            table.order.push(operation);
            table.codes.insert(operation, code);
            table.operations.insert(code, operation);
        }

        Ok(table)
    }

    pub fn code(&self, operation: OperationKind) -> Option<char> {
        self.codes.get(&operation).copied()
    }

    pub fn operation(&self, code: char) -> Option<OperationKind> {
        self.operations.get(&code).copied()
    }

    pub fn is_code(&self, c: char) -> bool {
        self.operations.contains_key(&c)
    }

    /// Registered operations in registration order.
    pub fn operations(&self) -> &[OperationKind] {
        &self.order
    }
}
