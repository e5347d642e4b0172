use crate::operation::OperationKind;

pub const MESSAGE_ACTION_IMAGE: &str = "Choose action for this image:";
pub const MESSAGE_UNPROCESSABLE: &str = "Unprocessable message.";
pub const MESSAGE_FAILED_TO_GET_FILE: &str = "Failed to get file from the server.";
pub const MESSAGE_CANCELED: &str = "Canceled.";
pub const CANCEL_LABEL: &str = "Cancel";

/// Word the prompt text must contain for a selection to be acted upon.
pub const IMAGE_CONTEXT_MARKER: &str = "image";

pub fn help(operations: &[OperationKind]) -> String {
    let list = operations
        .iter()
        .map(|op| format!("- {}", op.label()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Send any image to this bot, and select one of the following actions:\n\n{}\n\n\
         then it will send the result message or image back to you.\n",
        list
    )
}

pub fn processing(operation: OperationKind) -> String {
    format!("Processing '{}' on received image...", operation)
}

pub fn result_caption(operation: OperationKind) -> String {
    format!("Process result of '{}'", operation)
}

/// Notice sent when an analysis succeeded but found nothing.
pub fn empty_result(operation: OperationKind) -> &'static str {
    match operation {
        OperationKind::EmotionRecognition => "No emotion recognized on this image.",
        OperationKind::FaceDetection
        | OperationKind::EyeCensoring
        | OperationKind::FacePixelation => "No face detected on this image.",
        OperationKind::Describe => "Could not describe given image.",
        OperationKind::PlainTextRecognition | OperationKind::HandwritingRecognition => {
            "Could not recognize any text from given image."
        }
        OperationKind::TagImage => "Could not tag given image.",
    }
}

/// Message for a failed vision service call, carrying the remote cause.
pub fn remote_failure(operation: OperationKind, cause: &str) -> String {
    let what = match operation {
        OperationKind::EmotionRecognition => "recognize emotion",
        OperationKind::FaceDetection
        | OperationKind::EyeCensoring
        | OperationKind::FacePixelation => "detect faces",
        OperationKind::Describe => "describe image",
        OperationKind::PlainTextRecognition => "recognize text",
        OperationKind::HandwritingRecognition => "recognize handwritten text",
        OperationKind::TagImage => "tag image",
    };
    format!("Failed to {}: {}", what, cause)
}
