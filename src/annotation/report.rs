use crate::annotation::geometry::face_label;
use crate::models::{DetectionInstance, Scores};

/// Which text accompanies an annotated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Facial hair, head pose and emotion sections per face
    FaceAttributes,
    /// Emotion scores only, without section headers
    Emotion,
}

impl ReportKind {
    pub fn build(self, instances: &[DetectionInstance]) -> String {
        instances
            .iter()
            .enumerate()
            .map(|(i, instance)| match self {
                ReportKind::FaceAttributes => face_section(i, instance),
                ReportKind::Emotion => emotion_section(i, instance),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn face_section(index: usize, instance: &DetectionInstance) -> String {
    let attributes = &instance.attributes;
    let mut lines = vec![format!("[{}]", face_label(index))];

    let groups = [
        ("Facial Hair", attributes.facial_hair.as_ref(), Unit::Percent),
        ("Head Pose", attributes.head_pose.as_ref(), Unit::Degrees),
        ("Emotion", attributes.emotion.as_ref(), Unit::Percent),
    ];
    for (title, scores, unit) in groups {
        let Some(scores) = scores.filter(|s| !s.is_empty()) else {
            continue;
        };
        lines.push(format!("> {}", title));
        lines.extend(score_lines(scores, unit));
    }

    lines.join("\n")
}

fn emotion_section(index: usize, instance: &DetectionInstance) -> String {
    let mut lines = vec![format!("[{}]", face_label(index))];
    if let Some(scores) = &instance.attributes.emotion {
        lines.extend(score_lines(scores, Unit::Percent));
    }
    lines.join("\n")
}

#[derive(Clone, Copy)]
enum Unit {
    Percent,
    Degrees,
}

fn score_lines(scores: &Scores, unit: Unit) -> impl Iterator<Item = String> + '_ {
    scores.iter().map(move |(name, value)| match unit {
        Unit::Percent => format!("  {}: {:.3}%", name, value * 100.0),
        Unit::Degrees => format!("  {}: {:.2}°", name, value),
    })
}
