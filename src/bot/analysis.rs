//! Text rendering of the image-level analyses. Each formatter returns `None`
//! when the result holds nothing worth sending.

use crate::models::{ImageDescription, Tag, TextRegion};

pub fn describe(description: &ImageDescription) -> Option<String> {
    if description.captions.is_empty() && description.tags.is_empty() {
        return None;
    }
    let captions = description
        .captions
        .iter()
        .map(|c| format!("{} ({:.3}%)", c.text, c.confidence * 100.0))
        .collect::<Vec<_>>()
        .join("\n");
    non_blank(format!("{}\n\n({})", captions, description.tags.join(", ")))
}

pub fn plain_text(regions: &[TextRegion]) -> Option<String> {
    let words: Vec<&str> = regions
        .iter()
        .flat_map(|r| &r.lines)
        .flat_map(|l| &l.words)
        .map(String::as_str)
        .collect();
    non_blank(format!("{}\n", words.join(" ")))
}

pub fn handwriting(lines: &[String]) -> Option<String> {
    non_blank(lines.join(" "))
}

pub fn tags(tags: &[Tag]) -> Option<String> {
    non_blank(
        tags.iter()
            .map(|t| format!("{} ({:.3}%)", t.name, t.confidence * 100.0))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}
