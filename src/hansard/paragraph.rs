//! Paragraph classification and text cleaning for speech segmentation.

use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::Node;

use super::markup;

/// Leading speaker label, optionally time-stamped: `Mr SMITH (10:02):`
static SPEAKER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r".*?(?:\(\d{2}:\d{2}\))?:").expect("Invalid speaker prefix regex")
});

/// Interjection sub-kinds as marked up in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterjectionKind {
    /// `a[type=MemberInterjecting]`
    Member,
    /// `span.HPS-OfficeInterjecting`
    Office,
    /// `span.HPS-GeneralIInterjecting`, no attributable talker
    General,
}

impl InterjectionKind {
    /// Whether the interjection is tied to an `interjection/talker` block
    pub fn is_attributable(&self) -> bool {
        !matches!(self, Self::General)
    }
}

/// How a single paragraph takes part in its speech
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphClass {
    Continuation,
    Interjection(InterjectionKind),
    Ordinary,
}

/// Classify a `p` element. A continuation marker wins over interjection markers.
pub fn classify(p: Node) -> ParagraphClass {
    if markup::find_with_attr(p, "a", "type", "MemberContinuation").is_some() {
        return ParagraphClass::Continuation;
    }
    match interjection_kind(p) {
        Some(kind) => ParagraphClass::Interjection(kind),
        None => ParagraphClass::Ordinary,
    }
}

fn interjection_kind(p: Node) -> Option<InterjectionKind> {
    if markup::find_with_attr(p, "a", "type", "MemberInterjecting").is_some() {
        Some(InterjectionKind::Member)
    } else if markup::find_with_class(p, "span", "HPS-OfficeInterjecting").is_some() {
        Some(InterjectionKind::Office)
    } else if markup::find_with_class(p, "span", "HPS-GeneralIInterjecting").is_some() {
        Some(InterjectionKind::General)
    } else {
        None
    }
}

/// Text of a paragraph as used when merging into an open part
pub fn raw_text(p: Node) -> String {
    markup::stripped_text(p)
}

/// Text of a paragraph that opens a new part, with the speaker label removed
pub fn cleaned_text(p: Node) -> String {
    clean(&raw_text(p))
}

/// Remove the first speaker label from `text` and trim
pub fn clean(text: &str) -> String {
    SPEAKER_PREFIX.replacen(text, 1, "").trim().to_string()
}
