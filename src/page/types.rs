use chrono::{DateTime, Utc};

/// Deduplication key for a question (blake3 hex of the normalized text).
pub type Signature = String;

/// A question read off the page. Superseded, never mutated.
#[derive(Debug, Clone)]
pub struct Question {
    pub text: String,
    pub signature: Signature,
    pub detected_at: DateTime<Utc>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let signature = signature_for(&text);
        Self {
            text,
            signature,
            detected_at: Utc::now(),
        }
    }
}

/// Lowercase, compact whitespace and drop trailing punctuation, then hash.
/// Cosmetic re-renders of the same question map to the same signature.
pub fn signature_for(text: &str) -> Signature {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let normalized = normalized.trim_end_matches(|c: char| matches!(c, '?' | '!' | '.' | ':'));
    blake3::hash(normalized.as_bytes()).to_hex().to_string()
}

/// Opaque reference to one rendered option: the probe selector that produced
/// the option list plus the option's position in it. Only the `Selector`
/// collaborator dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionHandle {
    pub selector: &'static str,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOption {
    pub text: String,
    pub handle: OptionHandle,
}

/// Result of probing one snapshot.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub question: Option<Question>,
    /// On-screen order. Empty when fewer than two options were found.
    pub answers: Vec<AnswerOption>,
}
