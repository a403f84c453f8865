use crate::config::KeyTransform;
use crate::model::CanonicalKey;

/// Derive the join key for a raw identifier.
///
/// Returns `None` when the identifier is missing or normalizes to nothing;
/// such an entry never takes part in matching.
pub fn normalize_key(raw: Option<&str>, transform: KeyTransform) -> Option<CanonicalKey> {
    let raw = raw?;
    let key: String = match transform {
        KeyTransform::Trim => raw.trim().to_string(),
        KeyTransform::Digits => raw.chars().filter(|c| c.is_ascii_digit()).collect(),
    };
    if key.is_empty() {
        None
    } else {
        Some(CanonicalKey::new(key))
    }
}
