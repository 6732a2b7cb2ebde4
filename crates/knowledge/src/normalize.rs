//! Lexical normalization applied to a query before entity extraction.

/// Canonical spelling of the elevator model family abbreviation.
pub const MODEL_FAMILY: &str = "PVE";

/// Rewrite every case-insensitive occurrence of `pve` as `PVE`.
///
/// All other text, including non-ASCII characters, is left untouched.
///
/// ```
/// use liftrag_knowledge::normalize::normalize;
///
/// assert_eq!(normalize("necesito info del pve 30"), "necesito info del PVE 30");
/// ```
pub fn normalize(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    let needle = MODEL_FAMILY.to_ascii_lowercase();

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (idx, _) in lower.match_indices(needle.as_str()) {
        out.push_str(&text[last..idx]);
        out.push_str(MODEL_FAMILY);
        last = idx + needle.len();
    }
    out.push_str(&text[last..]);
    out
}
