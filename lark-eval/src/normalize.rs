//! Text canonicalization applied before metric computation.

/// Normalize text for comparison.
///
/// Lowercases, collapses whitespace runs to single spaces, and trims both
/// ends. Deterministic and idempotent; reference and hypothesis must pass
/// through this identically before any error rate is computed.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars() {
            out.extend(c.to_lowercase());
        }
    }

    out
}
