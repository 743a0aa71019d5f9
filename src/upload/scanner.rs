//! Content Scanner
//!
//! Heuristic scan of a PDF buffer for literal active-content markers. The buffer is
//! matched byte-wise (each byte read as one Latin-1 character), not parsed as a PDF object
//! tree. Payloads hidden in compressed streams are not seen, and binary data that happens
//! to contain a marker is rejected. Only the listed patterns are promised.

use regex::bytes::RegexSet;
use std::sync::LazyLock;

/// (signature name, case-insensitive byte pattern)
const SIGNATURES: &[(&str, &str)] = &[
    ("<script", r"(?i-u)<script[\s\S]*?>"),
    ("javascript:", r"(?i-u)javascript:"),
    ("/JS", r"(?i-u)/JS"),
    ("/JavaScript", r"(?i-u)/JavaScript"),
    ("/AA", r"(?i-u)/AA"),
    ("/OpenAction", r"(?i-u)/OpenAction"),
    ("/Launch", r"(?i-u)/Launch"),
    ("/RichMedia", r"(?i-u)/RichMedia"),
    ("<iframe", r"(?i-u)<iframe"),
    // \xA0 is the Latin-1 no-break space.
    ("eval(", r"(?i-u)eval[\s\xA0]*\("),
    ("<img onerror=", r"(?i-u)<img[\s\S]*onerror="),
];

static SIGNATURE_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(SIGNATURES.iter().map(|(_, pattern)| *pattern))
        .expect("content scanner signatures are valid patterns")
});

/// Names of every signature the scanner looks for, in match-priority order.
pub fn signature_names() -> impl Iterator<Item = &'static str> {
    SIGNATURES.iter().map(|(name, _)| *name)
}

/// Returns the first signature (in list order) found in the buffer, or `None` if clean.
pub fn scan(data: &[u8]) -> Option<&'static str> {
    SIGNATURE_SET
        .matches(data)
        .into_iter()
        .next()
        .map(|idx| SIGNATURES[idx].0)
}

/// Convenience wrapper: true when no signature matches.
pub fn is_clean(data: &[u8]) -> bool {
    !SIGNATURE_SET.is_match(data)
}
