//! Readiness and value matching over process output.

use anyhow::{Context, Result};
use regex::Regex;

/// A pattern in process output that signals readiness or yields a value.
///
/// The exact marker strings are an external contract with the tools whose
/// output they match; each service module owns its constants and tests them
/// against verbatim captured output.
#[derive(Debug, Clone)]
pub enum ReadinessMarker {
    /// A literal substring, e.g. `"Listening on"`.
    Substring(String),
    /// A regex whose capture groups become the step's output values.
    Pattern(Regex),
}

impl ReadinessMarker {
    /// Marker matching a literal substring.
    pub fn substring(s: impl Into<String>) -> Self {
        Self::Substring(s.into())
    }

    /// Marker matching a regex with capture groups.
    pub fn pattern(re: &str) -> Result<Self> {
        let re = Regex::new(re).with_context(|| format!("Invalid marker pattern: {re}"))?;
        Ok(Self::Pattern(re))
    }
}

/// Scan a complete text for a marker, returning its captures on a match.
///
/// For substring markers the capture list is empty. Used directly for
/// close-time extraction from a one-shot step's accumulated output.
pub fn scan_text(marker: &ReadinessMarker, text: &str) -> Option<Vec<String>> {
    match marker {
        ReadinessMarker::Substring(s) => text.contains(s.as_str()).then(Vec::new),
        ReadinessMarker::Pattern(re) => re.captures(text).map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .collect()
        }),
    }
}

/// Scans successive output chunks for a marker.
///
/// Chunks may split a marker across boundaries, so every feed appends to a
/// cumulative buffer and scans the whole buffer, never the chunk alone. Once
/// matched, the pattern is not re-evaluated: a step produces at most one
/// terminal result.
#[derive(Debug)]
pub struct OutputMatcher {
    marker: ReadinessMarker,
    buffer: String,
    matched: bool,
}

impl OutputMatcher {
    pub fn new(marker: ReadinessMarker) -> Self {
        Self {
            marker,
            buffer: String::new(),
            matched: false,
        }
    }

    /// Feed one chunk of output. Returns the captures on the first match,
    /// `None` before a match and on every feed after one.
    pub fn feed(&mut self, chunk: &str) -> Option<Vec<String>> {
        if self.matched {
            return None;
        }
        self.buffer.push_str(chunk);
        let captures = scan_text(&self.marker, &self.buffer)?;
        self.matched = true;
        Some(captures)
    }

    /// The accumulated output seen so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Consume the matcher, yielding the accumulated output.
    pub fn into_buffer(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "starting\nListening on 127.0.0.1:7545\nmined block 0\n";

    #[test]
    fn test_substring_match() {
        let marker = ReadinessMarker::substring("Listening on");
        assert_eq!(scan_text(&marker, SAMPLE), Some(vec![]));
        assert_eq!(scan_text(&marker, "still booting"), None);
    }

    #[test]
    fn test_pattern_captures() {
        let marker = ReadinessMarker::pattern(r"Network id:\s*(\d+)").unwrap();
        assert_eq!(
            scan_text(&marker, "...\nNetwork id: 5777\n..."),
            Some(vec!["5777".to_string()])
        );
        assert_eq!(scan_text(&marker, "Network id: pending"), None);
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        // Any split of the text must yield the same result as the unsplit
        // scan. SAMPLE is ASCII, so every byte offset is a valid boundary.
        let marker = ReadinessMarker::substring("Listening on");
        let unsplit = scan_text(&marker, SAMPLE);

        for split in 0..=SAMPLE.len() {
            let mut matcher = OutputMatcher::new(marker.clone());
            let first = matcher.feed(&SAMPLE[..split]);
            let second = matcher.feed(&SAMPLE[split..]);
            assert_eq!(first.or(second), unsplit, "split at {split}");
        }
    }

    #[test]
    fn test_pattern_split_across_chunks() {
        let marker = ReadinessMarker::pattern(r"contract address:\s*(0x[0-9a-fA-F]{40})").unwrap();
        let mut matcher = OutputMatcher::new(marker);
        assert_eq!(matcher.feed("contract addr"), None);
        assert_eq!(
            matcher.feed("ess: 0xABCDEF0123456789ABCDEF0123456789ABCDEF01\n"),
            Some(vec![
                "0xABCDEF0123456789ABCDEF0123456789ABCDEF01".to_string()
            ])
        );
    }

    #[test]
    fn test_matches_at_most_once() {
        let mut matcher = OutputMatcher::new(ReadinessMarker::substring("ready"));
        assert_eq!(matcher.feed("ready\n"), Some(vec![]));
        assert_eq!(matcher.feed("ready again\n"), None);
    }

    #[test]
    fn test_buffer_accumulates() {
        let mut matcher = OutputMatcher::new(ReadinessMarker::substring("never"));
        matcher.feed("one\n");
        matcher.feed("two\n");
        assert_eq!(matcher.buffer(), "one\ntwo\n");
        assert_eq!(matcher.into_buffer(), "one\ntwo\n");
    }
}
