//! Comparable response oracle used by the expression-based test
//!
//! The similarity signal is deliberately coarse:
//!   0.0          status codes differ, or exactly one body is empty
//!   1.0          status codes match and the stripped bodies are identical
//!   (0.01, 0.99) otherwise, the stripped-body length ratio (min/max),
//!                clamped so a non-identical pair never reads as fully
//!                identical or as completely different

use crate::http::HttpResponse;
use crate::sqli::strip::strip_off;

pub struct ComparableResponse {
    status: u16,
    body: String,
    value_sent: String,
}

impl ComparableResponse {
    pub fn new(response: &HttpResponse, value_sent: &str) -> Self {
        Self::from_parts(response.status, response.body_text(), value_sent)
    }

    pub fn from_parts(status: u16, body: String, value_sent: &str) -> Self {
        Self {
            status,
            body,
            value_sent: value_sent.to_string(),
        }
    }

    fn stripped(&self) -> String {
        strip_off(&self.body, &self.value_sent)
    }

    /// Similarity against another response; see the module docs for the
    /// value ranges.
    pub fn compare_with(&self, other: &ComparableResponse) -> f32 {
        if self.status != other.status {
            return 0.0;
        }

        let mine = self.stripped();
        let theirs = other.stripped();
        if mine == theirs {
            return 1.0;
        }
        if mine.is_empty() || theirs.is_empty() {
            return 0.0;
        }

        let (shorter, longer) = if mine.len() <= theirs.len() {
            (mine.len(), theirs.len())
        } else {
            (theirs.len(), mine.len())
        };
        (shorter as f32 / longer as f32).clamp(0.01, 0.99)
    }

    /// Whether the probe's payload is echoed back the same number of times
    /// in both responses. 1.0 means no differential reflection; anything
    /// lower suggests the page is merely mirroring input, which would fake
    /// a positive differential signal.
    pub fn input_reflection(probe: &ComparableResponse, baseline: &ComparableResponse) -> f32 {
        let in_probe = count_occurrences(&probe.body, &probe.value_sent);
        let in_baseline = count_occurrences(&baseline.body, &probe.value_sent);
        let delta = in_probe.abs_diff(in_baseline);
        1.0 / (1.0 + delta as f32)
    }
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}
