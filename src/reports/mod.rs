//! Readers for reports written by the build's test and static-analysis plugins.

pub mod spotbugs;
pub mod surefire;

pub use spotbugs::{parse_bug_report_file, BugFinding, BugSummary};
pub use surefire::{summarize_failures, FailureSummary, TestProblem};

/// Keep at most `max_chars` characters (not bytes).
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("äöü", 2), "äö");
        assert_eq!(truncate_chars("", 5), "");
    }
}
