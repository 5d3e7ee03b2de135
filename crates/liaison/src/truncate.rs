use crate::config::RetryConfig;

/// Tool-output budget in chars for a first attempt.
pub const FIRST_ATTEMPT_BUDGET: usize = 4000;

/// Budget for a given recovery attempt.
///
/// Attempt 0 is the normal path; every retry after an overflow drops to the
/// aggressive threshold so the model sees less data and is pushed toward a
/// narrower query.
pub fn budget_for_attempt(attempt: u32, config: &RetryConfig) -> usize {
    if attempt == 0 {
        FIRST_ATTEMPT_BUDGET
    } else {
        config.aggressive_truncation_threshold
    }
}

/// Truncate `content` to at most roughly `max_length` chars, keeping the head
/// and tail and replacing the middle with an elision marker.
///
/// The head gets 3/4 of the budget and the tail 1/8; command output tends to
/// front-load the useful part, while the tail often carries totals or error
/// summaries. Content at or under the budget (or a zero budget) passes
/// through unchanged. Counts are chars, not bytes, so multi-byte text never
/// splits mid-character.
pub fn truncate(content: &str, max_length: usize) -> String {
    let total = content.chars().count();
    if max_length == 0 || total <= max_length {
        return content.to_string();
    }

    let head = max_length * 3 / 4;
    let tail = max_length / 8;
    let removed = total - head - tail;

    let prefix: String = content.chars().take(head).collect();
    let suffix: String = content
        .chars()
        .skip(total - tail)
        .collect();

    format!("{prefix}\n\n<{removed} chars elided>\n\n{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_unchanged() {
        assert_eq!(truncate("hello", 100), "hello");
        assert_eq!(truncate("", 100), "");
    }

    #[test]
    fn content_exactly_at_budget_unchanged() {
        let content = "x".repeat(2000);
        assert_eq!(truncate(&content, 2000), content);
    }

    #[test]
    fn zero_budget_disables_truncation() {
        let content = "y".repeat(10_000);
        assert_eq!(truncate(&content, 0), content);
    }

    #[test]
    fn truncates_keeping_head_and_tail() {
        let content = "A".repeat(5000);
        let out = truncate(&content, 2000);

        assert!(out.starts_with(&"A".repeat(1500)));
        assert!(out.ends_with(&"A".repeat(250)));
        assert!(out.contains("<3250 chars elided>"));
        // head + tail + marker, well under the original
        assert!(out.chars().count() < 2100);
    }

    #[test]
    fn marker_reports_exact_removed_count() {
        let content = "z".repeat(4001);
        let out = truncate(&content, 4000);
        // head 3000, tail 500, removed 501
        assert!(out.contains("<501 chars elided>"));
    }

    #[test]
    fn multibyte_content_splits_on_char_boundaries() {
        let content = "é".repeat(3000);
        let out = truncate(&content, 2000);
        assert!(out.starts_with(&"é".repeat(1500)));
        assert!(out.ends_with(&"é".repeat(250)));
        assert!(out.contains("<1250 chars elided>"));
    }

    #[test]
    fn budget_first_attempt_is_default() {
        let config = RetryConfig::default();
        assert_eq!(budget_for_attempt(0, &config), 4000);
    }

    #[test]
    fn budget_retries_use_aggressive_threshold() {
        let config = RetryConfig::default();
        assert_eq!(budget_for_attempt(1, &config), 2000);
        assert_eq!(budget_for_attempt(2, &config), 2000);

        let config = RetryConfig {
            aggressive_truncation_threshold: 500,
            ..RetryConfig::default()
        };
        assert_eq!(budget_for_attempt(1, &config), 500);
    }
}
