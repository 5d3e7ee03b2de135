use crate::error::Error;

/// Actionable classification of backend transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The conversation context or requested output exceeds the backend's
    /// window. The only kind auto-retried by the session.
    ContextTooLarge,
    /// Rate limited (HTTP 429). Surfaced to the caller, not retried here.
    RateLimit,
    /// Authentication failure (HTTP 401/403).
    AuthError,
    /// Unrecognized error — no actionable recovery.
    Unknown,
}

/// Classify an HTTP status code + error body into an [`ErrorKind`].
///
/// Status 400 defaults to `ContextTooLarge` even when no overflow keyword
/// matches: oversized context is by far the dominant observed 400 cause in
/// this system, and a spurious recovery turn is cheaper than a dead session.
pub fn classify_http_error(status: u16, body: &str) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::AuthError,
        429 => ErrorKind::RateLimit,
        400 => {
            if !is_context_overflow(body) {
                tracing::debug!(
                    body = %preview(body, 120),
                    "400 without overflow keyword, defaulting to ContextTooLarge"
                );
            }
            ErrorKind::ContextTooLarge
        }
        _ => ErrorKind::Unknown,
    }
}

/// Classify a crate [`Error`] into an [`ErrorKind`].
///
/// Network-level failures carry no status code and classify as `Unknown`.
pub fn classify(error: &Error) -> ErrorKind {
    match error {
        Error::Api { status, message } => classify_http_error(*status, message),
        Error::Http(_) => ErrorKind::Unknown,
        _ => ErrorKind::Unknown,
    }
}

/// Check if an error body indicates context overflow.
///
/// Case-insensitive substring matching (no regex dependency).
fn is_context_overflow(body: &str) -> bool {
    const PATTERNS: &[&str] = &[
        "context length",
        "token limit",
        "too large",
        "input too long",
        "context window",
        "exceeds maximum",
    ];

    let lower = body.to_lowercase();
    PATTERNS.iter().any(|p| lower.contains(p))
}

/// Bounded preview of an error body for terminal surfacing and logs.
pub fn preview(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let cut: String = body.chars().take(max_chars).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_400_context_length() {
        assert_eq!(
            classify_http_error(400, "context length exceeded"),
            ErrorKind::ContextTooLarge
        );
    }

    #[test]
    fn classify_400_token_limit() {
        assert_eq!(
            classify_http_error(400, "request hit the token limit for this model"),
            ErrorKind::ContextTooLarge
        );
    }

    #[test]
    fn classify_400_context_window() {
        assert_eq!(
            classify_http_error(400, "exceeds the context window"),
            ErrorKind::ContextTooLarge
        );
    }

    #[test]
    fn classify_400_case_insensitive() {
        assert_eq!(
            classify_http_error(400, "INPUT TOO LONG"),
            ErrorKind::ContextTooLarge
        );
    }

    /// A 400 with no overflow keyword still classifies as ContextTooLarge —
    /// the optimistic default for this backend's dominant failure mode.
    #[test]
    fn classify_400_without_keyword_defaults_to_overflow() {
        assert_eq!(
            classify_http_error(400, "invalid parameter: temperature"),
            ErrorKind::ContextTooLarge
        );
    }

    #[test]
    fn classify_429_as_rate_limit() {
        assert_eq!(classify_http_error(429, "slow down"), ErrorKind::RateLimit);
    }

    #[test]
    fn classify_401_and_403_as_auth_error() {
        assert_eq!(
            classify_http_error(401, "unauthorized"),
            ErrorKind::AuthError
        );
        assert_eq!(classify_http_error(403, "forbidden"), ErrorKind::AuthError);
    }

    #[test]
    fn classify_other_statuses_as_unknown() {
        assert_eq!(
            classify_http_error(500, "internal server error"),
            ErrorKind::Unknown
        );
        assert_eq!(classify_http_error(418, "teapot"), ErrorKind::Unknown);
    }

    #[test]
    fn classify_api_error_variant() {
        let err = Error::Api {
            status: 400,
            message: "prompt exceeds maximum size".into(),
        };
        assert_eq!(classify(&err), ErrorKind::ContextTooLarge);

        let err = Error::Api {
            status: 429,
            message: "rate limited".into(),
        };
        assert_eq!(classify(&err), ErrorKind::RateLimit);
    }

    #[test]
    fn classify_non_api_errors_as_unknown() {
        assert_eq!(classify(&Error::Cancelled), ErrorKind::Unknown);
        assert_eq!(
            classify(&Error::Session("something broke".into())),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn preview_bounds_long_bodies() {
        let body = "x".repeat(1000);
        let p = preview(&body, 100);
        assert_eq!(p.chars().count(), 101); // 100 chars + ellipsis
        assert!(p.ends_with('…'));
    }

    #[test]
    fn preview_passes_short_bodies_through() {
        assert_eq!(preview("short", 100), "short");
    }
}
