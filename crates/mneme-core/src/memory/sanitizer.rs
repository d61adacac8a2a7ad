//! Message validation and content sanitization.
//!
//! Both functions are pure. A message that fails validation is skipped by the
//! extractor, never reported as an error. A message whose content matches a
//! sensitive-data pattern is dropped entirely (`sanitize_content` returns an
//! empty string) rather than redacted in place.

use std::sync::LazyLock;

use mneme_types::conversation::MessageRole;
use regex::Regex;
use serde_json::Value;

/// Maximum characters in a sanitized memory, ellipsis included.
pub const MAX_CONTENT_CHARS: usize = 200;

/// Appended to content truncated at [`MAX_CONTENT_CHARS`].
pub const ELLIPSIS: &str = "...";

/// Trimmed content must be longer than this to be worth remembering.
const MIN_TRIMMED_CHARS: usize = 10;

/// Raw content must be shorter than this.
const MAX_RAW_CHARS: usize = 1000;

/// Sensitive-data pattern, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitivePattern {
    Password,
    Token,
    Secret,
    CardNumber,
    SocialSecurityNumber,
}

impl SensitivePattern {
    pub fn name(&self) -> &'static str {
        match self {
            SensitivePattern::Password => "password",
            SensitivePattern::Token => "token",
            SensitivePattern::Secret => "secret",
            SensitivePattern::CardNumber => "card_number",
            SensitivePattern::SocialSecurityNumber => "ssn",
        }
    }
}

static SENSITIVE_PATTERNS: LazyLock<Vec<(SensitivePattern, Regex)>> = LazyLock::new(|| {
    [
        (SensitivePattern::Password, r"(?i)password"),
        (SensitivePattern::Token, r"(?i)token"),
        (SensitivePattern::Secret, r"(?i)secret"),
        (SensitivePattern::CardNumber, r"[0-9]{4}-[0-9]{4}-[0-9]{4}-[0-9]{4}"),
        (SensitivePattern::SocialSecurityNumber, r"[0-9]{3}-[0-9]{2}-[0-9]{4}"),
    ]
    .into_iter()
    .map(|(kind, pattern)| {
        (
            kind,
            Regex::new(pattern).expect("sensitive pattern must compile"),
        )
    })
    .collect()
});

/// First sensitive pattern found in `text`, if any.
pub fn find_sensitive(text: &str) -> Option<SensitivePattern> {
    SENSITIVE_PATTERNS
        .iter()
        .find(|(_, regex)| regex.is_match(text))
        .map(|(kind, _)| *kind)
}

/// Whether `msg` is a usable `{role, content}` object.
///
/// Requires an object whose `role` is `"user"` or `"assistant"` and whose
/// `content` is a string with more than 10 characters after trimming and
/// fewer than 1000 characters raw. Extra fields are ignored.
pub fn is_valid_message(msg: &Value) -> bool {
    let Some(object) = msg.as_object() else {
        return false;
    };
    let Some(content) = object.get("content").and_then(Value::as_str) else {
        return false;
    };
    let role_ok = object
        .get("role")
        .and_then(Value::as_str)
        .is_some_and(|role| role.parse::<MessageRole>().is_ok());

    role_ok
        && content.trim().chars().count() > MIN_TRIMMED_CHARS
        && content.chars().count() < MAX_RAW_CHARS
}

/// Normalize `content` into memory text, or return `""` to drop the message.
///
/// Whitespace runs collapse to single spaces and the ends are trimmed. The
/// collapsed text is screened for sensitive data before truncation, so a
/// match anywhere in the message drops it. Text longer than 200 characters
/// is cut to 197 and suffixed with `"..."`.
pub fn sanitize_content(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(pattern) = find_sensitive(&collapsed) {
        tracing::debug!(pattern = pattern.name(), "Dropped message matching sensitive pattern");
        return String::new();
    }

    if collapsed.chars().count() <= MAX_CONTENT_CHARS {
        return collapsed;
    }

    let keep = MAX_CONTENT_CHARS - ELLIPSIS.chars().count();
    let mut truncated: String = collapsed.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
