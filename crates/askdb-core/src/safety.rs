//! Safety gate for generated SQL.
//!
//! Classifies a candidate query as safe (a single read starting with
//! `SELECT` and free of destructive keywords) or unsafe. This is the only
//! checkpoint between generated text and the database.
//!
//! The check is a keyword blocklist, not a grammar. It does not catch every
//! injection vector (statement chaining after a `;`, keywords hidden in
//! comments that a second statement relies on, etc.); it reproduces the
//! observable behaviour clients depend on.

use std::sync::LazyLock;

use regex::Regex;

/// Keywords that make a query unsafe when they appear as whole words.
pub const BLOCKED_KEYWORDS: [&str; 6] = ["drop", "delete", "update", "insert", "alter", "create"];

static BLOCKED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(drop|delete|update|insert|alter|create)\b")
        .expect("blocked keyword pattern is a valid regex")
});

/// Verdict for a single candidate query. Computed fresh per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    /// The query may be executed.
    Safe,
    /// The query must not reach the database.
    Unsafe { reason: String },
}

impl SafetyVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, SafetyVerdict::Safe)
    }
}

/// Stateless SQL safety gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyGate;

impl SafetyGate {
    pub fn new() -> Self {
        Self
    }

    /// Classify `sql`.
    ///
    /// The string is trimmed and lowercased, then rejected if it does not
    /// start with `select` or if any blocked keyword occurs as a standalone
    /// word. Identifiers such as `updated_at` or `created_by` do not match.
    pub fn check(&self, sql: &str) -> SafetyVerdict {
        let normalized = sql.trim().to_lowercase();
        let blocked = first_blocked_keyword(&normalized);

        if !normalized.starts_with("select") {
            let reason = match blocked {
                Some(keyword) => format!(
                    "blocked keyword '{}': only SELECT statements are allowed",
                    keyword
                ),
                None => format!(
                    "only SELECT statements are allowed, query starts with '{}'",
                    leading_token(&normalized)
                ),
            };
            return SafetyVerdict::Unsafe { reason };
        }

        match blocked {
            Some(keyword) => SafetyVerdict::Unsafe {
                reason: format!("blocked keyword '{}' found in query", keyword),
            },
            None => SafetyVerdict::Safe,
        }
    }
}

/// Earliest blocked keyword in an already-normalized query.
fn first_blocked_keyword(normalized: &str) -> Option<&str> {
    BLOCKED_PATTERN.find(normalized).map(|m| m.as_str())
}

fn leading_token(normalized: &str) -> &str {
    normalized
        .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .find(|t| !t.is_empty())
        .unwrap_or("")
}
