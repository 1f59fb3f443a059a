//! Runtime value type for the configuration language.
//!
//! Every value is a string.  Lists are the same string joined with `;`,
//! exposed through [`Value::list`]; numbers only exist as integers parsed on
//! demand.

use std::fmt;

/// A script runtime value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Value(String);

impl Value {
    pub fn new(s: impl Into<String>) -> Self {
        Value(s.into())
    }

    /// Join items with `;`.
    pub fn from_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = String::new();
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            out.push_str(item.as_ref());
        }
        Value(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// List view: the empty string is the empty list, otherwise split on
    /// every `;` (empty elements are kept).
    pub fn list(&self) -> Vec<&str> {
        split_list(&self.0)
    }

    pub fn as_int(&self) -> Option<i64> {
        parse_int(&self.0)
    }

    /// Condition truthiness.
    pub fn is_truthy(&self) -> bool {
        is_truthy(&self.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value(s.to_owned())
    }
}

// ── Free helpers ──────────────────────────────────────────────────────────────

pub fn split_list(s: &str) -> Vec<&str> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split(';').collect()
    }
}

/// Parse a (possibly signed) decimal integer, ignoring surrounding spaces.
pub fn parse_int(s: &str) -> Option<i64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse().ok()
}

/// `true` if `s` is wrapped in a pair of double quotes.
pub fn is_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

/// Strip one surrounding pair of `"` and un-escape `\"`.
///
/// Unquoted text is returned unchanged.
pub fn dequote(s: &str) -> String {
    if !is_quoted(s) {
        return s.to_owned();
    }
    let inner = &s[1..s.len() - 1];
    inner.replace("\\\"", "\"")
}

/// Boolean constants recognised in conditions (compared case-insensitively).
pub fn is_bool_constant(s: &str) -> bool {
    let up = s.to_ascii_uppercase();
    matches!(
        up.as_str(),
        "ON" | "OFF" | "TRUE" | "FALSE" | "YES" | "NO" | "Y" | "N" | "IGNORE" | "NOTFOUND"
    ) || up.ends_with("-NOTFOUND")
}

/// A value is true unless it is empty or equals `false` / `off` in any case.
///
/// Everything else is true, including `0`, `NO` and `*-NOTFOUND`; test a
/// search result with `STREQUAL` or the `<name>_FOUND` variable instead.
pub fn is_truthy(s: &str) -> bool {
    !(s.is_empty() || s.eq_ignore_ascii_case("false") || s.eq_ignore_ascii_case("off"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
