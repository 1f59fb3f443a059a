//! Keyword-argument binder.
//!
//! Commands declare a vocabulary of flags, single-value keywords and
//! multi-value keywords.  [`bind`] walks the substituted arguments once,
//! left to right, and sorts them into positional arguments and keyword
//! values.  Keyword values are then published into the scope under
//! `<COMMAND>_<KEYWORD>` (e.g. `SET_PARENT_SCOPE`) where handlers read them.

use crate::error::{Result, ScriptError};
use crate::var::Scope;

use super::value::{dequote, is_quoted};

/// A command's keyword vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct Keywords {
    pub flags: &'static [&'static str],
    pub single: &'static [&'static str],
    pub multi: &'static [&'static str],
}

impl Keywords {
    pub const NONE: Keywords = Keywords { flags: &[], single: &[], multi: &[] };

    fn kind(&self, tok: &str) -> Option<Kind> {
        if self.flags.contains(&tok) {
            Some(Kind::Flag)
        } else if self.single.contains(&tok) {
            Some(Kind::Single)
        } else if self.multi.contains(&tok) {
            Some(Kind::Multi)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Flag,
    Single,
    Multi,
}

/// Result of binding one call's arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundArgs {
    /// Uppercased command name used as the keyword prefix.
    pub prefix: String,
    /// Dequoted positional arguments up to the cap.
    pub positional: Vec<String>,
    /// Positional arguments beyond the cap.
    pub overflow: Vec<String>,
    /// `(KEYWORD, value)` in order of first appearance.  Flags hold `TRUE`;
    /// multi-value keywords hold `;`-joined values.
    pub keywords: Vec<(String, String)>,
}

impl BoundArgs {
    /// Scope name for `keyword`.
    pub fn key(&self, keyword: &str) -> String {
        format!("{}_{}", self.prefix, keyword)
    }

    /// Direct lookup, without going through the scope.
    pub fn keyword(&self, keyword: &str) -> Option<&str> {
        self.keywords.iter().find(|(k, _)| k == keyword).map(|(_, v)| v.as_str())
    }

    /// Write every keyword entry into the live scope.
    pub fn store(&self, scope: &mut Scope) {
        for (k, v) in &self.keywords {
            scope.set(self.key(k), v.as_str());
        }
    }

    /// Remove the entries written by [`BoundArgs::store`].
    pub fn erase(&self, scope: &mut Scope) {
        for (k, _) in &self.keywords {
            scope.unset(&self.key(k));
        }
    }

    fn entry(&mut self, keyword: &str) -> &mut String {
        let idx = match self.keywords.iter().position(|(k, _)| k == keyword) {
            Some(i) => i,
            None => {
                self.keywords.push((keyword.to_owned(), String::new()));
                self.keywords.len() - 1
            }
        };
        &mut self.keywords[idx].1
    }
}

/// Classify `args` against `vocab`.
///
/// Only unquoted tokens can be keywords.  A flag records `TRUE` and returns
/// to positional mode; a single-value keyword takes exactly one value; a
/// multi-value keyword collects values until the next keyword.  With
/// `max_positional` set, positional tokens past the cap go to
/// [`BoundArgs::overflow`].
pub fn bind(
    command: &str,
    vocab: &Keywords,
    args: &[String],
    max_positional: Option<usize>,
) -> Result<BoundArgs> {
    let mut bound = BoundArgs { prefix: command.to_ascii_uppercase(), ..Default::default() };
    let mut current: Option<(&str, Kind)> = None;
    let mut single_taken = false;

    for tok in args {
        if !is_quoted(tok) {
            if let Some(kind) = vocab.kind(tok) {
                match kind {
                    Kind::Flag => {
                        *bound.entry(tok) = "TRUE".to_owned();
                        current = None;
                    }
                    Kind::Single | Kind::Multi => {
                        bound.entry(tok);
                        current = Some((tok.as_str(), kind));
                        single_taken = false;
                    }
                }
                continue;
            }
        }

        let value = dequote(tok);
        match current {
            Some((kw, Kind::Single)) => {
                if single_taken {
                    return Err(ScriptError::scope(format!(
                        "{} {} expects one value, got extra \"{}\"",
                        command, kw, value
                    )));
                }
                *bound.entry(kw) = value;
                single_taken = true;
            }
            Some((kw, _)) => {
                let slot = bound.entry(kw);
                if !slot.is_empty() {
                    slot.push(';');
                }
                slot.push_str(&value);
            }
            None => match max_positional {
                Some(cap) if bound.positional.len() >= cap => bound.overflow.push(value),
                _ => bound.positional.push(value),
            },
        }
    }
    Ok(bound)
}

// ── Scope readers ─────────────────────────────────────────────────────────────

/// Was `flag` given?  Reads the `<PREFIX>_<FLAG>` entry from the scope.
pub fn flag(scope: &Scope, bound: &BoundArgs, flag: &str) -> bool {
    scope.get(&bound.key(flag)).is_some_and(|v| v.as_str() == "TRUE")
}

/// Value of a single-value keyword, if the keyword was given.
pub fn value(scope: &Scope, bound: &BoundArgs, keyword: &str) -> Option<String> {
    scope.get(&bound.key(keyword)).map(|v| v.as_str().to_owned())
}

/// Values of a multi-value keyword (empty when absent).
pub fn values(scope: &Scope, bound: &BoundArgs, keyword: &str) -> Vec<String> {
    scope
        .get(&bound.key(keyword))
        .map(|v| v.list().into_iter().map(str::to_owned).collect())
        .unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
