//! Variable substitution.
//!
//! | Sequence     | Meaning                                              |
//! |--------------|------------------------------------------------------|
//! | `${name}`    | Scope variable, falling back to the cache            |
//! | `$ENV{name}` | Entry of the interpreter's environment snapshot      |
//!
//! References are replaced by the *dequoted* value (or nothing when
//! undefined) and the argument is rescanned until no reference is left, so
//! `${${X}_DIR}` resolves the inner reference first.

use crate::error::{Result, ScriptError};

use super::expr::EvalContext;
use super::value::dequote;

/// Upper bound on replacements in one argument.
pub const MAX_REPLACEMENTS: usize = 10_000;

/// Substitute every `${...}` and `$ENV{...}` reference in `src`.
pub fn expand(src: &str, ctx: &dyn EvalContext) -> Result<String> {
    if !src.contains('$') {
        return Ok(src.to_owned());
    }
    let mut s = src.to_owned();
    let mut replacements = 0usize;

    // ── ${name} ───────────────────────────────────────────────────────────────
    while let Some(first) = s.find("${") {
        let Some(rel) = s[first + 2..].find('}') else {
            return Err(ScriptError::syntax(format!(
                "Syntax error in cmake code when parsing string\n\n  {src}\n\n\
                 There is an unterminated variable reference."
            )));
        };
        let close = first + 2 + rel;
        // Innermost reference: the last `${` before the first `}`.
        let open = s[..close].rfind("${").unwrap_or(first);
        let value = ctx
            .get_var(&s[open + 2..close])
            .map(|v| dequote(v.as_str()))
            .unwrap_or_default();
        s.replace_range(open..=close, &value);
        replacements += 1;
        if replacements >= MAX_REPLACEMENTS {
            return Err(runaway(src));
        }
    }

    // ── $ENV{name} ────────────────────────────────────────────────────────────
    while let Some(open) = s.find("$ENV{") {
        let Some(rel) = s[open + 5..].find('}') else { break };
        let close = open + 5 + rel;
        let value = ctx.get_env(&s[open + 5..close]).unwrap_or_default();
        s.replace_range(open..=close, &value);
        replacements += 1;
        if replacements >= MAX_REPLACEMENTS {
            return Err(runaway(src));
        }
    }

    Ok(s)
}

fn runaway(src: &str) -> ScriptError {
    ScriptError::syntax(format!(
        "Variable substitution in\n\n  {src}\n\ndid not terminate after \
         {MAX_REPLACEMENTS} replacements (self-referencing variable?)."
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
