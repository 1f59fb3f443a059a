//! Policy stack for `cmake_policy()`.
//!
//! Policies are named `CMPnnnn` and set to `NEW` or `OLD`.  The stack is
//! independent of variable scoping; `PUSH` copies the current entry so
//! settings made after it are discarded by the matching `POP`.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, ScriptError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySetting {
    New,
    Old,
}

impl PolicySetting {
    pub fn parse(s: &str) -> Option<PolicySetting> {
        match s {
            "NEW" => Some(PolicySetting::New),
            "OLD" => Some(PolicySetting::Old),
            _ => None,
        }
    }
}

impl fmt::Display for PolicySetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolicySetting::New => "NEW",
            PolicySetting::Old => "OLD",
        })
    }
}

#[derive(Debug, Clone, Default)]
struct PolicyScope {
    version: Option<String>,
    settings: HashMap<String, PolicySetting>,
}

fn policy_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^CMP[0-9]{4}$").expect("valid policy id regex"))
}

pub fn is_policy_id(s: &str) -> bool {
    policy_id().is_match(s)
}

/// Stack of policy scopes; the base entry can never be popped.
#[derive(Debug, Clone)]
pub struct PolicyStack {
    scopes: Vec<PolicyScope>,
}

impl Default for PolicyStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStack {
    pub fn new() -> Self {
        PolicyStack { scopes: vec![PolicyScope::default()] }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn push(&mut self) {
        let copy = self.current().clone();
        self.scopes.push(copy);
    }

    pub fn pop(&mut self) -> Result<()> {
        if self.scopes.len() <= 1 {
            return Err(ScriptError::structural(
                "cmake_policy POP without matching PUSH",
            ));
        }
        self.scopes.pop();
        Ok(())
    }

    pub fn set(&mut self, id: &str, value: &str) -> Result<()> {
        check_id(id)?;
        let Some(setting) = PolicySetting::parse(value) else {
            return Err(ScriptError::domain(format!(
                "cmake_policy SET given unrecognized policy setting \"{value}\"."
            )));
        };
        self.current_mut().settings.insert(id.to_owned(), setting);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<PolicySetting>> {
        check_id(id)?;
        Ok(self.current().settings.get(id).copied())
    }

    pub fn set_version(&mut self, version: &str) {
        self.current_mut().version = Some(version.to_owned());
    }

    pub fn version(&self) -> Option<&str> {
        self.current().version.as_deref()
    }

    fn current(&self) -> &PolicyScope {
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut PolicyScope {
        let n = self.scopes.len();
        &mut self.scopes[n - 1]
    }
}

fn check_id(id: &str) -> Result<()> {
    if is_policy_id(id) {
        Ok(())
    } else {
        Err(ScriptError::domain(format!(
            "Policy \"{id}\" is not known to this version of CMake."
        )))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
