//! Variable scope with marked write-back.
//!
//! There is a single live variable map.  A new-scope call (a procedure or
//! any built-in command) pushes a frame: the map is snapshotted, the callee
//! mutates the live map freely, and on return the snapshot is restored
//! except for the names the callee *marked*, whose live values (or absence)
//! are copied back into the caller.
//!
//! The frame stack always holds a root frame that is never popped, so marks
//! made at top level are harmless.

use std::collections::{HashMap, HashSet};

use crate::script::value::Value;

/// Variables captured at the start of a new-scope call.
#[derive(Debug)]
#[must_use = "a snapshot must be handed back to Scope::pop_frame"]
pub struct Snapshot(HashMap<String, Value>);

/// The live variable map plus one mark set per active new-scope call.
#[derive(Debug)]
pub struct Scope {
    vars: HashMap<String, Value>,
    marks: Vec<HashSet<String>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Scope { vars: HashMap::new(), marks: vec![HashSet::new()] }
    }

    /// Set (or overwrite) a variable in the live map.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Remove a variable.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Set a variable and mark it so it survives the current call's return.
    pub fn set_exported(&mut self, name: &str, value: impl Into<Value>) {
        self.set(name, value);
        self.export(name);
    }

    /// Unset a variable and mark it so the removal reaches the caller.
    pub fn unset_exported(&mut self, name: &str) {
        self.unset(name);
        self.export(name);
    }

    /// Mark `name` in the innermost call's set.
    pub fn export(&mut self, name: &str) {
        if let Some(top) = self.marks.last_mut() {
            top.insert(name.to_owned());
        }
    }

    /// Mark `name` in the set of the call enclosing the innermost one, so it
    /// survives one more return.  At top level there is nothing to reach.
    pub fn export_parent(&mut self, name: &str) {
        let n = self.marks.len();
        if n >= 2 {
            self.marks[n - 2].insert(name.to_owned());
        }
    }

    /// Begin a new-scope call.
    pub fn push_frame(&mut self) -> Snapshot {
        self.marks.push(HashSet::new());
        Snapshot(self.vars.clone())
    }

    /// End a new-scope call: restore the snapshot, then copy back every
    /// marked name from the callee's live map.
    pub fn pop_frame(&mut self, snapshot: Snapshot) {
        let marked = if self.marks.len() > 1 { self.marks.pop().unwrap_or_default() } else { HashSet::new() };
        let live = std::mem::replace(&mut self.vars, snapshot.0);
        for name in marked {
            match live.get(&name) {
                Some(v) => {
                    self.vars.insert(name, v.clone());
                }
                None => {
                    self.vars.remove(&name);
                }
            }
        }
    }

    /// Number of active new-scope calls (the root frame is not counted).
    pub fn depth(&self) -> usize {
        self.marks.len() - 1
    }

    /// Iterate over all live variables.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(scope: &'a Scope, name: &str) -> Option<&'a str> {
        scope.get(name).map(Value::as_str)
    }

    #[test]
    fn set_and_get() {
        let mut scope = Scope::new();
        scope.set("X", "1");
        assert_eq!(get(&scope, "X"), Some("1"));
        assert!(scope.unset("X"));
        assert!(!scope.unset("X"));
    }

    #[test]
    fn unmarked_changes_are_discarded() {
        let mut scope = Scope::new();
        scope.set("X", "outer");
        let snap = scope.push_frame();
        scope.set("X", "inner");
        scope.set("Y", "new");
        scope.pop_frame(snap);
        assert_eq!(get(&scope, "X"), Some("outer"));
        assert_eq!(get(&scope, "Y"), None);
    }

    #[test]
    fn marked_changes_are_written_back() {
        let mut scope = Scope::new();
        scope.set("X", "outer");
        let snap = scope.push_frame();
        scope.set_exported("X", "inner");
        scope.set_exported("Y", "new");
        scope.pop_frame(snap);
        assert_eq!(get(&scope, "X"), Some("inner"));
        assert_eq!(get(&scope, "Y"), Some("new"));
    }

    #[test]
    fn marked_unset_removes_in_caller() {
        let mut scope = Scope::new();
        scope.set("X", "outer");
        let snap = scope.push_frame();
        scope.unset_exported("X");
        scope.pop_frame(snap);
        assert!(!scope.contains("X"));
    }

    #[test]
    fn parent_mark_survives_two_returns() {
        let mut scope = Scope::new();
        let outer = scope.push_frame(); // procedure
        let inner = scope.push_frame(); // built-in
        scope.set_exported("X", "1");
        scope.export_parent("X");
        scope.set_exported("LOCAL", "1");
        scope.pop_frame(inner);
        assert_eq!(get(&scope, "X"), Some("1"));
        assert_eq!(get(&scope, "LOCAL"), Some("1"));
        scope.pop_frame(outer);
        assert_eq!(get(&scope, "X"), Some("1"));
        assert_eq!(get(&scope, "LOCAL"), None);
        assert_eq!(scope.depth(), 0);
    }

    #[test]
    fn parent_mark_at_top_level_just_sets() {
        let mut scope = Scope::new();
        let snap = scope.push_frame();
        scope.set_exported("X", "1");
        scope.export_parent("X");
        scope.pop_frame(snap);
        assert_eq!(get(&scope, "X"), Some("1"));
    }
}
