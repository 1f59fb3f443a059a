//! Control-flow block capture and `if` bookkeeping.
//!
//! `function`, `macro` and `foreach` bodies are not executed as they are
//! read.  The opener pushes a [`Block`] onto the [`CaptureStack`]; every
//! following statement is appended to the top block verbatim until its
//! terminator arrives, at which point the finished block is handed back to
//! the interpreter to register (procedures, macros) or run (loops).
//!
//! Conditionals are evaluated inline instead, through [`IfState`].

use crate::error::{Result, ScriptError};

use super::stmt::Statement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `function()`: own scope per call.
    Procedure,
    /// `macro()`: runs in the caller's scope.
    Macro,
    /// `foreach()`: evaluated once, at its terminator.
    Loop,
}

impl BlockKind {
    pub fn from_opener(name: &str) -> Option<BlockKind> {
        match name {
            "function" => Some(BlockKind::Procedure),
            "macro" => Some(BlockKind::Macro),
            "foreach" => Some(BlockKind::Loop),
            _ => None,
        }
    }

    pub fn from_terminator(name: &str) -> Option<BlockKind> {
        match name {
            "endfunction" => Some(BlockKind::Procedure),
            "endmacro" => Some(BlockKind::Macro),
            "endforeach" => Some(BlockKind::Loop),
            _ => None,
        }
    }

    pub fn opener(self) -> &'static str {
        match self {
            BlockKind::Procedure => "function",
            BlockKind::Macro => "macro",
            BlockKind::Loop => "foreach",
        }
    }

    pub fn terminator(self) -> &'static str {
        match self {
            BlockKind::Procedure => "endfunction",
            BlockKind::Macro => "endmacro",
            BlockKind::Loop => "endforeach",
        }
    }
}

/// A captured block.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// Procedure or macro name; empty for loops.
    pub name: String,
    /// Formal parameters, or the substituted loop header.
    pub params: Vec<String>,
    pub body: Vec<Statement>,
    /// Line of the opener.
    pub line: usize,
    /// Openers of the same kind seen inside the body and not yet closed.
    nesting: usize,
}

impl Block {
    /// Build a block from its substituted opener arguments.
    pub fn open(kind: BlockKind, args: Vec<String>, line: usize) -> Result<Block> {
        let (name, params) = match kind {
            BlockKind::Loop => {
                if args.is_empty() {
                    return Err(ScriptError::structural("foreach called with incorrect number of arguments"));
                }
                (String::new(), args)
            }
            _ => {
                let mut it = args.into_iter();
                let Some(name) = it.next() else {
                    return Err(ScriptError::structural(format!(
                        "{} called with incorrect number of arguments",
                        kind.opener()
                    )));
                };
                (name, it.collect())
            }
        };
        Ok(Block { kind, name, params, body: Vec::new(), line, nesting: 0 })
    }
}

/// What happened to a statement offered to the capture stack.
#[derive(Debug)]
pub enum Captured {
    /// Appended to the body of the top block.
    Body,
    /// It was the top block's terminator; the finished block is returned.
    Closed(Block),
}

/// Blocks currently being defined, innermost last.
#[derive(Debug, Default)]
pub struct CaptureStack {
    blocks: Vec<Block>,
}

impl CaptureStack {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// The innermost open block.
    pub fn top(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Offer `stmt` (whose lowercased name is `name`) to the top block.
    ///
    /// Same-kind openers inside the body are counted so that their
    /// terminators are captured too; only the terminator matching the
    /// outermost opener closes the block.
    pub fn capture(&mut self, name: &str, stmt: &Statement) -> Option<Captured> {
        let top = self.blocks.last_mut()?;
        if BlockKind::from_opener(name) == Some(top.kind) {
            top.nesting += 1;
        } else if BlockKind::from_terminator(name) == Some(top.kind) {
            if top.nesting == 0 {
                return self.blocks.pop().map(Captured::Closed);
            }
            top.nesting -= 1;
        }
        top.body.push(stmt.clone());
        Some(Captured::Body)
    }
}

// ── IfState ───────────────────────────────────────────────────────────────────

/// Inline conditional state.
///
/// `depth` counts open `if`s, `valid` counts those whose current branch is
/// executing; statements run only while the two are equal.  `taken`
/// records, per open `if`, whether some branch of its chain already ran (or
/// can never run because the enclosing branch is inactive).
#[derive(Debug, Default, Clone)]
pub struct IfState {
    depth: usize,
    valid: usize,
    taken: Vec<bool>,
}

impl IfState {
    /// Are statements currently executed?
    pub fn active(&self) -> bool {
        self.depth == self.valid
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Open an `if`.  `holds` is the condition value; pass `false` when the
    /// enclosing branch is inactive (the condition is not evaluated then).
    pub fn open(&mut self, enclosing_active: bool, holds: bool) {
        self.depth += 1;
        if enclosing_active && holds {
            self.valid += 1;
        }
        self.taken.push(!enclosing_active || holds);
    }

    /// Handle `elseif`/`else`: close a running branch, then report whether
    /// the new branch is eligible to run (its condition still decides).
    pub fn next_branch(&mut self, command: &str) -> Result<bool> {
        if self.depth == 0 {
            return Err(ScriptError::structural(format!("{command}() without opening if()")));
        }
        if self.valid == self.depth {
            self.valid -= 1;
            return Ok(false);
        }
        let taken = self.taken.last().copied().unwrap_or(true);
        Ok(self.valid + 1 == self.depth && !taken)
    }

    /// Start executing the branch approved by [`IfState::next_branch`].
    pub fn enter_branch(&mut self) {
        self.valid += 1;
        if let Some(t) = self.taken.last_mut() {
            *t = true;
        }
    }

    pub fn close(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(ScriptError::structural("endif() without opening if()"));
        }
        self.depth -= 1;
        self.taken.pop();
        self.valid = self.valid.min(self.depth);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
