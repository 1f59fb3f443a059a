//! Script interpreter.
//!
//! The [`Interpreter`] owns every piece of mutable state: the variable
//! scope, the cache, the environment snapshot, user-defined procedures and
//! macros, the block capture stack, conditional state, the policy stack and
//! the recorded project.  It implements [`EvalContext`] so the substitution
//! engine and the condition evaluator can look variables up.
//!
//! Statements are dispatched in this order:
//!
//! 1. while a block is being captured, the statement joins its body (or
//!    closes it);
//! 2. `if` / `elseif` / `else` / `endif` update the conditional state;
//! 3. anything inside an inactive branch is skipped;
//! 4. arguments are substituted;
//! 5. `function` / `macro` / `foreach` open a capture;
//! 6. user-defined procedures and macros, then built-ins, are invoked.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::config::{default_variables, CacheEntry, InitialCache, Platform};
use crate::error::{Result, ScriptError};
use crate::host::{display, FsHost, Host};
use crate::project::Project;
use crate::var::Scope;

use super::{
    args::{self, bind, Keywords},
    block::{Block, BlockKind, CaptureStack, Captured, IfState},
    builtins::{self, Builtin, Flow},
    expand::expand,
    expr::{eval_condition, EvalContext},
    policy::PolicyStack,
    stmt::{parse_script, Statement},
    value::{parse_int, Value},
};

/// Nesting limit for procedure/macro calls and includes.
pub const MAX_CALL_DEPTH: usize = 1000;

const FOREACH_KEYWORDS: Keywords = Keywords {
    flags: &["IN"],
    single: &[],
    multi: &["LISTS", "ITEMS", "ZIP_LISTS", "RANGE"],
};

const RANGE_KEYWORDS: Keywords = Keywords { flags: &[], single: &[], multi: &["RANGE"] };

/// Index of the `IN` that ends the loop variables of a `foreach` header.
///
/// `IN` follows a single loop variable directly; several variables are only
/// allowed before `IN ZIP_LISTS`.  An `IN` anywhere else is a plain item.
fn in_position(header: &[String]) -> Option<usize> {
    if header.get(1).is_some_and(|a| a == "IN") {
        return Some(1);
    }
    let p = header.iter().position(|a| a == "IN")?;
    (p > 1 && header.get(p + 1).is_some_and(|a| a == "ZIP_LISTS")).then_some(p)
}

// ── ControlFlow ───────────────────────────────────────────────────────────────

/// Non-error control-flow signals that unwind statement lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Break,
    Continue,
    Return,
}

/// Environment entries that are valid UTF-8; anything else is skipped.
fn utf8_env(vars: impl Iterator<Item = (OsString, OsString)>) -> HashMap<String, String> {
    vars.filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))).collect()
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// The script interpreter.
pub struct Interpreter {
    pub(crate) scope: Scope,
    pub(crate) cache: HashMap<String, CacheEntry>,
    pub(crate) env: HashMap<String, String>,
    /// User procedures and macros, keyed by lowercased name.
    blocks: HashMap<String, Rc<Block>>,
    captures: CaptureStack,
    ifs: IfState,
    pub(crate) policies: PolicyStack,
    pub(crate) project: Project,
    pub(crate) host: Box<dyn Host>,
    pub(crate) platform: Platform,
    /// File (or `<string>`) currently being evaluated, for diagnostics.
    current_file: String,
    call_depth: usize,
    pub(crate) send_errors: usize,
    /// Lines produced by `message()` for standard output.
    pub output: Vec<String>,
    /// Warnings and non-fatal errors, meant for standard error.
    pub diagnostics: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter on the real filesystem and process environment.
    pub fn new() -> Self {
        Self::with_host(FsHost)
    }

    /// An interpreter using `host` for all filesystem access.
    pub fn with_host(host: impl Host + 'static) -> Self {
        let platform = Platform::host();
        let mut interp = Interpreter {
            scope: Scope::new(),
            cache: HashMap::new(),
            env: utf8_env(std::env::vars_os()),
            blocks: HashMap::new(),
            captures: CaptureStack::default(),
            ifs: IfState::default(),
            policies: PolicyStack::new(),
            project: Project::default(),
            host: Box::new(host),
            platform,
            current_file: "<string>".to_owned(),
            call_depth: 0,
            send_errors: 0,
            output: Vec::new(),
            diagnostics: Vec::new(),
        };
        interp.apply_defaults();
        interp
    }

    /// Switch the target platform, replacing the platform default variables.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        for m in self.platform.markers() {
            self.scope.unset(m);
        }
        self.platform = platform;
        self.apply_defaults();
        self
    }

    /// Replace the environment snapshot used by `$ENV{}` and searches.
    pub fn with_env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = env.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    fn apply_defaults(&mut self) {
        for (name, value) in default_variables(self.platform) {
            self.scope.set(name, value);
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    // ── Variables ─────────────────────────────────────────────────────────────

    /// Value of a variable, falling back to the cache.
    pub fn var(&self, name: &str) -> Option<String> {
        self.get_var(name).map(Value::into_string)
    }

    /// Set a variable in the current scope.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value: String = value.into();
        self.scope.set(name, value);
    }

    pub fn unset_var(&mut self, name: &str) -> bool {
        self.scope.unset(name)
    }

    pub fn cache_entry(&self, name: &str) -> Option<&CacheEntry> {
        self.cache.get(name)
    }

    pub fn set_cache_entry(&mut self, name: impl Into<String>, entry: CacheEntry) {
        self.cache.insert(name.into(), entry);
    }

    /// Load an initial cache: every entry goes into the cache and the scope.
    pub fn load_initial_cache(&mut self, cache: &InitialCache) {
        for (name, entry) in &cache.entries {
            self.scope.set(name.as_str(), entry.value.as_str());
            self.cache.insert(name.clone(), entry.clone());
        }
    }

    /// The data recorded by project-description commands.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Number of `message(SEND_ERROR)` calls so far.
    pub fn send_errors(&self) -> usize {
        self.send_errors
    }

    /// Is `name` a user-defined procedure or macro?
    pub fn has_command(&self, name: &str) -> bool {
        self.blocks.contains_key(&name.to_ascii_lowercase())
    }

    /// Drain and return the standard-output lines.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    /// Evaluate a script held in memory.
    pub fn run_str(&mut self, src: &str) -> Result<()> {
        self.run_source("<string>", src)
    }

    /// Evaluate a script file; its directory becomes the source directory.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let abs = self.host.absolute(path.as_ref());
        let source = self
            .host
            .read_to_string(&abs)
            .map_err(|e| ScriptError::io(format!("cannot read \"{}\": {e}", display(&abs))))?;
        let dir = abs.parent().map(display).unwrap_or_default();
        for name in ["CMAKE_SOURCE_DIR", "CMAKE_BINARY_DIR"] {
            if self.get_var(name).is_none() {
                self.scope.set(name, dir.as_str());
            }
        }
        let binary = self.var("CMAKE_BINARY_DIR").unwrap_or_else(|| dir.clone());
        self.scope.set("CMAKE_CURRENT_SOURCE_DIR", dir.as_str());
        self.scope.set("CMAKE_CURRENT_BINARY_DIR", binary);
        self.run_included(&abs, &source)
    }

    /// Evaluate an already-read file in the current scope with
    /// `CMAKE_CURRENT_LIST_FILE` / `CMAKE_CURRENT_LIST_DIR` pointing at it.
    pub(crate) fn run_included(&mut self, path: &Path, source: &str) -> Result<()> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(ScriptError::dispatch(format!(
                "Maximum recursion depth of {MAX_CALL_DEPTH} exceeded while including \"{}\".",
                display(path)
            )));
        }
        let file = display(path);
        let dir = path.parent().map(display).unwrap_or_default();
        let prev_file = self.scope.get("CMAKE_CURRENT_LIST_FILE").cloned();
        let prev_dir = self.scope.get("CMAKE_CURRENT_LIST_DIR").cloned();
        self.scope.set("CMAKE_CURRENT_LIST_FILE", file.as_str());
        self.scope.set("CMAKE_CURRENT_LIST_DIR", dir);
        debug!(file = %file, "evaluating file");

        self.call_depth += 1;
        let result = self.run_source(&file, source);
        self.call_depth -= 1;

        for (name, prev) in [("CMAKE_CURRENT_LIST_FILE", prev_file), ("CMAKE_CURRENT_LIST_DIR", prev_dir)] {
            match prev {
                Some(v) => self.scope.set(name, v),
                None => {
                    self.scope.unset(name);
                }
            }
        }
        result
    }

    /// Read and evaluate one source unit.  The unit gets its own capture
    /// stack and conditional state and must close everything it opens.
    fn run_source(&mut self, origin: &str, src: &str) -> Result<()> {
        let stmts = parse_script(src);
        let saved_ifs = std::mem::take(&mut self.ifs);
        let saved_captures = std::mem::take(&mut self.captures);
        let saved_file = std::mem::replace(&mut self.current_file, origin.to_owned());

        let result = self.run_unit(&stmts);

        self.ifs = saved_ifs;
        self.captures = saved_captures;
        self.current_file = saved_file;
        result
    }

    fn run_unit(&mut self, stmts: &[Statement]) -> Result<()> {
        match self.exec_block(stmts)? {
            Some(ControlFlow::Return) => return Ok(()),
            Some(ControlFlow::Break) => {
                return Err(ScriptError::structural("break() called outside of a foreach() loop."))
            }
            Some(ControlFlow::Continue) => {
                return Err(ScriptError::structural("continue() called outside of a foreach() loop."))
            }
            None => {}
        }
        self.check_balanced()
    }

    /// Fail if a block capture or an `if` is still open.
    fn check_balanced(&self) -> Result<()> {
        if let Some(open) = self.captures.top() {
            let opener = open.kind.opener();
            return Err(ScriptError::structural(format!(
                "Flow control statements are not properly nested.\n{opener}() has no matching {}().",
                open.kind.terminator()
            ))
            .at(&self.current_file, open.line, opener));
        }
        if self.ifs.depth() > 0 {
            return Err(ScriptError::structural("if() has no matching endif()."));
        }
        Ok(())
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Execute statements in order, stopping at the first control-flow signal.
    pub fn exec_block(&mut self, stmts: &[Statement]) -> Result<Option<ControlFlow>> {
        for stmt in stmts {
            if let Some(cf) = self.exec_stmt(stmt)? {
                return Ok(Some(cf));
            }
        }
        Ok(None)
    }

    /// Execute a single statement.
    pub fn exec_stmt(&mut self, stmt: &Statement) -> Result<Option<ControlFlow>> {
        let name = stmt.name.to_ascii_lowercase();
        self.dispatch(&name, stmt)
            .map_err(|e| e.at(&self.current_file, stmt.line, &stmt.name))
    }

    fn dispatch(&mut self, name: &str, stmt: &Statement) -> Result<Option<ControlFlow>> {
        trace!(command = %name, line = stmt.line, "statement");

        if let Some(captured) = self.captures.capture(name, stmt) {
            return match captured {
                Captured::Body => Ok(None),
                Captured::Closed(block) => self.finish_block(block),
            };
        }

        match name {
            "if" => {
                let enclosing = self.ifs.active();
                let holds = enclosing && self.condition(&stmt.arguments)?;
                self.ifs.open(enclosing, holds);
                return Ok(None);
            }
            "elseif" => {
                if self.ifs.next_branch(name)? && self.condition(&stmt.arguments)? {
                    self.ifs.enter_branch();
                }
                return Ok(None);
            }
            "else" => {
                if self.ifs.next_branch(name)? {
                    self.ifs.enter_branch();
                }
                return Ok(None);
            }
            "endif" => {
                self.ifs.close()?;
                return Ok(None);
            }
            _ => {}
        }

        if !self.ifs.active() {
            return Ok(None);
        }

        let args = self.substitute(&stmt.arguments)?;

        if let Some(kind) = BlockKind::from_opener(name) {
            self.captures.push(Block::open(kind, args, stmt.line)?);
            return Ok(None);
        }
        if let Some(kind) = BlockKind::from_terminator(name) {
            return Err(ScriptError::structural(format!(
                "{}() without opening {}().",
                kind.terminator(),
                kind.opener()
            )));
        }

        self.invoke(name, &args)
    }

    fn substitute(&self, raw: &[String]) -> Result<Vec<String>> {
        raw.iter().map(|a| expand(a, self)).collect()
    }

    fn condition(&self, raw: &[String]) -> Result<bool> {
        let args = self.substitute(raw)?;
        eval_condition(&args, self)
    }

    fn finish_block(&mut self, block: Block) -> Result<Option<ControlFlow>> {
        match block.kind {
            BlockKind::Loop => self.run_loop(&block),
            _ => {
                debug!(name = %block.name, kind = ?block.kind, params = ?block.params, "defined command");
                self.blocks.insert(block.name.to_ascii_lowercase(), Rc::new(block));
                Ok(None)
            }
        }
    }

    // ── Invocation ────────────────────────────────────────────────────────────

    /// Invoke a command with substituted arguments.
    pub fn invoke(&mut self, name: &str, args: &[String]) -> Result<Option<ControlFlow>> {
        if let Some(block) = self.blocks.get(name).cloned() {
            return self.call_block(&block, args);
        }
        if let Some(builtin) = builtins::lookup(name) {
            return self.call_builtin(builtin, args);
        }
        Err(ScriptError::dispatch(format!("Unknown CMake command \"{name}\".")))
    }

    /// Built-ins run in a new scope: whatever they do not mark is discarded.
    fn call_builtin(&mut self, builtin: &Builtin, args: &[String]) -> Result<Option<ControlFlow>> {
        let bound = bind(builtin.name, &builtin.keywords, args, builtin.max_positional)?;
        let snapshot = self.scope.push_frame();
        bound.store(&mut self.scope);
        let result = (builtin.handler)(self, &bound);
        self.scope.pop_frame(snapshot);

        match result? {
            Flow::Next => Ok(None),
            Flow::Break => Ok(Some(ControlFlow::Break)),
            Flow::Continue => Ok(Some(ControlFlow::Continue)),
            Flow::Return => Ok(Some(ControlFlow::Return)),
            Flow::Include { path, source } => {
                self.run_included(&path, &source)?;
                Ok(None)
            }
        }
    }

    fn call_block(&mut self, block: &Block, args: &[String]) -> Result<Option<ControlFlow>> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(ScriptError::dispatch(format!(
                "Maximum recursion depth of {MAX_CALL_DEPTH} exceeded calling {}().",
                block.name
            )));
        }
        let actual = bind(&block.name, &Keywords::NONE, args, None)?.positional;
        debug!(name = %block.name, argc = actual.len(), "calling user command");

        self.call_depth += 1;
        let result = match block.kind {
            BlockKind::Macro => {
                self.bind_parameters(block, &actual);
                self.run_body(&block.body)
            }
            _ => {
                let snapshot = self.scope.push_frame();
                self.bind_parameters(block, &actual);
                let r = self.run_body(&block.body);
                self.scope.pop_frame(snapshot);
                match r {
                    Err(e) => Err(e),
                    Ok(None | Some(ControlFlow::Return)) => Ok(None),
                    Ok(Some(ControlFlow::Break)) => Err(ScriptError::structural(format!(
                        "break() called outside of a foreach() loop in {}().",
                        block.name
                    ))),
                    Ok(Some(ControlFlow::Continue)) => Err(ScriptError::structural(format!(
                        "continue() called outside of a foreach() loop in {}().",
                        block.name
                    ))),
                }
            }
        };
        self.call_depth -= 1;
        result
    }

    fn bind_parameters(&mut self, block: &Block, actual: &[String]) {
        for (i, param) in block.params.iter().enumerate() {
            match actual.get(i) {
                Some(v) => self.scope.set(param.as_str(), v.as_str()),
                None => {
                    self.scope.unset(param);
                }
            }
        }
        self.scope.set("ARGC", actual.len().to_string());
        self.scope.set("ARGV", Value::from_list(actual));
        for (i, v) in actual.iter().enumerate() {
            self.scope.set(format!("ARGV{i}"), v.as_str());
        }
        let extra = actual.get(block.params.len()..).unwrap_or(&[]);
        self.scope.set("ARGN", Value::from_list(extra));
    }

    /// Run a captured body in the current scope with fresh block state.
    ///
    /// A body that runs to its end must leave no `if` or block open.
    fn run_body(&mut self, body: &[Statement]) -> Result<Option<ControlFlow>> {
        let saved_ifs = std::mem::take(&mut self.ifs);
        let saved_captures = std::mem::take(&mut self.captures);
        let result = match self.exec_block(body) {
            Ok(None) => self.check_balanced().map(|()| None),
            other => other,
        };
        self.ifs = saved_ifs;
        self.captures = saved_captures;
        result
    }

    // ── foreach ───────────────────────────────────────────────────────────────

    fn run_loop(&mut self, block: &Block) -> Result<Option<ControlFlow>> {
        let header = &block.params;
        let has_in = in_position(header).is_some();
        let vocab = if has_in {
            &FOREACH_KEYWORDS
        } else if header.get(1).is_some_and(|a| a == "RANGE") {
            &RANGE_KEYWORDS
        } else {
            &Keywords::NONE
        };
        let bound = bind("foreach", vocab, header, if has_in { None } else { Some(1) })?;
        bound.store(&mut self.scope);
        let plan = self.plan_loop(&bound, has_in);
        bound.erase(&mut self.scope);

        match plan? {
            LoopPlan::Items { var, items } => {
                for item in items {
                    self.scope.set(var.as_str(), item);
                    match self.run_body(&block.body)? {
                        Some(ControlFlow::Break) => break,
                        Some(ControlFlow::Return) => return Ok(Some(ControlFlow::Return)),
                        _ => {}
                    }
                }
            }
            LoopPlan::Zip { vars, lists } => {
                let rounds = lists.iter().map(Vec::len).max().unwrap_or(0);
                for i in 0..rounds {
                    for (var, list) in vars.iter().zip(&lists) {
                        match list.get(i) {
                            Some(v) => self.scope.set(var.as_str(), v.as_str()),
                            None => {
                                self.scope.unset(var);
                            }
                        }
                    }
                    match self.run_body(&block.body)? {
                        Some(ControlFlow::Break) => break,
                        Some(ControlFlow::Return) => return Ok(Some(ControlFlow::Return)),
                        _ => {}
                    }
                }
            }
        }
        Ok(None)
    }

    fn plan_loop(&self, bound: &args::BoundArgs, has_in: bool) -> Result<LoopPlan> {
        let Some(first) = bound.positional.first().cloned() else {
            return Err(ScriptError::structural("foreach called with incorrect number of arguments"));
        };
        let present = |kw: &str| self.scope.contains(&bound.key(kw));

        if present("RANGE") {
            let bounds = args::values(&self.scope, bound, "RANGE");
            return Ok(LoopPlan::Items { var: first, items: range_items(&bounds)? });
        }

        if present("ZIP_LISTS") {
            let names = args::values(&self.scope, bound, "ZIP_LISTS");
            let lists: Vec<Vec<String>> = names.iter().map(|n| self.list_of(n)).collect();
            let vars = if bound.positional.len() == 1 {
                (0..lists.len()).map(|i| format!("{first}_{i}")).collect()
            } else if bound.positional.len() == lists.len() {
                bound.positional.clone()
            } else {
                return Err(ScriptError::structural(format!(
                    "foreach ZIP_LISTS given {} loop variables for {} lists; \
                     use one variable or one per list.",
                    bound.positional.len(),
                    lists.len()
                )));
            };
            return Ok(LoopPlan::Zip { vars, lists });
        }

        if has_in && bound.positional.len() > 1 {
            return Err(ScriptError::structural(
                "foreach IN LISTS/ITEMS takes exactly one loop variable",
            ));
        }
        let mut items = Vec::new();
        for name in args::values(&self.scope, bound, "LISTS") {
            items.extend(self.list_of(&name));
        }
        items.extend(args::values(&self.scope, bound, "ITEMS"));
        for tok in &bound.overflow {
            items.extend(Value::from(tok.as_str()).list().into_iter().map(str::to_owned));
        }
        Ok(LoopPlan::Items { var: first, items })
    }

    /// List elements of variable `name` (empty when undefined).
    pub(crate) fn list_of(&self, name: &str) -> Vec<String> {
        self.get_var(name)
            .map(|v| v.list().into_iter().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// Directory used to resolve relative paths in the current file.
    pub(crate) fn current_source_dir(&self) -> PathBuf {
        match self.var("CMAKE_CURRENT_SOURCE_DIR") {
            Some(d) if !d.is_empty() => PathBuf::from(d),
            _ => self.host.absolute(Path::new(".")),
        }
    }
}

enum LoopPlan {
    Items { var: String, items: Vec<String> },
    Zip { vars: Vec<String>, lists: Vec<Vec<String>> },
}

/// Expand `RANGE stop` / `RANGE start stop [step]` (inclusive).
fn range_items(bounds: &[String]) -> Result<Vec<String>> {
    let mut nums = Vec::with_capacity(bounds.len());
    for b in bounds {
        match parse_int(b) {
            Some(n) => nums.push(n),
            None => {
                return Err(ScriptError::numeric(format!(
                    "foreach RANGE requires integer arguments, got \"{b}\"."
                )))
            }
        }
    }
    let (start, stop, step) = match nums[..] {
        [stop] => (0, stop, 1),
        [start, stop] => (start, stop, 1),
        [start, stop, step] => (start, stop, step),
        _ => {
            return Err(ScriptError::numeric(
                "foreach RANGE takes one to three integer arguments.",
            ))
        }
    };
    if step <= 0 {
        return Err(ScriptError::numeric(format!(
            "foreach RANGE step must be positive, got {step}."
        )));
    }
    let mut items = Vec::new();
    let mut i = start;
    while i <= stop {
        items.push(i.to_string());
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(items)
}

impl EvalContext for Interpreter {
    fn get_var(&self, name: &str) -> Option<Value> {
        self.scope
            .get(name)
            .cloned()
            .or_else(|| self.cache.get(name).map(|e| Value::new(e.value.as_str())))
    }

    fn get_env(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
