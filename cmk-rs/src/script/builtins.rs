//! Built-in command table.
//!
//! Each built-in declares its keyword vocabulary and an optional cap on
//! positional arguments; the interpreter binds the call against it, runs
//! the handler in a fresh scope frame and acts on the returned [`Flow`].
//! Handlers mark every variable they assign so it survives that frame.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::{CacheEntry, CMAKE_VERSION};
use crate::error::{Result, ScriptError};
use crate::host::{display, normalize};
use crate::project::{LibraryType, Target, TargetKind, Visibility};

use super::args::{self, BoundArgs, Keywords};
use super::find;
use super::interp::Interpreter;
use super::value::{is_truthy, Value};

/// What the interpreter does after a handler returns.
#[derive(Debug)]
pub enum Flow {
    Next,
    Break,
    Continue,
    Return,
    /// Evaluate `source` (read from `path`) in the caller's scope.
    Include { path: PathBuf, source: String },
}

pub type Handler = fn(&mut Interpreter, &BoundArgs) -> Result<Flow>;

/// A built-in command.
pub struct Builtin {
    pub name: &'static str,
    pub keywords: Keywords,
    pub max_positional: Option<usize>,
    pub handler: Handler,
}

const fn builtin(name: &'static str, keywords: Keywords, handler: Handler) -> Builtin {
    Builtin { name, keywords, max_positional: None, handler }
}

static BUILTINS: &[Builtin] = &[
    builtin("set", Keywords { flags: &["PARENT_SCOPE", "FORCE"], single: &[], multi: &["CACHE"] }, cmd_set),
    builtin("unset", Keywords { flags: &["CACHE", "PARENT_SCOPE"], single: &[], multi: &[] }, cmd_unset),
    builtin("list", Keywords::NONE, cmd_list),
    builtin("message", Keywords::NONE, cmd_message),
    builtin(
        "project",
        Keywords { flags: &[], single: &["VERSION", "DESCRIPTION", "HOMEPAGE_URL"], multi: &["LANGUAGES"] },
        cmd_project,
    ),
    builtin(
        "add_library",
        Keywords {
            flags: &[
                "STATIC", "SHARED", "MODULE", "INTERFACE", "OBJECT", "UNKNOWN", "IMPORTED", "GLOBAL",
                "EXCLUDE_FROM_ALL",
            ],
            single: &["ALIAS"],
            multi: &[],
        },
        cmd_add_library,
    ),
    builtin(
        "add_executable",
        Keywords {
            flags: &["WIN32", "MACOSX_BUNDLE", "EXCLUDE_FROM_ALL", "IMPORTED", "GLOBAL"],
            single: &["ALIAS"],
            multi: &[],
        },
        cmd_add_executable,
    ),
    builtin(
        "target_include_directories",
        Keywords { flags: &["SYSTEM", "BEFORE", "AFTER"], single: &[], multi: &["PRIVATE", "PUBLIC", "INTERFACE"] },
        cmd_target_include_directories,
    ),
    builtin(
        "target_link_libraries",
        Keywords { flags: &[], single: &[], multi: &["PRIVATE", "PUBLIC", "INTERFACE"] },
        cmd_target_link_libraries,
    ),
    builtin(
        "get_filename_component",
        Keywords {
            flags: &[
                "DIRECTORY", "PATH", "NAME", "EXT", "NAME_WE", "LAST_EXT", "NAME_WLE", "ABSOLUTE",
                "REALPATH", "CACHE",
            ],
            single: &["BASE_DIR"],
            multi: &[],
        },
        cmd_get_filename_component,
    ),
    builtin("cmake_policy", Keywords::NONE, cmd_cmake_policy),
    builtin(
        "cmake_minimum_required",
        Keywords { flags: &["FATAL_ERROR"], single: &["VERSION"], multi: &[] },
        cmd_cmake_minimum_required,
    ),
    builtin("option", Keywords::NONE, cmd_option),
    builtin(
        "include",
        Keywords { flags: &["OPTIONAL", "NO_POLICY_SCOPE"], single: &["RESULT_VARIABLE"], multi: &[] },
        cmd_include,
    ),
    builtin("mark_as_advanced", Keywords { flags: &["CLEAR", "FORCE"], single: &[], multi: &[] }, cmd_mark_as_advanced),
    builtin("break", Keywords::NONE, cmd_break),
    builtin("continue", Keywords::NONE, cmd_continue),
    builtin("return", Keywords::NONE, cmd_return),
    builtin("find_path", find::FIND_KEYWORDS, find::cmd_find_path),
    builtin("find_library", find::FIND_KEYWORDS, find::cmd_find_library),
    builtin("find_program", find::FIND_KEYWORDS, find::cmd_find_program),
    builtin("find_package", find::PACKAGE_KEYWORDS, find::cmd_find_package),
];

/// Look up a built-in by lowercased name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    static TABLE: OnceLock<HashMap<&'static str, &'static Builtin>> = OnceLock::new();
    TABLE
        .get_or_init(|| BUILTINS.iter().map(|b| (b.name, b)).collect())
        .get(name)
        .copied()
}

/// Names of all built-ins, in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

// ── Shared helpers ────────────────────────────────────────────────────────────

pub(crate) fn has(interp: &Interpreter, b: &BoundArgs, flag: &str) -> bool {
    args::flag(&interp.scope, b, flag)
}

pub(crate) fn value_of(interp: &Interpreter, b: &BoundArgs, keyword: &str) -> Option<String> {
    args::value(&interp.scope, b, keyword)
}

pub(crate) fn values_of(interp: &Interpreter, b: &BoundArgs, keyword: &str) -> Vec<String> {
    args::values(&interp.scope, b, keyword)
}

fn positional<'a>(b: &'a BoundArgs, i: usize, command: &str) -> Result<&'a str> {
    b.positional.get(i).map(String::as_str).ok_or_else(|| {
        ScriptError::domain(format!("{command} called with incorrect number of arguments"))
    })
}

/// Assign `name` in the scope the command was called from.
pub(crate) fn export(interp: &mut Interpreter, name: &str, value: impl Into<Value>) {
    interp.scope.set_exported(name, value);
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?(?:\.([0-9]+))?$").expect("valid version regex")
    })
}

/// Split `major[.minor[.patch[.tweak]]]` into its components.
pub fn parse_version(s: &str) -> Option<Vec<u64>> {
    let caps = version_re().captures(s.trim())?;
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().parse().ok())
        .collect()
}

/// Compare two component lists, missing components counting as zero.
pub fn compare_versions(a: &[u64], b: &[u64]) -> std::cmp::Ordering {
    let n = a.len().max(b.len());
    for i in 0..n {
        let (x, y) = (a.get(i).copied().unwrap_or(0), b.get(i).copied().unwrap_or(0));
        match x.cmp(&y) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

// ── set / unset ───────────────────────────────────────────────────────────────

fn cmd_set(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let name = positional(b, 0, "set")?;
    let values = Value::from_list(&b.positional[1..]);

    if b.keyword("CACHE").is_some() {
        let spec = values_of(interp, b, "CACHE");
        let ty = spec.first().cloned().unwrap_or_else(|| "STRING".to_owned());
        let doc = spec.get(1).cloned().unwrap_or_default();
        let force = has(interp, b, "FORCE") || ty == "INTERNAL";
        let entry = CacheEntry { value: values.into_string(), ty, doc };
        match interp.cache.get_mut(name) {
            None => {
                interp.cache.insert(name.to_owned(), entry);
            }
            Some(existing) if force => *existing = entry,
            Some(existing) if existing.ty == "UNINITIALIZED" => {
                existing.ty = entry.ty;
                existing.doc = entry.doc;
            }
            Some(_) => {}
        }
        return Ok(Flow::Next);
    }

    if b.positional.len() == 1 {
        interp.scope.unset_exported(name);
    } else {
        export(interp, name, values);
    }
    if has(interp, b, "PARENT_SCOPE") {
        interp.scope.export_parent(name);
    }
    Ok(Flow::Next)
}

fn cmd_unset(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let name = positional(b, 0, "unset")?;
    if has(interp, b, "CACHE") {
        interp.cache.remove(name);
        return Ok(Flow::Next);
    }
    interp.scope.unset_exported(name);
    if has(interp, b, "PARENT_SCOPE") {
        interp.scope.export_parent(name);
    }
    Ok(Flow::Next)
}

// ── list ──────────────────────────────────────────────────────────────────────

fn cmd_list(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let sub = positional(b, 0, "list")?;
    let var = positional(b, 1, "list")?;
    let rest = &b.positional[2..];
    let mut items = interp.list_of(var);

    match sub {
        "APPEND" => {
            if rest.is_empty() && interp.var(var).is_some() {
                return Ok(Flow::Next);
            }
            items.extend(rest.iter().cloned());
            export(interp, var, Value::from_list(&items));
        }
        "PREPEND" => {
            let mut out: Vec<String> = rest.to_vec();
            out.extend(items);
            export(interp, var, Value::from_list(&out));
        }
        "REMOVE_ITEM" => {
            if interp.var(var).is_some() {
                items.retain(|item| !rest.contains(item));
                export(interp, var, Value::from_list(&items));
            }
        }
        "REMOVE_DUPLICATES" => {
            if interp.var(var).is_some() {
                let mut seen = std::collections::HashSet::new();
                items.retain(|item| seen.insert(item.clone()));
                export(interp, var, Value::from_list(&items));
            }
        }
        "LENGTH" => {
            let out = positional(b, 2, "list LENGTH")?;
            export(interp, out, items.len().to_string());
        }
        "GET" => {
            let (out, indices) = match rest.split_last() {
                Some((out, idx)) if !idx.is_empty() => (out, idx),
                _ => return Err(ScriptError::domain("list GET needs at least one index and an output variable")),
            };
            let mut picked = Vec::with_capacity(indices.len());
            for idx in indices {
                picked.push(items[list_index(idx, items.len())?].clone());
            }
            export(interp, out, Value::from_list(&picked));
        }
        "FIND" => {
            let value = positional(b, 2, "list FIND")?;
            let out = positional(b, 3, "list FIND")?;
            let found = items.iter().position(|i| i == value).map_or(-1, |p| p as i64);
            export(interp, out, found.to_string());
        }
        other => {
            return Err(ScriptError::domain(format!("list does not recognize sub-command {other}")));
        }
    }
    Ok(Flow::Next)
}

/// Resolve a possibly negative list index.
fn list_index(idx: &str, len: usize) -> Result<usize> {
    let out_of_range = || {
        ScriptError::domain(format!(
            "list index: {idx} out of range (-{len}, {})",
            len as i64 - 1
        ))
    };
    let n: i64 = idx.trim().parse().map_err(|_| out_of_range())?;
    let resolved = if n < 0 { len as i64 + n } else { n };
    if resolved < 0 || resolved >= len as i64 {
        return Err(out_of_range());
    }
    Ok(resolved as usize)
}

// ── message ───────────────────────────────────────────────────────────────────

const MESSAGE_MODES: &[&str] = &[
    "STATUS", "WARNING", "AUTHOR_WARNING", "DEPRECATION", "FATAL_ERROR", "SEND_ERROR", "NOTICE",
    "VERBOSE", "DEBUG", "TRACE",
];

fn cmd_message(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let (mode, words) = match b.positional.split_first() {
        Some((first, rest)) if MESSAGE_MODES.contains(&first.as_str()) => (first.as_str(), rest),
        _ => ("", &b.positional[..]),
    };
    let text = words.join(" ");
    match mode {
        "STATUS" => interp.output.push(format!("-- {text}")),
        "VERBOSE" | "DEBUG" | "TRACE" => debug!(target: "cmk::message", "{text}"),
        "WARNING" | "AUTHOR_WARNING" | "DEPRECATION" => {
            warn!("{text}");
            let header = match mode {
                "WARNING" => "CMake Warning:",
                "AUTHOR_WARNING" => "CMake Warning (dev):",
                _ => "CMake Deprecation Warning:",
            };
            interp.diagnostics.push(format!("{header}\n{}", indent(&text)));
        }
        "SEND_ERROR" => {
            warn!(count = interp.send_errors + 1, "{text}");
            interp.send_errors += 1;
            interp.diagnostics.push(format!("CMake Error:\n{}", indent(&text)));
        }
        "FATAL_ERROR" => return Err(ScriptError::domain(text)),
        _ => interp.output.push(text),
    }
    Ok(Flow::Next)
}

/// Indent every non-empty line by two spaces.
pub(crate) fn indent(text: &str) -> String {
    text.lines()
        .map(|l| if l.is_empty() { String::new() } else { format!("  {l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── project ───────────────────────────────────────────────────────────────────

fn cmd_project(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let name = positional(b, 0, "project")?.to_owned();
    let version = value_of(interp, b, "VERSION").unwrap_or_default();
    let description = value_of(interp, b, "DESCRIPTION").unwrap_or_default();
    let homepage = value_of(interp, b, "HOMEPAGE_URL").unwrap_or_default();
    let mut languages: Vec<String> = b.positional[1..].to_vec();
    languages.extend(values_of(interp, b, "LANGUAGES"));
    if languages.is_empty() {
        languages = vec!["C".to_owned(), "CXX".to_owned()];
    }
    languages.retain(|l| l != "NONE");

    let components = if version.is_empty() {
        Vec::new()
    } else {
        parse_version(&version).ok_or_else(|| {
            ScriptError::domain(format!("VERSION \"{version}\" format invalid."))
        })?
    };

    export(interp, "PROJECT_NAME", name.as_str());
    if interp.var("CMAKE_PROJECT_NAME").is_none() {
        export(interp, "CMAKE_PROJECT_NAME", name.as_str());
    }
    for prefix in ["PROJECT".to_owned(), name.clone()] {
        export(interp, &format!("{prefix}_VERSION"), version.as_str());
        for (i, part) in ["MAJOR", "MINOR", "PATCH", "TWEAK"].iter().enumerate() {
            let v = components.get(i).map(u64::to_string).unwrap_or_default();
            export(interp, &format!("{prefix}_VERSION_{part}"), v);
        }
        if let Some(src) = interp.var("CMAKE_CURRENT_SOURCE_DIR") {
            export(interp, &format!("{prefix}_SOURCE_DIR"), src);
        }
        if let Some(bin) = interp.var("CMAKE_CURRENT_BINARY_DIR") {
            export(interp, &format!("{prefix}_BINARY_DIR"), bin);
        }
    }
    export(interp, "PROJECT_DESCRIPTION", description.as_str());
    export(interp, "PROJECT_HOMEPAGE_URL", homepage.as_str());

    debug!(project = %name, version = %version, "project");
    let p = &mut interp.project;
    p.name = Some(name);
    p.version = Some(version);
    p.description = Some(description);
    p.homepage = Some(homepage);
    p.languages = languages;
    Ok(Flow::Next)
}

// ── Targets ───────────────────────────────────────────────────────────────────

fn cmd_add_library(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let name = positional(b, 0, "add_library")?;
    if let Some(real) = value_of(interp, b, "ALIAS") {
        return add_alias(interp, "add_library", name, real);
    }
    let explicit = ["STATIC", "SHARED", "MODULE", "INTERFACE", "OBJECT"]
        .into_iter()
        .find(|f| has(interp, b, f))
        .and_then(LibraryType::parse);
    let ty = explicit.unwrap_or_else(|| {
        if interp.var("BUILD_SHARED_LIBS").is_some_and(|v| is_truthy(&v)) {
            LibraryType::Shared
        } else {
            LibraryType::Static
        }
    });
    let mut target = Target::new(name, TargetKind::Library(ty));
    target.imported = has(interp, b, "IMPORTED");
    target.sources = b.positional[1..].to_vec();
    interp
        .project
        .add_target(target)
        .map_err(|e| ScriptError::domain(format!("add_library {e}")))?;
    Ok(Flow::Next)
}

fn cmd_add_executable(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let name = positional(b, 0, "add_executable")?;
    if let Some(real) = value_of(interp, b, "ALIAS") {
        return add_alias(interp, "add_executable", name, real);
    }
    let mut target = Target::new(name, TargetKind::Executable);
    target.imported = has(interp, b, "IMPORTED");
    target.sources = b.positional[1..].to_vec();
    interp
        .project
        .add_target(target)
        .map_err(|e| ScriptError::domain(format!("add_executable {e}")))?;
    Ok(Flow::Next)
}

fn add_alias(interp: &mut Interpreter, command: &str, name: &str, real: String) -> Result<Flow> {
    if interp.project.target(&real).is_none() {
        return Err(ScriptError::domain(format!(
            "{command} cannot create ALIAS target \"{name}\" because target \"{real}\" does not exist."
        )));
    }
    interp
        .project
        .add_target(Target::new(name, TargetKind::Alias(real)))
        .map_err(|e| ScriptError::domain(format!("{command} {e}")))?;
    Ok(Flow::Next)
}

/// Items grouped by visibility; plain items count as `PUBLIC`.
fn by_visibility(interp: &Interpreter, b: &BoundArgs) -> Vec<(Visibility, String)> {
    let mut out: Vec<(Visibility, String)> =
        b.positional[1..].iter().map(|i| (Visibility::Public, i.clone())).collect();
    for vis in Visibility::ALL {
        for item in values_of(interp, b, vis.as_str()) {
            out.push((vis, item));
        }
    }
    out
}

fn cmd_target_include_directories(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let name = positional(b, 0, "target_include_directories")?;
    let dirs = by_visibility(interp, b);
    let Some(target) = interp.project.target_mut(name) else {
        return Err(ScriptError::domain(format!(
            "Cannot specify include directories for target \"{name}\" which is not built by this project."
        )));
    };
    if has_flag(b, "BEFORE") {
        let mut merged = dirs;
        merged.append(&mut target.include_dirs);
        target.include_dirs = merged;
    } else {
        target.include_dirs.extend(dirs);
    }
    Ok(Flow::Next)
}

fn cmd_target_link_libraries(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let name = positional(b, 0, "target_link_libraries")?;
    let libs = by_visibility(interp, b);
    let Some(target) = interp.project.target_mut(name) else {
        return Err(ScriptError::domain(format!(
            "Cannot specify link libraries for target \"{name}\" which is not built by this project."
        )));
    };
    target.link_libraries.extend(libs);
    Ok(Flow::Next)
}

/// Flag check straight from the bound arguments, for use while the project
/// record is mutably borrowed.
fn has_flag(b: &BoundArgs, flag: &str) -> bool {
    b.keyword(flag) == Some("TRUE")
}

// ── get_filename_component ────────────────────────────────────────────────────

fn cmd_get_filename_component(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let var = positional(b, 0, "get_filename_component")?;
    let raw = positional(b, 1, "get_filename_component")?;
    let path = Path::new(raw);
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    let result = if has(interp, b, "DIRECTORY") || has(interp, b, "PATH") {
        path.parent().map(display).unwrap_or_default()
    } else if has(interp, b, "NAME") {
        file_name
    } else if has(interp, b, "EXT") {
        file_name.find('.').map(|i| file_name[i..].to_owned()).unwrap_or_default()
    } else if has(interp, b, "NAME_WE") {
        file_name.split('.').next().unwrap_or_default().to_owned()
    } else if has(interp, b, "LAST_EXT") {
        file_name.rfind('.').map(|i| file_name[i..].to_owned()).unwrap_or_default()
    } else if has(interp, b, "NAME_WLE") {
        match file_name.rfind('.') {
            Some(i) => file_name[..i].to_owned(),
            None => file_name,
        }
    } else if has(interp, b, "ABSOLUTE") || has(interp, b, "REALPATH") {
        let base = match value_of(interp, b, "BASE_DIR") {
            Some(d) => PathBuf::from(d),
            None => interp.current_source_dir(),
        };
        let abs = if path.is_absolute() { normalize(path) } else { normalize(&base.join(path)) };
        let abs = if has(interp, b, "REALPATH") {
            interp.host.canonicalize(&abs).unwrap_or(abs)
        } else {
            abs
        };
        display(&abs)
    } else {
        raw.to_owned()
    };

    if has(interp, b, "CACHE") {
        if !interp.cache.contains_key(var) {
            interp.cache.insert(var.to_owned(), CacheEntry::new(result, "STRING"));
        }
    } else {
        export(interp, var, result);
    }
    Ok(Flow::Next)
}

// ── Policies and versions ─────────────────────────────────────────────────────

fn cmd_cmake_policy(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    match positional(b, 0, "cmake_policy")? {
        "PUSH" => interp.policies.push(),
        "POP" => interp.policies.pop()?,
        "SET" => {
            let id = positional(b, 1, "cmake_policy SET")?;
            let value = positional(b, 2, "cmake_policy SET")?;
            interp.policies.set(id, value)?;
        }
        "GET" => {
            let id = positional(b, 1, "cmake_policy GET")?;
            let var = positional(b, 2, "cmake_policy GET")?;
            let setting = interp.policies.get(id)?.map(|s| s.to_string()).unwrap_or_default();
            export(interp, var, setting);
        }
        "VERSION" => {
            let v = positional(b, 1, "cmake_policy VERSION")?;
            interp.policies.set_version(v);
        }
        other => {
            return Err(ScriptError::domain(format!(
                "cmake_policy given unknown first argument \"{other}\""
            )));
        }
    }
    Ok(Flow::Next)
}

fn cmd_cmake_minimum_required(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let Some(spec) = value_of(interp, b, "VERSION") else {
        return Err(ScriptError::domain("cmake_minimum_required called with no VERSION"));
    };
    let min = spec.split("...").next().unwrap_or_default();
    let Some(wanted) = parse_version(min) else {
        return Err(ScriptError::domain(format!(
            "Invalid policy version value \"{spec}\".  A numeric major.minor[.patch[.tweak]] must be given."
        )));
    };
    let (major, minor, patch) = CMAKE_VERSION;
    let running = [u64::from(major), u64::from(minor), u64::from(patch)];
    if compare_versions(&wanted, &running) == std::cmp::Ordering::Greater {
        return Err(ScriptError::domain(format!(
            "CMake {min} or higher is required.  You are running version {major}.{minor}.{patch}"
        )));
    }
    export(interp, "CMAKE_MINIMUM_REQUIRED_VERSION", min);
    interp.policies.set_version(min);
    Ok(Flow::Next)
}

// ── option / include / mark_as_advanced ───────────────────────────────────────

fn cmd_option(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let name = positional(b, 0, "option")?;
    let doc = b.positional.get(1).cloned().unwrap_or_default();
    let value = b.positional.get(2).cloned().unwrap_or_else(|| "OFF".to_owned());

    if interp.scope.contains(name) && !interp.cache.contains_key(name) {
        // A normal variable already decides the option.
        return Ok(Flow::Next);
    }
    match interp.cache.get_mut(name) {
        Some(existing) => {
            if existing.ty == "UNINITIALIZED" {
                existing.ty = "BOOL".to_owned();
                existing.doc = doc;
            }
        }
        None => {
            interp.cache.insert(name.to_owned(), CacheEntry { value, ty: "BOOL".to_owned(), doc });
        }
    }
    Ok(Flow::Next)
}

fn cmd_include(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let file = positional(b, 0, "include")?;
    let result_var = value_of(interp, b, "RESULT_VARIABLE");
    let found = resolve_include(interp, file);

    let Some(path) = found else {
        if let Some(var) = &result_var {
            export(interp, var, "NOTFOUND");
        }
        if has(interp, b, "OPTIONAL") {
            return Ok(Flow::Next);
        }
        return Err(ScriptError::domain(format!(
            "include could not find requested file:\n\n  {file}"
        )));
    };

    let source = interp
        .host
        .read_to_string(&path)
        .map_err(|e| ScriptError::io(format!("include cannot read \"{}\": {e}", display(&path))))?;
    if let Some(var) = &result_var {
        export(interp, var, display(&path));
    }
    Ok(Flow::Include { path, source })
}

/// A bare module name is looked up as `<name>.cmake` in
/// `CMAKE_MODULE_PATH`; anything else is a path relative to the current
/// source directory.
fn resolve_include(interp: &Interpreter, file: &str) -> Option<PathBuf> {
    let path = Path::new(file);
    if path.is_absolute() {
        return interp.host.exists(path).then(|| normalize(path));
    }
    if !file.contains('/') && !file.ends_with(".cmake") {
        for dir in interp.list_of("CMAKE_MODULE_PATH") {
            let candidate = Path::new(&dir).join(format!("{file}.cmake"));
            if interp.host.exists(&candidate) && !interp.host.is_dir(&candidate) {
                return Some(interp.host.absolute(&candidate));
            }
        }
    }
    let candidate = interp.current_source_dir().join(path);
    (interp.host.exists(&candidate) && !interp.host.is_dir(&candidate))
        .then(|| interp.host.absolute(&candidate))
}

fn cmd_mark_as_advanced(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let clear = has(interp, b, "CLEAR");
    for name in &b.positional {
        if clear {
            interp.project.advanced.remove(name);
        } else {
            interp.project.advanced.insert(name.clone());
        }
    }
    Ok(Flow::Next)
}

fn cmd_break(_: &mut Interpreter, _: &BoundArgs) -> Result<Flow> {
    Ok(Flow::Break)
}

fn cmd_continue(_: &mut Interpreter, _: &BoundArgs) -> Result<Flow> {
    Ok(Flow::Continue)
}

fn cmd_return(_: &mut Interpreter, _: &BoundArgs) -> Result<Flow> {
    Ok(Flow::Return)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
