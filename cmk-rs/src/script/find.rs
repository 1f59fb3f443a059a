//! Path discovery: `find_path`, `find_library`, `find_program` and
//! `find_package`.
//!
//! Searches only ask the [`Host`](crate::host::Host) whether candidates
//! exist.  A located package file is read and handed back to the
//! interpreter as [`Flow::Include`] so it runs in the caller's scope.
//!
//! Search order for `find_path` / `find_library` / `find_program`:
//!
//! 1. `CMAKE_PREFIX_PATH` (variable, then environment), as `<prefix>/include`,
//!    `<prefix>/lib` or `<prefix>/bin`;
//! 2. `HINTS`;
//! 3. the `PATH` environment variable (`find_program` only);
//! 4. platform default prefixes;
//! 5. `PATHS`.
//!
//! `NO_DEFAULT_PATH` keeps only `HINTS` and `PATHS`.  Each directory is
//! tried with every `PATH_SUFFIXES` entry appended before it is tried alone.

use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::config::{CacheEntry, Platform};
use crate::error::{Result, ScriptError};
use crate::host::display;

use super::args::{BoundArgs, Keywords};
use super::builtins::{export, has, indent, parse_version, value_of, values_of, Flow};
use super::interp::Interpreter;
use super::value::{split_list, Value};

pub(crate) const FIND_KEYWORDS: Keywords = Keywords {
    flags: &[
        "REQUIRED",
        "QUIET",
        "NO_DEFAULT_PATH",
        "NO_CACHE",
        "NAMES_PER_DIR",
        "NO_CMAKE_PATH",
        "NO_CMAKE_ENVIRONMENT_PATH",
        "NO_SYSTEM_ENVIRONMENT_PATH",
    ],
    single: &["DOC"],
    multi: &["NAMES", "HINTS", "PATHS", "PATH_SUFFIXES"],
};

pub(crate) const PACKAGE_KEYWORDS: Keywords = Keywords {
    flags: &[
        "EXACT",
        "QUIET",
        "REQUIRED",
        "CONFIG",
        "NO_MODULE",
        "MODULE",
        "NO_DEFAULT_PATH",
        "NO_POLICY_SCOPE",
        "GLOBAL",
    ],
    single: &[],
    multi: &["COMPONENTS", "OPTIONAL_COMPONENTS", "HINTS", "PATHS"],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FindKind {
    Path,
    Library,
    Program,
}

impl FindKind {
    fn command(self) -> &'static str {
        match self {
            FindKind::Path => "find_path",
            FindKind::Library => "find_library",
            FindKind::Program => "find_program",
        }
    }

    fn cache_type(self) -> &'static str {
        match self {
            FindKind::Path => "PATH",
            FindKind::Library | FindKind::Program => "FILEPATH",
        }
    }

    /// Subdirectories searched under each prefix.
    fn prefix_subdirs(self) -> &'static [&'static str] {
        match self {
            FindKind::Path => &["include"],
            FindKind::Library => &["lib", "lib64"],
            FindKind::Program => &["bin", "sbin"],
        }
    }

    /// File names tried for one requested name.
    fn file_names(self, platform: Platform, name: &str) -> Vec<String> {
        match self {
            FindKind::Path => vec![name.to_owned()],
            FindKind::Library => library_names(platform, name),
            FindKind::Program => {
                if platform == Platform::Windows && Path::new(name).extension().is_none() {
                    vec![format!("{name}.exe"), name.to_owned()]
                } else {
                    vec![name.to_owned()]
                }
            }
        }
    }
}

/// Candidate file names for `find_library(... NAMES name)`.  A name that
/// already carries a library extension is used verbatim.
fn library_names(platform: Platform, name: &str) -> Vec<String> {
    const EXTENSIONS: &[&str] = &[".so", ".a", ".dylib", ".tbd", ".lib", ".dll"];
    if EXTENSIONS.iter().any(|ext| name.ends_with(ext)) || name.contains(".so.") {
        return vec![name.to_owned()];
    }
    match platform {
        Platform::Windows => vec![format!("{name}.lib"), format!("lib{name}.lib"), format!("lib{name}.a")],
        Platform::MacOs | Platform::Ios => vec![
            format!("lib{name}.dylib"),
            format!("lib{name}.tbd"),
            format!("lib{name}.a"),
        ],
        Platform::Linux | Platform::Android | Platform::Other => {
            vec![format!("lib{name}.so"), format!("lib{name}.a")]
        }
    }
}

/// Separator of list-valued environment variables such as `PATH`.
fn env_separator(platform: Platform) -> char {
    if platform == Platform::Windows {
        ';'
    } else {
        ':'
    }
}

fn already_found(value: &str) -> bool {
    !value.is_empty() && !value.ends_with("NOTFOUND")
}

/// Store a search result in the cache (or, with `no_cache`, as a normal
/// variable).  A normal variable of the same name is updated as well so it
/// cannot shadow the new entry.
pub(crate) fn store_result(
    interp: &mut Interpreter,
    var: &str,
    value: String,
    ty: &str,
    doc: String,
    no_cache: bool,
) {
    if no_cache {
        export(interp, var, value);
        return;
    }
    if interp.scope.contains(var) {
        export(interp, var, value.as_str());
    }
    interp.cache.insert(var.to_owned(), CacheEntry { value, ty: ty.to_owned(), doc });
}

// ── CMAKE_PREFIX_PATH and platform defaults ───────────────────────────────────

fn prefix_path(interp: &Interpreter) -> Vec<String> {
    let mut out = interp.list_of("CMAKE_PREFIX_PATH");
    if let Some(env) = interp.env.get("CMAKE_PREFIX_PATH") {
        let sep = env_separator(interp.platform);
        out.extend(env.split(sep).filter(|p| !p.is_empty()).map(str::to_owned));
    }
    out
}

fn runtime_prefix(interp: &Interpreter) -> Option<String> {
    interp.var("CMAKE_RUNTIME_PREFIX").filter(|p| !p.is_empty())
}

fn default_prefixes(interp: &Interpreter) -> Vec<PathBuf> {
    let fixed: &[&str] = match interp.platform {
        Platform::Linux | Platform::Other => &["/usr/local", "/usr"],
        Platform::MacOs => &["/usr/local", "/opt/homebrew", "/usr"],
        Platform::Windows => &["C:/Program Files", "C:/Program Files (x86)"],
        Platform::Ios | Platform::Android => &[],
    };
    let mut out: Vec<PathBuf> = fixed.iter().map(PathBuf::from).collect();
    if matches!(interp.platform, Platform::Ios | Platform::Android) {
        out.extend(runtime_prefix(interp).map(PathBuf::from));
    }
    out
}

// ── find_path / find_library / find_program ───────────────────────────────────

pub(crate) fn cmd_find_path(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    find_file_like(interp, b, FindKind::Path)
}

pub(crate) fn cmd_find_library(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    find_file_like(interp, b, FindKind::Library)
}

pub(crate) fn cmd_find_program(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    find_file_like(interp, b, FindKind::Program)
}

fn find_file_like(interp: &mut Interpreter, b: &BoundArgs, kind: FindKind) -> Result<Flow> {
    let Some(var) = b.positional.first().cloned() else {
        return Err(ScriptError::domain(format!(
            "{} called with incorrect number of arguments",
            kind.command()
        )));
    };
    if interp.var(&var).is_some_and(|v| already_found(&v)) {
        trace!(var = %var, "already found");
        return Ok(Flow::Next);
    }

    let mut names = values_of(interp, b, "NAMES");
    let mut paths = values_of(interp, b, "PATHS");
    if b.keyword("NAMES").is_none() {
        // find_xxx(var name [paths...])
        names.extend(b.positional.get(1).cloned());
        paths.extend(b.positional.iter().skip(2).cloned());
    }
    if names.is_empty() {
        return Err(ScriptError::domain(format!("{} called without a name to search for", kind.command())));
    }

    let dirs = with_suffixes(search_dirs(interp, b, kind, &paths), &values_of(interp, b, "PATH_SUFFIXES"));
    let view: &Interpreter = interp;
    let found = if has(view, b, "NAMES_PER_DIR") {
        dirs.iter().find_map(|dir| names.iter().find_map(|n| probe(view, kind, dir, n)))
    } else {
        names.iter().find_map(|n| dirs.iter().find_map(|dir| probe(view, kind, dir, n)))
    };

    let no_cache = has(interp, b, "NO_CACHE");
    let doc = value_of(interp, b, "DOC").unwrap_or_default();
    match found {
        Some(path) => {
            let value = display(&path);
            debug!(command = kind.command(), var = %var, found = %value, "search succeeded");
            store_result(interp, &var, value, kind.cache_type(), doc, no_cache);
            Ok(Flow::Next)
        }
        None => {
            debug!(command = kind.command(), var = %var, searched = dirs.len(), "search failed");
            store_result(interp, &var, format!("{var}-NOTFOUND"), kind.cache_type(), doc, no_cache);
            if has(interp, b, "REQUIRED") {
                let what = if kind == FindKind::Path { "files" } else { "names" };
                return Err(ScriptError::domain(format!(
                    "Could not find {var} using the following {what}: {}",
                    names.join(", ")
                )));
            }
            Ok(Flow::Next)
        }
    }
}

fn search_dirs(interp: &Interpreter, b: &BoundArgs, kind: FindKind, paths: &[String]) -> Vec<PathBuf> {
    let defaults = !has(interp, b, "NO_DEFAULT_PATH");
    let mut dirs = Vec::new();
    let under = |prefix: &Path, dirs: &mut Vec<PathBuf>| {
        dirs.extend(kind.prefix_subdirs().iter().map(|sub| prefix.join(sub)));
    };

    if defaults && !has(interp, b, "NO_CMAKE_PATH") {
        for prefix in prefix_path(interp) {
            under(Path::new(&prefix), &mut dirs);
        }
    }
    dirs.extend(values_of(interp, b, "HINTS").into_iter().map(PathBuf::from));
    if defaults {
        if kind == FindKind::Program && !has(interp, b, "NO_SYSTEM_ENVIRONMENT_PATH") {
            if let Some(path) = interp.env.get("PATH") {
                let sep = env_separator(interp.platform);
                dirs.extend(path.split(sep).filter(|p| !p.is_empty()).map(PathBuf::from));
            }
        }
        for prefix in default_prefixes(interp) {
            under(&prefix, &mut dirs);
        }
    }
    dirs.extend(paths.iter().map(PathBuf::from));
    dirs
}

fn with_suffixes(dirs: Vec<PathBuf>, suffixes: &[String]) -> Vec<PathBuf> {
    if suffixes.is_empty() {
        return dirs;
    }
    let mut out = Vec::with_capacity(dirs.len() * (suffixes.len() + 1));
    for dir in dirs {
        out.extend(suffixes.iter().map(|s| dir.join(s)));
        out.push(dir);
    }
    out
}

/// Look for `name` in `dir`.  `find_path` yields the directory, the other
/// searches the file itself.
fn probe(interp: &Interpreter, kind: FindKind, dir: &Path, name: &str) -> Option<PathBuf> {
    for file in kind.file_names(interp.platform, name) {
        let candidate = dir.join(&file);
        if !interp.host.exists(&candidate) {
            continue;
        }
        match kind {
            FindKind::Path => return Some(interp.host.absolute(dir)),
            _ if interp.host.is_dir(&candidate) => continue,
            _ => return Some(interp.host.absolute(&candidate)),
        }
    }
    None
}

// ── find_package ──────────────────────────────────────────────────────────────

pub(crate) fn cmd_find_package(interp: &mut Interpreter, b: &BoundArgs) -> Result<Flow> {
    let Some(name) = b.positional.first().cloned() else {
        return Err(ScriptError::domain("find_package called with incorrect number of arguments"));
    };

    let mut version = String::new();
    let mut components = values_of(interp, b, "COMPONENTS");
    for (i, item) in b.positional.iter().enumerate().skip(1) {
        if i == 1 && parse_version(item).is_some() {
            version = item.clone();
        } else {
            components.push(item.clone());
        }
    }
    let required = has(interp, b, "REQUIRED");
    let quiet = has(interp, b, "QUIET");
    let flag = |on: bool| if on { "1" } else { "0" };

    export(interp, &format!("{name}_FIND_REQUIRED"), flag(required));
    export(interp, &format!("{name}_FIND_QUIETLY"), flag(quiet));
    let exact = has(interp, b, "EXACT");
    export(interp, &format!("{name}_FIND_VERSION_EXACT"), flag(exact));
    export(interp, &format!("{name}_FIND_VERSION"), version.as_str());
    if let Some(parts) = parse_version(&version) {
        for (i, part) in ["MAJOR", "MINOR", "PATCH", "TWEAK"].iter().enumerate() {
            let v = parts.get(i).map(u64::to_string).unwrap_or_else(|| "0".to_owned());
            export(interp, &format!("{name}_FIND_VERSION_{part}"), v);
        }
    }
    export(interp, &format!("{name}_FIND_COMPONENTS"), Value::from_list(&components));

    let config_only = has(interp, b, "CONFIG") || has(interp, b, "NO_MODULE");
    if !config_only {
        if let Some(module) = find_module(interp, &name) {
            let shown = display(&module);
            debug!(package = %name, module = %shown, "using find module");
            return include(interp, module);
        }
        if has(interp, b, "MODULE") {
            return package_not_found(interp, &name, required, quiet);
        }
    }

    let file_names = config_file_names(&name);
    for dir in package_dirs(interp, b, &name) {
        for file in &file_names {
            let path = dir.join(file);
            if !interp.host.exists(&path) || interp.host.is_dir(&path) {
                continue;
            }
            let dir = display(&interp.host.absolute(&dir));
            let config = interp.host.absolute(&path);
            let shown = display(&config);
            debug!(package = %name, config = %shown, "found package configuration");
            let doc = format!("The directory containing a CMake configuration file for {name}.");
            store_result(interp, &format!("{name}_DIR"), dir, "PATH", doc, false);
            export(interp, &format!("{name}_CONFIG"), shown);
            export(interp, &format!("{name}_FOUND"), "TRUE");
            return include(interp, config);
        }
    }
    package_not_found(interp, &name, required, quiet)
}

fn include(interp: &Interpreter, path: PathBuf) -> Result<Flow> {
    let source = interp
        .host
        .read_to_string(&path)
        .map_err(|e| ScriptError::io(format!("find_package cannot read \"{}\": {e}", display(&path))))?;
    Ok(Flow::Include { path, source })
}

fn find_module(interp: &Interpreter, name: &str) -> Option<PathBuf> {
    interp.list_of("CMAKE_MODULE_PATH").into_iter().find_map(|dir| {
        let candidate = Path::new(&dir).join(format!("Find{name}.cmake"));
        (interp.host.exists(&candidate) && !interp.host.is_dir(&candidate))
            .then(|| interp.host.absolute(&candidate))
    })
}

pub(crate) fn config_file_names(name: &str) -> Vec<String> {
    let lower = name.to_ascii_lowercase();
    let mut names = vec![format!("{name}Config.cmake"), format!("{lower}-config.cmake")];
    if lower != name {
        names.push(format!("{name}-config.cmake"));
    }
    names
}

/// Config-mode directory candidates, in search order.
fn package_dirs(interp: &Interpreter, b: &BoundArgs, name: &str) -> Vec<PathBuf> {
    let defaults = !has(interp, b, "NO_DEFAULT_PATH");
    let mut dirs = Vec::new();
    if let Some(dir) = interp.var(&format!("{name}_DIR")).filter(|d| already_found(d)) {
        dirs.push(PathBuf::from(dir));
    }

    let mut prefixes = Vec::new();
    if defaults {
        let root_var = format!("{name}_ROOT");
        if let Some(root) = interp.var(&root_var).or_else(|| interp.env.get(&root_var).cloned()) {
            prefixes.extend(split_list(&root).into_iter().map(str::to_owned));
        }
    }
    prefixes.extend(values_of(interp, b, "HINTS"));
    if defaults {
        prefixes.extend(prefix_path(interp));
    }
    prefixes.extend(values_of(interp, b, "PATHS"));
    for prefix in prefixes.iter().filter(|p| !p.is_empty()) {
        let p = Path::new(prefix);
        dirs.push(p.join("lib").join("cmake").join(name));
        dirs.push(p.join("share").join("cmake").join(name));
        dirs.push(p.to_path_buf());
    }

    if defaults {
        dirs.extend(platform_package_dirs(interp, name));
    }
    dirs
}

fn platform_package_dirs(interp: &Interpreter, name: &str) -> Vec<PathBuf> {
    let under = |prefix: &str| PathBuf::from(format!("{prefix}/{name}"));
    match interp.platform {
        Platform::Windows => vec![
            PathBuf::from(format!("C:/Program Files/{name}/lib/cmake/{name}")),
            PathBuf::from(format!("C:/Program Files (x86)/{name}/lib/cmake/{name}")),
        ],
        Platform::Linux => vec![
            under("/usr/lib/cmake"),
            under("/usr/local/lib/cmake"),
            under("/usr/share/cmake"),
        ],
        Platform::MacOs => vec![
            under("/usr/local/lib/cmake"),
            under("/opt/homebrew/lib/cmake"),
            under("/usr/lib/cmake"),
        ],
        Platform::Ios => match runtime_prefix(interp) {
            Some(prefix) => vec![under(&format!("{prefix}/cmake"))],
            None => vec![under("cmake")],
        },
        Platform::Android => match runtime_prefix(interp) {
            Some(prefix) => vec![under(&format!("{prefix}/cmake"))],
            None => vec![under("assets/cmake")],
        },
        Platform::Other => vec![PathBuf::from(format!("{name}/lib/cmake/{name}"))],
    }
}

fn package_not_found(interp: &mut Interpreter, name: &str, required: bool, quiet: bool) -> Result<Flow> {
    export(interp, &format!("{name}_FOUND"), "FALSE");
    let dir_var = format!("{name}_DIR");
    if interp.var(&dir_var).is_none() {
        let doc = format!("The directory containing a CMake configuration file for {name}.");
        store_result(interp, &dir_var, format!("{name}_DIR-NOTFOUND"), "PATH", doc, false);
    }

    let message = not_found_message(name);
    if required {
        return Err(ScriptError::domain(message));
    }
    if !quiet {
        warn!(package = %name, "package configuration not found");
        interp.diagnostics.push(format!("CMake Warning:\n{}", indent(&message)));
    }
    Ok(Flow::Next)
}

fn not_found_message(name: &str) -> String {
    let names = config_file_names(name);
    let listed: Vec<String> = names.iter().take(2).map(|n| format!("  {n}")).collect();
    format!(
        "By not providing \"Find{name}.cmake\" in CMAKE_MODULE_PATH this project has\n\
         asked CMake to find a package configuration file provided by \"{name}\", but\n\
         CMake did not find one.\n\
         \n\
         Could not find a package configuration file provided by \"{name}\" with any of\n\
         the following names:\n\
         \n\
         {}\n\
         \n\
         Add the installation prefix of \"{name}\" to CMAKE_PREFIX_PATH or set \"{name}_DIR\"\n\
         to a directory containing one of the above files.  If \"{name}\" provides a\n\
         separate development package or SDK, be sure it has been installed.",
        listed.join("\n")
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::host::MemoryHost;

    fn interp_with(host: MemoryHost, env: &[(&str, &str)]) -> Interpreter {
        Interpreter::with_host(host)
            .with_platform(Platform::Linux)
            .with_env(env.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    fn run(host: MemoryHost, src: &str) -> Interpreter {
        let mut i = interp_with(host, &[]);
        i.run_str(src).unwrap_or_else(|e| panic!("{e}"));
        i
    }

    #[test]
    fn library_name_candidates() {
        assert_eq!(library_names(Platform::Linux, "z"), vec!["libz.so", "libz.a"]);
        assert_eq!(library_names(Platform::Windows, "z")[0], "z.lib");
        assert_eq!(library_names(Platform::MacOs, "z")[0], "libz.dylib");
        assert_eq!(library_names(Platform::Linux, "libz.so.1"), vec!["libz.so.1"]);
        assert_eq!(
            FindKind::Program.file_names(Platform::Windows, "ninja"),
            vec!["ninja.exe", "ninja"]
        );
    }

    #[test]
    fn find_path_with_hints_and_suffixes() {
        let host = MemoryHost::new().with_file("/opt/zlib/include/zlib/zlib.h", "");
        let i = run(host, "find_path(ZLIB_INCLUDE_DIR NAMES zlib.h HINTS /opt/zlib/include PATH_SUFFIXES zlib)");
        assert_eq!(i.var("ZLIB_INCLUDE_DIR").as_deref(), Some("/opt/zlib/include/zlib"));
        let entry = i.cache_entry("ZLIB_INCLUDE_DIR").unwrap();
        assert_eq!(entry.ty, "PATH");
    }

    #[test]
    fn short_form_and_defaults() {
        let host = MemoryHost::new()
            .with_file("/custom/inc/foo.h", "")
            .with_file("/usr/include/bar.h", "")
            .with_file("/usr/lib/libm.so", "");
        let i = run(
            host,
            "find_path(FOO_DIR foo.h /custom/inc)\nfind_path(BAR_DIR bar.h)\nfind_library(M_LIB m)",
        );
        assert_eq!(i.var("FOO_DIR").as_deref(), Some("/custom/inc"));
        assert_eq!(i.var("BAR_DIR").as_deref(), Some("/usr/include"));
        assert_eq!(i.var("M_LIB").as_deref(), Some("/usr/lib/libm.so"));
    }

    #[test]
    fn no_default_path_skips_system_dirs() {
        let host = MemoryHost::new().with_file("/usr/include/bar.h", "");
        let i = run(host, "find_path(BAR_DIR bar.h NO_DEFAULT_PATH)");
        assert_eq!(i.var("BAR_DIR").as_deref(), Some("BAR_DIR-NOTFOUND"));
    }

    #[test]
    fn prefix_path_is_searched_first() {
        let host = MemoryHost::new()
            .with_file("/deps/lib/libz.a", "")
            .with_file("/usr/lib/libz.so", "");
        let i = run(host, "set(CMAKE_PREFIX_PATH /deps)\nfind_library(Z_LIB NAMES z)");
        assert_eq!(i.var("Z_LIB").as_deref(), Some("/deps/lib/libz.a"));
    }

    #[test]
    fn missing_result_and_required() {
        let i = run(MemoryHost::new(), "find_library(NOPE_LIB NAMES nope DOC \"the nope library\")");
        assert_eq!(i.var("NOPE_LIB").as_deref(), Some("NOPE_LIB-NOTFOUND"));
        assert_eq!(i.cache_entry("NOPE_LIB").unwrap().doc, "the nope library");

        let e = interp_with(MemoryHost::new(), &[])
            .run_str("find_program(TOOL NAMES a b REQUIRED)")
            .unwrap_err();
        assert_eq!(e.kind, ErrorKind::Domain);
        assert_eq!(e.message, "Could not find TOOL using the following names: a, b");
    }

    #[test]
    fn found_variable_is_left_alone() {
        let host = MemoryHost::new().with_file("/usr/include/foo.h", "");
        let i = run(host, "set(FOO_DIR /mine)\nfind_path(FOO_DIR foo.h)");
        assert_eq!(i.var("FOO_DIR").as_deref(), Some("/mine"));
        assert!(i.cache_entry("FOO_DIR").is_none());
    }

    #[test]
    fn notfound_variable_is_searched_again() {
        let host = MemoryHost::new().with_file("/usr/include/foo.h", "");
        let i = run(host, "set(FOO_DIR FOO_DIR-NOTFOUND)\nfind_path(FOO_DIR foo.h)");
        assert_eq!(i.var("FOO_DIR").as_deref(), Some("/usr/include"));
    }

    #[test]
    fn no_cache_sets_normal_variable() {
        let host = MemoryHost::new().with_file("/usr/include/foo.h", "");
        let i = run(host, "function(f)\n  find_path(FOO_DIR foo.h NO_CACHE)\n  set(OUT ${FOO_DIR} PARENT_SCOPE)\nendfunction()\nf()");
        assert_eq!(i.var("OUT").as_deref(), Some("/usr/include"));
        assert!(i.cache_entry("FOO_DIR").is_none());
    }

    #[test]
    fn find_program_uses_path_env() {
        let host = MemoryHost::new()
            .with_file("/tools/bin/ninja", "")
            .with_file("/usr/bin/ninja", "");
        let mut i = interp_with(host, &[("PATH", "/tools/bin:/usr/bin")]);
        i.run_str("find_program(NINJA ninja)").unwrap();
        assert_eq!(i.var("NINJA").as_deref(), Some("/tools/bin/ninja"));
        assert_eq!(i.cache_entry("NINJA").unwrap().ty, "FILEPATH");
    }

    #[test]
    fn package_through_prefix_path() {
        let host = MemoryHost::new().with_file(
            "/deps/lib/cmake/Foo/FooConfig.cmake",
            "set(Foo_VERSION 2.1)\nset(FOO_FROM ${CMAKE_CURRENT_LIST_DIR})\nadd_library(Foo::foo INTERFACE IMPORTED)",
        );
        let mut i = interp_with(host, &[("CMAKE_PREFIX_PATH", "/elsewhere:/deps")]);
        i.run_str("find_package(Foo 2.0 REQUIRED COMPONENTS a b)").unwrap();
        assert_eq!(i.var("Foo_FOUND").as_deref(), Some("TRUE"));
        assert_eq!(i.var("Foo_DIR").as_deref(), Some("/deps/lib/cmake/Foo"));
        assert_eq!(i.var("Foo_CONFIG").as_deref(), Some("/deps/lib/cmake/Foo/FooConfig.cmake"));
        assert_eq!(i.var("Foo_VERSION").as_deref(), Some("2.1"));
        assert_eq!(i.var("FOO_FROM").as_deref(), Some("/deps/lib/cmake/Foo"));
        assert_eq!(i.var("Foo_FIND_VERSION").as_deref(), Some("2.0"));
        assert_eq!(i.var("Foo_FIND_VERSION_MAJOR").as_deref(), Some("2"));
        assert_eq!(i.var("Foo_FIND_REQUIRED").as_deref(), Some("1"));
        assert_eq!(i.var("Foo_FIND_COMPONENTS").as_deref(), Some("a;b"));
        assert!(i.project().target("Foo::foo").unwrap().imported);
        assert_eq!(i.var("CMAKE_CURRENT_LIST_FILE"), None);
    }

    #[test]
    fn package_dir_variable_wins() {
        let host = MemoryHost::new()
            .with_file("/pinned/bar-config.cmake", "set(WHICH pinned)")
            .with_file("/usr/lib/cmake/Bar/BarConfig.cmake", "set(WHICH system)");
        let i = run(host, "set(Bar_DIR /pinned)\nfind_package(Bar)");
        assert_eq!(i.var("WHICH").as_deref(), Some("pinned"));
    }

    #[test]
    fn package_platform_defaults() {
        let host = MemoryHost::new().with_file("/usr/share/cmake/Sys/SysConfig.cmake", "set(SYS_LOADED 1)");
        let i = run(host.clone(), "find_package(Sys)");
        assert_eq!(i.var("SYS_LOADED").as_deref(), Some("1"));
        assert_eq!(i.var("Sys_DIR").as_deref(), Some("/usr/share/cmake/Sys"));

        let i = run(host, "find_package(Sys QUIET NO_DEFAULT_PATH)");
        assert_eq!(i.var("Sys_FOUND").as_deref(), Some("FALSE"));
    }

    #[test]
    fn package_module_mode() {
        let host = MemoryHost::new().with_file("/mods/FindBaz.cmake", "set(Baz_FOUND TRUE)\nset(BAZ_QUIET ${Baz_FIND_QUIETLY})");
        let i = run(host, "set(CMAKE_MODULE_PATH /mods)\nfind_package(Baz QUIET)");
        assert_eq!(i.var("Baz_FOUND").as_deref(), Some("TRUE"));
        assert_eq!(i.var("BAZ_QUIET").as_deref(), Some("1"));
        assert_eq!(i.var("Baz_CONFIG"), None);
    }

    #[test]
    fn missing_package_warns_or_fails() {
        let i = run(MemoryHost::new(), "find_package(Qux)");
        assert_eq!(i.var("Qux_FOUND").as_deref(), Some("FALSE"));
        assert_eq!(i.var("Qux_DIR").as_deref(), Some("Qux_DIR-NOTFOUND"));
        assert_eq!(i.diagnostics.len(), 1);
        assert!(i.diagnostics[0].starts_with("CMake Warning:\n  By not providing \"FindQux.cmake\""));

        let i = run(MemoryHost::new(), "find_package(Qux QUIET)");
        assert!(i.diagnostics.is_empty());

        let e = interp_with(MemoryHost::new(), &[])
            .run_str("find_package(Qux REQUIRED)")
            .unwrap_err();
        assert_eq!(e.kind, ErrorKind::Domain);
        assert!(e.message.contains("provided by \"Qux\" with any of"));
        assert!(e.message.contains("\n  QuxConfig.cmake\n  qux-config.cmake\n"));
        assert!(e.to_string().contains("set \"Qux_DIR\""));
    }
}
