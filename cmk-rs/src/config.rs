//! Interpreter configuration: platform defaults and initial-cache files.
//!
//! An initial-cache file pre-populates the cache before a script runs:
//!
//! | Line                   | Action                                  |
//! |------------------------|-----------------------------------------|
//! | `NAME=VALUE`           | cache entry of type `UNINITIALIZED`     |
//! | `NAME:TYPE=VALUE`      | cache entry with an explicit type       |
//! | `# ...` / `// ...`     | comment, ignored                        |
//!
//! The same `NAME[:TYPE]=VALUE` syntax is accepted by `cmk -D`.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Version reported through `CMAKE_VERSION`.
pub const CMAKE_VERSION: (u32, u32, u32) = (3, 28, 0);

// ── Platform ──────────────────────────────────────────────────────────────────

/// Target platform; decides default variables and search locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    MacOs,
    Ios,
    Android,
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn host() -> Platform {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    /// Value of `CMAKE_SYSTEM_NAME`.
    pub fn system_name(self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
            Platform::MacOs => "Darwin",
            Platform::Ios => "iOS",
            Platform::Android => "Android",
            Platform::Other => "Generic",
        }
    }

    /// Platform marker variables set to `1`.
    pub fn markers(self) -> &'static [&'static str] {
        match self {
            Platform::Linux => &["UNIX", "LINUX"],
            Platform::Windows => &["WIN32"],
            Platform::MacOs => &["UNIX", "APPLE"],
            Platform::Ios => &["UNIX", "APPLE", "IOS"],
            Platform::Android => &["UNIX", "ANDROID"],
            Platform::Other => &[],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.system_name())
    }
}

/// Variables every interpreter starts with.
pub fn default_variables(platform: Platform) -> Vec<(String, String)> {
    let (major, minor, patch) = CMAKE_VERSION;
    let pointer = if cfg!(target_pointer_width = "64") { "8" } else { "4" };
    let mut vars = vec![
        ("CMAKE_SYSTEM_NAME".to_owned(), platform.system_name().to_owned()),
        ("CMAKE_HOST_SYSTEM_NAME".to_owned(), Platform::host().system_name().to_owned()),
        ("CMAKE_SIZEOF_VOID_P".to_owned(), pointer.to_owned()),
        ("CMAKE_VERSION".to_owned(), format!("{major}.{minor}.{patch}")),
        ("CMAKE_MAJOR_VERSION".to_owned(), major.to_string()),
        ("CMAKE_MINOR_VERSION".to_owned(), minor.to_string()),
        ("CMAKE_PATCH_VERSION".to_owned(), patch.to_string()),
    ];
    for m in platform.markers() {
        vars.push(((*m).to_owned(), "1".to_owned()));
    }
    vars
}

// ── Cache entries ─────────────────────────────────────────────────────────────

/// One persistent cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: String,
    /// `BOOL`, `PATH`, `FILEPATH`, `STRING`, `INTERNAL` or `UNINITIALIZED`.
    pub ty: String,
    pub doc: String,
}

impl CacheEntry {
    pub fn new(value: impl Into<String>, ty: impl Into<String>) -> Self {
        CacheEntry { value: value.into(), ty: ty.into(), doc: String::new() }
    }
}

/// A problem on one line of an initial-cache file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Parse `NAME[:TYPE]=VALUE`.
pub fn parse_definition(s: &str) -> Result<(String, CacheEntry), String> {
    let Some((lhs, value)) = s.split_once('=') else {
        return Err(format!("expected NAME[:TYPE]=VALUE, got \"{s}\""));
    };
    let (name, ty) = match lhs.split_once(':') {
        Some((n, t)) => (n.trim(), t.trim().to_ascii_uppercase()),
        None => (lhs.trim(), "UNINITIALIZED".to_owned()),
    };
    if name.is_empty() {
        return Err(format!("missing variable name in \"{s}\""));
    }
    Ok((name.to_owned(), CacheEntry::new(value.trim(), ty)))
}

/// Entries read from an initial-cache file, in file order.
#[derive(Debug, Default, Clone)]
pub struct InitialCache {
    pub entries: Vec<(String, CacheEntry)>,
}

impl InitialCache {
    /// Parse an initial-cache file.  Malformed lines are reported and
    /// skipped; the rest of the file still loads.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut cache = InitialCache::default();
        let mut errors = Vec::new();
        for (i, raw) in s.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }
            match parse_definition(line) {
                Ok(entry) => cache.entries.push(entry),
                Err(message) => errors.push(ConfigError { line: i + 1, message }),
            }
        }
        (cache, errors)
    }

    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }
}

/// `<config dir>/cmk/init-cache.txt` for the current user.
pub fn user_init_cache() -> Option<PathBuf> {
    let dirs = directories::BaseDirs::new()?;
    Some(dirs.config_dir().join("cmk").join("init-cache.txt"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_variables_linux() {
        let vars = default_variables(Platform::Linux);
        let get = |n: &str| vars.iter().find(|(k, _)| k == n).map(|(_, v)| v.as_str());
        assert_eq!(get("CMAKE_SYSTEM_NAME"), Some("Linux"));
        assert_eq!(get("UNIX"), Some("1"));
        assert_eq!(get("LINUX"), Some("1"));
        assert_eq!(get("WIN32"), None);
        assert_eq!(get("CMAKE_VERSION"), Some("3.28.0"));
    }

    #[test]
    fn default_variables_windows() {
        let vars = default_variables(Platform::Windows);
        assert!(vars.iter().any(|(k, v)| k == "WIN32" && v == "1"));
        assert!(!vars.iter().any(|(k, _)| k == "UNIX"));
    }

    #[test]
    fn definitions() {
        let (name, e) = parse_definition("BUILD_SHARED_LIBS:BOOL=ON").unwrap();
        assert_eq!(name, "BUILD_SHARED_LIBS");
        assert_eq!(e.ty, "BOOL");
        assert_eq!(e.value, "ON");
        let (name, e) = parse_definition("PREFIX=/opt/x=y").unwrap();
        assert_eq!(name, "PREFIX");
        assert_eq!(e.value, "/opt/x=y");
        assert_eq!(e.ty, "UNINITIALIZED");
        assert!(parse_definition("NOEQUALS").is_err());
        assert!(parse_definition("=1").is_err());
    }

    #[test]
    fn initial_cache_file() {
        let src = "# comment\n// also comment\n\nA=1\nB:PATH=/usr\nbroken line\n";
        let (cache, errors) = InitialCache::load_str(src);
        assert_eq!(cache.entries.len(), 2);
        assert_eq!(cache.entries[1].0, "B");
        assert_eq!(cache.entries[1].1.ty, "PATH");
        assert_eq!(errors, vec![ConfigError { line: 6, message: "expected NAME[:TYPE]=VALUE, got \"broken line\"".into() }]);
    }

    #[test]
    fn initial_cache_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("init.txt");
        std::fs::write(&path, "X:STRING=hello\n").unwrap();
        let (cache, errors) = InitialCache::load_file(&path).unwrap();
        assert!(errors.is_empty());
        assert_eq!(cache.entries[0].1.value, "hello");
    }
}
