//! Command-line argument parsing.
//!
//! Usage:
//!   cmk [-C <cache-file>] [-D NAME[:TYPE]=VALUE]... [-c <cmd>] [-pnqd] [<script>]

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{parse_definition, CacheEntry};

/// Script run when none is named.
pub const DEFAULT_SCRIPT: &str = "CMakeLists.txt";

pub const USAGE: &str =
    "Usage: cmk [-C <cache-file>] [-D NAME[:TYPE]=VALUE]... [-c <cmd>] [-pnqd] [<script>]";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Initial-cache file (`-C <file>`).
    pub cache_file: Option<PathBuf>,
    /// Cache definitions (`-D NAME[:TYPE]=VALUE`), in order.
    pub definitions: Vec<(String, CacheEntry)>,
    /// Script text to run instead of a file (`-c <cmd>`).
    pub command: Option<String>,
    /// Print the recorded project after the run (`-p`).
    pub print_project: bool,
    /// Skip the per-user init cache (`-n`).
    pub no_user_cache: bool,
    /// Suppress warnings on stderr (`-q`).
    pub quiet: bool,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Script file; `None` means [`DEFAULT_SCRIPT`].
    pub script: Option<PathBuf>,
}

impl CliArgs {
    /// The script file to run.
    pub fn script_path(&self) -> PathBuf {
        self.script.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPT))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    #[error("-{0} requires an argument")]
    MissingValue(char),
    #[error("unknown option: -{0}")]
    UnknownOption(char),
    #[error("invalid definition: {0}")]
    BadDefinition(String),
    #[error("too many arguments ({0})")]
    TooManyArguments(usize),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()`.
pub fn parse_args() -> Result<CliArgs, CliError> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or(&[]))
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, CliError> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'p' => args.print_project = true,
                'n' => args.no_user_cache = true,
                'q' => args.quiet = true,
                'd' => args.debug = true,

                // Options taking a value: -X<value> or -X <value>.
                c @ ('C' | 'D' | 'c') => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(CliError::MissingValue(c));
                    };
                    match c {
                        'C' => args.cache_file = Some(PathBuf::from(value)),
                        'D' => args
                            .definitions
                            .push(parse_definition(&value).map_err(CliError::BadDefinition)?),
                        _ => args.command = Some(value),
                    }
                }

                c => return Err(CliError::UnknownOption(c)),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 => args.script = Some(PathBuf::from(positional.remove(0))),
        n => return Err(CliError::TooManyArguments(n)),
    }

    Ok(args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn empty_args() {
        let a = parse_argv(&argv(&[])).unwrap();
        assert!(!a.print_project);
        assert!(a.definitions.is_empty());
        assert_eq!(a.script_path(), PathBuf::from("CMakeLists.txt"));
    }

    #[test]
    fn script_positional() {
        let a = parse_argv(&argv(&["sub/CMakeLists.txt"])).unwrap();
        assert_eq!(a.script_path(), PathBuf::from("sub/CMakeLists.txt"));
    }

    #[test]
    fn bool_flags() {
        let a = parse_argv(&argv(&["-p", "-n", "-q", "-d"])).unwrap();
        assert!(a.print_project && a.no_user_cache && a.quiet && a.debug);
    }

    #[test]
    fn combined_flags() {
        let a = parse_argv(&argv(&["-pq"])).unwrap();
        assert!(a.print_project);
        assert!(a.quiet);
        assert!(!a.debug);
    }

    #[test]
    fn definitions_embedded_and_separate() {
        let a = parse_argv(&argv(&["-DWITH_TESTS:BOOL=ON", "-D", "PREFIX=/opt"])).unwrap();
        assert_eq!(a.definitions.len(), 2);
        assert_eq!(a.definitions[0].0, "WITH_TESTS");
        assert_eq!(a.definitions[0].1.ty, "BOOL");
        assert_eq!(a.definitions[1].1.value, "/opt");
        assert_eq!(a.definitions[1].1.ty, "UNINITIALIZED");
    }

    #[test]
    fn cache_file_and_command() {
        let a = parse_argv(&argv(&["-C", "init.txt", "-cmessage(hi)"])).unwrap();
        assert_eq!(a.cache_file, Some(PathBuf::from("init.txt")));
        assert_eq!(a.command.as_deref(), Some("message(hi)"));
    }

    #[test]
    fn errors() {
        assert_eq!(parse_argv(&argv(&["-x"])).unwrap_err(), CliError::UnknownOption('x'));
        assert_eq!(parse_argv(&argv(&["-C"])).unwrap_err(), CliError::MissingValue('C'));
        assert!(matches!(parse_argv(&argv(&["-D", "novalue"])), Err(CliError::BadDefinition(_))));
        assert_eq!(parse_argv(&argv(&["a", "b"])).unwrap_err(), CliError::TooManyArguments(2));
    }

    #[test]
    fn double_dash_ends_flags() {
        let a = parse_argv(&argv(&["--", "-weird-name.cmake"])).unwrap();
        assert_eq!(a.script_path(), PathBuf::from("-weird-name.cmake"));
    }
}
