//! The configuration language.
//!
//! A tree-walking interpreter for CMake-style scripts, covering:
//!
//! - Command reading with quoted, bracket and nested-parenthesis arguments
//! - Variable substitution (`${name}`, `$ENV{name}`), innermost first
//! - `if` / `elseif` / `else` / `endif` with `AND`, `OR`, `NOT`, grouping,
//!   comparisons and `DEFINED`
//! - `function`, `macro` and `foreach` blocks with scoped variables
//! - Keyword-argument binding for built-ins
//! - Data-recording commands (`project`, `add_library`, ...) and the
//!   `find_*` path searches
//!
//! # Quick start
//!
//! ```rust
//! use cmk::script::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! interp.run_str("set(x 6)\nforeach(i RANGE 1 ${x})\n  list(APPEND L ${i})\nendforeach()\nmessage(\"${L}\")").unwrap();
//! assert_eq!(interp.output, vec!["1;2;3;4;5;6"]);
//! ```

pub mod args;
pub mod block;
pub mod builtins;
pub mod expand;
pub mod expr;
pub mod find;
pub mod interp;
pub mod policy;
pub mod stmt;
pub mod value;

// Re-exports for convenience.
pub use expr::EvalContext;
pub use interp::{ControlFlow, Interpreter};
pub use stmt::{parse_script, Statement};
pub use value::Value;
