//! cmk: an embeddable interpreter for CMake-style configuration scripts.
//!
//! Scripts are evaluated for their side effects on variables, the cache and
//! a recorded [`Project`]; nothing is compiled or built.
//!
//! ```rust
//! use cmk::{host::MemoryHost, Interpreter};
//!
//! let host = MemoryHost::new().with_file("/proj/CMakeLists.txt", "project(Demo VERSION 1.0)\nadd_executable(demo main.c)");
//! let mut interp = Interpreter::with_host(host);
//! interp.run_file("/proj/CMakeLists.txt").unwrap();
//! assert_eq!(interp.project().name.as_deref(), Some("Demo"));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod project;
pub mod script;
pub mod var;

pub use error::{ErrorKind, ScriptError};
pub use project::Project;
pub use script::Interpreter;
