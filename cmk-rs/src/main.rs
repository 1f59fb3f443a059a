use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cmk::cli::{self, CliArgs};
use cmk::config::{self, InitialCache};
use cmk::Interpreter;

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("cmk: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(1);
        }
    };

    install_tracing(&args);

    let mut interp = Interpreter::new();

    // ── Initial cache: per-user file, -C file, then -D definitions ────────────
    if !args.no_user_cache {
        if let Some(path) = config::user_init_cache().filter(|p| p.is_file()) {
            if let Err(e) = load_cache_file(&mut interp, &path) {
                eprintln!("cmk: warning: {e}");
            }
        }
    }
    if let Some(path) = &args.cache_file {
        if let Err(e) = load_cache_file(&mut interp, path) {
            eprintln!("cmk: {e}");
            std::process::exit(1);
        }
    }
    interp.load_initial_cache(&InitialCache { entries: args.definitions.clone() });

    // ── Run ───────────────────────────────────────────────────────────────────
    let result = match &args.command {
        Some(cmd) => interp.run_str(cmd),
        None => interp.run_file(args.script_path()),
    };

    for line in interp.take_output() {
        println!("{line}");
    }
    if !args.quiet {
        for d in &interp.diagnostics {
            eprintln!("{d}");
        }
    }

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
    if args.print_project {
        print!("{}", interp.project());
    }
    if interp.send_errors() > 0 {
        eprintln!("-- Configuring incomplete, errors occurred!");
        std::process::exit(1);
    }
}

fn install_tracing(args: &CliArgs) {
    let filter = if args.debug {
        EnvFilter::new("cmk=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load an initial-cache file.  Malformed lines are reported and skipped.
fn load_cache_file(interp: &mut Interpreter, path: &Path) -> Result<(), String> {
    let (cache, errors) =
        InitialCache::load_file(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    for e in errors {
        eprintln!("cmk: {}: {e}", path.display());
    }
    tracing::debug!(file = %path.display(), entries = cache.entries.len(), "loaded initial cache");
    interp.load_initial_cache(&cache);
    Ok(())
}
