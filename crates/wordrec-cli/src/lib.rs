// wordrec-cli: shared utilities for CLI tools.

use std::path::Path;
use std::process;

use wordrec_core::diagnostics::LoadSummary;
use wordrec_core::symbols::SymbolSet;
use wordrec_dawg::graph::WordGraph;

/// Environment variable naming the default symbol set file.
const SYMBOLS_ENV: &str = "WORDREC_SYMBOLS";

/// Read a text file, with the path in the error message.
pub fn read_text(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))
}

/// Load the symbol set named by `-s PATH`, or by `WORDREC_SYMBOLS`.
pub fn load_symbols(path: Option<&str>) -> Result<SymbolSet, String> {
    let path = match path {
        Some(p) => p.to_string(),
        None => std::env::var(SYMBOLS_ENV)
            .map_err(|_| format!("no symbol set given (use -s PATH or set {SYMBOLS_ENV})"))?,
    };
    let text = read_text(&path)?;
    let (symbols, summary) =
        SymbolSet::from_text(&text).map_err(|e| format!("failed to load {path}: {e}"))?;
    report_summary(&path, &summary);
    log::info!("{path}: {} symbols", symbols.len());
    Ok(symbols)
}

/// Load a word graph written by `wordrec-build-graph`.
pub fn load_graph(path: &str) -> Result<WordGraph, String> {
    let data = std::fs::read(path).map_err(|e| format!("failed to read {path}: {e}"))?;
    WordGraph::from_bytes(&data).map_err(|e| format!("failed to load {path}: {e}"))
}

/// Check that a graph and a symbol set belong together.
pub fn check_vocabulary(graph: &WordGraph, symbols: &SymbolSet) -> Result<(), String> {
    if graph.symbol_count() > symbols.len() {
        return Err(format!(
            "graph was built for {} symbols but the symbol set has {}",
            graph.symbol_count(),
            symbols.len()
        ));
    }
    Ok(())
}

/// Write bytes to `path`, creating parent directories as needed.
pub fn write_bytes(path: &str, data: &[u8]) -> Result<(), String> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }
    std::fs::write(path, data).map_err(|e| format!("failed to write {path}: {e}"))
}

/// Print skipped lines of a load to stderr.
pub fn report_summary(source: &str, summary: &LoadSummary) {
    for skipped in &summary.skipped {
        eprintln!("{source}:{}: skipped: {}", skipped.line, skipped.reason);
    }
}

/// Parse a `--name=VALUE`, `--name VALUE` or `-x VALUE` option.
///
/// Returns `(value, remaining_args)`.
pub fn parse_option(args: &[String], long: &str, short: &str) -> (Option<String>, Vec<String>) {
    let mut value = None;
    let mut remaining = Vec::new();
    let mut skip_next = false;
    let prefix = format!("{long}=");

    for (i, arg) in args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if let Some(val) = arg.strip_prefix(&prefix) {
            value = Some(val.to_string());
        } else if arg == long || arg == short {
            if i + 1 < args.len() {
                value = Some(args[i + 1].clone());
                skip_next = true;
            } else {
                fatal(&format!("{arg} requires a value"));
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    (value, remaining)
}

/// Parse `--symbols=PATH`, `--symbols PATH` or `-s PATH`.
pub fn parse_symbols_path(args: &[String]) -> (Option<String>, Vec<String>) {
    parse_option(args, "--symbols", "-s")
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}
