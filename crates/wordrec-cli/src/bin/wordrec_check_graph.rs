// wordrec-check-graph: Look up words in a word graph.
//
// Reads words from stdin (one per line) and prints "C: word" for words the
// graph accepts, "W: word" for words it rejects.
//
// Usage:
//   wordrec-check-graph [-s SYMBOLS] GRAPH [WORD...]
//
// Options:
//   -s, --symbols PATH      Symbol set file (default: $WORDREC_SYMBOLS)
//   -h, --help              Print help

use std::io::{self, BufRead, Write};

use wordrec_core::symbols::SymbolSet;
use wordrec_dawg::Dawg;
use wordrec_dawg::graph::WordGraph;

fn check(graph: &WordGraph, symbols: &SymbolSet, word: &str) -> bool {
    match symbols.encode(word) {
        Ok(ids) => !ids.is_empty() && graph.contains(&ids),
        Err(unknown) => {
            log::debug!("{word:?}: unknown symbol {unknown:?}");
            false
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (symbols_path, args) = wordrec_cli::parse_symbols_path(&args);

    if wordrec_cli::wants_help(&args) {
        println!("wordrec-check-graph: Look up words in a word graph.");
        println!();
        println!("Usage: wordrec-check-graph [-s SYMBOLS] GRAPH [WORD...]");
        println!();
        println!("If WORD arguments are given, checks each word.");
        println!("Otherwise reads words from stdin (one per line).");
        println!("Prints C: for accepted words and W: for rejected ones.");
        println!();
        println!("Options:");
        println!("  -s, --symbols PATH      Symbol set file (default: $WORDREC_SYMBOLS)");
        println!("  -h, --help              Print this help");
        return;
    }

    let Some((graph_path, words)) = args.split_first() else {
        wordrec_cli::fatal("expected GRAPH (see --help)");
    };

    let symbols = wordrec_cli::load_symbols(symbols_path.as_deref())
        .unwrap_or_else(|e| wordrec_cli::fatal(&e));
    let graph = wordrec_cli::load_graph(graph_path).unwrap_or_else(|e| wordrec_cli::fatal(&e));
    wordrec_cli::check_vocabulary(&graph, &symbols).unwrap_or_else(|e| wordrec_cli::fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let mut report = |word: &str| {
        let tag = if check(&graph, &symbols, word) { 'C' } else { 'W' };
        let _ = writeln!(out, "{tag}: {word}");
    };

    if words.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("error reading stdin: {e}");
                    break;
                }
            };
            let word = line.trim();
            if word.is_empty() {
                continue;
            }
            report(word);
        }
    } else {
        for word in words {
            report(word);
        }
    }
}
