// wordrec-dump-graph: Print the contents of a word graph.
//
// Prints a header with graph statistics, then every accepted word in
// symbol order. With --edges, prints the raw edge records instead.
//
// Usage:
//   wordrec-dump-graph [-s SYMBOLS] [--edges] GRAPH
//
// Options:
//   -s, --symbols PATH      Symbol set file (default: $WORDREC_SYMBOLS)
//       --edges             Print edge records instead of words
//   -h, --help              Print help

use std::io::{self, Write};

use wordrec_dawg::Dawg;
use wordrec_dawg::EdgeRef;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (symbols_path, args) = wordrec_cli::parse_symbols_path(&args);

    if wordrec_cli::wants_help(&args) {
        println!("wordrec-dump-graph: Print the contents of a word graph.");
        println!();
        println!("Usage: wordrec-dump-graph [-s SYMBOLS] [--edges] GRAPH");
        println!();
        println!("Options:");
        println!("  -s, --symbols PATH      Symbol set file (default: $WORDREC_SYMBOLS)");
        println!("      --edges             Print edge records instead of words");
        println!("  -h, --help              Print this help");
        return;
    }

    let show_edges = args.iter().any(|a| a == "--edges");
    let rest: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let [graph_path] = rest.as_slice() else {
        wordrec_cli::fatal("expected exactly one GRAPH (see --help)");
    };

    let symbols = wordrec_cli::load_symbols(symbols_path.as_deref())
        .unwrap_or_else(|e| wordrec_cli::fatal(&e));
    let graph = wordrec_cli::load_graph(graph_path).unwrap_or_else(|e| wordrec_cli::fatal(&e));
    wordrec_cli::check_vocabulary(&graph, &symbols).unwrap_or_else(|e| wordrec_cli::fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let _ = writeln!(out, "# symbols: {}", graph.symbol_count());
    let _ = writeln!(out, "# nodes: {}", graph.num_nodes());
    let _ = writeln!(out, "# edges: {}", graph.num_edges());

    if show_edges {
        for index in 0..graph.num_edges() {
            let edge = EdgeRef(index as u64);
            let next = graph.next_node(edge);
            let end = if graph.is_word_end(edge) { " end" } else { "" };
            let target = if next.is_none() {
                "-".to_string()
            } else {
                next.0.to_string()
            };
            let _ = writeln!(
                out,
                "{index}\t{}\t-> {target}{end}",
                symbols.text(graph.symbol_of(edge))
            );
        }
    } else {
        for word in graph.words() {
            let _ = writeln!(out, "{}", symbols.render(&word));
        }
    }
}
