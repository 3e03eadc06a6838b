// wordrec-build-graph: Compile a word list into a word graph file.
//
// Reads a symbol set and a word list (one word per line), builds a trie,
// compacts it and writes the serialized graph.
//
// Usage:
//   wordrec-build-graph [-s SYMBOLS] [-m MAX_EDGES] WORDLIST OUTPUT
//
// Options:
//   -s, --symbols PATH      Symbol set file (default: $WORDREC_SYMBOLS)
//   -m, --max-edges N       Edge budget of the trie (default: 10000000)
//   -h, --help              Print help

use wordrec_dawg::trie::{DictOptions, Trie};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (symbols_path, args) = wordrec_cli::parse_symbols_path(&args);
    let (max_edges, args) = wordrec_cli::parse_option(&args, "--max-edges", "-m");

    if wordrec_cli::wants_help(&args) {
        println!("wordrec-build-graph: Compile a word list into a word graph.");
        println!();
        println!("Usage: wordrec-build-graph [-s SYMBOLS] [-m MAX_EDGES] WORDLIST OUTPUT");
        println!();
        println!("Options:");
        println!("  -s, --symbols PATH      Symbol set file (default: $WORDREC_SYMBOLS)");
        println!("  -m, --max-edges N       Edge budget of the trie (default: 10000000)");
        println!("  -h, --help              Print this help");
        return;
    }

    let [word_list, output] = args.as_slice() else {
        wordrec_cli::fatal("expected WORDLIST and OUTPUT (see --help)");
    };

    let mut options = DictOptions::default();
    if let Some(value) = max_edges {
        options.max_num_edges = value
            .parse()
            .unwrap_or_else(|_| wordrec_cli::fatal(&format!("invalid --max-edges value {value:?}")));
    }

    let symbols = wordrec_cli::load_symbols(symbols_path.as_deref())
        .unwrap_or_else(|e| wordrec_cli::fatal(&e));
    let text = wordrec_cli::read_text(word_list).unwrap_or_else(|e| wordrec_cli::fatal(&e));

    let mut trie = Trie::new(symbols.len(), &options);
    let summary = trie.read_word_list(&text, &symbols);
    wordrec_cli::report_summary(word_list, &summary);
    if trie.resets() > 0 {
        log::warn!(
            "{word_list}: edge budget of {} exceeded {} time(s); only words after the last reset are kept",
            options.max_num_edges,
            trie.resets()
        );
    }

    let trie_edges = trie.num_edges();
    let graph = trie.compact();
    let bytes = graph
        .to_bytes()
        .unwrap_or_else(|e| wordrec_cli::fatal(&format!("{output}: {e}")));
    wordrec_cli::write_bytes(output, &bytes).unwrap_or_else(|e| wordrec_cli::fatal(&e));

    eprintln!(
        "{output}: {} words ({} skipped), {trie_edges} trie edges -> {} graph edges, {} nodes",
        summary.accepted,
        summary.skipped.len(),
        graph.num_edges(),
        graph.num_nodes()
    );
}
