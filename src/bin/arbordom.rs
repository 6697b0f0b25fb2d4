//! Command-line front end: parse XML files into documents and print them,
//! selected parts of them, or node statistics.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use arbordom::query::{CompoundSelector, Selector};
use arbordom::serial::{serialize_node, serialize_with_options, SerializeOptions};
use arbordom::{ChildStorage, Document, DocumentOptions, DomError, NodeType};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// arbordom -- load XML files into a DOM and print, query or summarize them.
#[derive(Parser, Debug)]
#[command(name = "arbordom", version, about, long_about = None)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Pretty-print (indent) the output.
    #[arg(long)]
    format: bool,

    /// Print only the nodes matching a selector such as `div.note [id]`.
    #[arg(long, value_name = "SELECTOR")]
    select: Option<String>,

    /// Store children in linked lists instead of arrays.
    #[arg(long)]
    linked: bool,

    /// Print node counts by kind instead of the document.
    #[arg(long)]
    stats: bool,

    /// Leave out the XML declaration.
    #[arg(long)]
    no_declaration: bool,

    /// Log debug output to stderr (overridden by `RUST_LOG`).
    #[arg(long, short)]
    verbose: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_READ_ERROR: u8 = 1;
const EXIT_SELECTOR_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let selector = match cli.select.as_deref().map(CompoundSelector::parse).transpose() {
        Ok(selector) => selector,
        Err(err) => {
            eprintln!("invalid selector: {err}");
            return ExitCode::from(EXIT_SELECTOR_ERROR);
        }
    };

    let mut worst_exit = EXIT_SUCCESS;
    for file in &cli.files {
        let exit = process_file(&cli, selector.as_ref(), file);
        worst_exit = worst_exit.max(exit);
    }
    ExitCode::from(worst_exit)
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "arbordom=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Processes a single input file and returns an exit code.
fn process_file(cli: &Cli, selector: Option<&CompoundSelector>, filename: &str) -> u8 {
    let input = match read_input(filename) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("{filename}: failed to read: {err}");
            return EXIT_READ_ERROR;
        }
    };

    let storage = if cli.linked {
        ChildStorage::Linked
    } else {
        ChildStorage::Array
    };
    let doc = match Document::parse_str_with_options(
        &input,
        DocumentOptions::default().child_storage(storage),
    ) {
        Ok(doc) => doc,
        Err(err) => {
            eprintln!("{filename}: {err}");
            return EXIT_READ_ERROR;
        }
    };
    info!(file = filename, nodes = doc.node_count(), "parsed document");

    let output = if cli.stats {
        Ok(format_stats(&doc))
    } else if let Some(selector) = selector {
        format_matches(cli, &doc, selector)
    } else {
        serialize_with_options(&doc, &serialize_options(cli))
    };

    match output {
        Ok(text) => {
            let mut stdout = io::stdout().lock();
            if let Err(err) = stdout.write_all(text.as_bytes()) {
                debug!(error = %err, "stdout closed");
            }
            EXIT_SUCCESS
        }
        Err(err) => {
            eprintln!("{filename}: {err}");
            EXIT_READ_ERROR
        }
    }
}

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<String> {
    if filename == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(filename)
    }
}

fn serialize_options(cli: &Cli) -> SerializeOptions {
    SerializeOptions::default()
        .indent(cli.format)
        .declaration(!cli.no_declaration)
}

/// One serialized match per line.
fn format_matches(cli: &Cli, doc: &Document, selector: &CompoundSelector) -> Result<String, DomError> {
    let options = serialize_options(cli);
    let mut out = String::new();
    for node in selector.select(doc, doc.root()) {
        out.push_str(&serialize_node(doc, node, &options)?);
        out.push('\n');
    }
    Ok(out)
}

/// Node counts by kind, attributes included, plus the unlinked bucket.
fn format_stats(doc: &Document) -> String {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut attributes = 0;
    for node in doc.descendants_and_self(doc.root()) {
        if let Some(kind) = doc.node_type(node) {
            *counts.entry(kind.to_string()).or_default() += 1;
        }
        attributes += doc.attribute_count(node);
    }
    if attributes > 0 {
        *counts.entry(NodeType::Attribute.to_string()).or_default() += attributes;
    }

    let mut out = String::new();
    for (kind, count) in &counts {
        let _ = writeln!(out, "{kind:<24}{count}");
    }
    let _ = writeln!(out, "{:<24}{}", "unlinked", doc.unlinked_nodes().count());
    let _ = writeln!(out, "{:<24}{}", "live nodes", doc.node_count());
    out
}
