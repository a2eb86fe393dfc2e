use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser as _;
use tracing::{error, info};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use tidyxml::{
    compact,
    config::{DEFAULT_LOOKAHEAD_LIMIT, DEFAULT_MAX_DEPTH},
    ElementHandler, Node, Parser, ParserConfig, Serializer, WorkerPool,
};

#[derive(Debug, clap::Parser)]
#[command(
    name = "tidyxml",
    version,
    about = "Stream, prune and re-indent large XML documents"
)]
struct Args {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Worker threads (defaults to one per core)
    #[arg(long, value_name = "N")]
    threads: Option<usize>,
    /// Maximum lookahead of the reader
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_LOOKAHEAD_LIMIT)]
    buffer_limit: usize,
    /// Maximum element nesting depth
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
    /// Drop every element with this name while reading (repeatable)
    #[arg(long = "drop", value_name = "NAME")]
    drop: Vec<String>,
    /// Keep vestigial elements
    #[arg(long)]
    no_compact: bool,
    /// Print the single-line tree instead of indented XML
    #[arg(long)]
    tree: bool,
}

/// Takes elements with the given names out of the tree as soon as they close.
struct DropNamed {
    names: HashSet<String>,
    dropped: usize,
}

impl ElementHandler for DropNamed {
    fn element_finished(&mut self, element: Node) -> Option<Node> {
        if self.names.contains(&element.name) {
            self.dropped += 1;
            None
        } else {
            Some(element)
        }
    }
}

fn main() {
    // Logs go to stderr; stdout carries the document
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let config = ParserConfig {
        lookahead_limit: args.buffer_limit,
        max_depth: args.max_depth,
    };
    let mut handler = DropNamed {
        names: args.drop.iter().cloned().collect(),
        dropped: 0,
    };

    let input = open_input(&args.input)?;
    let mut root = Parser::new(input)
        .with_config(config)
        .with_handler(&mut handler)
        .parse()
        .context("failed to parse input")?;
    if handler.dropped > 0 {
        info!(dropped = handler.dropped, "Dropped elements while reading");
    }

    let pool = match args.threads {
        Some(threads) => WorkerPool::new(threads)?,
        None => WorkerPool::with_available_cores()?,
    };
    if !args.no_compact {
        compact(&mut root, &pool)?;
    }

    let mut output = open_output(&args.output)?;
    if args.tree {
        writeln!(output, "{root}").context("failed to write output")?;
    } else {
        output = Serializer::new(&pool)
            .write_document(&root, output)
            .context("failed to write output")?;
    }
    output.flush().context("failed to write output")?;
    Ok(())
}

fn open_input(path: &Option<PathBuf>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            info!("Reading file: {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("failed to read input file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: &Option<PathBuf>) -> Result<Box<dyn Write + Send>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to write output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}
