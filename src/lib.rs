//! tidyxml: a streaming XML reader and parallel writer for very large documents
//!
//! This crate provides functionality to:
//! - Parse XML from any byte stream with bounded lookahead
//! - Take elements out of the tree while parsing through an [`ElementHandler`]
//! - Drop vestigial elements from a tree in parallel
//! - Write a tree back as indented XML, fanning wide elements out to workers
//!
//! # Examples
//! ```
//! use tidyxml::{parse_str, to_string, Result, WorkerPool};
//!
//! fn example() -> Result<()> {
//!     let mut root = parse_str("<gpx><wpt lat='1'/><empty/></gpx>")?;
//!     let pool = WorkerPool::new(2)?;
//!     let text = to_string(&mut root, &pool)?;
//!     assert!(text.contains("<wpt lat=\"1\" />"));
//!     assert!(!text.contains("empty"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use tracing::{debug, error, info, instrument};

pub mod compact;
pub mod config;
pub mod cursor;
pub mod error;
pub mod escape;
pub mod node;
pub mod parser;
pub mod pool;
pub mod writer;

// Re-exports
pub use compact::{compact, Compactor};
pub use config::{ParserConfig, WriterConfig};
pub use error::{Error, ErrorKind, Result};
pub use escape::{escape, unescape};
pub use node::{Attribute, Node};
pub use parser::{ElementHandler, Parser};
pub use pool::WorkerPool;
pub use writer::{Serializer, Sink};

/// Parses a complete document held in memory.
pub fn parse_str(input: &str) -> Result<Node> {
    Parser::new(input.as_bytes()).parse()
}

/// Parses a document from any byte stream with the default configuration.
pub fn parse_reader<R: Read>(reader: R) -> Result<Node> {
    Parser::new(reader).parse()
}

#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn parse_file(path: impl AsRef<Path>, config: ParserConfig) -> Result<Node> {
    let path = path.as_ref();
    debug!("Opening input file");

    let file = File::open(path).map_err(|e| {
        error!("Failed to open file: {}", e);
        Error::from(e).with_context(format!("Cannot read file: {}", path.display()))
    })?;

    let root = Parser::new(BufReader::new(file)).with_config(config).parse()?;
    info!(elements = root.count() - 1, "File parsed");
    Ok(root)
}

/// Compacts `root` and writes it to `writer`.
pub fn to_writer<W: Write + Send>(root: &mut Node, pool: &WorkerPool, writer: W) -> Result<W> {
    to_writer_with_config(root, pool, &WriterConfig::default(), writer)
}

/// Like [`to_writer`], with the fan-out thresholds and layout of `config`.
pub fn to_writer_with_config<W: Write + Send>(
    root: &mut Node,
    pool: &WorkerPool,
    config: &WriterConfig,
    writer: W,
) -> Result<W> {
    Compactor::new(pool).with_config(config).compact(root)?;
    Serializer::new(pool)
        .with_config(config.clone())
        .write_document(root, writer)
}

/// Compacts `root` and renders it into a string.
pub fn to_string(root: &mut Node, pool: &WorkerPool) -> Result<String> {
    to_string_with_config(root, pool, &WriterConfig::default())
}

/// Like [`to_string`], with the fan-out thresholds and layout of `config`.
pub fn to_string_with_config(
    root: &mut Node,
    pool: &WorkerPool,
    config: &WriterConfig,
) -> Result<String> {
    Compactor::new(pool).with_config(config).compact(root)?;
    Serializer::new(pool).with_config(config.clone()).to_string(root)
}

/// Writes `root` as it is; callers compact first.
#[instrument(skip(root, pool, config, path), fields(path = %path.as_ref().display()))]
pub fn write_file(
    path: impl AsRef<Path>,
    root: &Node,
    pool: &WorkerPool,
    config: WriterConfig,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        error!("Failed to create file: {}", e);
        Error::from(e).with_context(format!("Cannot write to file: {}", path.display()))
    })?;

    let file = Serializer::new(pool).with_config(config).write_document(root, file)?;
    file.sync_all().map_err(|e| {
        Error::from(e).with_context(format!("Cannot write to file: {}", path.display()))
    })?;
    info!("File written");
    Ok(())
}
