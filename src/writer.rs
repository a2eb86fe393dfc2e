//! XML serializer
//!
//! Renders a tree depth-first, indenting by nesting depth. Elements with more
//! than [`WriterConfig::serialize_fan_out`] children are rendered by several
//! workers. Each worker renders its range into a private buffer and appends
//! that buffer to the shared output every [`WriterConfig::flush_every`]
//! children, so output from different ranges may interleave. Within a range
//! the document order is kept; a pool with a single worker always writes
//! the whole document in order.

use std::io::{BufWriter, Write};

use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::{
    config::WriterConfig,
    error::{Error, Result},
    escape::escape,
    node::Node,
    pool::WorkerPool,
};

const SPACES: &str = "                                                                ";

/// Destination of rendered text
pub trait Sink: Send {
    fn append(&mut self, text: &str) -> Result<()>;
}

impl Sink for String {
    fn append(&mut self, text: &str) -> Result<()> {
        self.push_str(text);
        Ok(())
    }
}

/// [`Sink`] over any byte writer
#[derive(Debug)]
pub struct IoSink<W: Write> {
    writer: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for IoSink<W> {
    fn append(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|e| Error::from(e).with_context("writing serialized output"))
    }
}

/// Renders trees as indented XML text
#[derive(Debug)]
pub struct Serializer<'p> {
    pool: &'p WorkerPool,
    config: WriterConfig,
}

impl<'p> Serializer<'p> {
    pub fn new(pool: &'p WorkerPool) -> Self {
        Self {
            pool,
            config: WriterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Writes the declaration and every top-level element under `root`.
    #[instrument(skip_all, fields(elements = root.children.len()))]
    pub fn write_document<W: Write + Send>(&self, root: &Node, writer: W) -> Result<W> {
        let mut sink = IoSink::new(BufWriter::new(writer));
        self.render_document(root, &mut sink)?;
        let writer = sink
            .into_inner()
            .into_inner()
            .map_err(|e| Error::from(e.into_error()).with_context("flushing serialized output"))?;
        debug!("document written");
        Ok(writer)
    }

    /// Renders the document into a string.
    pub fn to_string(&self, root: &Node) -> Result<String> {
        let mut out = String::new();
        self.render_document(root, &mut out)?;
        Ok(out)
    }

    pub fn render_document<S: Sink>(&self, root: &Node, out: &mut S) -> Result<()> {
        out.append(&self.config.declaration)?;
        out.append("\n")?;
        for child in &root.children {
            self.render(child, 0, out)?;
        }
        Ok(())
    }

    /// Renders `node` and its subtree at `depth`.
    pub fn render<S: Sink>(&self, node: &Node, depth: usize, out: &mut S) -> Result<()> {
        self.indent(depth, out)?;
        out.append("<")?;
        out.append(&node.name)?;
        for attr in &node.attributes {
            if let Some(value) = &attr.value {
                out.append(" ")?;
                out.append(&attr.name)?;
                out.append("=\"")?;
                out.append(&escape(value))?;
                out.append("\"")?;
            }
        }

        if node.body.is_none() && node.children.is_empty() {
            return out.append(" />\n");
        }

        out.append(">")?;
        if !node.children.is_empty() {
            out.append("\n")?;
        }

        if node.children.len() > self.config.serialize_fan_out {
            self.render_wide(node, depth, out)?;
        } else {
            for child in &node.children {
                self.render(child, depth + 1, out)?;
            }
        }

        match &node.body {
            Some(body) => out.append(&escape(body))?,
            None => self.indent(depth, out)?,
        }
        out.append("</")?;
        out.append(&node.name)?;
        out.append(">\n")
    }

    /// Renders the children of `node` on the worker pool.
    fn render_wide<S: Sink>(&self, node: &Node, depth: usize, out: &mut S) -> Result<()> {
        let flush_every = self.config.flush_every.max(1);
        let shared = Mutex::new(out);

        self.pool.fan_out(&node.children, |start, chunk| {
            let mut local = String::new();
            for (offset, child) in chunk.iter().enumerate() {
                self.render(child, depth + 1, &mut local)?;
                if (start + offset) % flush_every == 0 {
                    shared.lock().append(&local)?;
                    local.clear();
                }
            }
            shared.lock().append(&local)
        })
    }

    fn indent<S: Sink>(&self, depth: usize, out: &mut S) -> Result<()> {
        let mut width = depth * self.config.indent_width;
        while width > 0 {
            let step = width.min(SPACES.len());
            out.append(SPACES.get(..step).unwrap_or_default())?;
            width -= step;
        }
        Ok(())
    }
}
