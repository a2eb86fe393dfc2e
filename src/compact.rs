//! Removal of vestigial elements before serialization

use tracing::{debug, instrument};

use crate::{config::WriterConfig, error::Result, node::Node, pool::WorkerPool};

/// Drops every element left without body, attributes and children,
/// bottom-up, so parents emptied by the pass are dropped as well.
#[instrument(skip_all, fields(children = root.children.len()))]
pub fn compact(root: &mut Node, pool: &WorkerPool) -> Result<()> {
    let before = root.count();
    Compactor::new(pool).compact(root)?;
    debug!(removed = before - root.count(), "tree compacted");
    Ok(())
}

/// Compaction pass over a tree
#[derive(Debug, Clone, Copy)]
pub struct Compactor<'p> {
    pool: &'p WorkerPool,
    fan_out: usize,
}

impl<'p> Compactor<'p> {
    pub fn new(pool: &'p WorkerPool) -> Self {
        Self {
            pool,
            fan_out: WriterConfig::default().compact_fan_out,
        }
    }

    pub fn with_config(mut self, config: &WriterConfig) -> Self {
        self.fan_out = config.compact_fan_out;
        self
    }

    /// Compacts the subtree under `node`. The node itself is never removed.
    pub fn compact(&self, node: &mut Node) -> Result<()> {
        if node.children.len() < self.fan_out {
            for child in &mut node.children {
                self.compact(child)?;
            }
        } else {
            self.pool.fan_out_mut(&mut node.children, |chunk| {
                chunk.iter_mut().try_for_each(|child| self.compact(child))
            })?;
        }

        node.children.retain(|child| !child.is_vestigial());
        Ok(())
    }
}
