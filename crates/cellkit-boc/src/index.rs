//! Topological ordering of a cell tree with content deduplication.
//!
//! Cells are visited depth-first in pre-order. The first occurrence of each
//! hash claims the next position. When a duplicate shows up under a parent
//! that is already positioned after the existing copy, that copy (and then
//! its whole subtree) is moved to the end of the order, so every reference in
//! the serialized bag points forward.

use std::collections::HashMap;

use cellkit_core::{CellError, CellGraph, CellHash, CellId, CellMetrics};

/// Ordered, deduplicated list of the cells under one root.
#[derive(Debug, Clone)]
pub struct CellIndex {
    order: Vec<CellId>,
    positions: HashMap<CellHash, usize>,
    metrics: CellMetrics,
}

impl CellIndex {
    /// Index every cell reachable from `root`.
    ///
    /// Fails on cycles and on handles that don't belong to `graph`.
    pub fn build(graph: &CellGraph, root: CellId) -> Result<Self, CellError> {
        let metrics = graph.metrics(root)?;
        let mut index = CellIndex {
            order: Vec::new(),
            positions: HashMap::new(),
            metrics,
        };

        let mut stack: Vec<(CellId, Option<CellHash>)> = vec![(root, None)];
        while let Some((id, parent)) = stack.pop() {
            let hash = index.metrics.hash(id)?;

            if let Some(&existing) = index.positions.get(&hash) {
                let parent_pos = parent.and_then(|p| index.positions.get(&p).copied());
                if parent_pos.is_some_and(|p| p > existing) {
                    index.move_to_end(graph, hash)?;
                }
                continue;
            }

            index.positions.insert(hash, index.order.len());
            index.order.push(id);
            for &child in graph.cell(id)?.refs().iter().rev() {
                stack.push((child, Some(hash)));
            }
        }

        Ok(index)
    }

    /// Move the cell with `target` hash to the end, then do the same for
    /// each of its descendants in pre-order.
    fn move_to_end(&mut self, graph: &CellGraph, target: CellHash) -> Result<(), CellError> {
        let mut stack = vec![target];
        while let Some(hash) = stack.pop() {
            let Some(&from) = self.positions.get(&hash) else {
                continue;
            };
            let id = self.order.remove(from);
            self.order.push(id);
            for (pos, moved) in self.order.iter().enumerate().skip(from) {
                self.positions.insert(self.metrics.hash(*moved)?, pos);
            }
            tracing::trace!(cell = %id, from, to = self.order.len() - 1, "moved cell to end");

            let refs = graph.cell(id)?.refs();
            for &child in refs.iter().rev() {
                stack.push(self.metrics.hash(child)?);
            }
        }
        Ok(())
    }

    /// Cells in serialization order.
    pub fn order(&self) -> &[CellId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position assigned to a hash.
    pub fn position(&self, hash: &CellHash) -> Option<usize> {
        self.positions.get(hash).copied()
    }

    /// Position of the cell a handle resolves to (by content).
    pub fn position_of(&self, id: CellId) -> Result<usize, CellError> {
        let hash = self.metrics.hash(id)?;
        self.position(&hash).ok_or(CellError::UnknownCell(id))
    }

    /// Hashes and depths computed while indexing.
    pub fn metrics(&self) -> &CellMetrics {
        &self.metrics
    }
}
