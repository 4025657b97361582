//! Cells and the arena that owns them.
//!
//! A cell holds up to 1023 data bits and up to four ordered references to
//! other cells. Cells live in a [`CellGraph`] and reference each other through
//! [`CellId`] handles, so the same child can sit under many parents (or under
//! one parent several times) without shared ownership. The arena accepts any
//! reference pattern while cells are being built; cycles are rejected by the
//! traversals that need acyclic input (hashing, depth, printing, serializing).

pub mod slice;

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::bits::{BitString, MAX_CELL_BITS};
use crate::error::{CellError, Result};
use crate::hash::{hash_base64, hash_hex, sha256, CellHash};

pub use self::slice::CellSlice;

/// Maximum number of references per cell.
pub const MAX_CELL_REFS: usize = 4;

/// Handle of a cell inside a [`CellGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    /// Position of the cell in its graph.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An ordinary (level 0) cell: data bits plus child handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    bits: BitString,
    refs: Vec<CellId>,
}

impl Cell {
    /// Create an empty cell with the full 1023-bit data budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cell around existing data.
    pub fn with_bits(bits: BitString) -> Result<Self> {
        Ok(Self {
            bits: bits.into_capacity(MAX_CELL_BITS)?,
            refs: Vec::new(),
        })
    }

    pub fn bits(&self) -> &BitString {
        &self.bits
    }

    pub fn bits_mut(&mut self) -> &mut BitString {
        &mut self.bits
    }

    pub fn refs(&self) -> &[CellId] {
        &self.refs
    }

    /// `d1 = refs + 8·exotic + 32·level`; only ordinary cells exist here.
    pub fn refs_descriptor(&self) -> u8 {
        self.refs.len() as u8
    }

    /// `d2 = ⌊bits/8⌋ + ⌈bits/8⌉`.
    pub fn bits_descriptor(&self) -> u8 {
        let used = self.bits.used_bits();
        (used / 8 + used.div_ceil(8)) as u8
    }

    /// Descriptor bytes followed by the completion-padded data.
    pub fn data_with_descriptors(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.bits.used_bytes());
        out.push(self.refs_descriptor());
        out.push(self.bits_descriptor());
        out.extend_from_slice(&self.bits.top_upped_bytes());
        out
    }
}

/// Hash and depth of one cell, as embedded in its parents' representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMeta {
    pub hash: CellHash,
    pub depth: u16,
}

/// Memoised [`CellMeta`] for every cell reachable from some root.
#[derive(Debug, Clone, Default)]
pub struct CellMetrics {
    entries: HashMap<CellId, CellMeta>,
}

impl CellMetrics {
    pub fn get(&self, id: CellId) -> Option<&CellMeta> {
        self.entries.get(&id)
    }

    /// Hash of a cell covered by these metrics.
    pub fn hash(&self, id: CellId) -> Result<CellHash> {
        self.get(id)
            .map(|m| m.hash)
            .ok_or(CellError::UnknownCell(id))
    }

    pub fn depth(&self, id: CellId) -> Result<u16> {
        self.get(id)
            .map(|m| m.depth)
            .ok_or(CellError::UnknownCell(id))
    }

    /// Number of distinct cell handles covered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Arena owning a set of cells.
#[derive(Debug, Clone, Default)]
pub struct CellGraph {
    cells: Vec<Cell>,
}

impl CellGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty cell and return its handle.
    pub fn new_cell(&mut self) -> CellId {
        self.push_cell(Cell::new())
    }

    /// Add a cell holding `bits` and no references yet.
    pub fn add_bits(&mut self, bits: BitString) -> Result<CellId> {
        Ok(self.push_cell(Cell::with_bits(bits)?))
    }

    fn push_cell(&mut self, cell: Cell) -> CellId {
        let id = CellId(self.cells.len());
        self.cells.push(cell);
        id
    }

    /// Look up a cell by handle.
    pub fn cell(&self, id: CellId) -> Result<&Cell> {
        self.cells.get(id.0).ok_or(CellError::UnknownCell(id))
    }

    /// Look up a cell by handle (mutable).
    pub fn cell_mut(&mut self, id: CellId) -> Result<&mut Cell> {
        self.cells.get_mut(id.0).ok_or(CellError::UnknownCell(id))
    }

    /// Data bits of a cell, for writing.
    pub fn bits_mut(&mut self, id: CellId) -> Result<&mut BitString> {
        Ok(self.cell_mut(id)?.bits_mut())
    }

    /// Append a reference from `parent` to `child`.
    pub fn push_ref(&mut self, parent: CellId, child: CellId) -> Result<()> {
        self.cell(child)?;
        let cell = self.cell_mut(parent)?;
        if cell.refs.len() >= MAX_CELL_REFS {
            return Err(CellError::TooManyRefs {
                cell: parent,
                max: MAX_CELL_REFS,
            });
        }
        cell.refs.push(child);
        Ok(())
    }

    /// Append the bits and references of `source` to `target`.
    ///
    /// Both limits are checked first, so a failure leaves `target` untouched.
    pub fn write_cell(&mut self, target: CellId, source: CellId) -> Result<()> {
        let src = self.cell(source)?.clone();
        let dst = self.cell(target)?;
        if dst.refs.len() + src.refs.len() > MAX_CELL_REFS {
            return Err(CellError::TooManyRefs {
                cell: target,
                max: MAX_CELL_REFS,
            });
        }
        let dst = self.cell_mut(target)?;
        dst.bits.write_bit_string(&src.bits)?;
        dst.refs.extend_from_slice(&src.refs);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all cells with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells.iter().enumerate().map(|(i, c)| (CellId(i), c))
    }

    /// Compute hash and depth of every cell reachable from `root`.
    ///
    /// Children are finished before their parents (post-order) using an
    /// explicit stack. Meeting a cell that is still in progress means the
    /// graph loops back on itself.
    pub fn metrics(&self, root: CellId) -> Result<CellMetrics> {
        self.cell(root)?;
        let mut state: HashMap<CellId, Visit> = HashMap::new();
        let mut metrics = CellMetrics::default();
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            let cell = self.cell(id)?;
            if expanded {
                let meta = self.compute_meta(id, cell, &metrics)?;
                metrics.entries.insert(id, meta);
                state.insert(id, Visit::Done);
                continue;
            }
            match state.get(&id) {
                Some(Visit::Done) => continue,
                Some(Visit::InProgress) => return Err(CellError::CycleDetected(id)),
                None => {}
            }
            state.insert(id, Visit::InProgress);
            stack.push((id, true));
            for &child in cell.refs.iter().rev() {
                self.cell(child)?;
                match state.get(&child) {
                    Some(Visit::Done) => {}
                    Some(Visit::InProgress) => return Err(CellError::CycleDetected(child)),
                    None => stack.push((child, false)),
                }
            }
        }

        Ok(metrics)
    }

    fn compute_meta(&self, id: CellId, cell: &Cell, metrics: &CellMetrics) -> Result<CellMeta> {
        let mut depth = 0u16;
        for &child in &cell.refs {
            let child_depth = metrics.depth(child)?;
            let candidate = child_depth
                .checked_add(1)
                .ok_or(CellError::DepthOverflow(id))?;
            depth = depth.max(candidate);
        }
        let repr = Self::repr_with(cell, metrics)?;
        Ok(CellMeta {
            hash: sha256(&repr),
            depth,
        })
    }

    fn repr_with(cell: &Cell, metrics: &CellMetrics) -> Result<Vec<u8>> {
        let mut repr = cell.data_with_descriptors();
        for &child in &cell.refs {
            repr.extend_from_slice(&metrics.depth(child)?.to_be_bytes());
        }
        for &child in &cell.refs {
            repr.extend_from_slice(&metrics.hash(child)?);
        }
        Ok(repr)
    }

    /// Standard cell representation: descriptors, padded data, child depths,
    /// child hashes.
    pub fn repr(&self, id: CellId) -> Result<Vec<u8>> {
        let metrics = self.metrics(id)?;
        Self::repr_with(self.cell(id)?, &metrics)
    }

    /// SHA-256 of the cell's standard representation.
    pub fn hash(&self, id: CellId) -> Result<CellHash> {
        self.metrics(id)?.hash(id)
    }

    pub fn hash_hex(&self, id: CellId) -> Result<String> {
        Ok(hash_hex(&self.hash(id)?))
    }

    pub fn hash_base64(&self, id: CellId) -> Result<String> {
        Ok(hash_base64(&self.hash(id)?))
    }

    /// 0 for a leaf, otherwise one more than the deepest child.
    pub fn max_depth(&self, id: CellId) -> Result<u16> {
        self.metrics(id)?.depth(id)
    }

    /// Open a read cursor over a cell.
    pub fn parse(&self, id: CellId) -> Result<CellSlice<'_>> {
        Ok(CellSlice::new(self, id, self.cell(id)?))
    }

    /// Fift-style dump: one `x{HEX}` line per cell, children indented.
    ///
    /// A cell reached again through another reference prints as
    /// `x{HEX} -> #N` without its children, so shared subtrees are expanded
    /// once.
    pub fn print(&self, root: CellId) -> Result<String> {
        // Rejects cycles before walking.
        self.metrics(root)?;
        let mut out = String::new();
        let mut expanded = HashSet::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((id, indent)) = stack.pop() {
            let cell = self.cell(id)?;
            out.push_str(&" ".repeat(indent));
            if !expanded.insert(id) {
                out.push_str(&format!("x{{{}}} -> {id}\n", cell.bits.to_hex()));
                continue;
            }
            out.push_str(&format!("x{{{}}}\n", cell.bits.to_hex()));
            for &child in cell.refs.iter().rev() {
                stack.push((child, indent + 1));
            }
        }
        Ok(out)
    }
}
