//! Growable sparse boolean matrix backing label, relation and adjacency classes.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::types::{GraphError, Result};

type Row = SmallVec<[u64; 4]>;

/// Square sparse boolean matrix; rows are kept sorted so lookups binary search.
#[derive(Clone, Debug, Default)]
pub struct SparseMatrix {
    dim: u64,
    rows: FxHashMap<u64, Row>,
    nvals: u64,
}

impl SparseMatrix {
    /// Creates an empty `dim x dim` matrix.
    pub fn new(dim: u64) -> Self {
        Self {
            dim,
            rows: FxHashMap::default(),
            nvals: 0,
        }
    }

    /// Current row/column count.
    pub fn dim(&self) -> u64 {
        self.dim
    }

    /// Number of set entries.
    pub fn nvals(&self) -> u64 {
        self.nvals
    }

    /// Grows the matrix to `dim x dim`; shrinking is not supported.
    ///
    /// Returns `true` when the dimension actually changed.
    pub fn resize(&mut self, dim: u64) -> bool {
        if dim <= self.dim {
            return false;
        }
        self.dim = dim;
        true
    }

    /// Sets entry `(row, col)`; setting an already-set entry is a no-op.
    pub fn set(&mut self, row: u64, col: u64) -> Result<()> {
        if row >= self.dim || col >= self.dim {
            return Err(GraphError::Invalid("matrix index out of bounds"));
        }
        let entries = self.rows.entry(row).or_default();
        if let Err(pos) = entries.binary_search(&col) {
            entries.insert(pos, col);
            self.nvals += 1;
        }
        Ok(())
    }

    /// Returns `true` when entry `(row, col)` is set.
    pub fn get(&self, row: u64, col: u64) -> bool {
        self.rows
            .get(&row)
            .is_some_and(|entries| entries.binary_search(&col).is_ok())
    }

    /// Sorted column indices set in `row`.
    pub fn row(&self, row: u64) -> &[u64] {
        self.rows.get(&row).map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Diagonal entries in ascending order; used for label matrices.
    pub fn diagonal(&self) -> Vec<u64> {
        let mut diag: Vec<u64> = self
            .rows
            .iter()
            .filter(|(row, cols)| cols.binary_search(row).is_ok())
            .map(|(row, _)| *row)
            .collect();
        diag.sort_unstable();
        diag
    }
}
