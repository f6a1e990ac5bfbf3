//! Shared indexing helpers for the three tensor types (components G-I):
//! Collins-Gisin, probability, and full-correlator tensors all share a
//! column-major layout, a deferred symbol-resolution cell, and the
//! party/measurement/outcome indexing scheme used by locality scenarios.

pub mod collins_gisin;
pub mod full_correlator;
pub mod probability;

use crate::error::MomentError;
use crate::operator::OperatorSequence;
use crate::symbol::{BasisKey, SymbolId, SymbolLookup, SymbolTable};

pub use collins_gisin::{CellRange, CellView, CollinsGisinTensor};
pub use full_correlator::FullCorrelatorTensor;
pub use probability::ProbabilityTensor;

/// A zero-based (party, measurement) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartyMeasurementIndex {
    pub party: usize,
    pub measurement: usize,
}

/// A zero-based (party, measurement, outcome) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartyMeasurementOutcomeIndex {
    pub party: usize,
    pub measurement: usize,
    pub outcome: usize,
}

/// Converts a column-major multi-index into a flat offset, validating it
/// against `dims` on the way.
pub fn index_to_offset(dims: &[usize], index: &[usize]) -> Result<usize, MomentError> {
    validate_index(dims, index)?;
    let mut offset = 0usize;
    let mut stride = 1usize;
    for (dim, idx) in dims.iter().zip(index) {
        offset += idx * stride;
        stride *= dim;
    }
    Ok(offset)
}

pub fn offset_to_index(dims: &[usize], mut offset: usize) -> Vec<usize> {
    let mut index = Vec::with_capacity(dims.len());
    for &dim in dims {
        index.push(offset % dim);
        offset /= dim;
    }
    index
}

pub fn validate_index(dims: &[usize], index: &[usize]) -> Result<(), MomentError> {
    if dims.len() != index.len() {
        return Err(MomentError::BadTensorIndex {
            index: index.to_vec(),
            reason: format!("expected {} indices, got {}", dims.len(), index.len()),
        });
    }
    for (axis, (&dim, &idx)) in dims.iter().zip(index).enumerate() {
        if idx >= dim {
            return Err(MomentError::BadTensorIndex {
                index: index.to_vec(),
                reason: format!("axis {axis} index {idx} out of range for dimension {dim}"),
            });
        }
    }
    Ok(())
}

/// Maps (party, measurement) pairs onto a single global index, with
/// global index 0 reserved for the identity/normalization element; party
/// offsets therefore start at 1.
#[derive(Debug, Clone)]
pub struct MeasurementLayout {
    per_party: Vec<usize>,
    offsets: Vec<usize>,
}

impl MeasurementLayout {
    pub fn new(per_party: Vec<usize>) -> Self {
        let mut offsets = Vec::with_capacity(per_party.len());
        let mut acc = 1usize;
        for &n in &per_party {
            offsets.push(acc);
            acc += n;
        }
        Self { per_party, offsets }
    }

    pub fn parties(&self) -> usize {
        self.per_party.len()
    }

    pub fn measurements_for(&self, party: usize) -> usize {
        self.per_party[party]
    }

    pub fn global_measurement_index(&self, idx: PartyMeasurementIndex) -> Result<usize, MomentError> {
        let count = *self.per_party.get(idx.party).ok_or_else(|| MomentError::BadTensorIndex {
            index: vec![idx.party],
            reason: "party out of range".to_string(),
        })?;
        if idx.measurement >= count {
            return Err(MomentError::BadTensorIndex {
                index: vec![idx.party, idx.measurement],
                reason: "measurement out of range for party".to_string(),
            });
        }
        Ok(self.offsets[idx.party] + idx.measurement)
    }

    pub fn total_global_indices(&self) -> usize {
        self.offsets.last().copied().unwrap_or(1) + self.per_party.last().copied().unwrap_or(0)
    }
}

/// A tensor cell's symbol reference: resolution only ever moves
/// `Unresolved -> Resolved`, never back, so `has_all_symbols` is
/// monotonic across repeated `refresh_symbols` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSymbol {
    Unresolved,
    Resolved {
        symbol: SymbolId,
        conjugated: bool,
        basis: BasisKey,
    },
}

impl CellSymbol {
    pub fn symbol_id(&self) -> Option<SymbolId> {
        match self {
            CellSymbol::Unresolved => None,
            CellSymbol::Resolved { symbol, .. } => Some(*symbol),
        }
    }

    pub fn conjugated(&self) -> Option<bool> {
        match self {
            CellSymbol::Unresolved => None,
            CellSymbol::Resolved { conjugated, .. } => Some(*conjugated),
        }
    }

    /// The resolved symbol's real-basis index, the coordinate this cell
    /// occupies in the solver's moment vector (spec: "optionally the
    /// real-basis index").
    pub fn real_basis_index(&self) -> Option<usize> {
        match self {
            CellSymbol::Unresolved => None,
            CellSymbol::Resolved { basis, .. } => basis.real_index(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, CellSymbol::Resolved { .. })
    }
}

/// Common cell shape for all three tensors: the operator sequence the
/// index stands for and its (possibly still unresolved) symbol.
#[derive(Debug, Clone)]
pub struct TensorCell {
    pub sequence: OperatorSequence,
    pub symbol: CellSymbol,
}

impl TensorCell {
    pub fn new(sequence: OperatorSequence) -> Self {
        Self {
            sequence,
            symbol: CellSymbol::Unresolved,
        }
    }

    fn refresh(&mut self, table: &(dyn SymbolTable + Sync)) {
        if self.symbol.is_resolved() {
            return;
        }
        if let Some(lookup) = table.where_hash(self.sequence.hash()) {
            let (symbol, conjugated) = match lookup {
                SymbolLookup::Own(id) => (id, false),
                SymbolLookup::AliasOf { symbol, conjugated } => (symbol, conjugated),
            };
            // A symbol resolved via lookup always has a basis entry in a
            // well-formed table; fall back to "absent" rather than panic
            // if a consumer's table disagrees, since refresh must never
            // fail outright (it only ever moves a cell forward).
            let basis = table.to_basis(symbol).unwrap_or(BasisKey::new(BasisKey::ABSENT, BasisKey::ABSENT));
            self.symbol = CellSymbol::Resolved { symbol, conjugated, basis };
        }
    }
}

/// Eagerly-built dense storage of every cell vs. on-demand recomputation
/// from the underlying operator-sequence builder. Both expose the same
/// cell API; `Virtual` trades memory for recomputing a cell's sequence
/// on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Explicit,
    Virtual,
}

/// Resolves every still-`Unresolved` cell in `cells` against `table`,
/// returning true iff every cell is now resolved. Cells are independent
/// of one another, so this is the bulk per-cell work `moment_maybe_rayon`
/// exists for: with the `parallel` feature enabled, large tensors refresh
/// their cells across a rayon thread pool instead of one at a time.
pub fn refresh_all(cells: &mut [TensorCell], table: &(dyn SymbolTable + Sync)) -> bool {
    use moment_maybe_rayon::*;
    cells.par_iter_mut().for_each(|cell| cell.refresh(table));
    cells.iter().all(|cell| cell.symbol.is_resolved())
}
