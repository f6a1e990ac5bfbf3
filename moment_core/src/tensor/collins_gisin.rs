//! Component G: the Collins-Gisin tensor.
//!
//! A dense array, one axis per party, each axis ranging over "no
//! constraint" (the shared index 0, standing for the identity) plus one
//! slot per (measurement, outcome) pair with the measurement's last
//! outcome dropped (its probability is implied by normalization). For
//! the CHSH scenario (2 parties, 2 binary measurements each) every
//! party's axis has dimension `1 + 2*(2-1) = 3`.

use itertools::Itertools;

use crate::error::MomentError;
use crate::operator::OperatorSequence;
use crate::symbol::SymbolTable;

use super::{
    index_to_offset, refresh_all, validate_index, CellSymbol, MeasurementLayout, PartyMeasurementIndex,
    PartyMeasurementOutcomeIndex, StorageMode, TensorCell,
};

#[derive(Debug, Clone, Copy)]
struct PartyAxisLayout {
    /// For local index `i >= 1` on this party's axis, `(measurement,
    /// outcome)` it represents. Index 0 is always the identity.
    start_of_measurement: Vec<usize>,
    outcomes_minus_one: Vec<usize>,
}

impl PartyAxisLayout {
    fn new(outcomes: &[usize]) -> Self {
        let mut start_of_measurement = Vec::with_capacity(outcomes.len());
        let mut acc = 1usize;
        let mut outcomes_minus_one = Vec::with_capacity(outcomes.len());
        for &o in outcomes {
            start_of_measurement.push(acc);
            let span = o.saturating_sub(1);
            outcomes_minus_one.push(span);
            acc += span;
        }
        Self {
            start_of_measurement,
            outcomes_minus_one,
        }
    }

    fn dimension(&self) -> usize {
        1 + self.outcomes_minus_one.iter().sum::<usize>()
    }

    fn range(&self, measurement: usize) -> Result<(usize, usize), MomentError> {
        let start = *self.start_of_measurement.get(measurement).ok_or_else(|| MomentError::BadCG {
            reason: format!("measurement {measurement} out of range"),
        })?;
        Ok((start, start + self.outcomes_minus_one[measurement]))
    }
}

#[derive(Debug)]
pub struct CollinsGisinTensor {
    dims: Vec<usize>,
    cells: Vec<TensorCell>,
    axes: Vec<PartyAxisLayout>,
    layout: MeasurementLayout,
    mode: StorageMode,
    has_all_symbols: bool,
}

impl CollinsGisinTensor {
    /// `outcomes[party][measurement]` gives that measurement's outcome
    /// count; `sequence_for(party, local_index)` must produce the
    /// operator sequence standing for that party's marginal at the
    /// given local axis index (0 = identity).
    pub fn new(
        outcomes: Vec<Vec<usize>>,
        sequence_for: impl Fn(usize, usize) -> OperatorSequence,
        mode: StorageMode,
    ) -> Result<Self, MomentError> {
        if outcomes.is_empty() {
            return Err(MomentError::BadCG {
                reason: "a Collins-Gisin tensor needs at least one party".to_string(),
            });
        }
        let axes: Vec<PartyAxisLayout> = outcomes.iter().map(|o| PartyAxisLayout::new(o)).collect();
        let dims: Vec<usize> = axes.iter().map(|a| a.dimension()).collect();
        let total: usize = dims.iter().product();

        let mut cells = Vec::with_capacity(total);
        for offset in 0..total {
            let index = super::offset_to_index(&dims, offset);
            let mut sequence = sequence_for(0, index[0]);
            for (party, &local) in index.iter().enumerate().skip(1) {
                let factor = sequence_for(party, local);
                sequence = combine_marginals(sequence, factor);
            }
            cells.push(TensorCell::new(sequence));
        }

        let layout = MeasurementLayout::new(outcomes.iter().map(|o| o.len()).collect());

        Ok(Self {
            dims,
            cells,
            axes,
            layout,
            mode,
            has_all_symbols: false,
        })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// The contiguous axis slot range `[start, end)` a single party's
    /// measurement occupies (the `outcomes - 1` explicit outcomes; the
    /// dropped last outcome has no slot of its own).
    pub fn axis_range(&self, party: usize, measurement: usize) -> Result<(usize, usize), MomentError> {
        self.axes
            .get(party)
            .ok_or_else(|| MomentError::BadCG {
                reason: format!("party {party} out of range"),
            })?
            .range(measurement)
    }

    /// The range of cells that iterates over every combination of
    /// operators at `free` measurements while holding each of `fixed`'s
    /// axes at its chosen (1-indexed) explicit outcome. Parties named in
    /// neither list are held at their identity slot (axis index 0).
    /// Fails with `BadCG` if any party/measurement/outcome is out of
    /// bounds, or if a party appears in both lists.
    pub fn measurement_to_range(
        &self,
        free: &[PartyMeasurementIndex],
        fixed: &[PartyMeasurementOutcomeIndex],
    ) -> Result<CellRange<'_>, MomentError> {
        let mut seen_parties = hashbrown::HashSet::new();
        for f in free {
            if !seen_parties.insert(f.party) {
                return Err(MomentError::BadCG {
                    reason: format!("party {} named more than once among free measurements", f.party),
                });
            }
        }
        for fx in fixed {
            if !seen_parties.insert(fx.party) {
                return Err(MomentError::BadCG {
                    reason: format!("party {} appears in both the free and fixed lists", fx.party),
                });
            }
        }

        let mut per_party_axis_values: Vec<Vec<usize>> = vec![vec![0]; self.dims.len()];
        for f in free {
            let (start, end) = self.axis_range(f.party, f.measurement)?;
            per_party_axis_values[f.party] = (start..end).collect();
        }
        for fx in fixed {
            let (start, end) = self.axis_range(fx.party, fx.measurement)?;
            let explicit_outcomes = end - start;
            if fx.outcome == 0 || fx.outcome > explicit_outcomes {
                return Err(MomentError::BadCG {
                    reason: format!(
                        "outcome {} out of range for party {} measurement {} ({explicit_outcomes} explicit outcomes, 1-indexed)",
                        fx.outcome, fx.party, fx.measurement
                    ),
                });
            }
            per_party_axis_values[fx.party] = vec![start + fx.outcome - 1];
        }

        let indices: Vec<Vec<usize>> = per_party_axis_values.into_iter().multi_cartesian_product().collect();
        Ok(CellRange { tensor: self, indices })
    }

    /// Convenience overload of [`Self::measurement_to_range`] for the
    /// common case where every named measurement is free and no party
    /// needs to be fixed to a specific outcome.
    pub fn measurement_to_range_free(&self, free: &[PartyMeasurementIndex]) -> Result<CellRange<'_>, MomentError> {
        self.measurement_to_range(free, &[])
    }

    pub fn global_measurement_index(&self, party: usize, measurement: usize) -> Result<usize, MomentError> {
        self.layout
            .global_measurement_index(super::PartyMeasurementIndex { party, measurement })
    }

    pub fn sequence_at(&self, index: &[usize]) -> Result<&OperatorSequence, MomentError> {
        let offset = index_to_offset(&self.dims, index)?;
        let cell = &self.cells[offset];
        if self.mode == StorageMode::Virtual && self.has_all_symbols {
            return Err(MomentError::BadCG {
                reason: "operator sequence discarded after virtual-mode resolution".to_string(),
            });
        }
        Ok(&cell.sequence)
    }

    pub fn symbol_at(&self, index: &[usize]) -> Result<CellSymbol, MomentError> {
        validate_index(&self.dims, index)?;
        let offset = index_to_offset(&self.dims, index)?;
        Ok(self.cells[offset].symbol)
    }

    pub fn has_all_symbols(&self) -> bool {
        self.has_all_symbols
    }

    /// Resolves every still-unresolved cell against `table`. Once every
    /// cell has a symbol, `Virtual`-mode storage drops the retained
    /// operator sequences.
    pub fn refresh_symbols(&mut self, table: &(dyn SymbolTable + Sync)) -> bool {
        if self.has_all_symbols {
            return true;
        }
        let all_resolved = refresh_all(&mut self.cells, table);
        if all_resolved {
            self.has_all_symbols = true;
            if self.mode == StorageMode::Virtual {
                for cell in &mut self.cells {
                    cell.sequence = OperatorSequence::zero();
                }
            }
        }
        all_resolved
    }
}

/// A single cell in a [`CellRange`]: its full multi-index plus whatever
/// the tensor currently knows about it.
#[derive(Debug, Clone)]
pub struct CellView<'a> {
    pub index: Vec<usize>,
    pub sequence: &'a OperatorSequence,
    pub hash: u64,
    pub symbol: CellSymbol,
}

/// A forward-iterable slice of a [`CollinsGisinTensor`] produced by
/// [`CollinsGisinTensor::measurement_to_range`]: every combination of the
/// free measurements' explicit outcomes, with fixed/unmentioned parties
/// held at a single axis value.
#[derive(Debug)]
pub struct CellRange<'a> {
    tensor: &'a CollinsGisinTensor,
    indices: Vec<Vec<usize>>,
}

impl<'a> CellRange<'a> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CellView<'a>> + '_ {
        let tensor = self.tensor;
        self.indices.iter().map(move |index| {
            let offset = index_to_offset(&tensor.dims, index).expect("CellRange indices are validated at construction");
            let cell = &tensor.cells[offset];
            CellView {
                index: index.clone(),
                sequence: &cell.sequence,
                hash: cell.sequence.hash(),
                symbol: cell.symbol,
            }
        })
    }
}

impl<'a> IntoIterator for &'a CellRange<'a> {
    type Item = CellView<'a>;
    type IntoIter = Box<dyn Iterator<Item = CellView<'a>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Combines two single-party marginal sequences into the joint
/// sequence for a multi-party cell. Parties act on disjoint sites, so
/// the combined raw tuple is just the concatenation, re-sorted and
/// re-hashed by whichever non-trivial sequence carries real structure;
/// the identity marginal (empty raw tuple) contributes nothing.
fn combine_marginals(mut left: OperatorSequence, right: OperatorSequence) -> OperatorSequence {
    if right.is_empty() {
        return left;
    }
    if left.is_empty() {
        return right;
    }
    let mut raw = left.raw().to_vec();
    raw.extend_from_slice(right.raw());
    let sign = left.sign().mul(right.sign());
    // No shared reducer is available at this layer (tensors are
    // context-agnostic); the caller's `sequence_for` closure is
    // responsible for supplying already-normalized single-party
    // sequences, so concatenation alone is the joint sequence's raw
    // tuple. We still keep the pair sorted by the raw encoding so
    // equal joint operators hash identically regardless of party
    // visiting order.
    raw.sort_unstable();
    left = OperatorSequence::from_raw_parts(raw, sign, 0);
    left
}
