//! Component E: translational-symmetry canonicalization.
//!
//! Three variants, chosen once at `PauliContext` construction and
//! dispatched through the `Simplifier` enum rather than a trait object
//! or virtual call: `NonwrappingChainSimplifier` and
//! `NonwrappingLatticeSimplifier` normalize by translating the occupied
//! support to the origin (no wraparound is possible, so the
//! representative is unique without a search), while `WrappingSimplifier`
//! searches the full cyclic-shift orbit via the bit-packed site hasher.

use crate::error::MomentError;
use crate::operator::{Operator, OperatorSequence, Sign, SequenceReducer};

use super::context::{PauliContext, WrapMode};
use super::site_hasher::{WrappingSiteHasher, QUBITS_PER_SLIDE, MAX_SLIDES};

pub trait MomentSimplifier {
    /// The representative of `sequence`'s translation orbit.
    fn canonical_sequence(&self, context: &PauliContext, sequence: &OperatorSequence) -> OperatorSequence;

    /// True iff `sequence` is already its orbit's representative.
    fn is_canonical(&self, context: &PauliContext, sequence: &OperatorSequence) -> bool {
        let canon = self.canonical_sequence(context, sequence);
        canon.hash() == sequence.hash() && canon.raw() == sequence.raw()
    }

    fn impl_label(&self) -> &'static str;
}

fn occupied_sites(sequence: &OperatorSequence) -> Vec<usize> {
    sequence.raw().iter().map(|&op| (op / 3) as usize).collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NonwrappingChainSimplifier;

impl NonwrappingChainSimplifier {
    /// The shift that moves the leftmost occupied site to 0; `None` for
    /// the identity sequence (already canonical, no shift needed).
    pub fn chain_offset(&self, sequence: &OperatorSequence) -> Option<isize> {
        occupied_sites(sequence).into_iter().min().map(|m| -(m as isize))
    }
}

impl MomentSimplifier for NonwrappingChainSimplifier {
    fn canonical_sequence(&self, context: &PauliContext, sequence: &OperatorSequence) -> OperatorSequence {
        let Some(offset) = self.chain_offset(sequence) else {
            return sequence.clone();
        };
        if offset == 0 {
            return sequence.clone();
        }
        shift_sequence_flat(context, sequence, offset)
    }

    fn impl_label(&self) -> &'static str {
        "nonwrapping-chain"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NonwrappingLatticeSimplifier;

impl NonwrappingLatticeSimplifier {
    /// The (row, col) shift that moves the topmost, then leftmost,
    /// occupied site to (0, 0).
    pub fn lattice_offset(&self, context: &PauliContext, sequence: &OperatorSequence) -> Option<(isize, isize)> {
        let (_, row_width) = context.effective_geometry();
        let sites = occupied_sites(sequence);
        let min_site = sites.into_iter().min()?;
        let row = (min_site / row_width) as isize;
        let col = (min_site % row_width) as isize;
        Some((-row, -col))
    }
}

impl MomentSimplifier for NonwrappingLatticeSimplifier {
    fn canonical_sequence(&self, context: &PauliContext, sequence: &OperatorSequence) -> OperatorSequence {
        let Some((row_offset, col_offset)) = self.lattice_offset(context, sequence) else {
            return sequence.clone();
        };
        if row_offset == 0 && col_offset == 0 {
            return sequence.clone();
        }
        let (_, row_width) = context.effective_geometry();
        let flat_offset = row_offset * row_width as isize + col_offset;
        shift_sequence_flat(context, sequence, flat_offset)
    }

    fn impl_label(&self) -> &'static str {
        "nonwrapping-lattice"
    }
}

/// Shifts every occupied site of `sequence` by `offset` (signed, no
/// wraparound expected — callers only ever pass offsets that keep every
/// site within bounds).
fn shift_sequence_flat(context: &PauliContext, sequence: &OperatorSequence, offset: isize) -> OperatorSequence {
    let mut raw: Vec<Operator> = sequence
        .raw()
        .iter()
        .map(|&op| {
            let site = (op / 3) as isize + offset;
            debug_assert!(site >= 0 && (site as usize) < context.qubit_count());
            let axis = op % 3;
            (site as usize * 3 + axis as usize) as Operator
        })
        .collect();
    raw.sort_by_key(|&op| op / 3);
    OperatorSequence::from_raw_parts(raw.clone(), sequence.sign(), context.hasher().hash(&raw))
}

#[derive(Debug, Clone)]
pub struct WrappingSimplifier {
    pub(super) hasher: WrappingSiteHasher,
}

impl WrappingSimplifier {
    fn datum_of(&self, context: &PauliContext, sequence: &OperatorSequence) -> super::site_hasher::Datum {
        let mut axes = vec![0u8; self.hasher.qubits()];
        for &op in sequence.raw() {
            let site = (op / 3) as usize;
            axes[site] = context.axis_of(op) + 1;
        }
        self.hasher.encode(&axes)
    }

    fn sequence_of(&self, context: &PauliContext, datum: &super::site_hasher::Datum, sign: Sign) -> OperatorSequence {
        let axes = self.hasher.decode(datum);
        let raw: Vec<Operator> = axes
            .into_iter()
            .enumerate()
            .filter(|&(_, axis)| axis != 0)
            .map(|(site, axis)| context.operator_for(site, axis - 1))
            .collect();
        let hash = context.hasher().hash(&raw);
        OperatorSequence::from_raw_parts(raw, sign, hash)
    }

    /// Routes through `WrappingSiteHasher::canonical_hash`, which
    /// restricts the search to translations that align an occupied site
    /// to the origin rather than enumerating the whole translation
    /// group.
    fn orbit_minimum(&self, context: &PauliContext, sequence: &OperatorSequence) -> super::site_hasher::Datum {
        let datum = self.datum_of(context, sequence);
        self.hasher.canonical_hash(&datum).0
    }
}

impl MomentSimplifier for WrappingSimplifier {
    fn canonical_sequence(&self, context: &PauliContext, sequence: &OperatorSequence) -> OperatorSequence {
        if sequence.is_zero() {
            return sequence.clone();
        }
        let minimum = self.orbit_minimum(context, sequence);
        self.sequence_of(context, &minimum, sequence.sign())
    }

    fn is_canonical(&self, context: &PauliContext, sequence: &OperatorSequence) -> bool {
        if sequence.is_zero() {
            return true;
        }
        let datum = self.datum_of(context, sequence);
        // Resolved per the bit-packed canonicalization's documented
        // invariant: canonical iff the sequence already equals the
        // orbit minimum, not its negation.
        let (smallest, actual) = self.hasher.canonical_hash(&datum);
        smallest == actual
    }

    fn impl_label(&self) -> &'static str {
        "wrapping"
    }
}

#[derive(Debug, Clone)]
pub enum Simplifier {
    NonwrappingChain(NonwrappingChainSimplifier),
    NonwrappingLattice(NonwrappingLatticeSimplifier),
    Wrapping(WrappingSimplifier),
}

impl Simplifier {
    pub fn make(
        qubit_count: usize,
        effective_column_height: usize,
        effective_row_width: usize,
        wrap: WrapMode,
    ) -> Result<Self, MomentError> {
        match wrap {
            WrapMode::None => {
                if effective_row_width > 1 {
                    Ok(Simplifier::NonwrappingLattice(NonwrappingLatticeSimplifier))
                } else {
                    Ok(Simplifier::NonwrappingChain(NonwrappingChainSimplifier))
                }
            }
            WrapMode::Wrap => {
                if qubit_count > MAX_SLIDES * QUBITS_PER_SLIDE {
                    return Err(MomentError::BadPauliContext {
                        reason: format!(
                            "wrapping requires at most {} qubits, got {qubit_count}",
                            MAX_SLIDES * QUBITS_PER_SLIDE
                        ),
                    });
                }
                let hasher = WrappingSiteHasher::new(qubit_count, effective_column_height, effective_row_width);
                Ok(Simplifier::Wrapping(WrappingSimplifier { hasher }))
            }
        }
    }

    pub fn canonical_sequence(&self, context: &PauliContext, sequence: &OperatorSequence) -> OperatorSequence {
        match self {
            Simplifier::NonwrappingChain(s) => s.canonical_sequence(context, sequence),
            Simplifier::NonwrappingLattice(s) => s.canonical_sequence(context, sequence),
            Simplifier::Wrapping(s) => s.canonical_sequence(context, sequence),
        }
    }

    pub fn is_canonical(&self, context: &PauliContext, sequence: &OperatorSequence) -> bool {
        match self {
            Simplifier::NonwrappingChain(s) => s.is_canonical(context, sequence),
            Simplifier::NonwrappingLattice(s) => s.is_canonical(context, sequence),
            Simplifier::Wrapping(s) => s.is_canonical(context, sequence),
        }
    }

    pub fn impl_label(&self) -> &'static str {
        match self {
            Simplifier::NonwrappingChain(s) => s.impl_label(),
            Simplifier::NonwrappingLattice(s) => s.impl_label(),
            Simplifier::Wrapping(s) => s.impl_label(),
        }
    }
}
