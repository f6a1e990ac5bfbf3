//! Replicates a local operator sequence across every translate of a
//! `PauliContext`'s lattice or chain, producing the full set of moment
//! rules implied by translational symmetry from a single representative
//! rule.

use crate::operator::{Operator, OperatorSequence, SequenceReducer};

use super::context::PauliContext;

/// Translates `local` by every site offset the wrapping topology allows
/// (a full cyclic orbit, wrapping around both lattice axes), deduplicating
/// by canonical hash. Requires a context built with `WrapMode::Wrap`.
pub fn symmetrical_fill(context: &PauliContext, local: &OperatorSequence) -> Vec<OperatorSequence> {
    let (column_height, row_width) = context.effective_geometry();
    let mut seen = hashbrown::HashSet::new();
    let mut out = Vec::new();
    for row_offset in 0..column_height {
        for col_offset in 0..row_width {
            let shifted = wrap_shift(context, local, row_offset as isize, col_offset as isize);
            if seen.insert(shifted.hash()) {
                out.push(shifted);
            }
        }
    }
    out
}

/// Translates every occupied site of `local` by `(row_offset, col_offset)`,
/// wrapping modulo the lattice's own extents (a chain is a `1`-wide
/// lattice, so this also covers the chain case).
fn wrap_shift(context: &PauliContext, local: &OperatorSequence, row_offset: isize, col_offset: isize) -> OperatorSequence {
    let (column_height, row_width) = context.effective_geometry();
    let (column_height, row_width) = (column_height as isize, row_width as isize);
    let mut raw: Vec<Operator> = Vec::with_capacity(local.len());
    for &op in local.raw() {
        let site = (op / 3) as isize;
        let row = site / row_width;
        let col = site % row_width;
        let new_row = (row + row_offset).rem_euclid(column_height);
        let new_col = (col + col_offset).rem_euclid(row_width);
        let new_site = new_row * row_width + new_col;
        raw.push((new_site as usize * 3 + (op % 3) as usize) as Operator);
    }
    raw.sort_by_key(|&op| op / 3);
    let hash = context.hasher().hash(&raw);
    OperatorSequence::from_raw_parts(raw, local.sign(), hash)
}

/// Translates `local` only by offsets that keep every occupied site
/// within `[0, qubit_count)` — no wraparound. Used for non-wrapping
/// contexts, where an out-of-bounds translate simply doesn't exist.
pub fn wrapless_symmetrical_fill(context: &PauliContext, local: &OperatorSequence) -> Vec<OperatorSequence> {
    let qubits = context.qubit_count() as isize;
    let mut seen = hashbrown::HashSet::new();
    let mut out = Vec::new();
    for offset in -(qubits - 1)..qubits {
        if let Some(shifted) = try_shift(context, local, offset) {
            if seen.insert(shifted.hash()) {
                out.push(shifted);
            }
        }
    }
    out
}

fn try_shift(context: &PauliContext, local: &OperatorSequence, offset: isize) -> Option<OperatorSequence> {
    let qubits = context.qubit_count() as isize;
    let mut raw: Vec<Operator> = Vec::with_capacity(local.len());
    for &op in local.raw() {
        let site = (op / 3) as isize + offset;
        if site < 0 || site >= qubits {
            return None;
        }
        raw.push((site as usize * 3 + (op % 3) as usize) as Operator);
    }
    raw.sort_by_key(|&op| op / 3);
    let hash = context.hasher().hash(&raw);
    Some(OperatorSequence::from_raw_parts(raw, local.sign(), hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{Sign, SequenceConstructionMode};
    use crate::pauli::context::{SymmetryMode, WrapMode};

    #[test]
    fn wrapless_fill_on_chain_stays_in_bounds() {
        let ctx = PauliContext::new_chain(5, WrapMode::None, SymmetryMode::Translational).unwrap();
        let local = OperatorSequence::new(
            vec![ctx.sigma_x(0)],
            Sign::Positive,
            SequenceConstructionMode::Default,
            &ctx,
        );
        let filled = wrapless_symmetrical_fill(&ctx, &local);
        assert_eq!(filled.len(), 5);
        for seq in &filled {
            assert_eq!(seq.len(), 1);
        }
    }

    #[test]
    fn symmetrical_fill_on_ring_covers_every_site() {
        let ctx = PauliContext::new_chain(5, WrapMode::Wrap, SymmetryMode::Translational).unwrap();
        let local = OperatorSequence::new(
            vec![ctx.sigma_x(0)],
            Sign::Positive,
            SequenceConstructionMode::Default,
            &ctx,
        );
        let filled = symmetrical_fill(&ctx, &local);
        assert_eq!(filled.len(), 5);
    }

    #[test]
    fn symmetrical_fill_wraps_a_nonzero_sited_local() {
        // A local pattern already sited away from the origin must still
        // wrap around the ring instead of being dropped near the boundary.
        let ctx = PauliContext::new_chain(5, WrapMode::Wrap, SymmetryMode::Translational).unwrap();
        let local = OperatorSequence::new(
            vec![ctx.sigma_x(4)],
            Sign::Positive,
            SequenceConstructionMode::Default,
            &ctx,
        );
        let filled = symmetrical_fill(&ctx, &local);
        let sites: std::collections::HashSet<usize> = filled
            .iter()
            .map(|seq| (seq.raw()[0] / 3) as usize)
            .collect();
        assert_eq!(filled.len(), 5);
        assert_eq!(sites, (0..5).collect());
    }

    #[test]
    fn symmetrical_fill_wraps_two_site_local_across_boundary() {
        let ctx = PauliContext::new_chain(4, WrapMode::Wrap, SymmetryMode::Translational).unwrap();
        let local = OperatorSequence::new(
            vec![ctx.sigma_x(3), ctx.sigma_z(0)],
            Sign::Positive,
            SequenceConstructionMode::Default,
            &ctx,
        );
        let filled = symmetrical_fill(&ctx, &local);
        // 4 distinct rotations of a 2-site pattern on a 4-ring, none
        // silently dropped by an out-of-bounds rejection.
        assert_eq!(filled.len(), 4);
        for seq in &filled {
            assert_eq!(seq.len(), 2);
        }
    }
}
