//! Component C: the Pauli operator context.

use crate::error::MomentError;
use crate::operator::{Operator, Sign, ShortlexHasher, SequenceReducer};

use super::simplifier::Simplifier;
use super::site_hasher::MAX_SLIDES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    None,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetryMode {
    None,
    Translational,
}

/// A context over `qubit_count` sites, each carrying an independent
/// Pauli algebra (X, Y, Z; no identity generator since "acts trivially
/// here" is represented by the site's *absence* from a sequence).
///
/// `col_height == 0` means the context is a bare chain; a lattice has
/// `col_height > 0` and `row_width = qubit_count / col_height`. A chain
/// is laid out internally as a single column (`column_height = qubits,
/// row_width = 1`) purely so the site hasher can treat both uniformly.
#[derive(Debug)]
pub struct PauliContext {
    qubit_count: usize,
    col_height: usize,
    row_width: usize,
    wrap: WrapMode,
    symmetry: SymmetryMode,
    hasher: ShortlexHasher,
    simplifier: Simplifier,
}

const SIGMA_X: u8 = 0;
const SIGMA_Y: u8 = 1;
const SIGMA_Z: u8 = 2;

impl PauliContext {
    pub fn new_chain(qubit_count: usize, wrap: WrapMode, symmetry: SymmetryMode) -> Result<Self, MomentError> {
        Self::build(qubit_count, 0, 0, wrap, symmetry)
    }

    pub fn new_lattice(
        column_height: usize,
        row_width: usize,
        wrap: WrapMode,
        symmetry: SymmetryMode,
    ) -> Result<Self, MomentError> {
        if column_height == 0 || row_width == 0 {
            return Err(MomentError::BadPauliContext {
                reason: "lattice dimensions must be positive".to_string(),
            });
        }
        Self::build(column_height * row_width, column_height, row_width, wrap, symmetry)
    }

    fn build(
        qubit_count: usize,
        col_height: usize,
        row_width: usize,
        wrap: WrapMode,
        symmetry: SymmetryMode,
    ) -> Result<Self, MomentError> {
        if qubit_count == 0 {
            return Err(MomentError::BadPauliContext {
                reason: "context must have at least one qubit".to_string(),
            });
        }
        let (eff_col, eff_row) = if col_height > 0 {
            (col_height, row_width)
        } else {
            (qubit_count, 1)
        };
        if wrap == WrapMode::Wrap && qubit_count > MAX_SLIDES * super::site_hasher::QUBITS_PER_SLIDE {
            return Err(MomentError::BadPauliContext {
                reason: format!(
                    "wrapping contexts support at most {} qubits, got {qubit_count}",
                    MAX_SLIDES * super::site_hasher::QUBITS_PER_SLIDE
                ),
            });
        }
        let simplifier = Simplifier::make(qubit_count, eff_col, eff_row, wrap)?;
        log::debug!(
            "PauliContext: {qubit_count} qubits, geometry {eff_col}x{eff_row}, wrap={wrap:?} -> simplifier {}",
            simplifier.impl_label()
        );
        // Alphabet is 3 operators (X, Y, Z) per site, plus the implicit
        // identity represented by a site's absence; the shortlex hasher
        // only ever sees the *present* operators, so its digit base is
        // the number of distinct present-operator codes: 3 * qubit_count.
        let hasher = ShortlexHasher::new((3 * qubit_count) as u64);
        Ok(Self {
            qubit_count,
            col_height,
            row_width,
            wrap,
            symmetry,
            hasher,
            simplifier,
        })
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    pub fn is_lattice(&self) -> bool {
        self.col_height > 0
    }

    pub fn wrap(&self) -> WrapMode {
        self.wrap
    }

    pub fn symmetry(&self) -> SymmetryMode {
        self.symmetry
    }

    /// The geometry used internally by the simplifier and site hasher: a
    /// chain behaves as a single column of `qubit_count` rows.
    pub fn effective_geometry(&self) -> (usize, usize) {
        if self.col_height > 0 {
            (self.col_height, self.row_width)
        } else {
            (self.qubit_count, 1)
        }
    }

    pub fn simplifier(&self) -> &Simplifier {
        &self.simplifier
    }

    pub fn sigma_x(&self, site: usize) -> Operator {
        self.operator_for(site, SIGMA_X)
    }
    pub fn sigma_y(&self, site: usize) -> Operator {
        self.operator_for(site, SIGMA_Y)
    }
    pub fn sigma_z(&self, site: usize) -> Operator {
        self.operator_for(site, SIGMA_Z)
    }

    pub fn operator_for(&self, site: usize, axis: u8) -> Operator {
        debug_assert!(site < self.qubit_count);
        debug_assert!(axis <= SIGMA_Z);
        (site * 3 + axis as usize) as Operator
    }

    pub fn axis_of(&self, op: Operator) -> u8 {
        (op % 3) as u8
    }
}

impl SequenceReducer for PauliContext {
    fn hasher(&self) -> &ShortlexHasher {
        &self.hasher
    }

    fn site_of(&self, op: Operator) -> usize {
        (op / 3) as usize
    }

    /// Same-site Pauli fusion via the Levi-Civita product rule:
    /// `sigma_a sigma_a = I`, `sigma_a sigma_b = i eps_{abc} sigma_c` for
    /// distinct `a != b`.
    fn fuse(&self, left: Operator, right: Operator) -> (Option<Operator>, Sign) {
        let site = self.site_of(left);
        debug_assert_eq!(site, self.site_of(right));
        let a = self.axis_of(left);
        let b = self.axis_of(right);
        if a == b {
            return (None, Sign::Positive);
        }
        // (a, b) -> (result axis, sign), cyclic X->Y->Z->X positive.
        let (result_axis, sign) = match (a, b) {
            (SIGMA_X, SIGMA_Y) => (SIGMA_Z, Sign::Imaginary),
            (SIGMA_Y, SIGMA_X) => (SIGMA_Z, Sign::NegImaginary),
            (SIGMA_Y, SIGMA_Z) => (SIGMA_X, Sign::Imaginary),
            (SIGMA_Z, SIGMA_Y) => (SIGMA_X, Sign::NegImaginary),
            (SIGMA_Z, SIGMA_X) => (SIGMA_Y, Sign::Imaginary),
            (SIGMA_X, SIGMA_Z) => (SIGMA_Y, Sign::NegImaginary),
            _ => unreachable!("axis codes are restricted to 0..=2"),
        };
        (Some(self.operator_for(site, result_axis)), sign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{OperatorSequence, SequenceConstructionMode};

    #[test]
    fn chain_context_reports_geometry() {
        let ctx = PauliContext::new_chain(5, WrapMode::None, SymmetryMode::None).unwrap();
        assert_eq!(ctx.qubit_count(), 5);
        assert!(!ctx.is_lattice());
        assert_eq!(ctx.effective_geometry(), (5, 1));
    }

    #[test]
    fn lattice_context_reports_geometry() {
        let ctx = PauliContext::new_lattice(2, 2, WrapMode::None, SymmetryMode::None).unwrap();
        assert!(ctx.is_lattice());
        assert_eq!(ctx.qubit_count(), 4);
    }

    #[test]
    fn wrap_beyond_256_qubits_is_rejected() {
        let result = PauliContext::new_chain(257, WrapMode::Wrap, SymmetryMode::Translational);
        assert!(matches!(result, Err(MomentError::BadPauliContext { .. })));
    }

    #[test]
    fn same_site_xy_fuses_to_iz() {
        let ctx = PauliContext::new_chain(2, WrapMode::None, SymmetryMode::None).unwrap();
        let seq = OperatorSequence::new(
            vec![ctx.sigma_x(0), ctx.sigma_y(0)],
            Sign::Positive,
            SequenceConstructionMode::Default,
            &ctx,
        );
        assert_eq!(seq.raw(), &[ctx.sigma_z(0)]);
        assert_eq!(seq.sign(), Sign::Imaginary);
    }

    #[test]
    fn different_sites_commute_without_sign_change() {
        let ctx = PauliContext::new_chain(2, WrapMode::None, SymmetryMode::None).unwrap();
        let seq = OperatorSequence::new(
            vec![ctx.sigma_z(1), ctx.sigma_x(0)],
            Sign::Positive,
            SequenceConstructionMode::Default,
            &ctx,
        );
        assert_eq!(seq.raw(), &[ctx.sigma_x(0), ctx.sigma_z(1)]);
        assert_eq!(seq.sign(), Sign::Positive);
    }
}
