//! Component I: the full-correlator tensor.
//!
//! Only defined when every measurement in the scenario is binary. Each
//! party's axis ranges over "not included" (index 0, contributing the
//! Collins-Gisin identity factor) or "measurement `m` included" (index
//! `m + 1`, contributing `2 * P(outcome 0) - 1` in Collins-Gisin
//! symbols, the +-1 expectation value of a binary observable).

use itertools::Itertools;
use num::complex::Complex64;

use crate::error::MomentError;
use crate::polynomial::{Monomial, Polynomial, PolynomialFactory};

use super::CollinsGisinTensor;

#[derive(Debug, Clone)]
pub struct FullCorrelatorTensor {
    /// Number of measurements per party; every measurement must be
    /// binary, enforced at construction.
    measurements_per_party: Vec<usize>,
}

impl FullCorrelatorTensor {
    pub fn new(outcomes: &[Vec<usize>]) -> Result<Self, MomentError> {
        for (party, measurements) in outcomes.iter().enumerate() {
            for (measurement, &count) in measurements.iter().enumerate() {
                if count != 2 {
                    return Err(MomentError::BadFC {
                        reason: format!(
                            "full correlator requires binary measurements; party {party} measurement {measurement} has {count} outcomes"
                        ),
                    });
                }
            }
        }
        Ok(Self {
            measurements_per_party: outcomes.iter().map(|m| m.len()).collect(),
        })
    }

    pub fn dims(&self) -> Vec<usize> {
        self.measurements_per_party.iter().map(|&n| n + 1).collect()
    }

    /// Converts a sparse `(party, measurement)` list into this tensor's
    /// dense multi-index, rejecting duplicate parties or any
    /// out-of-range party/measurement.
    pub fn mmt_to_element(&self, chosen: &[(usize, usize)]) -> Result<Vec<usize>, MomentError> {
        let mut index = vec![0usize; self.measurements_per_party.len()];
        let mut seen = vec![false; self.measurements_per_party.len()];
        for &(party, measurement) in chosen {
            let count = *self.measurements_per_party.get(party).ok_or_else(|| MomentError::BadFC {
                reason: format!("party {party} out of range"),
            })?;
            if measurement >= count {
                return Err(MomentError::BadFC {
                    reason: format!("measurement {measurement} out of range for party {party}"),
                });
            }
            if seen[party] {
                return Err(MomentError::BadFC {
                    reason: format!("party {party} specified more than once"),
                });
            }
            seen[party] = true;
            index[party] = measurement + 1;
        }
        Ok(index)
    }

    pub fn cell(
        &self,
        cg: &CollinsGisinTensor,
        index: &[usize],
        factory: &dyn PolynomialFactory,
    ) -> Result<Polynomial, MomentError> {
        if index.len() != self.measurements_per_party.len() {
            return Err(MomentError::BadFC {
                reason: "index length must match party count".to_string(),
            });
        }

        // Each party contributes either {(identity, +1)} when not
        // included, or {(identity, +2), (outcome-0 local, -2)} when
        // included (the linear expansion of `2*P(0) - 1`).
        let mut options: Vec<Vec<(usize, f64)>> = Vec::with_capacity(index.len());
        for (party, &local_choice) in index.iter().enumerate() {
            if local_choice == 0 {
                options.push(vec![(0, 1.0)]);
            } else {
                let measurement = local_choice - 1;
                let (start, _end) = cg.axis_range(party, measurement)?;
                options.push(vec![(0, -1.0), (start, 2.0)]);
            }
        }

        let mut terms = Vec::new();
        for combo in options.into_iter().multi_cartesian_product() {
            let coefficient: f64 = combo.iter().map(|&(_, c)| c).product();
            let cell_index: Vec<usize> = combo.iter().map(|&(local, _)| local).collect();
            let symbol = cg.symbol_at(&cell_index)?;
            let sid = symbol.symbol_id().ok_or_else(|| MomentError::BadFC {
                reason: format!("Collins-Gisin cell {cell_index:?} has no resolved symbol yet"),
            })?;
            terms.push(Monomial::new(sid, Complex64::new(coefficient, 0.0), false));
        }
        Ok(factory.build(terms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{OperatorSequence, Sign, EMPTY_SEQUENCE_HASH};
    use crate::symbol::test_support::StubSymbolTable;
    use crate::tensor::StorageMode;

    fn chsh_sequence(party: usize, local: usize) -> OperatorSequence {
        if local == 0 {
            return OperatorSequence::from_raw_parts(vec![], Sign::Positive, EMPTY_SEQUENCE_HASH);
        }
        let op = (party * 10 + local) as u32;
        OperatorSequence::from_raw_parts(vec![op], Sign::Positive, op as u64)
    }

    fn chsh_cg_with_symbols() -> CollinsGisinTensor {
        let outcomes = vec![vec![2, 2], vec![2, 2]];
        let mut cg = CollinsGisinTensor::new(outcomes, chsh_sequence, StorageMode::Explicit).unwrap();
        let mut table = StubSymbolTable::new();
        table.register(EMPTY_SEQUENCE_HASH);
        for party in 0..2 {
            for local in 1..3 {
                table.register(chsh_sequence(party, local).hash());
            }
        }
        cg.refresh_symbols(&table);
        cg
    }

    #[test]
    fn rejects_non_binary_measurements() {
        let err = FullCorrelatorTensor::new(&[vec![3], vec![2]]);
        assert!(matches!(err, Err(MomentError::BadFC { .. })));
    }

    #[test]
    fn mmt_to_element_rejects_duplicate_party() {
        let fc = FullCorrelatorTensor::new(&[vec![2, 2], vec![2, 2]]).unwrap();
        let err = fc.mmt_to_element(&[(0, 0), (0, 1)]);
        assert!(matches!(err, Err(MomentError::BadFC { .. })));
    }

    #[test]
    fn mmt_to_element_rejects_out_of_range() {
        let fc = FullCorrelatorTensor::new(&[vec![2, 2], vec![2, 2]]).unwrap();
        assert!(fc.mmt_to_element(&[(5, 0)]).is_err());
        assert!(fc.mmt_to_element(&[(0, 9)]).is_err());
    }

    #[test]
    fn full_chsh_correlator_cell_has_two_terms() {
        let fc = FullCorrelatorTensor::new(&[vec![2, 2], vec![2, 2]]).unwrap();
        let cg = chsh_cg_with_symbols();
        let index = fc.mmt_to_element(&[(0, 0), (1, 0)]).unwrap();
        struct UnitFactory;
        impl PolynomialFactory for UnitFactory {
            fn zero_tolerance(&self) -> f64 {
                1e-9
            }
        }
        let poly = fc.cell(&cg, &index, &UnitFactory).unwrap();
        assert_eq!(poly.len(), 4);
    }
}
