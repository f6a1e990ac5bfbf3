//! Component H: the probability tensor.
//!
//! Probability cells are not stored directly; each one is an
//! inclusion-exclusion expansion over the underlying Collins-Gisin
//! symbols. A measurement's last outcome is dependent (its probability
//! is `1 - sum of the others`), so any cell naming a last outcome for
//! some party expands into a sum over that party's identity slot and
//! its non-last local indices, with alternating sign for every party
//! simultaneously at a last outcome. A party named in neither a `cell`
//! call's settings nor a `measurement_to_range` splice is held at its
//! Collins-Gisin identity axis (no operator from that party), the same
//! "not included" convention the Collins-Gisin tensor itself uses.

use itertools::Itertools;
use num::complex::Complex64;

use crate::error::MomentError;
use crate::polynomial::{Monomial, Polynomial, PolynomialFactory};
use crate::symbol::SymbolId;

use super::{CollinsGisinTensor, PartyMeasurementIndex, PartyMeasurementOutcomeIndex};

#[derive(Debug, Clone, Copy)]
enum PartySpec {
    /// Not named: held at the Collins-Gisin identity axis.
    Identity,
    Outcome { measurement: usize, outcome: usize },
}

#[derive(Debug, Clone)]
pub struct ProbabilityTensor {
    /// `outcomes[party][measurement]` outcome counts, mirroring the
    /// Collins-Gisin tensor this probability tensor reads from.
    outcomes: Vec<Vec<usize>>,
}

/// One cell of a [`ProbabilityTensor::measurement_to_range`] splice: the
/// per-party `(measurement, outcome)` this cell fixes (`None` for a
/// party held at its identity axis) and the resulting polynomial over
/// Collins-Gisin symbols.
#[derive(Debug, Clone)]
pub struct ProbabilityCell {
    pub settings: Vec<Option<(usize, usize)>>,
    pub polynomial: Polynomial,
}

impl ProbabilityTensor {
    pub fn new(outcomes: Vec<Vec<usize>>) -> Self {
        Self { outcomes }
    }

    fn cg_options(
        &self,
        cg: &CollinsGisinTensor,
        specs: &[PartySpec],
    ) -> Result<Vec<Vec<(usize, i32)>>, MomentError> {
        let mut options = Vec::with_capacity(specs.len());
        for (party, spec) in specs.iter().enumerate() {
            match *spec {
                PartySpec::Identity => options.push(vec![(0usize, 1i32)]),
                PartySpec::Outcome { measurement, outcome } => {
                    let count = *self
                        .outcomes
                        .get(party)
                        .and_then(|m| m.get(measurement))
                        .ok_or_else(|| MomentError::BadPT {
                            reason: format!("no such measurement {measurement} for party {party}"),
                        })?;
                    if outcome >= count {
                        return Err(MomentError::BadPT {
                            reason: format!(
                                "outcome {outcome} out of range for party {party}'s {count}-outcome measurement"
                            ),
                        });
                    }
                    let (start, end) = cg.axis_range(party, measurement)?;
                    if outcome < count - 1 {
                        options.push(vec![(start + outcome, 1)]);
                    } else {
                        let mut opts = vec![(0usize, 1i32)];
                        opts.extend((start..end).map(|local| (local, -1)));
                        options.push(opts);
                    }
                }
            }
        }
        Ok(options)
    }

    fn poly_from_options(
        &self,
        cg: &CollinsGisinTensor,
        options: Vec<Vec<(usize, i32)>>,
        factory: &dyn PolynomialFactory,
    ) -> Result<Polynomial, MomentError> {
        let mut terms = Vec::new();
        for combo in options.into_iter().multi_cartesian_product() {
            let sign: i32 = combo.iter().map(|&(_, s)| s).product();
            let index: Vec<usize> = combo.iter().map(|&(local, _)| local).collect();
            let symbol = cg.symbol_at(&index)?;
            let sid = symbol.symbol_id().ok_or_else(|| MomentError::BadPT {
                reason: format!("Collins-Gisin cell {index:?} has no resolved symbol yet"),
            })?;
            terms.push(Monomial::new(sid, Complex64::new(sign as f64, 0.0), false));
        }
        Ok(factory.build(terms))
    }

    /// The polynomial (in Collins-Gisin symbols) for
    /// `P(chosen | settings)`, one measurement and outcome per party.
    pub fn cell(
        &self,
        cg: &CollinsGisinTensor,
        settings: &[usize],
        chosen: &[usize],
        factory: &dyn PolynomialFactory,
    ) -> Result<Polynomial, MomentError> {
        if settings.len() != self.outcomes.len() || chosen.len() != self.outcomes.len() {
            return Err(MomentError::BadPT {
                reason: "settings/outcomes length must match party count".to_string(),
            });
        }
        let specs: Vec<PartySpec> = settings
            .iter()
            .zip(chosen)
            .map(|(&measurement, &outcome)| PartySpec::Outcome { measurement, outcome })
            .collect();
        let options = self.cg_options(cg, &specs)?;
        self.poly_from_options(cg, options, factory)
    }

    /// The splice of cells that iterates every combination of outcomes
    /// (including each measurement's complement outcome) for `free`
    /// measurements, while holding each of `fixed`'s measurements at its
    /// chosen outcome. Parties named in neither list are held at their
    /// identity axis. Fails with `BadPT` if any party/measurement/outcome
    /// is out of bounds, or if a party appears in both lists.
    pub fn measurement_to_range(
        &self,
        cg: &CollinsGisinTensor,
        factory: &dyn PolynomialFactory,
        free: &[PartyMeasurementIndex],
        fixed: &[PartyMeasurementOutcomeIndex],
    ) -> Result<Vec<ProbabilityCell>, MomentError> {
        let parties = self.outcomes.len();
        let mut seen = vec![false; parties];
        for f in free {
            if f.party >= parties {
                return Err(MomentError::BadPT {
                    reason: format!("party {} out of range", f.party),
                });
            }
            if seen[f.party] {
                return Err(MomentError::BadPT {
                    reason: format!("party {} named more than once among free measurements", f.party),
                });
            }
            seen[f.party] = true;
        }
        for fx in fixed {
            if fx.party >= parties {
                return Err(MomentError::BadPT {
                    reason: format!("party {} out of range", fx.party),
                });
            }
            if seen[fx.party] {
                return Err(MomentError::BadPT {
                    reason: format!("party {} appears in both the free and fixed lists", fx.party),
                });
            }
            seen[fx.party] = true;
        }

        let mut per_party_specs: Vec<Vec<PartySpec>> = vec![vec![PartySpec::Identity]; parties];
        for f in free {
            let count = *self
                .outcomes
                .get(f.party)
                .and_then(|m| m.get(f.measurement))
                .ok_or_else(|| MomentError::BadPT {
                    reason: format!("no such measurement {} for party {}", f.measurement, f.party),
                })?;
            per_party_specs[f.party] = (0..count)
                .map(|outcome| PartySpec::Outcome { measurement: f.measurement, outcome })
                .collect();
        }
        for fx in fixed {
            let count = *self
                .outcomes
                .get(fx.party)
                .and_then(|m| m.get(fx.measurement))
                .ok_or_else(|| MomentError::BadPT {
                    reason: format!("no such measurement {} for party {}", fx.measurement, fx.party),
                })?;
            if fx.outcome >= count {
                return Err(MomentError::BadPT {
                    reason: format!(
                        "outcome {} out of range for party {} measurement {} ({count} outcomes)",
                        fx.outcome, fx.party, fx.measurement
                    ),
                });
            }
            per_party_specs[fx.party] = vec![PartySpec::Outcome { measurement: fx.measurement, outcome: fx.outcome }];
        }

        let mut cells = Vec::new();
        for combo in per_party_specs.into_iter().multi_cartesian_product() {
            let settings: Vec<Option<(usize, usize)>> = combo
                .iter()
                .map(|spec| match *spec {
                    PartySpec::Identity => None,
                    PartySpec::Outcome { measurement, outcome } => Some((measurement, outcome)),
                })
                .collect();
            let options = self.cg_options(cg, &combo)?;
            let polynomial = self.poly_from_options(cg, options, factory)?;
            cells.push(ProbabilityCell { settings, polynomial });
        }
        Ok(cells)
    }

    /// Given numerical probabilities for every cell in `cells` (in the
    /// order `measurement_to_range` produced them), synthesizes the rule
    /// polynomials `P_cell - v = 0` that pin each cell to its observed
    /// value. `identity_symbol` is the symbol id the host's symbol table
    /// assigns the trivial (identity) sequence.
    pub fn explicit_value_rules(
        cells: &[ProbabilityCell],
        values: &[f64],
        identity_symbol: SymbolId,
        factory: &dyn PolynomialFactory,
    ) -> Result<Vec<Polynomial>, MomentError> {
        if cells.len() != values.len() {
            return Err(MomentError::BadPT {
                reason: format!("expected one value per cell: {} cells, {} values", cells.len(), values.len()),
            });
        }
        Ok(cells
            .iter()
            .zip(values)
            .map(|(cell, &v)| {
                let mut terms = cell.polynomial.terms().to_vec();
                terms.push(Monomial::new(identity_symbol, Complex64::new(-v, 0.0), false));
                factory.build(terms)
            })
            .collect())
    }

    /// As [`Self::explicit_value_rules`], but divides each equation by
    /// `normalization_cell`. Since polynomials can't be divided directly,
    /// this cross-multiplies instead: `P_cell - v * P_norm = 0` is the
    /// same equation as `P_cell / P_norm = v` without ever dividing one
    /// polynomial by another.
    pub fn explicit_value_rules_normalized(
        cells: &[ProbabilityCell],
        normalization_cell: &ProbabilityCell,
        values: &[f64],
        factory: &dyn PolynomialFactory,
    ) -> Result<Vec<Polynomial>, MomentError> {
        if cells.len() != values.len() {
            return Err(MomentError::BadPT {
                reason: format!("expected one value per cell: {} cells, {} values", cells.len(), values.len()),
            });
        }
        Ok(cells
            .iter()
            .zip(values)
            .map(|(cell, &v)| {
                let mut terms = cell.polynomial.terms().to_vec();
                terms.extend(normalization_cell.polynomial.terms().iter().map(|m| {
                    Monomial::new(m.symbol_id, m.coefficient * Complex64::new(-v, 0.0), m.conjugated)
                }));
                factory.build(terms)
            })
            .collect())
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

    struct UnitFactory;
    impl PolynomialFactory for UnitFactory {
        fn zero_tolerance(&self) -> f64 {
            1e-9
        }
    }

    fn chsh_cg_with_symbols() -> CollinsGisinTensor {
        let outcomes = vec![vec![2, 2], vec![2, 2]];
        let mut cg = CollinsGisinTensor::new(outcomes, chsh_sequence, StorageMode::Explicit).unwrap();
        let mut table = StubSymbolTable::new();
        // Register identity first so it gets symbol 0 (used as the "1" constant).
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
    fn marginal_cell_for_first_outcome_is_direct() {
        let cg = chsh_cg_with_symbols();
        let pt = ProbabilityTensor::new(vec![vec![2, 2], vec![2, 2]]);
        let poly = pt.cell(&cg, &[0, 0], &[0, 1], &UnitFactory).unwrap();
        assert!(!poly.is_zero());
    }

    #[test]
    fn last_outcome_expands_as_one_minus_others() {
        let cg = chsh_cg_with_symbols();
        let pt = ProbabilityTensor::new(vec![vec![2, 2], vec![2, 2]]);
        let direct = pt.cell(&cg, &[0, 0], &[0, 0], &UnitFactory).unwrap();
        let dependent = pt.cell(&cg, &[0, 0], &[1, 0], &UnitFactory).unwrap();
        assert_eq!(direct.len(), 1);
        assert_eq!(dependent.len(), 2);
    }

    /// Spec §8 scenario 5: `measurement_to_range([party 0 mmt 0])` on the
    /// CHSH system yields exactly `P(A0=0) = A0` and `P(A0=1) = 1 - A0`,
    /// with party 1 held at its identity axis (i.e. marginalized out).
    #[test]
    fn chsh_marginal_splice_matches_scenario_5() {
        let cg = chsh_cg_with_symbols();
        let pt = ProbabilityTensor::new(vec![vec![2, 2], vec![2, 2]]);
        let cells = pt
            .measurement_to_range(&cg, &UnitFactory, &[PartyMeasurementIndex { party: 0, measurement: 0 }], &[])
            .unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].settings, vec![Some((0, 0)), None]);
        assert_eq!(cells[0].polynomial.len(), 1);
        assert_eq!(cells[1].settings, vec![Some((0, 1)), None]);
        assert_eq!(cells[1].polynomial.len(), 2);
    }

    #[test]
    fn measurement_to_range_rejects_a_party_named_in_both_lists() {
        let cg = chsh_cg_with_symbols();
        let pt = ProbabilityTensor::new(vec![vec![2, 2], vec![2, 2]]);
        let err = pt.measurement_to_range(
            &cg,
            &UnitFactory,
            &[PartyMeasurementIndex { party: 0, measurement: 0 }],
            &[PartyMeasurementOutcomeIndex { party: 0, measurement: 1, outcome: 0 }],
        );
        assert!(matches!(err, Err(MomentError::BadPT { .. })));
    }

    #[test]
    fn fixed_outcome_pins_one_party_while_the_other_splices() {
        let cg = chsh_cg_with_symbols();
        let pt = ProbabilityTensor::new(vec![vec![2, 2], vec![2, 2]]);
        let cells = pt
            .measurement_to_range(
                &cg,
                &UnitFactory,
                &[PartyMeasurementIndex { party: 0, measurement: 0 }],
                &[PartyMeasurementOutcomeIndex { party: 1, measurement: 1, outcome: 1 }],
            )
            .unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].settings, vec![Some((0, 0)), Some((1, 1))]);
        assert_eq!(cells[1].settings, vec![Some((0, 1)), Some((1, 1))]);
    }

    #[test]
    fn explicit_value_rules_emit_p_minus_v() {
        let cg = chsh_cg_with_symbols();
        let pt = ProbabilityTensor::new(vec![vec![2, 2], vec![2, 2]]);
        let cells = pt
            .measurement_to_range(&cg, &UnitFactory, &[PartyMeasurementIndex { party: 0, measurement: 0 }], &[])
            .unwrap();
        // Symbol 0 is the identity (registered first in chsh_cg_with_symbols).
        let rules = ProbabilityTensor::explicit_value_rules(&cells, &[0.5, 0.5], 0, &UnitFactory).unwrap();
        assert_eq!(rules.len(), 2);
        // P(A0=0) - 0.5 has two terms: the A0 symbol and the -0.5 identity term.
        assert_eq!(rules[0].len(), 2);
        // P(A0=1) - 0.5 = (1 - A0) - 0.5 = 0.5 - A0: identity coefficient
        // combines with the complement's own identity term, A0 stays separate.
        assert_eq!(rules[1].len(), 2);
    }

    #[test]
    fn explicit_value_rules_rejects_mismatched_value_count() {
        let cg = chsh_cg_with_symbols();
        let pt = ProbabilityTensor::new(vec![vec![2, 2], vec![2, 2]]);
        let cells = pt
            .measurement_to_range(&cg, &UnitFactory, &[PartyMeasurementIndex { party: 0, measurement: 0 }], &[])
            .unwrap();
        let err = ProbabilityTensor::explicit_value_rules(&cells, &[0.5], 0, &UnitFactory);
        assert!(matches!(err, Err(MomentError::BadPT { .. })));
    }

    #[test]
    fn explicit_value_rules_normalized_cross_multiplies_instead_of_dividing() {
        let cg = chsh_cg_with_symbols();
        let pt = ProbabilityTensor::new(vec![vec![2, 2], vec![2, 2]]);
        let cells = pt
            .measurement_to_range(&cg, &UnitFactory, &[PartyMeasurementIndex { party: 0, measurement: 0 }], &[])
            .unwrap();
        let norm = pt.cell(&cg, &[0, 0], &[0, 0], &UnitFactory).unwrap();
        let norm_cell = ProbabilityCell { settings: vec![Some((0, 0)), None], polynomial: norm };
        let rules =
            ProbabilityTensor::explicit_value_rules_normalized(&cells, &norm_cell, &[1.0, 0.0], &UnitFactory).unwrap();
        assert_eq!(rules.len(), 2);
        // v=1.0 against a 1-term normalization cell: P_cell - 1*P_norm, still 2 terms.
        assert_eq!(rules[0].len(), 2);
        // v=0.0 drops the normalization term entirely, leaving P_cell's own terms.
        assert_eq!(rules[1].len(), cells[1].polynomial.len());
    }
}
