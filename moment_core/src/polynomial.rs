//! Component G: polynomials over symbols.

use num::complex::Complex64;

use crate::symbol::SymbolId;

/// One term of a `Polynomial`: a complex coefficient times a symbol,
/// optionally conjugated (i.e. standing for the symbol's Hermitian
/// conjugate rather than the symbol itself).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Monomial {
    pub symbol_id: SymbolId,
    pub coefficient: Complex64,
    pub conjugated: bool,
}

impl Monomial {
    pub fn new(symbol_id: SymbolId, coefficient: Complex64, conjugated: bool) -> Self {
        Self {
            symbol_id,
            coefficient,
            conjugated,
        }
    }
}

/// A sum of `Monomial`s, kept sorted by `(symbol_id, conjugated)` so
/// that combining two polynomials built from the same factory is a
/// single merge pass, the same sorted-merge shape as a linear
/// combination but keyed on the richer `(symbol, conjugation)` pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polynomial {
    terms: Vec<Monomial>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Self { terms: Vec::new() }
    }

    /// Builds a polynomial from unsorted terms, combining duplicate
    /// `(symbol_id, conjugated)` entries and dropping any whose combined
    /// coefficient's magnitude falls within `zero_tolerance`.
    pub fn from_terms(mut terms: Vec<Monomial>, zero_tolerance: f64) -> Self {
        terms.sort_by_key(|m| (m.symbol_id, m.conjugated));
        let mut merged: Vec<Monomial> = Vec::with_capacity(terms.len());
        for term in terms {
            match merged.last_mut() {
                Some(last) if last.symbol_id == term.symbol_id && last.conjugated == term.conjugated => {
                    last.coefficient += term.coefficient;
                }
                _ => merged.push(term),
            }
        }
        merged.retain(|m| m.coefficient.norm() > zero_tolerance);
        Self { terms: merged }
    }

    pub fn terms(&self) -> &[Monomial] {
        &self.terms
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Produces `Polynomial`s with a fixed numerical tolerance for treating
/// a coefficient as zero. Matrix systems and tensors share one factory
/// so their polynomials compare and combine consistently.
pub trait PolynomialFactory {
    fn zero_tolerance(&self) -> f64;

    fn build(&self, terms: Vec<Monomial>) -> Polynomial {
        Polynomial::from_terms(terms, self.zero_tolerance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Factory(f64);
    impl PolynomialFactory for Factory {
        fn zero_tolerance(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn duplicate_symbols_combine() {
        let factory = Factory(1e-9);
        let poly = factory.build(vec![
            Monomial::new(0, Complex64::new(1.0, 0.0), false),
            Monomial::new(0, Complex64::new(2.0, 0.0), false),
        ]);
        assert_eq!(poly.len(), 1);
        assert_eq!(poly.terms()[0].coefficient, Complex64::new(3.0, 0.0));
    }

    #[test]
    fn conjugated_and_plain_symbol_stay_distinct() {
        let factory = Factory(1e-9);
        let poly = factory.build(vec![
            Monomial::new(0, Complex64::new(1.0, 0.0), false),
            Monomial::new(0, Complex64::new(1.0, 0.0), true),
        ]);
        assert_eq!(poly.len(), 2);
    }

    #[test]
    fn near_zero_coefficients_are_dropped() {
        let factory = Factory(1e-6);
        let poly = factory.build(vec![
            Monomial::new(0, Complex64::new(1.0, 0.0), false),
            Monomial::new(0, Complex64::new(-1.0, 0.0), false),
        ]);
        assert!(poly.is_zero());
    }
}
