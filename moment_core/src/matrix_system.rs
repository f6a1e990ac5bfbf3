//! The matrix system: a `parking_lot::RwLock`-guarded container tying a
//! `PauliContext` to a symbol table and the tensors built over it.
//!
//! Moment-matrix construction itself — generating the matrix of
//! operator products and populating a symbol table from it — is out of
//! scope; a `MatrixSystem` only holds a context together with whatever
//! symbol table and tensors a caller has already built, materializing
//! the tensors lazily and resolving their cells against the symbol
//! table on demand.

use parking_lot::RwLock;

use crate::error::MomentError;
use crate::pauli::PauliContext;
use crate::symbol::SymbolTable;
use crate::tensor::{CollinsGisinTensor, FullCorrelatorTensor, ProbabilityTensor};

pub struct MatrixSystem {
    context: PauliContext,
    symbols: RwLock<Box<dyn SymbolTable + Send + Sync>>,
    collins_gisin: RwLock<Option<CollinsGisinTensor>>,
    probability: RwLock<Option<ProbabilityTensor>>,
    full_correlator: RwLock<Option<FullCorrelatorTensor>>,
}

fn missing(component: &str) -> MomentError {
    MomentError::MissingComponent {
        component: component.to_string(),
    }
}

impl MatrixSystem {
    pub fn new(context: PauliContext, symbols: Box<dyn SymbolTable + Send + Sync>) -> Self {
        Self {
            context,
            symbols: RwLock::new(symbols),
            collins_gisin: RwLock::new(None),
            probability: RwLock::new(None),
            full_correlator: RwLock::new(None),
        }
    }

    pub fn context(&self) -> &PauliContext {
        &self.context
    }

    pub fn read_symbols<R>(&self, f: impl FnOnce(&dyn SymbolTable) -> R) -> R {
        f(self.symbols.read().as_ref())
    }

    pub fn write_symbols<R>(&self, f: impl FnOnce(&mut (dyn SymbolTable + Send + Sync)) -> R) -> R {
        f(self.symbols.write().as_mut())
    }

    /// Builds and stores the Collins-Gisin tensor if it hasn't been
    /// already; a concurrent caller that loses the race to the write
    /// lock sees the winner's tensor rather than building a second one.
    pub fn ensure_collins_gisin(
        &self,
        build: impl FnOnce() -> Result<CollinsGisinTensor, MomentError>,
    ) -> Result<(), MomentError> {
        if self.collins_gisin.read().is_some() {
            return Ok(());
        }
        let mut guard = self.collins_gisin.write();
        if guard.is_some() {
            return Ok(());
        }
        *guard = Some(build()?);
        log::debug!("MatrixSystem: materialized collins_gisin tensor");
        Ok(())
    }

    pub fn with_collins_gisin<R>(&self, f: impl FnOnce(&CollinsGisinTensor) -> R) -> Result<R, MomentError> {
        self.collins_gisin.read().as_ref().map(f).ok_or_else(|| missing("collins_gisin"))
    }

    pub fn with_collins_gisin_mut<R>(&self, f: impl FnOnce(&mut CollinsGisinTensor) -> R) -> Result<R, MomentError> {
        self.collins_gisin.write().as_mut().map(f).ok_or_else(|| missing("collins_gisin"))
    }

    pub fn ensure_probability(&self, build: impl FnOnce() -> ProbabilityTensor) -> bool {
        if self.probability.read().is_some() {
            return false;
        }
        let mut guard = self.probability.write();
        if guard.is_some() {
            return false;
        }
        *guard = Some(build());
        log::debug!("MatrixSystem: materialized probability tensor");
        true
    }

    pub fn with_probability<R>(&self, f: impl FnOnce(&ProbabilityTensor) -> R) -> Result<R, MomentError> {
        self.probability.read().as_ref().map(f).ok_or_else(|| missing("probability"))
    }

    pub fn ensure_full_correlator(
        &self,
        build: impl FnOnce() -> Result<FullCorrelatorTensor, MomentError>,
    ) -> Result<(), MomentError> {
        if self.full_correlator.read().is_some() {
            return Ok(());
        }
        let mut guard = self.full_correlator.write();
        if guard.is_some() {
            return Ok(());
        }
        *guard = Some(build()?);
        log::debug!("MatrixSystem: materialized full_correlator tensor");
        Ok(())
    }

    pub fn with_full_correlator<R>(&self, f: impl FnOnce(&FullCorrelatorTensor) -> R) -> Result<R, MomentError> {
        self.full_correlator
            .read()
            .as_ref()
            .map(f)
            .ok_or_else(|| missing("full_correlator"))
    }
}
