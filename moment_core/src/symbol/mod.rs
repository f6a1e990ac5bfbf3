//! Component F: the symbol table interface.
//!
//! Moment matrices and their symbol tables are out of scope here (see
//! the crate's non-goals); this module only fixes the interface the
//! tensor and polynomial components consume so they can be built and
//! tested against a symbol table without depending on how one gets
//! constructed.

use crate::error::MomentError;

pub type SymbolId = usize;

/// A symbol's position in the solver's real/imaginary basis vectors.
/// `-1` in either slot means that part is absent (e.g. a Hermitian
/// symbol has no imaginary basis entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasisKey {
    pub real: i64,
    pub imag: i64,
}

impl BasisKey {
    pub const ABSENT: i64 = -1;

    pub fn new(real: i64, imag: i64) -> Self {
        Self { real, imag }
    }

    pub fn real_index(&self) -> Option<usize> {
        (self.real != Self::ABSENT).then_some(self.real as usize)
    }

    pub fn imag_index(&self) -> Option<usize> {
        (self.imag != Self::ABSENT).then_some(self.imag as usize)
    }
}

/// What an `OperatorSequence` resolves to in a symbol table: either its
/// own symbol, or the same symbol as another sequence (possibly up to
/// conjugation), discovered by a completed rulebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolLookup {
    Own(SymbolId),
    AliasOf { symbol: SymbolId, conjugated: bool },
}

pub trait SymbolTable {
    /// Looks up the symbol standing for an operator sequence's hash, if
    /// one has been registered.
    fn where_hash(&self, sequence_hash: u64) -> Option<SymbolLookup>;

    fn size(&self) -> usize;

    /// The `(real_index, imag_index)` basis key a symbol occupies in the
    /// solver's moment vector.
    fn to_basis(&self, symbol: SymbolId) -> Result<BasisKey, MomentError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use hashbrown::HashMap;

    /// A minimal in-memory `SymbolTable` used only by this crate's own
    /// tests; production symbol tables are built elsewhere. Symbol 0
    /// (conventionally the identity) gets no imaginary part; every other
    /// registered symbol gets both a real and an imaginary basis slot,
    /// one past the previous symbol's, mirroring how a real solver packs
    /// a Hermitian moment matrix's independent real/imaginary parts.
    #[derive(Default)]
    pub struct StubSymbolTable {
        by_hash: HashMap<u64, SymbolLookup>,
        basis: Vec<BasisKey>,
        count: usize,
    }

    impl StubSymbolTable {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn register(&mut self, sequence_hash: u64) -> SymbolId {
            let id = self.count;
            self.count += 1;
            self.by_hash.insert(sequence_hash, SymbolLookup::Own(id));
            let real = id as i64;
            let imag = if id == 0 { BasisKey::ABSENT } else { id as i64 };
            self.basis.push(BasisKey::new(real, imag));
            id
        }

        pub fn alias(&mut self, sequence_hash: u64, symbol: SymbolId, conjugated: bool) {
            self.by_hash.insert(sequence_hash, SymbolLookup::AliasOf { symbol, conjugated });
        }
    }

    impl SymbolTable for StubSymbolTable {
        fn where_hash(&self, sequence_hash: u64) -> Option<SymbolLookup> {
            self.by_hash.get(&sequence_hash).copied()
        }

        fn size(&self) -> usize {
            self.count
        }

        fn to_basis(&self, symbol: SymbolId) -> Result<BasisKey, MomentError> {
            self.basis.get(symbol).copied().ok_or(MomentError::NotFound { key: symbol as u64 })
        }
    }
}
