//! Component H: the moment-rule interface.
//!
//! Knuth-Bendix completion of a rule set into a confluent rewriting
//! system is out of scope (see non-goals); this module fixes the
//! interface tensors consume to resolve a symbol down to a polynomial
//! of other symbols once a rulebook has been completed elsewhere.

use crate::error::MomentError;
use crate::polynomial::Polynomial;
use crate::symbol::SymbolId;

pub trait Rulebook {
    /// Registers an uncompleted rule `symbol_id -> replacement`. Returns
    /// `InvalidMomentRule` if the rule is inconsistent with one already
    /// present (e.g. contradictory substitutions for the same symbol).
    fn add_raw_rule(&mut self, symbol_id: SymbolId, replacement: Polynomial) -> Result<(), MomentError>;

    /// Runs completion, leaving the rulebook confluent. A no-op if
    /// already completed.
    fn complete(&mut self) -> Result<(), MomentError>;

    fn is_completed(&self) -> bool;

    /// Iterates completed `(symbol_id, replacement)` pairs. Empty before
    /// `complete` has run.
    fn iter(&self) -> Box<dyn Iterator<Item = (SymbolId, &Polynomial)> + '_>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
