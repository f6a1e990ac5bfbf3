//! Small, dependency-light helpers shared by the moment-matrix crates:
//! a lock-step iterator pairing and a sorted sparse linear combination.

mod iter_tuple;
mod linear_combo;

pub use iter_tuple::IterTuple;
pub use linear_combo::LinearCombo;
