//! Component A: operator sequences and their monotonic hash (component B).

mod sequence;
mod shortlex;

pub use sequence::{Operator, Sign, OperatorSequence, SequenceConstructionMode, SequenceReducer};
pub use shortlex::{ShortlexHasher, EMPTY_SEQUENCE_HASH};
