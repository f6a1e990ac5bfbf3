//! Components C, D, E: the Pauli scenario — context, bit-packed site
//! hasher, and translational-symmetry simplifiers.

pub mod context;
pub mod lattice_duplicator;
pub mod simplifier;
pub mod site_hasher;

pub use context::{PauliContext, SymmetryMode, WrapMode};
pub use simplifier::{MomentSimplifier, NonwrappingChainSimplifier, NonwrappingLatticeSimplifier, Simplifier, WrappingSimplifier};
pub use site_hasher::{Datum, WrappingSiteHasher, MAX_SLIDES, QUBITS_PER_SLIDE};
