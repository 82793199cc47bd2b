//! Fragment-based scores: synthetic accessibility and natural-product likeness.

mod fingerprint;
mod model;
mod np;
mod sa;

pub use fingerprint::*;
pub use model::*;
pub use np::*;
pub use sa::*;

/// Morgan radius both scorers' models were built with.
pub const FINGERPRINT_RADIUS: usize = 2;
