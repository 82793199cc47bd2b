//! Molecular descriptor calculation for tables of molecules.
//!
//! A table column holding SMILES, structure blocks or parsed molecules is
//! classified and converted into [`Molecule`]s, every descriptor in
//! [`DESCRIPTOR_TABLE`] plus three fixed scores is computed per row, and the
//! results are appended to the table as one column per descriptor.

use std::sync::Once;

mod element;
pub use element::*;

mod molecule;
pub use molecule::*;

mod parse;
pub use parse::*;

pub mod descriptors;
pub use descriptors::{DescriptorEntry, DescriptorError, DescriptorValue, ValueKind, DESCRIPTOR_TABLE};

pub mod scoring;
pub use scoring::{ModelError, ModelHandle, NpModel, SaModel};

mod calculator;
pub use calculator::*;

mod column;
pub use column::*;

mod table;
pub use table::*;

mod node;
pub use node::*;

mod error;
pub use error::*;

static LOGGING: Once = Once::new();

/// Install a `tracing` subscriber that prints events at `level` and above.
///
/// Unknown levels fall back to `info`. Calling this more than once is harmless;
/// only the first call installs a subscriber.
pub fn init_logging(level: &str) {
    LOGGING.call_once(|| {
        let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
