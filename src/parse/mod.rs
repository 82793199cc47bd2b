mod smiles;
pub use smiles::*;

mod molblock;
pub use molblock::*;

use thiserror::Error;

use crate::{Molecule, MoleculeGraph, SanitizeError};

/// Any failure turning text into a [`Molecule`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("invalid SMILES: {0}")]
    Smiles(#[from] SmilesError),
    #[error("invalid structure block: {0}")]
    MolBlock(#[from] MolBlockError),
    #[error("sanitization failed: {0}")]
    Sanitize(#[from] SanitizeError),
}

/// Knobs shared by the SMILES and structure-block parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject atoms whose explicit valence is not allowed.
    pub sanitize: bool,
    /// Fold explicit hydrogen atoms into their heavy neighbours.
    pub remove_hydrogens: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            sanitize: true,
            remove_hydrogens: true,
        }
    }
}

fn finish(graph: MoleculeGraph, options: ParseOptions) -> Result<Molecule, ParseError> {
    let molecule = if options.sanitize {
        Molecule::from_graph(graph, options.remove_hydrogens)?
    } else {
        Molecule::from_graph_unchecked(graph, options.remove_hydrogens)?
    };
    Ok(molecule)
}
