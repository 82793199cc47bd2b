//! Deciding whether a column holds molecules, and turning its cells into them.

use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;
use tracing::*;

use crate::{
    parse_molblock_with, parse_smiles_with, Cell, ColumnSpec, ConfigurationError, DataType, Molecule, ParseOptions,
};

lazy_static! {
    static ref NATIVE_TYPES: HashSet<&'static str> = HashSet::from(["molecule"]);
    static ref SMILES_TYPES: HashSet<&'static str> = HashSet::from(["smiles", "smiles-adapter"]);
    static ref CTAB_TYPES: HashSet<&'static str> = HashSet::from(["sdf", "sdf-adapter", "mol-adapter"]);
}

/// How the cells of a molecule column are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoleculeColumnKind {
    /// Already parsed molecule objects.
    Native,
    Smiles,
    /// MDL connection-table text (molfile or SD record).
    Ctab,
}

pub fn classify(data_type: &DataType) -> Option<MoleculeColumnKind> {
    let DataType::Logical(id) = data_type else {
        return None;
    };
    let id = id.as_str();
    if NATIVE_TYPES.contains(id) {
        Some(MoleculeColumnKind::Native)
    } else if SMILES_TYPES.contains(id) {
        Some(MoleculeColumnKind::Smiles)
    } else if CTAB_TYPES.contains(id) {
        Some(MoleculeColumnKind::Ctab)
    } else {
        None
    }
}

pub fn is_convertible_to_molecule(spec: &ColumnSpec) -> bool {
    classify(&spec.data_type).is_some()
}

/// Parse every cell of a molecule column.
///
/// Missing cells, blank text and cells that fail to parse all become `None`;
/// only a column type that is not a molecule type is an error.
pub fn convert_column(
    data_type: &DataType,
    cells: &[Cell],
    options: ParseOptions,
) -> Result<Vec<Option<Arc<Molecule>>>, ConfigurationError> {
    let kind = classify(data_type).ok_or_else(|| ConfigurationError::UnrecognizedColumnType(data_type.to_string()))?;
    debug!("Converting {} cells as {:?}", cells.len(), kind);

    let molecules = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| match kind {
            MoleculeColumnKind::Native => cell.as_molecule().cloned(),
            MoleculeColumnKind::Smiles => parse_text(row, cell, |text| parse_smiles_with(text, options)),
            MoleculeColumnKind::Ctab => parse_text(row, cell, |text| parse_molblock_with(text, options)),
        })
        .collect();
    Ok(molecules)
}

fn parse_text<E: std::fmt::Display>(
    row: usize,
    cell: &Cell,
    parse: impl Fn(&str) -> Result<Molecule, E>,
) -> Option<Arc<Molecule>> {
    let text = cell.as_text()?;
    if text.trim().is_empty() {
        return None;
    }
    match parse(text) {
        Ok(molecule) => Some(Arc::new(molecule)),
        Err(e) => {
            debug!("Row {row}: could not parse molecule: {e}");
            None
        }
    }
}
