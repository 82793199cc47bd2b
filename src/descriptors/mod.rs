//! The descriptor table: every named descriptor with its declared value kind
//! and the function computing it from a [`Molecule`].

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::Molecule;

mod constitutional;
mod crippen;
mod qed;
mod surface;
mod topological;
mod tpsa;

pub use constitutional::*;
pub use crippen::{mol_log_p, mol_mr};
pub use qed::qed;
pub use surface::*;
pub use topological::*;
pub use tpsa::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DescriptorValue {
    Int(i64),
    Real(f64),
}

impl DescriptorValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            DescriptorValue::Int(_) => ValueKind::Integer,
            DescriptorValue::Real(_) => ValueKind::Real,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            DescriptorValue::Int(n) => n as f64,
            DescriptorValue::Real(x) => x,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            DescriptorValue::Int(_) => true,
            DescriptorValue::Real(x) => x.is_finite(),
        }
    }
}

impl Display for DescriptorValue {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            DescriptorValue::Int(n) => write!(f, "{n}"),
            DescriptorValue::Real(x) => write!(f, "{x}"),
        }
    }
}

/// Storage kind of a descriptor output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Real,
}

/// A descriptor could not produce a value for a particular molecule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("undefined for this molecule: {reason}")]
    Undefined { reason: &'static str },
    #[error("result is not a finite number")]
    NotFinite,
}

impl DescriptorError {
    pub fn undefined(reason: &'static str) -> Self {
        DescriptorError::Undefined { reason }
    }
}

pub type DescriptorResult = Result<DescriptorValue, DescriptorError>;
pub type DescriptorFn = fn(&Molecule) -> DescriptorResult;

#[derive(Debug, Clone, Copy)]
pub struct DescriptorEntry {
    pub name: &'static str,
    pub kind: ValueKind,
    pub function: DescriptorFn,
}

impl DescriptorEntry {
    pub const fn integer(name: &'static str, function: DescriptorFn) -> Self {
        Self {
            name,
            kind: ValueKind::Integer,
            function,
        }
    }

    pub const fn real(name: &'static str, function: DescriptorFn) -> Self {
        Self {
            name,
            kind: ValueKind::Real,
            function,
        }
    }

    /// Run the descriptor, turning non-finite reals into [`DescriptorError::NotFinite`].
    pub fn evaluate(&self, molecule: &Molecule) -> DescriptorResult {
        let value = (self.function)(molecule)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DescriptorError::NotFinite)
        }
    }
}

pub(crate) fn int(value: usize) -> DescriptorResult {
    Ok(DescriptorValue::Int(value as i64))
}

pub(crate) fn real(value: f64) -> DescriptorResult {
    Ok(DescriptorValue::Real(value))
}

/// Every descriptor the calculator knows, in output order.
pub static DESCRIPTOR_TABLE: &[DescriptorEntry] = &[
    DescriptorEntry::real("MolWt", mol_wt),
    DescriptorEntry::real("HeavyAtomMolWt", heavy_atom_mol_wt),
    DescriptorEntry::real("ExactMolWt", exact_mol_wt),
    DescriptorEntry::real("MolLogP", mol_log_p),
    DescriptorEntry::real("MolMR", mol_mr),
    DescriptorEntry::integer("NumValenceElectrons", num_valence_electrons),
    DescriptorEntry::integer("NumRadicalElectrons", num_radical_electrons),
    DescriptorEntry::real("BalabanJ", balaban_j),
    DescriptorEntry::real("Chi0", chi0),
    DescriptorEntry::real("Chi0n", chi0n),
    DescriptorEntry::real("Chi0v", chi0v),
    DescriptorEntry::real("Chi1", chi1),
    DescriptorEntry::real("Chi1n", chi1n),
    DescriptorEntry::real("Chi1v", chi1v),
    DescriptorEntry::real("Chi2n", chi2n),
    DescriptorEntry::real("Chi2v", chi2v),
    DescriptorEntry::real("Chi3n", chi3n),
    DescriptorEntry::real("Chi3v", chi3v),
    DescriptorEntry::real("Chi4n", chi4n),
    DescriptorEntry::real("Chi4v", chi4v),
    DescriptorEntry::real("HallKierAlpha", hall_kier_alpha),
    DescriptorEntry::real("Ipc", ipc),
    DescriptorEntry::real("Kappa1", kappa1),
    DescriptorEntry::real("Kappa2", kappa2),
    DescriptorEntry::real("Kappa3", kappa3),
    DescriptorEntry::real("LabuteASA", labute_asa),
    DescriptorEntry::real("TPSA", tpsa),
    DescriptorEntry::real("FractionCSP3", fraction_csp3),
    DescriptorEntry::integer("HeavyAtomCount", heavy_atom_count),
    DescriptorEntry::integer("NHOHCount", nhoh_count),
    DescriptorEntry::integer("NOCount", no_count),
    DescriptorEntry::integer("NumAliphaticCarbocycles", num_aliphatic_carbocycles),
    DescriptorEntry::integer("NumAliphaticHeterocycles", num_aliphatic_heterocycles),
    DescriptorEntry::integer("NumAliphaticRings", num_aliphatic_rings),
    DescriptorEntry::integer("NumAromaticCarbocycles", num_aromatic_carbocycles),
    DescriptorEntry::integer("NumAromaticHeterocycles", num_aromatic_heterocycles),
    DescriptorEntry::integer("NumAromaticRings", num_aromatic_rings),
    DescriptorEntry::integer("NumHAcceptors", num_h_acceptors),
    DescriptorEntry::integer("NumHDonors", num_h_donors),
    DescriptorEntry::integer("NumHeteroatoms", num_heteroatoms),
    DescriptorEntry::integer("NumRotatableBonds", num_rotatable_bonds),
    DescriptorEntry::integer("NumSaturatedCarbocycles", num_saturated_carbocycles),
    DescriptorEntry::integer("NumSaturatedHeterocycles", num_saturated_heterocycles),
    DescriptorEntry::integer("NumSaturatedRings", num_saturated_rings),
    DescriptorEntry::integer("RingCount", ring_count),
    DescriptorEntry::integer("fr_C_O", fr_c_o),
    DescriptorEntry::integer("fr_halogen", fr_halogen),
    DescriptorEntry::integer("fr_nitrile", fr_nitrile),
    DescriptorEntry::real("qed", qed),
];

/// Look up a descriptor by name.
pub fn find_descriptor(name: &str) -> Option<&'static DescriptorEntry> {
    DESCRIPTOR_TABLE.iter().find(|entry| entry.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;
    use std::collections::HashSet;

    #[test]
    fn test_table_names_are_unique() {
        let names: HashSet<&str> = DESCRIPTOR_TABLE.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), DESCRIPTOR_TABLE.len());
        assert!(find_descriptor("Ipc").is_some());
        assert!(find_descriptor("SA_score").is_none());
        for name in ["MolLogP", "MolMR", "Chi4v", "LabuteASA", "qed"] {
            assert_eq!(find_descriptor(name).map(|e| e.kind), Some(ValueKind::Real), "{name}");
        }
    }

    #[test]
    fn test_declared_kinds_match_values() {
        let molecule = parse_smiles("CC(=O)Nc1ccc(O)cc1").expect("Failed to parse SMILES");
        for entry in DESCRIPTOR_TABLE {
            let value = entry.evaluate(&molecule).expect(entry.name);
            assert_eq!(value.kind(), entry.kind, "{}", entry.name);
        }
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        fn broken(_: &Molecule) -> DescriptorResult {
            real(f64::NAN)
        }
        let entry = DescriptorEntry::real("Broken", broken);
        let molecule = parse_smiles("C").expect("Failed to parse SMILES");
        assert_eq!(entry.evaluate(&molecule), Err(DescriptorError::NotFinite));
    }
}
