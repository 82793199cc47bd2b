//! Wildman-Crippen logP and molar refractivity.
//!
//! Every heavy atom gets one of the Wildman and Crippen (1999) atom types from
//! its element and first shell, and every hydrogen is typed by the atom it
//! sits on. Both descriptors are sums of per-type contributions.

use std::collections::HashMap;

use lazy_static::lazy_static;
use petgraph::graph::NodeIndex;

use super::{real, DescriptorResult};
use crate::{Atom, Bond, Element, Molecule};

/// `(type, logP, MR)` for every atom type.
const CONTRIBUTIONS: &[(&str, f64, f64)] = &[
    ("C1", 0.1441, 2.503),
    ("C2", 0.0, 2.433),
    ("C3", -0.2035, 2.753),
    ("C4", -0.2051, 2.731),
    ("C5", -0.2783, 5.007),
    ("C6", 0.1551, 3.513),
    ("C7", 0.0017, 3.888),
    ("C8", 0.08452, 2.464),
    ("C9", -0.1444, 2.412),
    ("C10", -0.0516, 2.488),
    ("C11", 0.1193, 2.582),
    ("C12", -0.0967, 2.576),
    ("C13", -0.5443, 4.041),
    ("C14", 0.0, 3.257),
    ("C15", 0.245, 3.564),
    ("C16", 0.198, 3.18),
    ("C17", 0.0, 3.104),
    ("C18", 0.1581, 3.35),
    ("C19", 0.2955, 4.346),
    ("C20", 0.2713, 3.904),
    ("C21", 0.136, 3.509),
    ("C22", 0.4619, 3.067),
    ("C23", 0.5437, 3.853),
    ("C24", 0.1893, 2.673),
    ("C25", -0.8186, 3.135),
    ("C26", 0.264, 4.305),
    ("C27", 0.2148, 2.693),
    ("CS", 0.08129, 3.243),
    ("H1", 0.123, 1.057),
    ("H2", -0.2677, 1.395),
    ("H3", 0.2142, 0.9627),
    ("H4", 0.298, 1.805),
    ("HS", 0.1125, 1.112),
    ("N1", -1.019, 2.262),
    ("N2", -0.7096, 2.173),
    ("N3", -1.027, 2.827),
    ("N4", -0.5188, 3.0),
    ("N5", 0.08387, 1.757),
    ("N6", 0.1836, 2.428),
    ("N7", -0.3187, 1.839),
    ("N8", -0.4458, 2.819),
    ("N9", 0.01508, 1.725),
    ("N10", -1.95, 0.0),
    ("N11", -0.3239, 2.202),
    ("N12", -1.119, 0.0),
    ("N13", -0.3396, 0.2604),
    ("N14", 0.2887, 3.359),
    ("NS", -0.4806, 2.134),
    ("O1", 0.1552, 1.08),
    ("O2", -0.2893, 0.8238),
    ("O3", -0.0684, 1.085),
    ("O4", -0.4195, 1.182),
    ("O5", 0.0335, 3.367),
    ("O6", -0.3339, 0.7774),
    ("O7", -1.189, 0.0),
    ("O8", 0.1788, 3.135),
    ("O9", -0.1526, 0.0),
    ("O10", 0.1129, 0.2215),
    ("O11", 0.4833, 0.389),
    ("O12", -1.326, 0.0),
    ("OS", -0.1188, 0.6865),
    ("F", 0.4202, 1.108),
    ("Cl", 0.6895, 5.853),
    ("Br", 0.8456, 8.927),
    ("I", 0.8857, 14.02),
    ("Hal", -2.996, 0.0),
    ("P", 0.8612, 6.92),
    ("S1", 0.6482, 7.591),
    ("S2", -0.0024, 7.365),
    ("S3", 0.6237, 6.691),
    ("Me1", -0.3808, 5.754),
    ("Me2", -0.0025, 0.0),
];

lazy_static! {
    static ref CONTRIBUTION_TABLE: HashMap<&'static str, (f64, f64)> = CONTRIBUTIONS
        .iter()
        .map(|&(label, log_p, mr)| (label, (log_p, mr)))
        .collect();
}

/// A heavy neighbour seen from the atom being typed.
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    node: NodeIndex,
    element: Element,
    aromatic: bool,
    bond: Bond,
}

impl Neighbor {
    fn is(&self, element: Element) -> bool {
        self.element == element
    }

    fn is_aliphatic(&self, element: Element) -> bool {
        self.element == element && !self.aromatic
    }
}

fn heavy_neighbors(molecule: &Molecule, node: NodeIndex) -> Vec<Neighbor> {
    molecule
        .bonds_of(node)
        .filter(|&(other, _)| !molecule.atom(other).element.is_hydrogen())
        .map(|(other, bond)| {
            let atom = molecule.atom(other);
            Neighbor {
                node: other,
                element: atom.element,
                aromatic: atom.aromatic,
                bond,
            }
        })
        .collect()
}

/// Aliphatic N, O, P, S or halogen.
fn is_aliphatic_hetero(neighbor: &Neighbor) -> bool {
    !neighbor.aromatic
        && matches!(
            neighbor.element,
            Element::N | Element::O | Element::P | Element::S | Element::F | Element::Cl | Element::Br | Element::I
        )
}

fn is_sp3(molecule: &Molecule, node: NodeIndex) -> bool {
    molecule.bonds_of(node).all(|(_, bond)| bond == Bond::Single)
        && molecule.heavy_degree(node) + molecule.total_hydrogens(node) as usize == 4
}

fn aromatic_carbon_type(hydrogens: usize, neighbors: &[Neighbor]) -> &'static str {
    let unusual = |n: &Neighbor| {
        !n.aromatic
            && !matches!(
                n.element,
                Element::C | Element::N | Element::O | Element::S | Element::F | Element::Cl | Element::Br | Element::I
            )
    };
    if hydrogens == 0 && neighbors.iter().any(|n| n.bond == Bond::Single && unusual(n)) {
        return "C13";
    }
    for (element, label) in [
        (Element::F, "C14"),
        (Element::Cl, "C15"),
        (Element::Br, "C16"),
        (Element::I, "C17"),
    ] {
        if neighbors.iter().any(|n| n.is(element)) {
            return label;
        }
    }
    if hydrogens == 1 {
        return "C18";
    }
    let ring_bonds = neighbors.iter().filter(|n| n.bond == Bond::Aromatic).count();
    if ring_bonds >= 3 {
        return "C19";
    }
    if ring_bonds == 2 {
        if let Some(exocyclic) = neighbors.iter().find(|n| n.bond != Bond::Aromatic) {
            match (exocyclic.bond, exocyclic.aromatic, exocyclic.element) {
                (Bond::Single, true, _) => return "C20",
                (Bond::Single, false, Element::C) => return "C21",
                (Bond::Single, false, Element::N) => return "C22",
                (Bond::Single, false, Element::O) => return "C23",
                (Bond::Single, false, Element::S) => return "C24",
                (Bond::Double, false, Element::C | Element::N | Element::O) => return "C25",
                _ => {}
            }
        }
    }
    "CS"
}

fn carbon_type(molecule: &Molecule, node: NodeIndex, hydrogens: usize, neighbors: &[Neighbor]) -> &'static str {
    if molecule.atom(node).aromatic {
        return aromatic_carbon_type(hydrogens, neighbors);
    }
    let all_single_to_aliphatic_carbon = neighbors
        .iter()
        .all(|n| n.bond == Bond::Single && n.is_aliphatic(Element::C));
    match (hydrogens, neighbors.len()) {
        (4, 0) => return "C1",
        (3, 1) | (2, 2) if all_single_to_aliphatic_carbon => return "C1",
        (1, 3) | (0, 4) if all_single_to_aliphatic_carbon => return "C2",
        _ => {}
    }

    let sp3 = is_sp3(molecule, node);
    let all_aliphatic = neighbors.iter().all(|n| !n.aromatic);
    let any_aromatic = !all_aliphatic;
    if sp3 && all_aliphatic && neighbors.iter().any(is_aliphatic_hetero) {
        return if hydrogens >= 2 { "C3" } else { "C4" };
    }
    if neighbors
        .iter()
        .any(|n| n.bond == Bond::Double && !n.aromatic && !n.is(Element::C))
    {
        return "C5";
    }
    let double_to_carbon = neighbors.iter().any(|n| n.bond == Bond::Double && n.is(Element::C));
    if double_to_carbon && all_aliphatic {
        return "C6";
    }
    if hydrogens + neighbors.len() == 2 && neighbors.iter().any(|n| n.bond == Bond::Triple) {
        return "C7";
    }
    if hydrogens == 3 && any_aromatic {
        return if neighbors[0].is(Element::C) { "C8" } else { "C9" };
    }
    if sp3 && any_aromatic {
        return match hydrogens {
            2 => "C10",
            1 => "C11",
            _ => "C12",
        };
    }
    if double_to_carbon {
        return "C26";
    }
    let unusual = |n: &Neighbor| {
        !n.aromatic
            && !matches!(
                n.element,
                Element::C
                    | Element::N
                    | Element::O
                    | Element::P
                    | Element::S
                    | Element::F
                    | Element::Cl
                    | Element::Br
                    | Element::I
            )
    };
    if sp3 && neighbors.iter().any(unusual) {
        return "C27";
    }
    "CS"
}

fn nitrogen_type(atom: &Atom, hydrogens: usize, neighbors: &[Neighbor]) -> &'static str {
    if atom.aromatic {
        return match atom.charge {
            0 => "N11",
            c if c > 0 => "N12",
            _ => "NS",
        };
    }
    let singles = neighbors.iter().filter(|n| n.bond == Bond::Single).count();
    let doubles = neighbors.iter().filter(|n| n.bond == Bond::Double).count();
    let triple = neighbors.iter().any(|n| n.bond == Bond::Triple);
    let any_aromatic = neighbors.iter().any(|n| n.aromatic);
    match atom.charge {
        0 => match (hydrogens, neighbors.len()) {
            (3, 0) => "N1",
            (2, 1) if singles == 1 => if any_aromatic { "N3" } else { "N1" },
            (1, 2) if singles == 2 => if any_aromatic { "N4" } else { "N2" },
            (1, 1) if doubles == 1 => "N5",
            (0, 2) if doubles == 1 => "N6",
            (0, 3) if singles == 3 => if any_aromatic { "N8" } else { "N7" },
            (0, 1) if triple => "N9",
            _ => "NS",
        },
        c if c > 0 => {
            if hydrogens > 0 {
                return "N10";
            }
            let aliphatic_singles = neighbors
                .iter()
                .filter(|n| n.bond == Bond::Single && !n.aromatic)
                .count();
            let quaternary = aliphatic_singles == 4;
            let ylidene = doubles == 1 && aliphatic_singles == 2;
            if quaternary || ylidene || doubles == 2 || triple {
                "N13"
            } else {
                "N14"
            }
        }
        _ => "N14",
    }
}

/// Carbonyl oxygen typed by the other substituents of its carbon.
fn carbonyl_type(molecule: &Molecule, oxygen: NodeIndex, carbon: NodeIndex) -> &'static str {
    let hydrogens = molecule.total_hydrogens(carbon);
    let others: Vec<Neighbor> = heavy_neighbors(molecule, carbon)
        .into_iter()
        .filter(|n| n.node != oxygen)
        .collect();
    let aliphatic = match (hydrogens, others.as_slice()) {
        (2, []) => true,
        (1, [n]) => !n.aromatic && matches!(n.element, Element::C | Element::N | Element::O),
        (0, [a, b]) => !a.aromatic && !b.aromatic && (a.is(Element::C) || b.is(Element::C)),
        (0, [n]) => n.bond == Bond::Double && n.is(Element::O),
        _ => false,
    };
    if aliphatic {
        "O9"
    } else if others.iter().any(|n| n.aromatic) {
        "O10"
    } else if hydrogens == 0 && others.len() == 2 && others.iter().all(|n| !n.is(Element::C)) {
        "O11"
    } else {
        "OS"
    }
}

fn oxygen_type(molecule: &Molecule, node: NodeIndex, hydrogens: usize, neighbors: &[Neighbor]) -> &'static str {
    let atom = molecule.atom(node);
    if atom.aromatic {
        return "O1";
    }
    if hydrogens > 0 {
        return "O2";
    }
    match neighbors {
        [a, b] if a.bond == Bond::Single && b.bond == Bond::Single => {
            if a.aromatic || b.aromatic {
                "O4"
            } else {
                "O3"
            }
        }
        [n] if n.bond == Bond::Double => match n.element {
            Element::N | Element::O => "O5",
            Element::C if n.aromatic => "O8",
            Element::C => carbonyl_type(molecule, node, n.node),
            _ => "OS",
        },
        [n] if atom.charge < 0 => match n.element {
            Element::N => "O5",
            Element::S => "O6",
            Element::C
                if heavy_neighbors(molecule, n.node)
                    .iter()
                    .any(|other| other.bond == Bond::Double && other.is(Element::O)) =>
            {
                "O12"
            }
            _ => "O7",
        },
        _ => "OS",
    }
}

fn atom_type(molecule: &Molecule, node: NodeIndex) -> &'static str {
    let atom = molecule.atom(node);
    let hydrogens = molecule.total_hydrogens(node) as usize;
    let neighbors = heavy_neighbors(molecule, node);
    match atom.element {
        Element::C => carbon_type(molecule, node, hydrogens, &neighbors),
        Element::N => nitrogen_type(atom, hydrogens, &neighbors),
        Element::O => oxygen_type(molecule, node, hydrogens, &neighbors),
        Element::F | Element::Cl | Element::Br | Element::I if atom.charge < 0 => "Hal",
        Element::Li | Element::Na | Element::K if atom.charge > 0 => "Hal",
        Element::F => "F",
        Element::Cl => "Cl",
        Element::Br => "Br",
        Element::I => "I",
        Element::P => "P",
        Element::S if atom.aromatic => "S3",
        Element::S if atom.charge == 0 => "S1",
        Element::S => "S2",
        Element::Li | Element::Na | Element::K | Element::Mg | Element::Ca | Element::Al => "Me1",
        _ => "Me2",
    }
}

/// Type of a hydrogen on `node`.
fn hydrogen_type(molecule: &Molecule, node: NodeIndex) -> &'static str {
    match molecule.atom(node).element {
        Element::C => "H1",
        Element::N => "H3",
        Element::O => {
            let Some(neighbor) = heavy_neighbors(molecule, node).first().copied() else {
                return "H2";
            };
            match neighbor.element {
                Element::N => "H3",
                Element::O | Element::S => "H4",
                Element::C if neighbor.aromatic || is_sp3(molecule, neighbor.node) => "H2",
                Element::C => {
                    let unsaturated = heavy_neighbors(molecule, neighbor.node).iter().any(|n| {
                        n.bond == Bond::Double
                            && matches!(n.element, Element::C | Element::N | Element::O | Element::S)
                    });
                    if unsaturated {
                        "H4"
                    } else {
                        "HS"
                    }
                }
                _ => "H2",
            }
        }
        _ => "H2",
    }
}

/// Every atom type in the molecule, hydrogens included, with its multiplicity.
fn typed_atoms(molecule: &Molecule) -> Vec<(&'static str, usize)> {
    let mut types = Vec::new();
    for node in molecule.graph().node_indices() {
        if molecule.atom(node).element.is_hydrogen() {
            // Hydrogens on heavy atoms are typed with their heavy atom.
            if molecule.heavy_degree(node) == 0 {
                let bonded = molecule.graph().neighbors(node).next().is_some();
                types.push((if bonded { "H1" } else { "HS" }, 1));
            }
            continue;
        }
        types.push((atom_type(molecule, node), 1));
        let hydrogens = molecule.total_hydrogens(node) as usize;
        if hydrogens > 0 {
            types.push((hydrogen_type(molecule, node), hydrogens));
        }
    }
    types
}

/// Summed `(logP, MR)` contributions.
fn contributions(molecule: &Molecule) -> (f64, f64) {
    typed_atoms(molecule)
        .into_iter()
        .filter_map(|(label, count)| {
            CONTRIBUTION_TABLE
                .get(label)
                .map(|&(log_p, mr)| (log_p * count as f64, mr * count as f64))
        })
        .fold((0.0, 0.0), |(log_p, mr), (a, b)| (log_p + a, mr + b))
}

pub(crate) fn crippen_log_p(molecule: &Molecule) -> f64 {
    contributions(molecule).0
}

pub fn mol_log_p(molecule: &Molecule) -> DescriptorResult {
    real(crippen_log_p(molecule))
}

pub fn mol_mr(molecule: &Molecule) -> DescriptorResult {
    real(contributions(molecule).1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    const EPS: f64 = 1e-4;

    fn log_p_of(smiles: &str) -> f64 {
        crippen_log_p(&parse_smiles(smiles).expect("Failed to parse SMILES"))
    }

    fn types_of(smiles: &str) -> Vec<&'static str> {
        let molecule = parse_smiles(smiles).expect("Failed to parse SMILES");
        molecule.heavy_atoms().map(|n| atom_type(&molecule, n)).collect()
    }

    #[test]
    fn test_every_type_has_a_contribution() {
        assert_eq!(CONTRIBUTION_TABLE.len(), CONTRIBUTIONS.len());
        for smiles in ["CCO", "c1ccccc1O", "CC(=O)O", "CC(=O)Nc1ccc(O)cc1", "C#N", "[Na+].[Cl-]", "CS(=O)C"] {
            let molecule = parse_smiles(smiles).expect("Failed to parse SMILES");
            for (label, _) in typed_atoms(&molecule) {
                assert!(CONTRIBUTION_TABLE.contains_key(label), "{smiles}: {label}");
            }
        }
    }

    #[test]
    fn test_atom_types() {
        assert_eq!(types_of("CCO"), ["C1", "C3", "O2"]);
        assert_eq!(types_of("CC(=O)O"), ["C1", "C5", "O9", "O2"]);
        assert_eq!(types_of("Cc1ccccc1"), ["C8", "C21", "C18", "C18", "C18", "C18", "C18"]);
        assert_eq!(types_of("Nc1ccccc1")[..2], ["N3", "C22"]);
        assert_eq!(types_of("C=C"), ["C6", "C6"]);
        assert_eq!(types_of("c1ccncc1")[3], "N11");
        assert_eq!(types_of("[Na+].[Cl-]"), ["Hal", "Hal"]);
    }

    #[test]
    fn test_log_p() {
        assert!((log_p_of("CCO") - -0.0014).abs() < EPS);
        assert!((log_p_of("c1ccccc1") - 1.6866).abs() < EPS);
        assert!((log_p_of("c1ccncc1") - 1.0816).abs() < EPS);
        assert!((log_p_of("Oc1ccccc1") - 1.3922).abs() < EPS);
        assert!((log_p_of("CC(=O)O") - 0.0909).abs() < EPS);
        assert!((log_p_of("O") - -0.8247).abs() < EPS);
    }

    #[test]
    fn test_molar_refractivity() {
        let mr = |smiles: &str| {
            let molecule = parse_smiles(smiles).expect("Failed to parse SMILES");
            mol_mr(&molecule).expect("Failed to compute MR").as_f64()
        };
        assert!((mr("CCO") - 12.7598).abs() < EPS);
        assert!((mr("c1ccccc1") - 26.442).abs() < EPS);
    }

    #[test]
    fn test_explicit_hydrogens_are_typed_like_implicit_ones() {
        let implicit = log_p_of("CO");
        let explicit = crippen_log_p(
            &crate::parse_smiles_with(
                "[H]C([H])([H])O[H]",
                crate::ParseOptions {
                    remove_hydrogens: false,
                    ..Default::default()
                },
            )
            .expect("Failed to parse SMILES"),
        );
        assert!((implicit - explicit).abs() < EPS);
    }
}
