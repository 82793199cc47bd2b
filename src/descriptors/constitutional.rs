//! Atom, bond and ring counts, weights and simple functional-group counts.

use petgraph::graph::NodeIndex;

use super::{int, real, DescriptorResult};
use crate::{Bond, Element, Hybridization, Molecule};

const HYDROGEN_AVERAGE_MASS: f64 = 1.008;
const HYDROGEN_EXACT_MASS: f64 = 1.00782503223;

fn atom_mass(molecule: &Molecule, node: NodeIndex, exact: bool) -> f64 {
    let atom = molecule.atom(node);
    match atom.isotope {
        Some(isotope) => isotope as f64,
        None if exact => atom.element.monoisotopic_mass(),
        None => atom.element.average_mass(),
    }
}

fn weight(molecule: &Molecule, exact: bool, heavy_only: bool) -> f64 {
    let hydrogen = if exact { HYDROGEN_EXACT_MASS } else { HYDROGEN_AVERAGE_MASS };
    molecule
        .graph()
        .node_indices()
        .filter(|&n| !(heavy_only && molecule.atom(n).element.is_hydrogen()))
        .map(|n| {
            let folded = if heavy_only { 0.0 } else { molecule.atom(n).hydrogens as f64 * hydrogen };
            atom_mass(molecule, n, exact) + folded
        })
        .sum()
}

/// Average molecular weight, hydrogens included.
pub fn mol_wt(molecule: &Molecule) -> DescriptorResult {
    real(weight(molecule, false, false))
}

pub fn heavy_atom_mol_wt(molecule: &Molecule) -> DescriptorResult {
    real(weight(molecule, false, true))
}

/// Monoisotopic molecular weight.
pub fn exact_mol_wt(molecule: &Molecule) -> DescriptorResult {
    real(weight(molecule, true, false))
}

pub fn num_valence_electrons(molecule: &Molecule) -> DescriptorResult {
    let total: i64 = molecule
        .graph()
        .node_indices()
        .map(|n| {
            let atom = molecule.atom(n);
            atom.element.outer_electrons() as i64 - atom.charge as i64 + atom.hydrogens as i64
        })
        .sum();
    int(total.max(0) as usize)
}

pub fn num_radical_electrons(molecule: &Molecule) -> DescriptorResult {
    int(molecule
        .graph()
        .node_indices()
        .map(|n| molecule.atom(n).radicals as usize)
        .sum())
}

pub fn heavy_atom_count(molecule: &Molecule) -> DescriptorResult {
    int(molecule.heavy_atom_count())
}

/// Hydrogens on nitrogen and oxygen atoms.
pub fn nhoh_count(molecule: &Molecule) -> DescriptorResult {
    int(molecule
        .heavy_atoms()
        .filter(|&n| matches!(molecule.atom(n).element, Element::N | Element::O))
        .map(|n| molecule.total_hydrogens(n) as usize)
        .sum())
}

pub fn no_count(molecule: &Molecule) -> DescriptorResult {
    int(molecule
        .heavy_atoms()
        .filter(|&n| matches!(molecule.atom(n).element, Element::N | Element::O))
        .count())
}

pub fn num_heteroatoms(molecule: &Molecule) -> DescriptorResult {
    int(molecule
        .heavy_atoms()
        .filter(|&n| !molecule.atom(n).element.is_carbon())
        .count())
}

fn explicit_valence(molecule: &Molecule, node: NodeIndex) -> u8 {
    let bonds: f64 = molecule.bonds_of(node).map(|(_, bond)| bond.order()).sum();
    bonds.round() as u8 + molecule.atom(node).hydrogens
}

/// True when `node` is double bonded to O, N, P or S.
fn has_double_bond_to_heteroatom(molecule: &Molecule, node: NodeIndex) -> bool {
    molecule.bonds_of(node).any(|(other, bond)| {
        bond == Bond::Double
            && matches!(
                molecule.atom(other).element,
                Element::O | Element::N | Element::P | Element::S
            )
    })
}

/// Aromatic neighbour of `node` that is an aromatic nitrogen, directly or
/// through one aromatic carbon (the O and S of oxazole or thiazole).
fn near_aromatic_nitrogen(molecule: &Molecule, node: NodeIndex) -> bool {
    let aromatic_neighbors = |n: NodeIndex| {
        molecule
            .bonds_of(n)
            .filter(|&(_, bond)| bond == Bond::Aromatic)
            .map(|(other, _)| other)
    };
    let is_element = |n: NodeIndex, element: Element| {
        let atom = molecule.atom(n);
        atom.aromatic && atom.element == element
    };
    aromatic_neighbors(node).any(|first| {
        is_element(first, Element::N)
            || (is_element(first, Element::C) && aromatic_neighbors(first).any(|second| is_element(second, Element::N)))
    })
}

fn is_acceptor(molecule: &Molecule, node: NodeIndex) -> bool {
    let atom = molecule.atom(node);
    let hydrogens = molecule.total_hydrogens(node);
    match atom.element {
        Element::F => true,
        Element::O | Element::S if atom.aromatic => {
            atom.charge == 0 && hydrogens == 0 && !near_aromatic_nitrogen(molecule, node)
        }
        Element::O | Element::S if atom.charge < 0 => true,
        Element::O | Element::S if explicit_valence(molecule, node) == 2 => match hydrogens {
            0 => true,
            // Acid hydroxyls do not accept.
            1 => !molecule
                .bonds_of(node)
                .any(|(other, _)| has_double_bond_to_heteroatom(molecule, other)),
            _ => false,
        },
        Element::N if atom.aromatic => atom.charge == 0 && hydrogens == 0,
        Element::N => {
            atom.charge == 0
                && explicit_valence(molecule, node) == 3
                && !molecule.bonds_of(node).any(|(other, bond)| {
                    bond == Bond::Single && has_double_bond_to_heteroatom(molecule, other)
                })
        }
        _ => false,
    }
}

fn is_donor(molecule: &Molecule, node: NodeIndex) -> bool {
    let atom = molecule.atom(node);
    let hydrogens = molecule.total_hydrogens(node);
    if hydrogens == 0 {
        return false;
    }
    match atom.element {
        Element::N if atom.aromatic => atom.charge == 0 && hydrogens == 1,
        Element::N => match atom.charge {
            0 => explicit_valence(molecule, node) == 3,
            1 => explicit_valence(molecule, node) == 4,
            _ => false,
        },
        Element::O | Element::S => atom.charge == 0 && hydrogens == 1,
        _ => false,
    }
}

pub fn num_h_acceptors(molecule: &Molecule) -> DescriptorResult {
    int(molecule.heavy_atoms().filter(|&n| is_acceptor(molecule, n)).count())
}

pub fn num_h_donors(molecule: &Molecule) -> DescriptorResult {
    int(molecule.heavy_atoms().filter(|&n| is_donor(molecule, n)).count())
}

/// Single, acyclic bonds between two non-terminal heavy atoms, neither of
/// which takes part in a triple bond.
pub fn num_rotatable_bonds(molecule: &Molecule) -> DescriptorResult {
    let eligible = |n: NodeIndex| {
        molecule.heavy_degree(n) > 1 && !molecule.bonds_of(n).any(|(_, bond)| bond == Bond::Triple)
    };
    let graph = molecule.graph();
    int(graph
        .edge_indices()
        .filter_map(|e| graph.edge_endpoints(e).map(|(a, b)| (a, b, graph[e])))
        .filter(|&(a, b, bond)| {
            bond == Bond::Single
                && !molecule.atom(a).element.is_hydrogen()
                && !molecule.atom(b).element.is_hydrogen()
                && !molecule.is_ring_bond(a, b)
                && eligible(a)
                && eligible(b)
        })
        .count())
}

pub fn fraction_csp3(molecule: &Molecule) -> DescriptorResult {
    let carbons: Vec<NodeIndex> = molecule
        .heavy_atoms()
        .filter(|&n| molecule.atom(n).element.is_carbon())
        .collect();
    if carbons.is_empty() {
        return real(0.0);
    }
    let sp3 = carbons
        .iter()
        .filter(|&&n| molecule.hybridization(n) == Hybridization::SP3)
        .count();
    real(sp3 as f64 / carbons.len() as f64)
}

pub fn ring_count(molecule: &Molecule) -> DescriptorResult {
    int(molecule.ring_count())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RingClass {
    Aromatic,
    Saturated,
    /// Non-aromatic with at least one multiple bond.
    Unsaturated,
}

fn classify_rings(molecule: &Molecule) -> Vec<(RingClass, bool)> {
    molecule
        .rings()
        .iter()
        .map(|ring| {
            let bonds = molecule.ring_bond_types(ring);
            let class = if bonds.iter().all(|&b| b == Bond::Aromatic) {
                RingClass::Aromatic
            } else if bonds.iter().all(|&b| b == Bond::Single) {
                RingClass::Saturated
            } else {
                RingClass::Unsaturated
            };
            let carbocycle = ring.iter().all(|&n| molecule.atom(n).element.is_carbon());
            (class, carbocycle)
        })
        .collect()
}

fn count_rings(molecule: &Molecule, keep: impl Fn(RingClass, bool) -> bool) -> DescriptorResult {
    int(classify_rings(molecule)
        .into_iter()
        .filter(|&(class, carbocycle)| keep(class, carbocycle))
        .count())
}

pub fn num_aromatic_rings(molecule: &Molecule) -> DescriptorResult {
    count_rings(molecule, |class, _| class == RingClass::Aromatic)
}

pub fn num_aromatic_carbocycles(molecule: &Molecule) -> DescriptorResult {
    count_rings(molecule, |class, carbo| class == RingClass::Aromatic && carbo)
}

pub fn num_aromatic_heterocycles(molecule: &Molecule) -> DescriptorResult {
    count_rings(molecule, |class, carbo| class == RingClass::Aromatic && !carbo)
}

pub fn num_saturated_rings(molecule: &Molecule) -> DescriptorResult {
    count_rings(molecule, |class, _| class == RingClass::Saturated)
}

pub fn num_saturated_carbocycles(molecule: &Molecule) -> DescriptorResult {
    count_rings(molecule, |class, carbo| class == RingClass::Saturated && carbo)
}

pub fn num_saturated_heterocycles(molecule: &Molecule) -> DescriptorResult {
    count_rings(molecule, |class, carbo| class == RingClass::Saturated && !carbo)
}

pub fn num_aliphatic_rings(molecule: &Molecule) -> DescriptorResult {
    count_rings(molecule, |class, _| class != RingClass::Aromatic)
}

pub fn num_aliphatic_carbocycles(molecule: &Molecule) -> DescriptorResult {
    count_rings(molecule, |class, carbo| class != RingClass::Aromatic && carbo)
}

pub fn num_aliphatic_heterocycles(molecule: &Molecule) -> DescriptorResult {
    count_rings(molecule, |class, carbo| class != RingClass::Aromatic && !carbo)
}

pub fn fr_halogen(molecule: &Molecule) -> DescriptorResult {
    int(molecule
        .heavy_atoms()
        .filter(|&n| molecule.atom(n).element.is_halogen())
        .count())
}

/// Carbonyl groups: a three-connected carbon double bonded to a terminal oxygen.
pub fn fr_c_o(molecule: &Molecule) -> DescriptorResult {
    int(molecule
        .heavy_atoms()
        .filter(|&o| molecule.atom(o).element == Element::O && molecule.heavy_degree(o) == 1)
        .filter(|&o| {
            molecule.bonds_of(o).any(|(c, bond)| {
                let carbon = molecule.atom(c);
                bond == Bond::Double
                    && carbon.element.is_carbon()
                    && !carbon.aromatic
                    && molecule.heavy_degree(c) + molecule.total_hydrogens(c) as usize == 3
            })
        })
        .count())
}

pub fn fr_nitrile(molecule: &Molecule) -> DescriptorResult {
    int(molecule
        .heavy_atoms()
        .filter(|&n| molecule.atom(n).element == Element::N && molecule.heavy_degree(n) == 1)
        .filter(|&n| {
            molecule.bonds_of(n).any(|(c, bond)| {
                bond == Bond::Triple && molecule.atom(c).element.is_carbon() && molecule.heavy_degree(c) == 2
            })
        })
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_smiles, DescriptorValue};

    const EPS: f64 = 1e-3;

    fn real_of(result: DescriptorResult) -> f64 {
        match result.expect("descriptor failed") {
            DescriptorValue::Real(x) => x,
            other => panic!("expected a real value, got {other:?}"),
        }
    }

    fn int_of(result: DescriptorResult) -> i64 {
        match result.expect("descriptor failed") {
            DescriptorValue::Int(n) => n,
            other => panic!("expected an integer value, got {other:?}"),
        }
    }

    #[test]
    fn test_ethanol_weights() {
        let ethanol = parse_smiles("CCO").expect("Failed to parse SMILES");
        assert!((real_of(mol_wt(&ethanol)) - 46.069).abs() < EPS);
        assert!((real_of(heavy_atom_mol_wt(&ethanol)) - 40.021).abs() < EPS);
        assert!((real_of(exact_mol_wt(&ethanol)) - 46.041865).abs() < 1e-5);
    }

    #[test]
    fn test_ethanol_counts() {
        let ethanol = parse_smiles("CCO").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_valence_electrons(&ethanol)), 20);
        assert_eq!(int_of(heavy_atom_count(&ethanol)), 3);
        assert_eq!(int_of(num_h_donors(&ethanol)), 1);
        assert_eq!(int_of(num_h_acceptors(&ethanol)), 1);
        assert_eq!(int_of(nhoh_count(&ethanol)), 1);
        assert_eq!(int_of(no_count(&ethanol)), 1);
        assert_eq!(int_of(num_rotatable_bonds(&ethanol)), 0);
        assert!((real_of(fraction_csp3(&ethanol)) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_acid_hydroxyl_is_not_an_acceptor() {
        let acetic_acid = parse_smiles("CC(=O)O").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_h_acceptors(&acetic_acid)), 1);
        assert_eq!(int_of(num_h_donors(&acetic_acid)), 1);
        assert_eq!(int_of(fr_c_o(&acetic_acid)), 1);
    }

    #[test]
    fn test_amide_nitrogen_is_not_an_acceptor() {
        let acetamide = parse_smiles("CC(N)=O").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_h_acceptors(&acetamide)), 1);
        assert_eq!(int_of(num_h_donors(&acetamide)), 1);
    }

    #[test]
    fn test_aromatic_oxygen_and_sulfur_beside_nitrogen() {
        let oxazole = parse_smiles("c1cocn1").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_h_acceptors(&oxazole)), 1);
        let isoxazole = parse_smiles("c1cnoc1").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_h_acceptors(&isoxazole)), 1);
        let thiazole = parse_smiles("c1cscn1").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_h_acceptors(&thiazole)), 1);
        let furan = parse_smiles("c1ccoc1").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_h_acceptors(&furan)), 1);
    }

    #[test]
    fn test_rotatable_bonds() {
        let butane = parse_smiles("CCCC").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_rotatable_bonds(&butane)), 1);
        let biphenyl = parse_smiles("c1ccccc1-c1ccccc1").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_rotatable_bonds(&biphenyl)), 1);
        let propionitrile = parse_smiles("CCC#N").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_rotatable_bonds(&propionitrile)), 0);
        assert_eq!(int_of(fr_nitrile(&propionitrile)), 1);
    }

    #[test]
    fn test_ring_classes() {
        // Indane: one aromatic carbocycle fused to one aliphatic carbocycle.
        let indane = parse_smiles("c1ccc2CCCc2c1").expect("Failed to parse SMILES");
        assert_eq!(int_of(ring_count(&indane)), 2);
        assert_eq!(int_of(num_aromatic_carbocycles(&indane)), 1);
        assert_eq!(int_of(num_aliphatic_carbocycles(&indane)), 1);
        assert_eq!(int_of(num_saturated_rings(&indane)), 0);

        let piperidine = parse_smiles("C1CCNCC1").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_saturated_heterocycles(&piperidine)), 1);
        assert_eq!(int_of(num_aliphatic_heterocycles(&piperidine)), 1);

        let pyridine = parse_smiles("c1ccncc1").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_aromatic_heterocycles(&pyridine)), 1);
        assert_eq!(int_of(num_aromatic_rings(&pyridine)), 1);
        assert_eq!(int_of(num_h_acceptors(&pyridine)), 1);
    }

    #[test]
    fn test_halogens_and_heteroatoms() {
        let molecule = parse_smiles("FC(Cl)(Br)CI").expect("Failed to parse SMILES");
        assert_eq!(int_of(fr_halogen(&molecule)), 4);
        assert_eq!(int_of(num_heteroatoms(&molecule)), 4);
    }

    #[test]
    fn test_radicals_and_charges() {
        let methyl = parse_smiles("[CH3]").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_radical_electrons(&methyl)), 1);
        let ammonium = parse_smiles("[NH4+]").expect("Failed to parse SMILES");
        assert_eq!(int_of(num_valence_electrons(&ammonium)), 8);
        assert_eq!(int_of(num_h_donors(&ammonium)), 1);
    }
}
