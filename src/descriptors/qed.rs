//! Quantitative estimate of drug-likeness (Bickerton et al., 2012).
//!
//! Eight properties are mapped through asymmetric double sigmoids onto
//! `0..=1` desirabilities, and the score is their weighted geometric mean.

use petgraph::graph::NodeIndex;

use super::{calc_tpsa, crippen::crippen_log_p, mol_wt, num_aromatic_rings, num_h_donors, num_rotatable_bonds};
use super::{real, DescriptorResult};
use crate::{Bond, Element, Molecule};

/// Parameters of one asymmetric double sigmoid.
struct Desirability {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    max: f64,
}

impl Desirability {
    const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64, max: f64) -> Self {
        Self { a, b, c, d, e, f, max }
    }

    fn of(&self, x: f64) -> f64 {
        let rise = 1.0 + (-(x - self.c + self.d / 2.0) / self.e).exp();
        let fall = 1.0 + (-(x - self.c - self.d / 2.0) / self.f).exp();
        (self.a + self.b / rise * (1.0 - 1.0 / fall)) / self.max
    }
}

/// MW, ALOGP, HBA, HBD, PSA, ROTB, AROM, ALERTS.
const PROPERTIES: [Desirability; 8] = [
    Desirability::new(2.817065973, 392.5754953, 290.7489764, 2.419764353, 49.22325677, 65.37051707, 104.9805561),
    Desirability::new(3.172690585, 137.8624751, 2.534937431, 4.581497897, 0.822739154, 0.576295591, 131.3186604),
    Desirability::new(2.948620388, 160.4605972, 3.615294657, 4.435986202, 0.290141953, 1.300669958, 148.7763046),
    Desirability::new(1.618662227, 1010.051101, 0.985094388, 0.000000001, 0.713820843, 0.920922555, 258.1632616),
    Desirability::new(1.876861559, 125.2232657, 62.90773554, 87.83366614, 12.01999824, 28.51324732, 104.5686167),
    Desirability::new(0.010000000, 272.4121427, 2.558379970, 1.565547684, 1.271567166, 2.758063707, 105.4420403),
    Desirability::new(3.217788970, 957.7374108, 2.274627939, 0.000000001, 1.317690384, 0.375760881, 312.3372610),
    Desirability::new(0.010000000, 1199.094025, -0.09002883, 0.000000001, 0.185904477, 0.875193782, 417.7253140),
];

const WEIGHTS: [f64; 8] = [0.66, 0.46, 0.05, 0.61, 0.06, 0.65, 0.48, 0.95];

/// Explicit connections and valence, hydrogens included.
fn connections(molecule: &Molecule, node: NodeIndex) -> (usize, usize) {
    let hydrogens = molecule.atom(node).hydrogens as usize;
    let degree = molecule.graph().neighbors(node).count() + hydrogens;
    let bonds: f64 = molecule.bonds_of(node).map(|(_, bond)| bond.order()).sum();
    (degree, bonds.round() as usize + hydrogens)
}

fn has_double_bond_to(molecule: &Molecule, node: NodeIndex, element: Element) -> bool {
    molecule
        .bonds_of(node)
        .any(|(other, bond)| bond == Bond::Double && molecule.atom(other).element == element)
}

fn is_acceptor(molecule: &Molecule, node: NodeIndex) -> bool {
    let atom = molecule.atom(node);
    let hydrogens = molecule.total_hydrogens(node);
    let (degree, valence) = connections(molecule, node);
    match atom.element {
        Element::O | Element::N if atom.aromatic => hydrogens == 0 && degree == 2,
        Element::O | Element::S if atom.charge < 0 => degree == 1,
        Element::O => valence == 2 && matches!((hydrogens, degree), (1, 2) | (0, 2) | (0, 1)),
        Element::S if !atom.aromatic => valence == 2 && hydrogens == 0 && matches!(degree, 1 | 2),
        Element::N if atom.charge == 0 && valence == 3 => match (hydrogens, degree) {
            (0, 1) => true,
            (_, 3) => !molecule.bonds_of(node).any(|(other, _)| {
                let neighbor = molecule.atom(other);
                !neighbor.aromatic
                    && matches!(neighbor.element, Element::C | Element::S)
                    && has_double_bond_to(molecule, other, Element::O)
            }),
            _ => false,
        },
        _ => false,
    }
}

fn is_aliphatic(molecule: &Molecule, node: NodeIndex, element: Element) -> bool {
    let atom = molecule.atom(node);
    atom.element == element && !atom.aromatic
}

/// Aliphatic neighbours of `node` with the given element, joined by a single bond.
fn single_neighbors(molecule: &Molecule, node: NodeIndex, element: Element) -> impl Iterator<Item = NodeIndex> + '_ {
    molecule
        .bonds_of(node)
        .filter(move |&(other, bond)| bond == Bond::Single && is_aliphatic(molecule, other, element))
        .map(|(other, _)| other)
}

fn is_carbonyl(molecule: &Molecule, node: NodeIndex) -> bool {
    is_aliphatic(molecule, node, Element::C) && has_double_bond_to(molecule, node, Element::O)
}

fn three_ring_with(molecule: &Molecule, element: Element) -> bool {
    molecule.rings().iter().any(|ring| {
        ring.len() == 3
            && ring.iter().filter(|&&n| is_aliphatic(molecule, n, element)).count() == 1
            && ring.iter().filter(|&&n| is_aliphatic(molecule, n, Element::C)).count() == 2
    })
}

fn any_atom(molecule: &Molecule, test: impl Fn(NodeIndex) -> bool) -> bool {
    molecule.heavy_atoms().any(test)
}

/// Reactive or unstable groups, each counted once however often it occurs.
fn structural_alerts(molecule: &Molecule) -> usize {
    let alerts = [
        // acyl chloride
        any_atom(molecule, |n| is_carbonyl(molecule, n) && single_neighbors(molecule, n, Element::Cl).next().is_some()),
        // sulfonyl chloride
        any_atom(molecule, |n| {
            is_aliphatic(molecule, n, Element::S)
                && molecule
                    .bonds_of(n)
                    .filter(|&(o, bond)| bond == Bond::Double && molecule.atom(o).element == Element::O)
                    .count()
                    >= 2
                && single_neighbors(molecule, n, Element::Cl).next().is_some()
        }),
        three_ring_with(molecule, Element::O),
        three_ring_with(molecule, Element::N),
        // thiol
        any_atom(molecule, |n| is_aliphatic(molecule, n, Element::S) && molecule.total_hydrogens(n) == 1),
        // aldehyde
        any_atom(molecule, |n| is_carbonyl(molecule, n) && molecule.total_hydrogens(n) == 1),
        // isocyanate
        any_atom(molecule, |n| {
            is_aliphatic(molecule, n, Element::C)
                && has_double_bond_to(molecule, n, Element::N)
                && has_double_bond_to(molecule, n, Element::O)
        }),
        // isothiocyanate
        any_atom(molecule, |n| {
            is_aliphatic(molecule, n, Element::C)
                && has_double_bond_to(molecule, n, Element::N)
                && has_double_bond_to(molecule, n, Element::S)
        }),
        // 1,2-dicarbonyl
        any_atom(molecule, |n| is_carbonyl(molecule, n) && single_neighbors(molecule, n, Element::C).any(|m| is_carbonyl(molecule, m))),
        // peroxide
        any_atom(molecule, |n| is_aliphatic(molecule, n, Element::O) && single_neighbors(molecule, n, Element::O).next().is_some()),
        // hydrazine
        any_atom(molecule, |n| is_aliphatic(molecule, n, Element::N) && single_neighbors(molecule, n, Element::N).next().is_some()),
    ];
    alerts.iter().filter(|&&hit| hit).count()
}

pub fn qed(molecule: &Molecule) -> DescriptorResult {
    let acceptors = molecule.heavy_atoms().filter(|&n| is_acceptor(molecule, n)).count();
    let values = [
        mol_wt(molecule)?.as_f64(),
        crippen_log_p(molecule),
        acceptors as f64,
        num_h_donors(molecule)?.as_f64(),
        calc_tpsa(molecule, false),
        num_rotatable_bonds(molecule)?.as_f64(),
        num_aromatic_rings(molecule)?.as_f64(),
        structural_alerts(molecule) as f64,
    ];
    let weighted: f64 = PROPERTIES
        .iter()
        .zip(values)
        .zip(WEIGHTS)
        .map(|((property, value), weight)| weight * property.of(value).ln())
        .sum();
    real((weighted / WEIGHTS.iter().sum::<f64>()).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    const EPS: f64 = 1e-4;

    fn qed_of(smiles: &str) -> f64 {
        let molecule = parse_smiles(smiles).expect("Failed to parse SMILES");
        qed(&molecule).expect("Failed to compute QED").as_f64()
    }

    #[test]
    fn test_benzene() {
        assert!((qed_of("c1ccccc1") - 0.4426).abs() < EPS);
    }

    #[test]
    fn test_scores_are_in_range() {
        for smiles in ["CCO", "CC(=O)Nc1ccc(O)cc1", "CC(=O)Oc1ccccc1C(=O)O", "[Na+].[Cl-]", "C"] {
            let score = qed_of(smiles);
            assert!(score > 0.0 && score <= 1.0, "{smiles}: {score}");
        }
        assert!(qed_of("CC(=O)Nc1ccc(O)cc1") > qed_of("CCO"));
    }

    #[test]
    fn test_alerts() {
        let alerts = |smiles: &str| structural_alerts(&parse_smiles(smiles).expect("Failed to parse SMILES"));
        assert_eq!(alerts("CCO"), 0);
        assert_eq!(alerts("CC(=O)Cl"), 1);
        assert_eq!(alerts("CC=O"), 1);
        assert_eq!(alerts("C1CO1"), 1);
        assert_eq!(alerts("CC(=O)C(=O)C"), 1);
        assert_eq!(alerts("NNC=O"), 2);
        assert!(qed_of("CCCCC=O") < qed_of("CCCCCO"));
    }

    #[test]
    fn test_acceptors() {
        let count = |smiles: &str| {
            let molecule = parse_smiles(smiles).expect("Failed to parse SMILES");
            molecule.heavy_atoms().filter(|&n| is_acceptor(&molecule, n)).count()
        };
        assert_eq!(count("CCO"), 1);
        assert_eq!(count("c1ccncc1"), 1);
        assert_eq!(count("CC(=O)N(C)C"), 1);
        assert_eq!(count("CN(C)C"), 1);
        assert_eq!(count("CC(=O)[O-]"), 2);
    }
}
