//! Topological polar surface area from Ertl's fragment contributions.

use petgraph::graph::NodeIndex;

use super::{real, DescriptorResult};
use crate::{Bond, Element, Molecule};

/// Bond environment of a polar atom, counted over heavy neighbours.
#[derive(Debug, Default, Clone, Copy)]
struct Environment {
    neighbors: usize,
    hydrogens: u8,
    charge: i8,
    single: usize,
    double: usize,
    triple: usize,
    aromatic: usize,
    in_three_ring: bool,
}

impl Environment {
    fn of(molecule: &Molecule, node: NodeIndex) -> Self {
        let atom = molecule.atom(node);
        let mut env = Environment {
            hydrogens: molecule.total_hydrogens(node),
            charge: atom.charge,
            in_three_ring: molecule.is_in_ring_of_size(node, 3),
            ..Default::default()
        };
        for (other, bond) in molecule.bonds_of(node) {
            if molecule.atom(other).element.is_hydrogen() {
                continue;
            }
            env.neighbors += 1;
            match bond {
                Bond::Single => env.single += 1,
                Bond::Double => env.double += 1,
                Bond::Triple => env.triple += 1,
                Bond::Aromatic => env.aromatic += 1,
            }
        }
        env
    }

    /// `(neighbors, hydrogens, charge, single, double, triple, aromatic)`
    fn key(&self) -> (usize, u8, i8, usize, usize, usize, usize) {
        (
            self.neighbors,
            self.hydrogens,
            self.charge,
            self.single,
            self.double,
            self.triple,
            self.aromatic,
        )
    }
}

fn nitrogen_contribution(env: &Environment) -> f64 {
    match env.key() {
        (1, 0, 0, 0, 0, 1, 0) => 23.79,
        (1, 1, 0, 0, 1, 0, 0) => 23.85,
        (1, 2, 0, 1, 0, 0, 0) => 26.02,
        (1, 2, 1, 0, 1, 0, 0) => 25.59,
        (1, 3, 1, 1, 0, 0, 0) => 27.64,
        (2, 0, 0, 1, 1, 0, 0) => 12.36,
        (2, 0, 0, 0, 1, 1, 0) => 13.60,
        (2, 1, 0, 2, 0, 0, 0) if env.in_three_ring => 21.94,
        (2, 1, 0, 2, 0, 0, 0) => 12.03,
        (2, 0, 1, 1, 0, 1, 0) => 4.36,
        (2, 1, 1, 1, 1, 0, 0) => 13.97,
        (2, 2, 1, 2, 0, 0, 0) => 16.61,
        (2, 0, 0, 0, 0, 0, 2) => 12.89,
        (2, 1, 0, 0, 0, 0, 2) => 15.79,
        (2, 1, 1, 0, 0, 0, 2) => 14.14,
        (3, 0, 0, 3, 0, 0, 0) if env.in_three_ring => 3.01,
        (3, 0, 0, 3, 0, 0, 0) => 3.24,
        (3, 0, 0, 1, 2, 0, 0) => 11.68,
        (3, 0, 1, 2, 1, 0, 0) => 3.01,
        (3, 1, 1, 3, 0, 0, 0) => 4.44,
        (3, 0, 0, 0, 0, 0, 3) => 4.41,
        (3, 0, 0, 1, 0, 0, 2) => 4.93,
        (3, 0, 0, 0, 1, 0, 2) => 8.39,
        (3, 0, 1, 0, 0, 0, 3) => 4.10,
        (3, 0, 1, 1, 0, 0, 2) => 3.88,
        (4, 0, 1, 4, 0, 0, 0) => 0.00,
        _ => (30.5 - 8.2 * env.neighbors as f64 + 1.5 * env.hydrogens as f64).max(0.0),
    }
}

fn oxygen_contribution(env: &Environment) -> f64 {
    match env.key() {
        (1, 0, 0, 0, 1, 0, 0) => 17.07,
        (1, 1, 0, 1, 0, 0, 0) => 20.23,
        (1, 0, -1, 1, 0, 0, 0) => 23.06,
        (2, 0, 0, 2, 0, 0, 0) if env.in_three_ring => 12.53,
        (2, 0, 0, 2, 0, 0, 0) => 9.23,
        (2, 0, 0, 0, 0, 0, 2) => 13.14,
        _ => (28.5 - 8.6 * env.neighbors as f64 + 1.5 * env.hydrogens as f64).max(0.0),
    }
}

fn sulfur_contribution(env: &Environment) -> f64 {
    match env.key() {
        (1, 0, 0, 0, 1, 0, 0) => 32.09,
        (1, 1, 0, 1, 0, 0, 0) => 38.80,
        (2, 0, 0, 2, 0, 0, 0) => 25.30,
        (2, 0, 0, 0, 0, 0, 2) => 28.24,
        (3, 0, 0, 0, 1, 0, 2) => 21.70,
        (3, 0, 0, 2, 1, 0, 0) => 19.21,
        (4, 0, 0, 2, 2, 0, 0) => 8.38,
        _ => 0.0,
    }
}

fn phosphorus_contribution(env: &Environment) -> f64 {
    match env.key() {
        (2, 0, 0, 1, 1, 0, 0) => 34.14,
        (3, 0, 0, 3, 0, 0, 0) => 13.59,
        (3, 1, 0, 2, 1, 0, 0) => 23.47,
        (4, 0, 0, 3, 1, 0, 0) => 9.81,
        _ => 0.0,
    }
}

/// Per-atom polar surface contributions; zero for non-polar atoms.
pub fn tpsa_contributions(molecule: &Molecule, include_s_and_p: bool) -> Vec<f64> {
    molecule
        .graph()
        .node_indices()
        .map(|node| {
            let env = Environment::of(molecule, node);
            match molecule.atom(node).element {
                Element::N => nitrogen_contribution(&env),
                Element::O => oxygen_contribution(&env),
                Element::S if include_s_and_p => sulfur_contribution(&env),
                Element::P if include_s_and_p => phosphorus_contribution(&env),
                _ => 0.0,
            }
        })
        .collect()
}

pub fn calc_tpsa(molecule: &Molecule, include_s_and_p: bool) -> f64 {
    tpsa_contributions(molecule, include_s_and_p).iter().sum()
}

/// TPSA counting nitrogen and oxygen only.
pub fn tpsa(molecule: &Molecule) -> DescriptorResult {
    real(calc_tpsa(molecule, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_ethanol_tpsa() {
        let ethanol = parse_smiles("CCO").expect("Failed to parse SMILES");
        assert!((calc_tpsa(&ethanol, false) - 20.23).abs() < EPS);
        assert!((calc_tpsa(&ethanol, true) - 20.23).abs() < EPS);
    }

    #[test]
    fn test_sulfur_only_counts_when_requested() {
        let dimethyl_sulfoxide = parse_smiles("CS(=O)C").expect("Failed to parse SMILES");
        assert!((calc_tpsa(&dimethyl_sulfoxide, false) - 17.07).abs() < EPS);
        assert!((calc_tpsa(&dimethyl_sulfoxide, true) - (17.07 + 19.21)).abs() < EPS);

        let thiophene = parse_smiles("c1ccsc1").expect("Failed to parse SMILES");
        assert!((calc_tpsa(&thiophene, false)).abs() < EPS);
        assert!((calc_tpsa(&thiophene, true) - 28.24).abs() < EPS);
    }

    #[test]
    fn test_nitrogen_environments() {
        let acetonitrile = parse_smiles("CC#N").expect("Failed to parse SMILES");
        assert!((calc_tpsa(&acetonitrile, false) - 23.79).abs() < EPS);
        let pyridine = parse_smiles("c1ccncc1").expect("Failed to parse SMILES");
        assert!((calc_tpsa(&pyridine, false) - 12.89).abs() < EPS);
        let pyrrole = parse_smiles("c1cc[nH]c1").expect("Failed to parse SMILES");
        assert!((calc_tpsa(&pyrrole, false) - 15.79).abs() < EPS);
        let aziridine = parse_smiles("C1CN1").expect("Failed to parse SMILES");
        assert!((calc_tpsa(&aziridine, false) - 21.94).abs() < EPS);
    }

    #[test]
    fn test_unlisted_environment_uses_fallback() {
        let ammonia = parse_smiles("N").expect("Failed to parse SMILES");
        assert!((calc_tpsa(&ammonia, false) - (30.5 + 4.5)).abs() < EPS);
    }
}
