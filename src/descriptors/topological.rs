//! Graph-theoretical descriptors on the hydrogen-suppressed molecular graph.
//!
//! Balaban's J uses bond-order weighted shortest paths
//! ([`Molecule::weighted_distance_matrix`]); the connectivity and shape
//! indices enumerate simple paths by depth-first search.

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use super::{real, DescriptorError, DescriptorResult};
use crate::{Element, Hybridization, Molecule};

/// Covalent radius of sp3 carbon, the Hall-Kier reference.
const CARBON_SP3_RADIUS: f64 = 0.77;

fn heavy_edges(molecule: &Molecule) -> Vec<(NodeIndex, NodeIndex)> {
    molecule
        .graph()
        .edge_references()
        .map(|e| (e.source(), e.target()))
        .filter(|&(a, b)| !molecule.atom(a).element.is_hydrogen() && !molecule.atom(b).element.is_hydrogen())
        .collect()
}

/// Balaban's J index, with each bond as long as the inverse of its order.
pub fn balaban_j(molecule: &Molecule) -> DescriptorResult {
    let edges = heavy_edges(molecule);
    if edges.is_empty() {
        return Err(DescriptorError::undefined("molecule has no bonds"));
    }

    let distances = molecule.weighted_distance_matrix();
    let sums: Vec<f64> = distances.iter().map(|row| row.iter().flatten().sum()).collect();
    // The first atom of each fragment reaches no earlier atom.
    let components = distances
        .iter()
        .enumerate()
        .filter(|(i, row)| row[..*i].iter().all(Option::is_none))
        .count();
    let positions = molecule.heavy_positions();

    let bonds = edges.len() as f64;
    let cyclomatic = bonds - distances.len() as f64 + components as f64;

    let mut total = 0.0;
    for (a, b) in edges {
        if let (Some(i), Some(j)) = (positions[a.index()], positions[b.index()]) {
            total += 1.0 / (sums[i] * sums[j]).sqrt();
        }
    }
    real(bonds / (cyclomatic + 1.0) * total)
}

fn simple_delta(molecule: &Molecule, node: NodeIndex) -> f64 {
    molecule.heavy_degree(node) as f64
}

fn valence_delta(molecule: &Molecule, node: NodeIndex, core_corrected: bool) -> f64 {
    let atom = molecule.atom(node);
    let valence_electrons = atom.element.outer_electrons() as f64 - atom.charge as f64;
    let delta = valence_electrons - molecule.total_hydrogens(node) as f64;
    let z = atom.element.atomic_number() as f64;
    if core_corrected && z > 10.0 {
        delta / (z - valence_electrons - 1.0)
    } else {
        delta
    }
}

/// Simple paths of `length` bonds between heavy atoms, each reported once.
fn simple_paths(molecule: &Molecule, length: usize) -> Vec<Vec<NodeIndex>> {
    fn walk(molecule: &Molecule, path: &mut Vec<NodeIndex>, length: usize, paths: &mut Vec<Vec<NodeIndex>>) {
        let Some(&current) = path.last() else {
            return;
        };
        if path.len() == length + 1 {
            // Found once from each end.
            if length == 0 || path[0] < current {
                paths.push(path.clone());
            }
            return;
        }
        for next in molecule.graph().neighbors(current) {
            if molecule.atom(next).element.is_hydrogen() || path.contains(&next) {
                continue;
            }
            path.push(next);
            walk(molecule, path, length, paths);
            path.pop();
        }
    }

    let mut paths = Vec::new();
    for start in molecule.heavy_atoms() {
        walk(molecule, &mut vec![start], length, &mut paths);
    }
    paths
}

/// Connectivity index of the given order: over all paths of `order` bonds,
/// the sum of the inverse square root of the product of atom deltas. Paths
/// through an atom with a non-positive delta contribute nothing.
fn chi_with(molecule: &Molecule, order: usize, delta: impl Fn(NodeIndex) -> f64) -> DescriptorResult {
    let deltas: Vec<f64> = molecule.graph().node_indices().map(delta).collect();
    let mut total = 0.0;
    for path in simple_paths(molecule, order) {
        let product: f64 = path.iter().map(|n| deltas[n.index()]).product();
        if path.iter().all(|n| deltas[n.index()] > 0.0) {
            total += product.powf(-0.5);
        }
    }
    real(total)
}

pub fn chi0(molecule: &Molecule) -> DescriptorResult {
    chi_with(molecule, 0, |n| simple_delta(molecule, n))
}

pub fn chi1(molecule: &Molecule) -> DescriptorResult {
    chi_with(molecule, 1, |n| simple_delta(molecule, n))
}

fn chi_n(molecule: &Molecule, order: usize) -> DescriptorResult {
    chi_with(molecule, order, |n| valence_delta(molecule, n, false))
}

fn chi_v(molecule: &Molecule, order: usize) -> DescriptorResult {
    chi_with(molecule, order, |n| valence_delta(molecule, n, true))
}

pub fn chi0n(molecule: &Molecule) -> DescriptorResult {
    chi_n(molecule, 0)
}

pub fn chi1n(molecule: &Molecule) -> DescriptorResult {
    chi_n(molecule, 1)
}

pub fn chi2n(molecule: &Molecule) -> DescriptorResult {
    chi_n(molecule, 2)
}

pub fn chi3n(molecule: &Molecule) -> DescriptorResult {
    chi_n(molecule, 3)
}

pub fn chi4n(molecule: &Molecule) -> DescriptorResult {
    chi_n(molecule, 4)
}

pub fn chi0v(molecule: &Molecule) -> DescriptorResult {
    chi_v(molecule, 0)
}

pub fn chi1v(molecule: &Molecule) -> DescriptorResult {
    chi_v(molecule, 1)
}

pub fn chi2v(molecule: &Molecule) -> DescriptorResult {
    chi_v(molecule, 2)
}

pub fn chi3v(molecule: &Molecule) -> DescriptorResult {
    chi_v(molecule, 3)
}

pub fn chi4v(molecule: &Molecule) -> DescriptorResult {
    chi_v(molecule, 4)
}

/// Kier covalent radius of an atom by element and hybridization.
fn kier_radius(element: Element, hybridization: Hybridization) -> f64 {
    use Hybridization::*;
    match (element, hybridization) {
        (Element::C, SP3) => 0.77,
        (Element::C, SP2) => 0.67,
        (Element::C, _) => 0.60,
        (Element::N, SP3) => 0.74,
        (Element::N, SP2) => 0.62,
        (Element::N, _) => 0.55,
        (Element::O, SP3) => 0.74,
        (Element::O, _) => 0.62,
        (Element::F, _) => 0.72,
        (Element::Cl, _) => 0.99,
        (Element::Br, _) => 1.14,
        (Element::I, _) => 1.33,
        (Element::P, _) => 1.10,
        (Element::S, _) => 1.04,
        _ => CARBON_SP3_RADIUS,
    }
}

fn alpha(molecule: &Molecule) -> f64 {
    molecule
        .heavy_atoms()
        .map(|n| kier_radius(molecule.atom(n).element, molecule.hybridization(n)) / CARBON_SP3_RADIUS - 1.0)
        .sum()
}

pub fn hall_kier_alpha(molecule: &Molecule) -> DescriptorResult {
    real(alpha(molecule))
}

/// Number of simple paths with `length` bonds between heavy atoms.
fn count_paths(molecule: &Molecule, length: usize) -> usize {
    simple_paths(molecule, length).len()
}

pub fn kappa1(molecule: &Molecule) -> DescriptorResult {
    let p1 = count_paths(molecule, 1) as f64;
    let a = molecule.heavy_atom_count() as f64 + alpha(molecule);
    let denominator = p1 + alpha(molecule);
    if p1 == 0.0 || denominator == 0.0 {
        return real(0.0);
    }
    real(a * (a - 1.0).powi(2) / denominator.powi(2))
}

pub fn kappa2(molecule: &Molecule) -> DescriptorResult {
    let p2 = count_paths(molecule, 2) as f64;
    let a = molecule.heavy_atom_count() as f64 + alpha(molecule);
    let denominator = p2 + alpha(molecule);
    if p2 == 0.0 || denominator == 0.0 {
        return real(0.0);
    }
    real((a - 1.0) * (a - 2.0).powi(2) / denominator.powi(2))
}

pub fn kappa3(molecule: &Molecule) -> DescriptorResult {
    let p3 = count_paths(molecule, 3) as f64;
    let atoms = molecule.heavy_atom_count();
    let a = atoms as f64 + alpha(molecule);
    let denominator = p3 + alpha(molecule);
    if p3 == 0.0 || denominator == 0.0 {
        return real(0.0);
    }
    let numerator = if atoms % 2 == 1 {
        (a - 1.0) * (a - 3.0).powi(2)
    } else {
        (a - 3.0) * (a - 2.0).powi(2)
    };
    real(numerator / denominator.powi(2))
}

/// Coefficients of the characteristic polynomial of a square matrix,
/// highest power first, by the Faddeev-LeVerrier recurrence.
fn characteristic_polynomial(matrix: &[Vec<f64>]) -> Vec<f64> {
    let n = matrix.len();
    let mut coefficients = vec![1.0];
    let mut m = vec![vec![0.0; n]; n];
    let mut c = 1.0;
    for k in 1..=n {
        // M_k = A * M_{k-1} + c_{k-1} * I
        let mut next = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                next[i][j] = (0..n).map(|l| matrix[i][l] * m[l][j]).sum::<f64>();
            }
            next[i][i] += c;
        }
        m = next;
        let trace: f64 = (0..n).map(|i| (0..n).map(|l| matrix[i][l] * m[l][i]).sum::<f64>()).sum();
        c = -trace / k as f64;
        coefficients.push(c);
    }
    coefficients
}

fn info_entropy(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    -values
        .iter()
        .filter(|&&v| v > 0.0)
        .map(|&v| {
            let p = v / total;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Bonchev-Trinajstic information content of the coefficients of the
/// characteristic polynomial of the adjacency matrix.
pub fn ipc(molecule: &Molecule) -> DescriptorResult {
    let heavy: Vec<NodeIndex> = molecule.heavy_atoms().collect();
    let adjacency: Vec<Vec<f64>> = heavy
        .iter()
        .map(|&a| {
            heavy
                .iter()
                .map(|&b| if molecule.bond_between(a, b).is_some() { 1.0 } else { 0.0 })
                .collect()
        })
        .collect();
    let coefficients: Vec<f64> = characteristic_polynomial(&adjacency)
        .into_iter()
        .map(|c| c.round().abs())
        .collect();
    let total: f64 = coefficients.iter().sum();
    real(total * info_entropy(&coefficients))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_smiles, DescriptorValue};

    const EPS: f64 = 1e-3;

    fn value(result: DescriptorResult) -> f64 {
        result.expect("descriptor failed").as_f64()
    }

    #[test]
    fn test_ethanol_topology() {
        let ethanol = parse_smiles("CCO").expect("Failed to parse SMILES");
        assert!((value(balaban_j(&ethanol)) - 1.6330).abs() < EPS);
        assert!((value(chi0(&ethanol)) - 2.7071).abs() < EPS);
        assert!((value(chi1(&ethanol)) - 1.4142).abs() < EPS);
        assert!((value(chi0n(&ethanol)) - 2.1543).abs() < EPS);
        assert!((value(hall_kier_alpha(&ethanol)) + 0.0390).abs() < EPS);
        assert!((value(kappa1(&ethanol)) - 2.9610).abs() < EPS);
        assert!((value(kappa2(&ethanol)) - 1.9610).abs() < EPS);
        assert_eq!(kappa3(&ethanol), Ok(DescriptorValue::Real(0.0)));
    }

    #[test]
    fn test_single_atom() {
        let methane = parse_smiles("C").expect("Failed to parse SMILES");
        assert!(matches!(balaban_j(&methane), Err(DescriptorError::Undefined { .. })));
        assert_eq!(chi0(&methane), Ok(DescriptorValue::Real(0.0)));
        assert_eq!(chi1(&methane), Ok(DescriptorValue::Real(0.0)));
    }

    #[test]
    fn test_zero_deltas_are_skipped_consistently() {
        let water = parse_smiles("O").expect("Failed to parse SMILES");
        assert_eq!(chi0(&water), Ok(DescriptorValue::Real(0.0)));
        assert!((value(chi0n(&water)) - 0.5).abs() < 1e-9);

        let salt = parse_smiles("[Na+].[Cl-]").expect("Failed to parse SMILES");
        assert_eq!(chi0(&salt), Ok(DescriptorValue::Real(0.0)));
        assert!((value(chi0n(&salt)) - 1.0 / 8.0f64.sqrt()).abs() < 1e-9);
        assert!((value(chi0v(&salt)) - 1.0).abs() < 1e-9);
        assert_eq!(chi1v(&salt), Ok(DescriptorValue::Real(0.0)));
    }

    #[test]
    fn test_balaban_j_weights_bond_orders() {
        let benzene = parse_smiles("c1ccccc1").expect("Failed to parse SMILES");
        assert!((value(balaban_j(&benzene)) - 3.0).abs() < 1e-9);
        let kekule = parse_smiles("C1=CC=CC=C1").expect("Failed to parse SMILES");
        assert!((value(balaban_j(&kekule)) - 3.0).abs() < 1e-9);
        // Single bonds keep unit length.
        let cyclohexane = parse_smiles("C1CCCCC1").expect("Failed to parse SMILES");
        assert!((value(balaban_j(&cyclohexane)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_higher_order_chi() {
        let butane = parse_smiles("CCCC").expect("Failed to parse SMILES");
        assert!((value(chi2n(&butane)) - 1.0).abs() < 1e-9);
        assert!((value(chi3n(&butane)) - 0.5).abs() < 1e-9);
        assert_eq!(chi4n(&butane), Ok(DescriptorValue::Real(0.0)));

        let isobutane = parse_smiles("CC(C)C").expect("Failed to parse SMILES");
        assert!((value(chi2n(&isobutane)) - 3.0f64.sqrt()).abs() < 1e-9);
        assert_eq!(chi3n(&isobutane), Ok(DescriptorValue::Real(0.0)));

        let pentane = parse_smiles("CCCCC").expect("Failed to parse SMILES");
        assert!((value(chi4n(&pentane)) - 1.0 / 8.0f64.sqrt()).abs() < 1e-9);
        assert!((value(chi4v(&pentane)) - value(chi4n(&pentane))).abs() < 1e-9);

        // Cl: 7 / (17 - 7 - 1)
        let chloroethane = parse_smiles("CCCl").expect("Failed to parse SMILES");
        assert!((value(chi2v(&chloroethane)) - 3.0 / 14.0f64.sqrt()).abs() < 1e-9);
        assert!((value(chi3v(&chloroethane))).abs() < 1e-9);
    }

    #[test]
    fn test_path_counts() {
        let isobutane = parse_smiles("CC(C)C").expect("Failed to parse SMILES");
        assert_eq!(count_paths(&isobutane, 1), 3);
        assert_eq!(count_paths(&isobutane, 2), 3);
        assert_eq!(count_paths(&isobutane, 3), 0);
        let cyclopropane = parse_smiles("C1CC1").expect("Failed to parse SMILES");
        assert_eq!(count_paths(&cyclopropane, 2), 3);
    }

    #[test]
    fn test_characteristic_polynomial_of_ethane_like_path() {
        // Path on three vertices: x^3 - 2x.
        let adjacency = vec![vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]];
        let coefficients = characteristic_polynomial(&adjacency);
        let expected = [1.0, 0.0, -2.0, 0.0];
        for (c, e) in coefficients.iter().zip(expected) {
            assert!((c - e).abs() < 1e-9);
        }
    }

    #[test]
    fn test_heavier_atoms_use_core_correction() {
        let chloromethane = parse_smiles("CCl").expect("Failed to parse SMILES");
        // Cl: (7 - 0) / (17 - 7 - 1)
        let expected = 1.0 / (7.0f64 / 9.0).sqrt();
        assert!((value(chi1v(&chloromethane)) - expected).abs() < 1e-9);
        assert!((value(chi1n(&chloromethane)) - 1.0 / 7.0f64.sqrt()).abs() < 1e-9);
    }
}
