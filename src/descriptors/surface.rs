//! Labute's approximate surface area.
//!
//! Each atom is a sphere of its bond radius; bonded neighbours bury part of
//! it, and the buried cap depends only on the two radii and the bond length.
//! All hydrogens are pooled into one sphere term.

use std::f64::consts::PI;

use petgraph::visit::EdgeRef;

use super::{real, DescriptorResult};
use crate::{Bond, Element, Molecule};

/// Shortening of the sum of radii for a bond of this order.
fn bond_shortening(bond: Bond) -> f64 {
    match bond {
        Bond::Single => 0.0,
        Bond::Aromatic => 0.1,
        Bond::Double => 0.2,
        Bond::Triple => 0.3,
    }
}

/// Area term that a sphere of radius `other` buries on a sphere of radius
/// `radius` at bond length `length`.
fn buried(radius: f64, other: f64, length: f64) -> f64 {
    let distance = length.max((radius - other).abs()).min(radius + other);
    other * other - (radius - distance).powi(2) / distance
}

fn exposed(radius: f64, buried: f64) -> f64 {
    4.0 * PI * radius * radius - PI * radius * buried
}

pub fn labute_asa(molecule: &Molecule) -> DescriptorResult {
    let radius_of = |node| molecule.atom(node).element.bond_radius();
    let hydrogen = Element::H.bond_radius();
    let positions = molecule.heavy_positions();
    let heavy: Vec<_> = molecule.heavy_atoms().collect();

    let mut covered = vec![0.0; heavy.len()];
    for edge in molecule.graph().edge_references() {
        let (a, b) = (edge.source(), edge.target());
        let (Some(i), Some(j)) = (positions[a.index()], positions[b.index()]) else {
            continue;
        };
        let (ra, rb) = (radius_of(a), radius_of(b));
        let length = ra + rb - bond_shortening(*edge.weight());
        covered[i] += buried(ra, rb, length);
        covered[j] += buried(rb, ra, length);
    }

    let mut hydrogen_count = 0usize;
    let mut hydrogen_covered = 0.0;
    for (i, &node) in heavy.iter().enumerate() {
        let count = molecule.total_hydrogens(node) as usize;
        if count == 0 {
            continue;
        }
        let radius = radius_of(node);
        let length = radius + hydrogen;
        covered[i] += count as f64 * buried(radius, hydrogen, length);
        hydrogen_covered += count as f64 * buried(hydrogen, radius, length);
        hydrogen_count += count;
    }

    let mut area: f64 = heavy
        .iter()
        .zip(&covered)
        .map(|(&node, &covered)| exposed(radius_of(node), covered))
        .sum();
    if hydrogen_count > 0 {
        area += exposed(hydrogen, hydrogen_covered);
    }
    real(area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    const EPS: f64 = 1e-3;

    fn asa(smiles: &str) -> f64 {
        let molecule = parse_smiles(smiles).expect("Failed to parse SMILES");
        labute_asa(&molecule).expect("Failed to compute LabuteASA").as_f64()
    }

    #[test]
    fn test_known_areas() {
        assert!((asa("c1ccccc1") - 37.4314).abs() < EPS);
        assert!((asa("CCO") - 19.6589).abs() < EPS);
    }

    #[test]
    fn test_kekule_and_aromatic_input_agree() {
        assert!((asa("C1=CC=CC=C1") - asa("c1ccccc1")).abs() < 1e-9);
    }

    #[test]
    fn test_area_grows_with_chain_length() {
        let areas: Vec<f64> = ["C", "CC", "CCC", "CCCC"].iter().map(|s| asa(s)).collect();
        assert!(areas.windows(2).all(|w| w[0] < w[1]), "{areas:?}");
    }

    #[test]
    fn test_isolated_atom_is_a_full_sphere() {
        let radius = Element::Na.bond_radius();
        assert!((asa("[Na+]") - 4.0 * PI * radius * radius).abs() < 1e-9);
    }
}
