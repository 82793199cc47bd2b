//! Synthetic accessibility (Ertl and Schuffenhauer, 2009): fragment
//! contributions plus complexity penalties, rescaled to 1 (easy) .. 10 (hard).

use std::collections::{BTreeSet, HashSet};

use petgraph::graph::NodeIndex;

use super::{atom_ranks, morgan_fingerprint, SaModel, FINGERPRINT_RADIUS};
use crate::descriptors::{DescriptorError, DescriptorResult, DescriptorValue};
use crate::{Bond, Element, Molecule};

/// Contribution of a fragment missing from the model.
const UNKNOWN_FRAGMENT: f64 = -4.0;
const RAW_MIN: f64 = -4.0;
const RAW_MAX: f64 = 2.5;

/// Atoms that could carry tetrahedral stereo: four substituents with pairwise
/// distinct symmetry classes, at most one of them hydrogen.
pub fn potential_stereocenters(molecule: &Molecule) -> usize {
    let ranks = atom_ranks(molecule);
    molecule
        .heavy_atoms()
        .filter(|&node| {
            let atom = molecule.atom(node);
            let tetrahedral_element = match atom.element {
                Element::C | Element::Si => atom.charge == 0,
                Element::N | Element::P => atom.charge == 1,
                _ => false,
            };
            let hydrogens = molecule.total_hydrogens(node) as usize;
            let degree = molecule.heavy_degree(node);
            if !tetrahedral_element || hydrogens > 1 || degree + hydrogens != 4 {
                return false;
            }
            if molecule.bonds_of(node).any(|(_, bond)| bond != Bond::Single) {
                return false;
            }
            let neighbor_ranks: HashSet<u32> = molecule
                .graph()
                .neighbors(node)
                .filter_map(|n| ranks.get(&n).copied())
                .collect();
            neighbor_ranks.len() == degree
        })
        .count()
}

fn ring_bonds(ring: &[NodeIndex]) -> HashSet<(NodeIndex, NodeIndex)> {
    (0..ring.len())
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
            (a.min(b), a.max(b))
        })
        .collect()
}

/// `(spiro atoms, bridgehead atoms)` over pairs of smallest rings.
///
/// Rings meeting in exactly one atom make that atom spiro; rings sharing two or
/// more bonds make the ends of the shared path bridgeheads.
pub fn spiro_and_bridgeheads(molecule: &Molecule) -> (usize, usize) {
    let rings = molecule.rings();
    let bonds: Vec<_> = rings.iter().map(|ring| ring_bonds(ring)).collect();
    let mut spiro = BTreeSet::new();
    let mut bridgeheads = BTreeSet::new();

    for i in 0..rings.len() {
        for j in (i + 1)..rings.len() {
            let shared_atoms: Vec<NodeIndex> = rings[i].iter().filter(|n| rings[j].contains(n)).copied().collect();
            let shared_bonds: Vec<_> = bonds[i].intersection(&bonds[j]).copied().collect();
            if shared_atoms.len() == 1 {
                spiro.insert(shared_atoms[0]);
            } else if shared_bonds.len() >= 2 {
                for &atom in &shared_atoms {
                    let incident = shared_bonds.iter().filter(|(a, b)| *a == atom || *b == atom).count();
                    if incident == 1 {
                        bridgeheads.insert(atom);
                    }
                }
            }
        }
    }
    (spiro.len(), bridgeheads.len())
}

/// Map the raw fragment-plus-penalty score onto 1..10.
fn rescale(raw: f64) -> f64 {
    let mut score = 11.0 - (raw - RAW_MIN + 1.0) / (RAW_MAX - RAW_MIN) * 9.0;
    if score > 8.0 {
        score = 8.0 + (score + 1.0 - 9.0).ln();
    }
    score.clamp(1.0, 10.0)
}

pub fn sa_score(molecule: &Molecule, model: &SaModel) -> DescriptorResult {
    if model.is_empty() {
        return Err(DescriptorError::undefined("synthetic-accessibility model is empty"));
    }
    let fingerprint = morgan_fingerprint(molecule, FINGERPRINT_RADIUS);
    if fingerprint.is_empty() {
        return Err(DescriptorError::undefined("molecule has no heavy atoms"));
    }

    let mut fragments = 0.0;
    for (&id, &count) in fingerprint.counts() {
        fragments += model.score(id).unwrap_or(UNKNOWN_FRAGMENT) * count as f64;
    }
    fragments /= fingerprint.total() as f64;

    let atoms = molecule.heavy_atom_count() as f64;
    let (spiro, bridgeheads) = spiro_and_bridgeheads(molecule);
    let size_penalty = atoms.powf(1.005) - atoms;
    let stereo_penalty = (potential_stereocenters(molecule) as f64 + 1.0).log10();
    let spiro_penalty = (spiro as f64 + 1.0).log10();
    let bridge_penalty = (bridgeheads as f64 + 1.0).log10();
    let macrocycle_penalty = if molecule.rings().iter().any(|ring| ring.len() > 8) {
        2f64.log10()
    } else {
        0.0
    };
    let complexity = -(size_penalty + stereo_penalty + spiro_penalty + bridge_penalty + macrocycle_penalty);

    // Symmetric molecules produce fewer distinct fragments than atoms.
    let distinct = fingerprint.len() as f64;
    let symmetry = if atoms > distinct { 0.5 * (atoms / distinct).ln() } else { 0.0 };

    Ok(DescriptorValue::Real(rescale(fragments + complexity + symmetry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;
    use std::collections::HashMap;

    const EPS: f64 = 1e-4;

    #[test]
    fn test_rescale() {
        assert!((rescale(0.0) - 4.0769).abs() < EPS);
        assert!((rescale(-4.0) - 8.4796).abs() < EPS);
        assert_eq!(rescale(2.5), 1.0);
        assert_eq!(rescale(-1000.0), 10.0);
    }

    #[test]
    fn test_stereocenters() {
        let butanol = parse_smiles("CC(O)CC").expect("Failed to parse SMILES");
        assert_eq!(potential_stereocenters(&butanol), 1);
        let isobutane = parse_smiles("CC(C)C").expect("Failed to parse SMILES");
        assert_eq!(potential_stereocenters(&isobutane), 0);
    }

    #[test]
    fn test_spiro_and_bridgeheads() {
        let spiro = parse_smiles("C1CCC2(C1)CCCC2").expect("Failed to parse SMILES");
        assert_eq!(spiro_and_bridgeheads(&spiro), (1, 0));
        let norbornane = parse_smiles("C1CC2CCC1C2").expect("Failed to parse SMILES");
        assert_eq!(spiro_and_bridgeheads(&norbornane), (0, 2));
        let decalin = parse_smiles("C1CCC2CCCCC2C1").expect("Failed to parse SMILES");
        assert_eq!(spiro_and_bridgeheads(&decalin), (0, 0));
    }

    #[test]
    fn test_empty_model_is_undefined() {
        let molecule = parse_smiles("CCO").expect("Failed to parse SMILES");
        assert!(matches!(
            sa_score(&molecule, &SaModel::default()),
            Err(DescriptorError::Undefined { .. })
        ));
    }

    #[test]
    fn test_known_fragments_lower_the_score() {
        let molecule = parse_smiles("CCO").expect("Failed to parse SMILES");
        let fingerprint = morgan_fingerprint(&molecule, FINGERPRINT_RADIUS);
        // A model that knows none of the fragments of ethanol.
        let free = (0..).find(|id| !fingerprint.counts().contains_key(id)).expect("no free fragment id");
        let unrelated = SaModel::new(HashMap::from([(free, 1.0)]));
        let unknown = sa_score(&molecule, &unrelated).expect("Failed to score").as_f64();
        let scores: HashMap<_, _> = fingerprint.ids().map(|id| (id, 1.0)).collect();
        let known = sa_score(&molecule, &SaModel::new(scores)).expect("Failed to score").as_f64();
        assert!(known < unknown);
        assert!((1.0..=10.0).contains(&unknown));
        assert!((1.0..=10.0).contains(&known));
    }
}
