//! Circular (Morgan) atom environments with stable 32-bit identifiers.
//!
//! Identifiers are built with an explicit hash combiner rather than
//! `DefaultHasher`, so they stay the same across runs and platforms and can be
//! used as keys in scoring-model files.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::Molecule;

pub type FragmentId = u32;

fn hash_combine(seed: u32, value: u32) -> u32 {
    seed ^ value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

fn hash_values(values: impl IntoIterator<Item = u32>) -> u32 {
    values.into_iter().fold(0, hash_combine)
}

/// Connectivity invariant of a heavy atom: element, heavy degree, hydrogens,
/// charge, isotope and ring membership.
fn atom_invariant(molecule: &Molecule, node: NodeIndex) -> u32 {
    let atom = molecule.atom(node);
    hash_values([
        atom.element.atomic_number() as u32,
        molecule.heavy_degree(node) as u32,
        molecule.total_hydrogens(node) as u32,
        atom.charge as i32 as u32,
        atom.isotope.unwrap_or(0) as u32,
        molecule.is_in_ring(node) as u32,
    ])
}

/// Sorted `(bond code, neighbour label)` pairs around `node`, heavy neighbours only.
fn neighborhood(molecule: &Molecule, labels: &HashMap<NodeIndex, u32>, node: NodeIndex) -> Vec<(u32, u32)> {
    let mut pairs: Vec<(u32, u32)> = molecule
        .bonds_of(node)
        .filter_map(|(other, bond)| labels.get(&other).map(|&label| (bond.code(), label)))
        .collect();
    pairs.sort_unstable();
    pairs
}

/// Count fingerprint: fragment identifier to number of occurrences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    counts: BTreeMap<FragmentId, u32>,
}

impl Fingerprint {
    pub fn counts(&self) -> &BTreeMap<FragmentId, u32> {
        &self.counts
    }

    /// Distinct fragment identifiers.
    pub fn ids(&self) -> impl Iterator<Item = FragmentId> + '_ {
        self.counts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all occurrence counts.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    fn add(&mut self, id: FragmentId) {
        *self.counts.entry(id).or_insert(0) += 1;
    }
}

/// Morgan count fingerprint up to `radius` bonds around each heavy atom.
///
/// An environment covering the same set of bonds as one already emitted (at
/// this or a smaller radius) is dropped; among equal environments at one
/// radius the smallest identifier is kept.
pub fn morgan_fingerprint(molecule: &Molecule, radius: usize) -> Fingerprint {
    let heavy: Vec<NodeIndex> = molecule.heavy_atoms().collect();
    let mut fingerprint = Fingerprint::default();

    let mut labels: HashMap<NodeIndex, u32> = heavy.iter().map(|&n| (n, atom_invariant(molecule, n))).collect();
    let mut environments: HashMap<NodeIndex, BTreeSet<EdgeIndex>> =
        heavy.iter().map(|&n| (n, BTreeSet::new())).collect();
    let mut seen: BTreeSet<BTreeSet<EdgeIndex>> = BTreeSet::new();

    for &node in &heavy {
        fingerprint.add(labels[&node]);
    }

    for layer in 1..=radius {
        let mut next_labels = HashMap::with_capacity(heavy.len());
        let mut next_environments = HashMap::with_capacity(heavy.len());
        let mut candidates: Vec<(BTreeSet<EdgeIndex>, FragmentId)> = Vec::new();

        for &node in &heavy {
            let mut label_input = vec![layer as u32, labels[&node]];
            for (code, label) in neighborhood(molecule, &labels, node) {
                label_input.push(code);
                label_input.push(label);
            }
            let label = hash_values(label_input);

            let mut environment = environments[&node].clone();
            for edge in molecule.graph().edges(node) {
                let other = if edge.source() == node { edge.target() } else { edge.source() };
                if let Some(inner) = environments.get(&other) {
                    environment.insert(edge.id());
                    environment.extend(inner.iter().copied());
                }
            }

            // Environments that did not grow carry no new information.
            if environment != environments[&node] {
                candidates.push((environment.clone(), label));
            }
            next_labels.insert(node, label);
            next_environments.insert(node, environment);
        }

        candidates.sort();
        for (environment, label) in candidates {
            if seen.insert(environment) {
                fingerprint.add(label);
            }
        }
        labels = next_labels;
        environments = next_environments;
    }
    fingerprint
}

/// Symmetry classes of heavy atoms by iterative label refinement.
///
/// Refinement stops when the number of distinct classes stops growing; atoms
/// with equal ranks are topologically equivalent to this depth.
pub fn atom_ranks(molecule: &Molecule) -> HashMap<NodeIndex, u32> {
    let mut labels: HashMap<NodeIndex, u32> = molecule
        .heavy_atoms()
        .map(|n| (n, atom_invariant(molecule, n)))
        .collect();
    let classes = |labels: &HashMap<NodeIndex, u32>| labels.values().collect::<BTreeSet<_>>().len();
    let mut class_count = classes(&labels);

    for _ in 0..labels.len() {
        let updated: HashMap<NodeIndex, u32> = labels
            .keys()
            .map(|&node| {
                let mut input = vec![labels[&node]];
                for (code, label) in neighborhood(molecule, &labels, node) {
                    input.push(code);
                    input.push(label);
                }
                (node, hash_values(input))
            })
            .collect();
        let updated_count = classes(&updated);
        labels = updated;
        if updated_count == class_count {
            break;
        }
        class_count = updated_count;
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    #[test]
    fn test_identifiers_are_stable() {
        let first = morgan_fingerprint(&parse_smiles("CCO").expect("Failed to parse SMILES"), 2);
        let second = morgan_fingerprint(&parse_smiles("OCC").expect("Failed to parse SMILES"), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_ethane_environment_is_not_duplicated() {
        // Two identical methyl atoms, then one radius-1 environment covering the
        // single bond; radius 2 adds nothing new.
        let fingerprint = morgan_fingerprint(&parse_smiles("CC").expect("Failed to parse SMILES"), 2);
        assert_eq!(fingerprint.len(), 2);
        assert_eq!(fingerprint.total(), 3);
    }

    #[test]
    fn test_benzene_is_symmetric() {
        let benzene = parse_smiles("c1ccccc1").expect("Failed to parse SMILES");
        let fingerprint = morgan_fingerprint(&benzene, 2);
        assert_eq!(fingerprint.counts().values().next(), Some(&6));
        let ranks = atom_ranks(&benzene);
        assert_eq!(ranks.values().collect::<BTreeSet<_>>().len(), 1);
    }

    #[test]
    fn test_ranks_separate_inequivalent_atoms() {
        let ranks = atom_ranks(&parse_smiles("CC(O)CC").expect("Failed to parse SMILES"));
        let distinct = ranks.values().collect::<BTreeSet<_>>().len();
        assert_eq!(distinct, 5);
    }

    #[test]
    fn test_hash_combine_is_order_sensitive() {
        assert_ne!(hash_values([1, 2]), hash_values([2, 1]));
    }
}
