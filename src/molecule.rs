use std::collections::{BTreeSet, HashSet, VecDeque};

use petgraph::algo::dijkstra;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use thiserror::Error;
use tracing::*;

use crate::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bond {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl Bond {
    /// Bond order, with aromatic bonds counted as 1.5.
    pub fn order(&self) -> f64 {
        match self {
            Bond::Single => 1.0,
            Bond::Double => 2.0,
            Bond::Triple => 3.0,
            Bond::Aromatic => 1.5,
        }
    }

    fn integer_order(&self) -> u8 {
        match self {
            Bond::Single | Bond::Aromatic => 1,
            Bond::Double => 2,
            Bond::Triple => 3,
        }
    }

    /// Small integer code used when hashing atom environments.
    pub fn code(&self) -> u32 {
        match self {
            Bond::Single => 1,
            Bond::Double => 2,
            Bond::Triple => 3,
            Bond::Aromatic => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: Option<u16>,
    /// Hydrogens attached to this atom that are not graph nodes.
    pub hydrogens: u8,
    /// The hydrogen count is fixed (bracket atoms); no implicit hydrogens are added.
    pub no_implicit: bool,
    pub radicals: u8,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            aromatic: false,
            charge: 0,
            isotope: None,
            hydrogens: 0,
            no_implicit: false,
            radicals: 0,
        }
    }

    pub fn aromatic(element: Element) -> Self {
        Self {
            aromatic: true,
            ..Self::new(element)
        }
    }

    /// Atoms that donate one electron to an aromatic system through a double bond
    /// in their Kekulé form, and so count one extra valence when aromatic.
    fn takes_aromatic_double_bond(&self) -> bool {
        match self.element {
            Element::C | Element::B => true,
            Element::N | Element::P | Element::As => self.hydrogens == 0 && self.charge == 0,
            _ => self.charge > 0,
        }
    }
}

pub type MoleculeGraph = UnGraph<Atom, Bond>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SanitizeError {
    #[error("explicit valence {valence} for atom #{atom} ({element}) is greater than permitted")]
    ValenceExceeded {
        atom: usize,
        element: Element,
        valence: u8,
    },
    #[error("non-ring atom #{0} marked aromatic")]
    NonRingAromaticAtom(usize),
    #[error("can't kekulize aromatic system containing atom #{0}")]
    Kekulize(usize),
    #[error("molecule has no atoms")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hybridization {
    S,
    SP,
    SP2,
    SP3,
}

/// A parsed, sanitized molecule with perceived rings.
///
/// Hydrogens are normally folded into [`Atom::hydrogens`]; hydrogen nodes only
/// remain where they cannot be attached to a heavy atom (e.g. `[H][H]`).
#[derive(Debug, Clone)]
pub struct Molecule {
    graph: MoleculeGraph,
    rings: Vec<Vec<NodeIndex>>,
    ring_bonds: HashSet<(NodeIndex, NodeIndex)>,
}

impl Molecule {
    /// Sanitize a raw graph: assign implicit hydrogens, check valences, fold
    /// hydrogen nodes into their neighbours, perceive rings and aromaticity.
    pub fn from_graph(graph: MoleculeGraph, remove_hydrogens: bool) -> Result<Self, SanitizeError> {
        Self::build(graph, remove_hydrogens, true)
    }

    /// Like [`Molecule::from_graph`] but without valence checking.
    pub fn from_graph_unchecked(graph: MoleculeGraph, remove_hydrogens: bool) -> Result<Self, SanitizeError> {
        Self::build(graph, remove_hydrogens, false)
    }

    fn build(mut graph: MoleculeGraph, remove_hydrogens: bool, check_valence: bool) -> Result<Self, SanitizeError> {
        if graph.node_count() == 0 {
            return Err(SanitizeError::Empty);
        }
        assign_hydrogens(&mut graph, check_valence)?;
        if remove_hydrogens {
            fold_hydrogens(&mut graph);
        }

        let rings = find_sssr(&graph);
        let mut molecule = Molecule {
            graph,
            ring_bonds: ring_bond_set(&rings),
            rings,
        };
        for node in molecule.graph.node_indices() {
            if molecule.graph[node].aromatic && !molecule.is_in_ring(node) {
                return Err(SanitizeError::NonRingAromaticAtom(node.index()));
            }
        }
        if check_valence {
            molecule.kekulize()?;
        }
        molecule.perceive_aromaticity();
        Ok(molecule)
    }

    pub fn graph(&self) -> &MoleculeGraph {
        &self.graph
    }

    pub fn atom(&self, node: NodeIndex) -> &Atom {
        &self.graph[node]
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All non-hydrogen atoms.
    pub fn heavy_atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(move |&n| !self.graph[n].element.is_hydrogen())
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.heavy_atoms().count()
    }

    /// Neighbours together with the connecting bond.
    pub fn bonds_of(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, Bond)> + '_ {
        self.graph.edges(node).map(move |edge| {
            let other = if edge.source() == node { edge.target() } else { edge.source() };
            (other, *edge.weight())
        })
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<Bond> {
        self.graph.find_edge(a, b).map(|e| self.graph[e])
    }

    /// Hydrogens on an atom, whether folded into the atom or present as nodes.
    pub fn total_hydrogens(&self, node: NodeIndex) -> u8 {
        let explicit = self
            .graph
            .neighbors(node)
            .filter(|&n| self.graph[n].element.is_hydrogen())
            .count() as u8;
        self.graph[node].hydrogens + explicit
    }

    /// Number of non-hydrogen neighbours.
    pub fn heavy_degree(&self, node: NodeIndex) -> usize {
        self.graph
            .neighbors(node)
            .filter(|&n| !self.graph[n].element.is_hydrogen())
            .count()
    }

    pub fn rings(&self) -> &[Vec<NodeIndex>] {
        &self.rings
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn is_in_ring(&self, node: NodeIndex) -> bool {
        self.rings.iter().any(|ring| ring.contains(&node))
    }

    pub fn is_in_ring_of_size(&self, node: NodeIndex, size: usize) -> bool {
        self.rings.iter().any(|ring| ring.len() == size && ring.contains(&node))
    }

    pub fn is_ring_bond(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.ring_bonds.contains(&ordered(a, b))
    }

    /// Bonds of a ring, in ring order.
    pub fn ring_bond_types(&self, ring: &[NodeIndex]) -> Vec<Bond> {
        (0..ring.len())
            .filter_map(|i| self.bond_between(ring[i], ring[(i + 1) % ring.len()]))
            .collect()
    }

    pub fn hybridization(&self, node: NodeIndex) -> Hybridization {
        let atom = &self.graph[node];
        if atom.element.is_hydrogen() {
            return Hybridization::S;
        }
        if atom.aromatic {
            return Hybridization::SP2;
        }
        let mut doubles = 0;
        for (_, bond) in self.bonds_of(node) {
            match bond {
                Bond::Triple => return Hybridization::SP,
                Bond::Double => doubles += 1,
                Bond::Aromatic => return Hybridization::SP2,
                Bond::Single => {}
            }
        }
        match doubles {
            0 => Hybridization::SP3,
            1 => Hybridization::SP2,
            _ => Hybridization::SP,
        }
    }

    /// Row of each node in [`Molecule::heavy_atoms`] order, indexed by
    /// `NodeIndex::index()`; `None` for hydrogens.
    pub fn heavy_positions(&self) -> Vec<Option<usize>> {
        let mut positions = vec![None; self.graph.node_count()];
        for (i, node) in self.heavy_atoms().enumerate() {
            positions[node.index()] = Some(i);
        }
        positions
    }

    /// Topological distances between heavy atoms, `None` when disconnected.
    ///
    /// Rows and columns follow the order of [`Molecule::heavy_atoms`].
    pub fn distance_matrix(&self) -> Vec<Vec<Option<usize>>> {
        let heavy: Vec<NodeIndex> = self.heavy_atoms().collect();
        let positions = self.heavy_positions();
        let mut matrix = vec![vec![None; heavy.len()]; heavy.len()];

        for (i, &start) in heavy.iter().enumerate() {
            let mut queue = VecDeque::new();
            matrix[i][i] = Some(0);
            queue.push_back((start, 0usize));
            while let Some((current, dist)) = queue.pop_front() {
                for next in self.graph.neighbors(current) {
                    if let Some(j) = positions[next.index()] {
                        if matrix[i][j].is_none() {
                            matrix[i][j] = Some(dist + 1);
                            queue.push_back((next, dist + 1));
                        }
                    }
                }
            }
        }
        matrix
    }

    /// Like [`Molecule::distance_matrix`], but each bond is as long as the
    /// inverse of its order (aromatic bonds count 1.5).
    pub fn weighted_distance_matrix(&self) -> Vec<Vec<Option<f64>>> {
        let positions = self.heavy_positions();
        let size = self.heavy_atom_count();
        self.heavy_atoms()
            .map(|start| {
                let mut row = vec![None; size];
                let reached = dijkstra(&self.graph, start, None, |edge| 1.0 / edge.weight().order());
                for (node, distance) in reached {
                    if let Some(j) = positions[node.index()] {
                        row[j] = Some(distance);
                    }
                }
                row
            })
            .collect()
    }

    /// Valence an aromatic input atom still lacks with every aromatic bond
    /// counted as single: one when it must take a double bond in a Kekulé form.
    fn needs_pi_bond(&self, node: NodeIndex) -> bool {
        let atom = &self.graph[node];
        let bonds: u8 = self.bonds_of(node).map(|(_, bond)| bond.integer_order()).sum();
        let valence = bonds + atom.hydrogens + atom.radicals;
        let allowed = atom.element.valences_with_charge(atom.charge);
        allowed.iter().find(|&&v| v >= valence) == Some(&(valence + 1))
    }

    /// Replace the aromatic bonds of the input by single and double bonds and
    /// clear the aromatic flags, so aromaticity is perceived from scratch.
    fn kekulize(&mut self) -> Result<(), SanitizeError> {
        let aromatic: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&n| self.graph[n].aromatic)
            .collect();
        if aromatic.is_empty() {
            return Ok(());
        }

        let mut needs = vec![false; self.graph.node_count()];
        for &node in &aromatic {
            needs[node.index()] = self.needs_pi_bond(node);
        }
        let partners: Vec<Vec<NodeIndex>> = self
            .graph
            .node_indices()
            .map(|node| {
                if !needs[node.index()] {
                    return Vec::new();
                }
                let mut list: Vec<NodeIndex> = self
                    .bonds_of(node)
                    .filter(|&(other, bond)| {
                        bond == Bond::Aromatic && needs[other.index()] && self.is_ring_bond(node, other)
                    })
                    .map(|(other, _)| other)
                    .collect();
                list.sort();
                list
            })
            .collect();

        let mut mate: Vec<Option<NodeIndex>> = vec![None; self.graph.node_count()];
        for system in pi_systems(&partners, &aromatic, &needs) {
            if system.len() % 2 == 1 || !assign_pi_bonds(&partners, &mut mate, &system) {
                debug!("No Kekulé form for the {}-atom system at atom #{}", system.len(), system[0].index());
                return Err(SanitizeError::Kekulize(system[0].index()));
            }
        }

        let aromatic_bonds: Vec<EdgeIndex> = self
            .graph
            .edge_indices()
            .filter(|&e| self.graph[e] == Bond::Aromatic)
            .collect();
        for edge in aromatic_bonds {
            if let Some((a, b)) = self.graph.edge_endpoints(edge) {
                self.graph[edge] = if mate[a.index()] == Some(b) { Bond::Double } else { Bond::Single };
            }
        }
        for node in aromatic {
            self.graph[node].aromatic = false;
        }
        Ok(())
    }

    /// Kekulé rings whose pi electron count satisfies Hückel's rule become
    /// aromatic. Repeats until no ring changes, so a ring fused to an aromatic
    /// ring can count the shared atoms as aromatic.
    fn perceive_aromaticity(&mut self) {
        loop {
            let aromatic_rings: Vec<Vec<NodeIndex>> = self
                .rings
                .iter()
                .filter(|ring| !self.ring_bond_types(ring).iter().all(|&b| b == Bond::Aromatic))
                .filter(|ring| matches!(self.pi_electrons(ring), Some(electrons) if electrons % 4 == 2))
                .cloned()
                .collect();
            if aromatic_rings.is_empty() {
                break;
            }

            for ring in aromatic_rings {
                debug!("Perceived aromatic ring of size {}", ring.len());
                for i in 0..ring.len() {
                    let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
                    if let Some(edge) = self.graph.find_edge(a, b) {
                        self.graph[edge] = Bond::Aromatic;
                    }
                    self.graph[a].aromatic = true;
                }
            }
        }
    }

    fn pi_electrons(&self, ring: &[NodeIndex]) -> Option<usize> {
        let mut total = 0;
        for &node in ring {
            let atom = &self.graph[node];
            let bonds: Vec<(NodeIndex, Bond)> = self.bonds_of(node).collect();
            let ring_double = bonds
                .iter()
                .any(|&(other, bond)| bond == Bond::Double && self.is_ring_bond(node, other));
            let exocyclic_double = bonds
                .iter()
                .any(|&(other, bond)| bond == Bond::Double && !self.is_ring_bond(node, other));

            if bonds.iter().any(|&(_, bond)| bond == Bond::Triple) {
                return None;
            }
            if ring_double || atom.aromatic {
                total += 1;
            } else if exocyclic_double {
                // Carbonyl-like ring atoms, e.g. the C=O of 2-pyridone.
                total += 0;
            } else {
                match atom.element {
                    Element::N | Element::P | Element::O | Element::S | Element::Se => total += 2,
                    Element::C if atom.charge < 0 => total += 2,
                    Element::C if atom.charge > 0 => total += 0,
                    _ => return None,
                }
            }
        }
        Some(total)
    }
}

fn ordered(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn ring_bond_set(rings: &[Vec<NodeIndex>]) -> HashSet<(NodeIndex, NodeIndex)> {
    let mut set = HashSet::new();
    for ring in rings {
        for i in 0..ring.len() {
            set.insert(ordered(ring[i], ring[(i + 1) % ring.len()]));
        }
    }
    set
}

/// Connected groups of atoms that need a double bond, in node order.
fn pi_systems(partners: &[Vec<NodeIndex>], aromatic: &[NodeIndex], needs: &[bool]) -> Vec<Vec<NodeIndex>> {
    let mut seen = vec![false; needs.len()];
    let mut systems = Vec::new();
    for &start in aromatic {
        if !needs[start.index()] || seen[start.index()] {
            continue;
        }
        seen[start.index()] = true;
        let mut system = vec![start];
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &next in &partners[node.index()] {
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    system.push(next);
                    stack.push(next);
                }
            }
        }
        system.sort();
        systems.push(system);
    }
    systems
}

/// Pair every atom of `system` with a bonded partner, most constrained atom
/// first, backtracking on dead ends.
fn assign_pi_bonds(partners: &[Vec<NodeIndex>], mate: &mut [Option<NodeIndex>], system: &[NodeIndex]) -> bool {
    let next = system
        .iter()
        .filter(|n| mate[n.index()].is_none())
        .map(|&n| {
            let free = partners[n.index()].iter().filter(|p| mate[p.index()].is_none()).count();
            (free, n)
        })
        .min();
    let Some((_, atom)) = next else {
        return true;
    };

    let candidates: Vec<NodeIndex> = partners[atom.index()]
        .iter()
        .copied()
        .filter(|p| mate[p.index()].is_none())
        .collect();
    for partner in candidates {
        mate[atom.index()] = Some(partner);
        mate[partner.index()] = Some(atom);
        if assign_pi_bonds(partners, mate, system) {
            return true;
        }
        mate[atom.index()] = None;
        mate[partner.index()] = None;
    }
    false
}

/// Fill in implicit hydrogens from the default valences of each atom.
fn assign_hydrogens(graph: &mut MoleculeGraph, check_valence: bool) -> Result<(), SanitizeError> {
    for node in graph.node_indices() {
        let atom = graph[node].clone();
        let mut bond_sum = 0u8;
        let mut aromatic_bonds = 0u8;
        for edge in graph.edges(node) {
            match edge.weight() {
                Bond::Aromatic => aromatic_bonds += 1,
                bond => bond_sum += bond.integer_order(),
            }
        }
        let mut valence = bond_sum + aromatic_bonds + atom.radicals;
        if atom.aromatic && aromatic_bonds > 0 && atom.takes_aromatic_double_bond() {
            valence += 1;
        }
        let allowed = atom.element.valences_with_charge(atom.charge);

        if atom.no_implicit {
            let total = valence + atom.hydrogens;
            if atom.aromatic {
                continue;
            }
            match allowed.iter().find(|&&v| v >= total) {
                // Unfilled valence on a bracket atom is radical electrons, e.g. [CH3].
                Some(&target) if atom.radicals == 0 => graph[node].radicals = target - total,
                Some(_) => {}
                None if check_valence && !allowed.is_empty() => {
                    return Err(SanitizeError::ValenceExceeded {
                        atom: node.index(),
                        element: atom.element,
                        valence: total,
                    });
                }
                None => {}
            }
            continue;
        }

        let hydrogens = match allowed.iter().find(|&&v| v >= valence) {
            Some(&target) => target - valence,
            None if atom.aromatic || !check_valence || allowed.is_empty() => 0,
            None => {
                return Err(SanitizeError::ValenceExceeded {
                    atom: node.index(),
                    element: atom.element,
                    valence,
                })
            }
        };
        graph[node].hydrogens = hydrogens;
    }
    Ok(())
}

/// Remove plain hydrogen nodes bonded to exactly one heavy atom, adding them to
/// that atom's hydrogen count.
fn fold_hydrogens(graph: &mut MoleculeGraph) {
    let removable: Vec<(NodeIndex, NodeIndex)> = graph
        .node_indices()
        .filter(|&n| {
            let atom = &graph[n];
            atom.element.is_hydrogen() && atom.charge == 0 && atom.isotope.is_none()
        })
        .filter_map(|n| {
            let neighbors: Vec<NodeIndex> = graph.neighbors(n).collect();
            match neighbors.as_slice() {
                [heavy] if !graph[*heavy].element.is_hydrogen() => Some((n, *heavy)),
                _ => None,
            }
        })
        .collect();

    if removable.is_empty() {
        return;
    }
    for &(_, heavy) in &removable {
        graph[heavy].hydrogens += 1;
    }
    let doomed: HashSet<NodeIndex> = removable.iter().map(|&(h, _)| h).collect();
    *graph = graph.filter_map(
        |node, atom| (!doomed.contains(&node)).then(|| atom.clone()),
        |_, bond| Some(*bond),
    );
}

/// Smallest set of smallest rings.
///
/// Candidate cycles are the shortest cycle through each bond; the smallest
/// linearly independent subset (over GF(2) bond vectors) of size equal to the
/// cyclomatic number is kept.
fn find_sssr(graph: &MoleculeGraph) -> Vec<Vec<NodeIndex>> {
    let components = petgraph::algo::connected_components(graph);
    let cyclomatic = graph.edge_count() + components - graph.node_count();
    if cyclomatic == 0 {
        return Vec::new();
    }

    let mut seen: HashSet<BTreeSet<NodeIndex>> = HashSet::new();
    let mut candidates: Vec<Vec<NodeIndex>> = Vec::new();
    for edge in graph.edge_references() {
        if let Some(cycle) = shortest_cycle_through(graph, edge.source(), edge.target()) {
            let key: BTreeSet<NodeIndex> = cycle.iter().copied().collect();
            if seen.insert(key) {
                candidates.push(cycle);
            }
        }
    }
    candidates.sort_by_key(|c| c.len());

    let edge_ids: Vec<(NodeIndex, NodeIndex)> = graph
        .edge_references()
        .map(|e| ordered(e.source(), e.target()))
        .collect();
    let words = (edge_ids.len() + 63) / 64;
    let to_vector = |cycle: &[NodeIndex]| {
        let mut bits = vec![0u64; words];
        for i in 0..cycle.len() {
            let key = ordered(cycle[i], cycle[(i + 1) % cycle.len()]);
            if let Some(pos) = edge_ids.iter().position(|&e| e == key) {
                bits[pos / 64] ^= 1 << (pos % 64);
            }
        }
        bits
    };

    // Row-reduced basis of accepted cycles, keyed by pivot bit.
    let mut basis: Vec<(usize, Vec<u64>)> = Vec::new();
    let mut rings = Vec::new();
    for cycle in candidates {
        let mut vector = to_vector(&cycle);
        for (pivot, row) in &basis {
            if vector[pivot / 64] & (1 << (pivot % 64)) != 0 {
                for (v, r) in vector.iter_mut().zip(row) {
                    *v ^= r;
                }
            }
        }
        let pivot = vector
            .iter()
            .enumerate()
            .find(|(_, &w)| w != 0)
            .map(|(i, w)| i * 64 + w.trailing_zeros() as usize);
        if let Some(pivot) = pivot {
            for (_, row) in basis.iter_mut() {
                if row[pivot / 64] & (1 << (pivot % 64)) != 0 {
                    for (r, v) in row.iter_mut().zip(&vector) {
                        *r ^= v;
                    }
                }
            }
            basis.push((pivot, vector));
            rings.push(cycle);
            if rings.len() == cyclomatic {
                break;
            }
        }
    }
    rings
}

/// Shortest path from `a` to `b` that does not use the direct `a-b` bond,
/// returned as a ring starting at `a`.
fn shortest_cycle_through(graph: &MoleculeGraph, a: NodeIndex, b: NodeIndex) -> Option<Vec<NodeIndex>> {
    let mut previous: Vec<Option<NodeIndex>> = vec![None; graph.node_count()];
    let mut visited = vec![false; graph.node_count()];
    let mut queue = VecDeque::new();
    visited[a.index()] = true;
    queue.push_back(a);

    while let Some(current) = queue.pop_front() {
        for next in graph.neighbors(current) {
            if current == a && next == b {
                continue;
            }
            if visited[next.index()] {
                continue;
            }
            visited[next.index()] = true;
            previous[next.index()] = Some(current);
            if next == b {
                let mut path = vec![b];
                let mut cursor = b;
                while let Some(p) = previous[cursor.index()] {
                    path.push(p);
                    cursor = p;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    #[test]
    fn test_implicit_hydrogens_ethanol() {
        let molecule = parse_smiles("CCO").expect("Failed to parse SMILES");
        let hydrogens: Vec<u8> = molecule
            .graph()
            .node_indices()
            .map(|n| molecule.total_hydrogens(n))
            .collect();
        assert_eq!(hydrogens, vec![3, 2, 1]);
        assert_eq!(molecule.ring_count(), 0);
    }

    #[test]
    fn test_rings_of_naphthalene() {
        let molecule = parse_smiles("c1ccc2ccccc2c1").expect("Failed to parse SMILES");
        assert_eq!(molecule.ring_count(), 2);
        assert!(molecule.rings().iter().all(|r| r.len() == 6));
        let fusion: Vec<NodeIndex> = molecule
            .graph()
            .node_indices()
            .filter(|&n| molecule.rings().iter().filter(|r| r.contains(&n)).count() == 2)
            .collect();
        assert_eq!(fusion.len(), 2);
    }

    #[test]
    fn test_kekule_benzene_is_aromatic() {
        let molecule = parse_smiles("C1=CC=CC=C1").expect("Failed to parse SMILES");
        for node in molecule.graph().node_indices() {
            assert!(molecule.atom(node).aromatic);
            assert_eq!(molecule.total_hydrogens(node), 1);
        }
        for edge in molecule.graph().edge_references() {
            assert_eq!(*edge.weight(), Bond::Aromatic);
        }
    }

    #[test]
    fn test_cyclohexene_is_not_aromatic() {
        let molecule = parse_smiles("C1=CCCCC1").expect("Failed to parse SMILES");
        assert!(molecule.heavy_atoms().all(|n| !molecule.atom(n).aromatic));
    }

    #[test]
    fn test_pentavalent_carbon_is_rejected() {
        assert!(parse_smiles("C(C)(C)(C)(C)C").is_err());
    }

    #[test]
    fn test_explicit_hydrogens_are_folded() {
        let molecule = parse_smiles("[H]C([H])([H])O").expect("Failed to parse SMILES");
        assert_eq!(molecule.atom_count(), 2);
        let carbon = NodeIndex::new(0);
        assert_eq!(molecule.atom(carbon).element, Element::C);
        assert_eq!(molecule.total_hydrogens(carbon), 3);
    }

    #[test]
    fn test_hybridization() {
        let molecule = parse_smiles("CC=CC#N").expect("Failed to parse SMILES");
        let kinds: Vec<Hybridization> = molecule
            .graph()
            .node_indices()
            .map(|n| molecule.hybridization(n))
            .collect();
        assert_eq!(
            kinds,
            vec![
                Hybridization::SP3,
                Hybridization::SP2,
                Hybridization::SP2,
                Hybridization::SP,
                Hybridization::SP
            ]
        );
    }

    #[test]
    fn test_distance_matrix() {
        let molecule = parse_smiles("CC(C)O.N").expect("Failed to parse SMILES");
        let matrix = molecule.distance_matrix();
        assert_eq!(matrix[0][2], Some(2));
        assert_eq!(matrix[0][3], Some(2));
        assert_eq!(matrix[0][4], None);
    }

    #[test]
    fn test_distance_matrix_of_long_chain() {
        let molecule = parse_smiles(&"C".repeat(400)).expect("Failed to parse SMILES");
        let matrix = molecule.distance_matrix();
        assert_eq!(matrix.len(), 400);
        assert_eq!(matrix[0][399], Some(399));
        assert_eq!(matrix[150][20], Some(130));
    }

    #[test]
    fn test_weighted_distance_matrix() {
        let benzene = parse_smiles("c1ccccc1").expect("Failed to parse SMILES");
        let matrix = benzene.weighted_distance_matrix();
        assert!((matrix[0][1].expect("unreachable") - 2.0 / 3.0).abs() < 1e-9);
        assert!((matrix[0][3].expect("unreachable") - 2.0).abs() < 1e-9);

        let propene = parse_smiles("C=CC.O").expect("Failed to parse SMILES");
        let matrix = propene.weighted_distance_matrix();
        assert!((matrix[0][2].expect("unreachable") - 1.5).abs() < 1e-9);
        assert_eq!(matrix[0][3], None);
    }

    #[test]
    fn test_heteroaromatics_are_kekulized() {
        for smiles in ["c1ccccc1", "c1cc[nH]c1", "c1ccncc1", "c1ccsc1", "c1ccoc1", "O=c1cccc[nH]1", "Cn1ccnc1"] {
            let molecule = parse_smiles(smiles).expect("Failed to parse SMILES");
            let ring = &molecule.rings()[0];
            assert!(ring.iter().all(|&n| molecule.atom(n).aromatic), "{smiles}");
            assert!(molecule.ring_bond_types(ring).iter().all(|&b| b == Bond::Aromatic), "{smiles}");
        }
    }

    #[test]
    fn test_unkekulizable_rings_are_rejected() {
        for smiles in ["c1cccc1", "c1ccnc1", "c1ccc2cccc2c1"] {
            let result = Molecule::from_graph(
                crate::parse_smiles_graph(smiles).expect("Failed to parse SMILES"),
                true,
            );
            assert!(matches!(result, Err(SanitizeError::Kekulize(_))), "{smiles}");
        }
    }

    #[test]
    fn test_aromatic_input_without_huckel_count_is_dearomatized() {
        let molecule = parse_smiles("c1ccccccc1").expect("Failed to parse SMILES");
        assert!(molecule.heavy_atoms().all(|n| !molecule.atom(n).aromatic));
        let bonds = molecule.ring_bond_types(&molecule.rings()[0]);
        assert_eq!(bonds.iter().filter(|&&b| b == Bond::Double).count(), 4);
    }

    #[test]
    fn test_fused_kekule_rings_are_aromatic() {
        let molecule = parse_smiles("C1=CC=C2C=CC=CC2=C1").expect("Failed to parse SMILES");
        assert!(molecule.heavy_atoms().all(|n| molecule.atom(n).aromatic));
        for ring in molecule.rings() {
            assert!(molecule.ring_bond_types(ring).iter().all(|&b| b == Bond::Aromatic));
        }
    }
}
