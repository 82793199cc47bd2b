use thiserror::Error;
use tracing::*;

use super::{finish, ParseError, ParseOptions};
use crate::{Atom, Bond, Element, Molecule, MoleculeGraph};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MolBlockError {
    #[error("{details} (at line {line})")]
    Parse { line: usize, details: String },
    #[error("V3000 structure blocks are not supported")]
    V3000,
}

impl MolBlockError {
    pub fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}

/// Parse the first V2000 record of a structure block with default options.
///
/// Everything after `M  END` (SD data items, `$$$$`, further records) is ignored.
pub fn parse_molblock(block: &str) -> Result<Molecule, ParseError> {
    parse_molblock_with(block, ParseOptions::default())
}

pub fn parse_molblock_with(block: &str, options: ParseOptions) -> Result<Molecule, ParseError> {
    let graph = parse_molblock_graph(block)?;
    finish(graph, options)
}

/// Read the connection table of a V2000 record into an unsanitized graph.
pub fn parse_molblock_graph(block: &str) -> Result<MoleculeGraph, MolBlockError> {
    let lines = collect_first_record(block);
    if lines.len() < 4 {
        return Err(MolBlockError::parse(
            lines.len().max(1),
            "structure block must contain a header and a counts line",
        ));
    }

    let (counts_line_no, counts_line) = lines[3];
    if counts_line.contains("V3000") {
        return Err(MolBlockError::V3000);
    }
    let (atom_count, bond_count) = parse_counts(counts_line, counts_line_no)?;
    let atom_start: usize = 4;
    let (bond_start, bond_end) = atom_start
        .checked_add(atom_count)
        .and_then(|start| Some((start, start.checked_add(bond_count)?)))
        .ok_or_else(|| MolBlockError::parse(counts_line_no, "atom and bond counts are too large"))?;
    if lines.len() < bond_end {
        return Err(MolBlockError::parse(
            lines.last().map(|(ln, _)| *ln).unwrap_or(counts_line_no),
            "structure block ended before atoms/bonds were fully specified",
        ));
    }

    let mut graph = MoleculeGraph::new_undirected();
    let nodes = parse_atoms(&lines[atom_start..bond_start])?
        .into_iter()
        .map(|atom| graph.add_node(atom))
        .collect::<Vec<_>>();

    for (ln, a1, a2, bond) in parse_bonds(&lines[bond_start..bond_end], atom_count)? {
        let (a, b) = (nodes[a1], nodes[a2]);
        if a == b || graph.find_edge(a, b).is_some() {
            return Err(MolBlockError::parse(ln, "duplicate or self-referencing bond"));
        }
        if bond == Bond::Aromatic {
            graph[a].aromatic = true;
            graph[b].aromatic = true;
        }
        graph.add_edge(a, b, bond);
    }

    apply_properties(&mut graph, &nodes, &lines[bond_end..])?;
    if graph.node_count() == 0 {
        return Err(MolBlockError::parse(counts_line_no, "structure block has no atoms"));
    }
    Ok(graph)
}

fn collect_first_record(block: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    for (i, content) in block.lines().enumerate() {
        if content.trim() == "$$$$" && !lines.is_empty() {
            break;
        }
        lines.push((i + 1, content.trim_end_matches('\r')));
    }
    lines
}

fn parse_counts(line: &str, line_no: usize) -> Result<(usize, usize), MolBlockError> {
    let field = |range: std::ops::Range<usize>| line.get(range).map(str::trim).unwrap_or_default();
    // Fixed columns first; fall back to whitespace splitting for sloppy writers.
    let fixed = (field(0..3).parse::<usize>(), field(3..6).parse::<usize>());
    if let (Ok(atoms), Ok(bonds)) = fixed {
        return Ok((atoms, bonds));
    }
    let tokens: Vec<_> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(MolBlockError::parse(line_no, "counts line must contain atom and bond counts"));
    }
    let atoms = tokens[0]
        .parse::<usize>()
        .map_err(|_| MolBlockError::parse(line_no, "invalid atom count"))?;
    let bonds = tokens[1]
        .parse::<usize>()
        .map_err(|_| MolBlockError::parse(line_no, "invalid bond count"))?;
    Ok((atoms, bonds))
}

fn parse_atoms(lines: &[(usize, &str)]) -> Result<Vec<Atom>, MolBlockError> {
    let mut atoms = Vec::with_capacity(lines.len());
    for (ln, raw) in lines {
        let padded = format!("{raw:<48}");
        let field = |range: std::ops::Range<usize>, what: &str| {
            padded
                .get(range)
                .map(str::trim)
                .ok_or_else(|| MolBlockError::parse(*ln, format!("unreadable {what} in atom line")))
        };
        for (range, axis) in [(0..10, "x"), (10..20, "y"), (20..30, "z")] {
            field(range, "coordinate")?
                .parse::<f64>()
                .map_err(|_| MolBlockError::parse(*ln, format!("invalid {axis} coordinate in atom line")))?;
        }
        let symbol = field(31..34, "element symbol")?;
        let element = Element::from_symbol(symbol)
            .ok_or_else(|| MolBlockError::parse(*ln, format!("unsupported element symbol '{symbol}'")))?;

        let mut atom = Atom::new(element);
        let mass_difference = field(34..36, "mass difference")?;
        if !mass_difference.is_empty() && mass_difference != "0" {
            let delta = mass_difference
                .parse::<i32>()
                .map_err(|_| MolBlockError::parse(*ln, "invalid mass difference"))?;
            let nominal = element.monoisotopic_mass().round() as i32 + delta;
            atom.isotope = u16::try_from(nominal).ok();
        }
        let charge_code = field(36..39, "charge code")?;
        match charge_code {
            "" | "0" => {}
            "1" => atom.charge = 3,
            "2" => atom.charge = 2,
            "3" => atom.charge = 1,
            "4" => atom.radicals = 1,
            "5" => atom.charge = -1,
            "6" => atom.charge = -2,
            "7" => atom.charge = -3,
            other => {
                return Err(MolBlockError::parse(*ln, format!("invalid charge code '{other}'")));
            }
        }
        atoms.push(atom);
    }
    Ok(atoms)
}

fn parse_bonds(
    lines: &[(usize, &str)],
    atom_count: usize,
) -> Result<Vec<(usize, usize, usize, Bond)>, MolBlockError> {
    let mut bonds = Vec::with_capacity(lines.len());
    for (ln, raw) in lines {
        let field = |range: std::ops::Range<usize>| raw.get(range).map(str::trim).unwrap_or_default();
        let tokens: Vec<&str> = match (field(0..3), field(3..6), field(6..9)) {
            (a, b, c) if !a.is_empty() && !b.is_empty() && !c.is_empty() => vec![a, b, c],
            _ => raw.split_whitespace().collect(),
        };
        if tokens.len() < 3 {
            return Err(MolBlockError::parse(*ln, "invalid bond line"));
        }
        let a1 = tokens[0]
            .parse::<usize>()
            .map_err(|_| MolBlockError::parse(*ln, "invalid first atom index"))?;
        let a2 = tokens[1]
            .parse::<usize>()
            .map_err(|_| MolBlockError::parse(*ln, "invalid second atom index"))?;
        let bond = match tokens[2] {
            "1" => Bond::Single,
            "2" => Bond::Double,
            "3" => Bond::Triple,
            "4" => Bond::Aromatic,
            other => {
                return Err(MolBlockError::parse(*ln, format!("unsupported bond type '{other}'")));
            }
        };
        if a1 == 0 || a2 == 0 || a1 > atom_count || a2 > atom_count {
            return Err(MolBlockError::parse(*ln, "bond references atom outside declared range"));
        }
        bonds.push((*ln, a1 - 1, a2 - 1, bond));
    }
    Ok(bonds)
}

/// Apply `M  CHG`, `M  ISO` and `M  RAD` lines up to `M  END`.
///
/// The first `M  CHG` or `M  RAD` line resets the charges and radicals given in
/// the atom block.
fn apply_properties(
    graph: &mut MoleculeGraph,
    nodes: &[petgraph::graph::NodeIndex],
    lines: &[(usize, &str)],
) -> Result<(), MolBlockError> {
    let mut charges_reset = false;
    for (ln, raw) in lines {
        let line = raw.trim_end();
        if line.starts_with("M  END") {
            return Ok(());
        }
        let kind = match line.get(0..6) {
            Some(kind @ ("M  CHG" | "M  ISO" | "M  RAD")) => kind,
            _ => {
                if line.starts_with("M  ") {
                    debug!("Ignoring property line {ln}: {line}");
                }
                continue;
            }
        };

        let tokens: Vec<i32> = line[6..]
            .split_whitespace()
            .map(|t| t.parse::<i32>())
            .collect::<Result<_, _>>()
            .map_err(|_| MolBlockError::parse(*ln, format!("invalid {kind} entry")))?;
        let Some((&count, pairs)) = tokens.split_first() else {
            return Err(MolBlockError::parse(*ln, format!("empty {kind} line")));
        };
        if count < 0 || pairs.len() != 2 * count as usize {
            return Err(MolBlockError::parse(*ln, format!("{kind} entry count does not match")));
        }

        if kind != "M  ISO" && !charges_reset {
            for &node in nodes {
                graph[node].charge = 0;
                graph[node].radicals = 0;
            }
            charges_reset = true;
        }
        for pair in pairs.chunks(2) {
            let index = pair[0];
            let value = pair[1];
            let node = usize::try_from(index)
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| nodes.get(i))
                .ok_or_else(|| MolBlockError::parse(*ln, format!("{kind} references unknown atom {index}")))?;
            let atom = &mut graph[*node];
            match kind {
                "M  CHG" => {
                    atom.charge = i8::try_from(value)
                        .map_err(|_| MolBlockError::parse(*ln, "charge out of range"))?
                }
                "M  ISO" => atom.isotope = u16::try_from(value).ok(),
                // Singlet and triplet both leave two unpaired electrons.
                _ => {
                    atom.radicals = match value {
                        1 | 3 => 2,
                        2 => 1,
                        _ => 0,
                    }
                }
            }
        }
    }
    warn!("Structure block has no M  END line");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::NodeIndex;

    const ETHANOL: &str = "ethanol
  handwritten

  3  2  0  0  0  0  0  0  0  0999 V2000
   -0.8900    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    0.6100    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.1100    1.4100    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  1  0
M  END
> <NAME>
ethanol

$$$$
";

    #[test]
    fn test_parse_ethanol_block() {
        let molecule = parse_molblock(ETHANOL).expect("Failed to parse structure block");
        assert_eq!(molecule.heavy_atom_count(), 3);
        assert_eq!(molecule.bond_count(), 2);
        assert_eq!(molecule.total_hydrogens(NodeIndex::new(0)), 3);
        assert_eq!(molecule.total_hydrogens(NodeIndex::new(2)), 1);
    }

    #[test]
    fn test_charge_lines_override_atom_block() {
        let block = "acetate
  handwritten

  4  3  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.2500    1.3000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    2.2500   -1.3000    0.0000 O   0  3  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  2  0
  2  4  1  0
M  CHG  1   4  -1
M  ISO  1   1  13
M  END
";
        let molecule = parse_molblock(block).expect("Failed to parse structure block");
        let oxygen = molecule.atom(NodeIndex::new(3));
        assert_eq!(oxygen.charge, -1);
        assert_eq!(molecule.total_hydrogens(NodeIndex::new(3)), 0);
        assert_eq!(molecule.atom(NodeIndex::new(0)).isotope, Some(13));
    }

    #[test]
    fn test_atom_block_charge_codes() {
        let block = "ammonium
  handwritten

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 N   0  3  0  0  0  0  0  0  0  0  0  0
M  END
";
        let molecule = parse_molblock(block).expect("Failed to parse structure block");
        assert_eq!(molecule.atom(NodeIndex::new(0)).charge, 1);
        assert_eq!(molecule.total_hydrogens(NodeIndex::new(0)), 4);
    }

    #[test]
    fn test_explicit_hydrogens_are_removed() {
        let block = "water
  handwritten

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    0.9600    0.0000    0.0000 H   0  0  0  0  0  0  0  0  0  0  0  0
   -0.2400    0.9300    0.0000 H   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  1  3  1  0
M  END
";
        let molecule = parse_molblock(block).expect("Failed to parse structure block");
        assert_eq!(molecule.atom_count(), 1);
        assert_eq!(molecule.total_hydrogens(NodeIndex::new(0)), 2);

        let options = ParseOptions {
            remove_hydrogens: false,
            ..ParseOptions::default()
        };
        let molecule = parse_molblock_with(block, options).expect("Failed to parse structure block");
        assert_eq!(molecule.atom_count(), 3);
        assert_eq!(molecule.total_hydrogens(NodeIndex::new(0)), 2);
    }

    #[test]
    fn test_malformed_blocks() {
        assert!(matches!(
            parse_molblock_graph("too short"),
            Err(MolBlockError::Parse { .. })
        ));
        let v3000 = "x\n  y\n\n  0  0  0     0  0            999 V3000\nM  END\n";
        assert_eq!(parse_molblock_graph(v3000).err(), Some(MolBlockError::V3000));

        let truncated = "x\n  y\n\n  2  1  0  0  0  0  0  0  0  0999 V2000\n    0.0000    0.0000    0.0000 C   0  0\n";
        assert!(matches!(
            parse_molblock_graph(truncated),
            Err(MolBlockError::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn test_non_ascii_atom_line_is_rejected() {
        let block = "x\n  y\n\n  1  0  0  0  0  0  0  0  0  0999 V2000\n    0.000\u{e9}   0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0\nM  END\n";
        assert!(matches!(
            parse_molblock_graph(block),
            Err(MolBlockError::Parse { line: 5, .. })
        ));
        let symbol = "x\n  y\n\n  1  0  0  0  0  0  0  0  0  0999 V2000\n    0.0000    0.0000    0.0000 \u{e9}\u{e9}  0  0\nM  END\n";
        assert!(matches!(
            parse_molblock_graph(symbol),
            Err(MolBlockError::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn test_huge_counts_are_rejected() {
        let block = "x\n  y\n\n1 18446744073709551615\nM  END\n";
        assert!(matches!(
            parse_molblock_graph(block),
            Err(MolBlockError::Parse { line: 4, .. })
        ));
        let block = "x\n  y\n\n18446744073709551615 1\nM  END\n";
        assert!(parse_molblock_graph(block).is_err());
    }

    #[test]
    fn test_unknown_element_is_rejected() {
        let block = "x
  y

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 Xx  0  0  0  0  0  0  0  0  0  0  0  0
M  END
";
        assert!(parse_molblock(block).is_err());
    }
}
