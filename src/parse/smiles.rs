use std::collections::BTreeMap;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{all_consuming, map_res, opt, recognize},
    error::{VerboseError, VerboseErrorKind},
    multi::many0_count,
    sequence::{pair, preceded},
    IResult,
};
use petgraph::graph::NodeIndex;
use thiserror::Error;

use super::{finish, ParseError, ParseOptions};
use crate::{Atom, Bond, Element, Molecule, MoleculeGraph};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    Empty,
    #[error("Branch start '(' at position {0} without a current atom")]
    BranchNoCurrentAtom(usize),
    #[error("Branch end ')' at position {0} without a matching '('")]
    BranchEndNoStart(usize),
    #[error("{0} branch(es) left open")]
    UnclosedBranch(usize),
    #[error("Ring closure digit '{0}' at position {1} without a current atom")]
    RingClosureNoCurrentAtom(char, usize),
    #[error("ring bond {0} was never closed")]
    UnclosedRing(u16),
    #[error("ring bond {0} closes onto an atom it is already bonded to")]
    InvalidRingBond(u16),
    #[error("ring bond {0} has conflicting bond symbols")]
    ConflictingRingBond(u16),
    #[error("Unclosed bracket '[' at position {0}")]
    UnclosedBracket(usize),
    #[error("invalid bracket atom '[{0}]'")]
    InvalidBracketAtom(String),
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),
    #[error("bond symbol at position {0} is not followed by an atom")]
    DanglingBond(usize),
    #[error("bond symbol at position {0} follows another bond symbol")]
    RepeatedBond(usize),
}

/// Parse a SMILES string into a sanitized molecule with default options.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, ParseError> {
    parse_smiles_with(smiles, ParseOptions::default())
}

pub fn parse_smiles_with(smiles: &str, options: ParseOptions) -> Result<Molecule, ParseError> {
    let graph = parse_smiles_graph(smiles)?;
    finish(graph, options)
}

/// Contents of a bracket atom such as `[13CH3+]`.
#[derive(Debug, Clone, PartialEq)]
struct BracketAtom {
    isotope: Option<u16>,
    element: Element,
    aromatic: bool,
    hydrogens: u8,
    charge: i8,
}

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn aromatic_pair(input: &str) -> Res<&str> {
    alt((tag("se"), tag("as")))(input)
}

fn symbol_text(input: &str) -> Res<&str> {
    alt((
        recognize(pair(
            satisfy(|c: char| c.is_ascii_uppercase()),
            opt(satisfy(|c: char| c.is_ascii_lowercase())),
        )),
        recognize(one_of("bcnops")),
    ))(input)
}

fn bracket_symbol(input: &str) -> Res<(Element, bool)> {
    // Two-letter aromatic symbols first so "se" is not read as "s" + "e".
    if let Ok((rest, symbol)) = aromatic_pair(input) {
        if let Some(element) = Element::from_aromatic_symbol(symbol) {
            return Ok((rest, (element, true)));
        }
    }
    let (rest, symbol) = symbol_text(input)?;
    if let Some(element) = Element::from_aromatic_symbol(symbol) {
        return Ok((rest, (element, true)));
    }
    if let Some(element) = Element::from_symbol(symbol) {
        return Ok((rest, (element, false)));
    }
    // An unknown two-letter symbol may still start with a known element.
    match Element::from_symbol(&symbol[..1]) {
        Some(element) if symbol.len() == 2 => Ok((&input[1..], (element, false))),
        _ => Err(nom::Err::Error(VerboseError {
            errors: vec![(input, VerboseErrorKind::Context("element symbol"))],
        })),
    }
}

fn chirality(input: &str) -> Res<()> {
    let (input, _) = opt(alt((tag("@@"), tag("@"))))(input)?;
    Ok((input, ()))
}

fn hydrogen_count(input: &str) -> Res<u8> {
    let (input, count) = opt(preceded(char('H'), opt(map_res(digit1, str::parse::<u8>))))(input)?;
    Ok((input, count.map(|n| n.unwrap_or(1)).unwrap_or(0)))
}

fn charge(input: &str) -> Res<i8> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let Some(sign) = sign else {
        return Ok((input, 0));
    };
    let unit = if sign == '+' { 1 } else { -1 };
    let (input, magnitude) = opt(map_res(digit1, str::parse::<i8>))(input)?;
    if let Some(magnitude) = magnitude {
        return Ok((input, unit * magnitude));
    }
    let (input, repeats) = many0_count(char(sign))(input)?;
    Ok((input, unit * (1 + repeats as i8)))
}

fn atom_class(input: &str) -> Res<()> {
    let (input, _) = opt(preceded(char(':'), digit1))(input)?;
    Ok((input, ()))
}

fn bracket_atom(input: &str) -> Res<BracketAtom> {
    let (input, isotope) = opt(map_res(digit1, str::parse::<u16>))(input)?;
    let (input, (element, aromatic)) = bracket_symbol(input)?;
    let (input, _) = chirality(input)?;
    let (input, hydrogens) = hydrogen_count(input)?;
    let (input, charge) = charge(input)?;
    let (input, _) = atom_class(input)?;
    Ok((
        input,
        BracketAtom {
            isotope,
            element,
            aromatic,
            hydrogens,
            charge,
        },
    ))
}

fn organic_atom(chars: &[char], i: usize) -> Option<(Atom, usize)> {
    let c = chars[i];
    let next = chars.get(i + 1).copied();
    match (c, next) {
        ('C', Some('l')) => return Some((Atom::new(Element::Cl), 2)),
        ('B', Some('r')) => return Some((Atom::new(Element::Br), 2)),
        _ => {}
    }
    let atom = match c {
        'B' => Atom::new(Element::B),
        'C' => Atom::new(Element::C),
        'N' => Atom::new(Element::N),
        'O' => Atom::new(Element::O),
        'P' => Atom::new(Element::P),
        'S' => Atom::new(Element::S),
        'F' => Atom::new(Element::F),
        'I' => Atom::new(Element::I),
        'b' => Atom::aromatic(Element::B),
        'c' => Atom::aromatic(Element::C),
        'n' => Atom::aromatic(Element::N),
        'o' => Atom::aromatic(Element::O),
        'p' => Atom::aromatic(Element::P),
        's' => Atom::aromatic(Element::S),
        _ => return None,
    };
    Some((atom, 1))
}

/// Tokenize a SMILES string into an unsanitized graph.
pub fn parse_smiles_graph(smiles: &str) -> Result<MoleculeGraph, SmilesError> {
    if smiles.trim().is_empty() {
        return Err(SmilesError::Empty);
    }
    let mut graph = MoleculeGraph::new_undirected();
    let mut current_atom: Option<NodeIndex> = None;
    let mut bond_type: Option<(Bond, usize)> = None;
    let mut branch_stack: Vec<NodeIndex> = Vec::new();
    let mut ring_map: BTreeMap<u16, (NodeIndex, Option<Bond>)> = BTreeMap::new();

    let chars: Vec<char> = smiles.trim().chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '(' => {
                let atom = current_atom.ok_or(SmilesError::BranchNoCurrentAtom(i))?;
                branch_stack.push(atom);
                i += 1;
            }
            ')' => {
                if let Some((_, at)) = bond_type {
                    return Err(SmilesError::DanglingBond(at));
                }
                current_atom = Some(branch_stack.pop().ok_or(SmilesError::BranchEndNoStart(i))?);
                i += 1;
            }
            '-' | '=' | '#' | ':' => {
                if bond_type.is_some() {
                    return Err(SmilesError::RepeatedBond(i));
                }
                let bond = match c {
                    '-' => Bond::Single,
                    '=' => Bond::Double,
                    '#' => Bond::Triple,
                    _ => Bond::Aromatic,
                };
                bond_type = Some((bond, i));
                i += 1;
            }
            '%' | '0'..='9' => {
                let (ring_number, width) = if c == '%' {
                    let digits: String = chars.iter().skip(i + 1).take(2).collect();
                    if digits.len() != 2 || !digits.chars().all(|d| d.is_ascii_digit()) {
                        return Err(SmilesError::UnexpectedCharacter('%', i));
                    }
                    (digits.parse::<u16>().map_err(|_| SmilesError::UnexpectedCharacter('%', i))?, 3)
                } else {
                    (c.to_digit(10).unwrap_or_default() as u16, 1)
                };
                let current = current_atom.ok_or(SmilesError::RingClosureNoCurrentAtom(c, i))?;
                let explicit = bond_type.take().map(|(bond, _)| bond);

                if let Some((start_atom, opening_bond)) = ring_map.remove(&ring_number) {
                    if start_atom == current || graph.find_edge(start_atom, current).is_some() {
                        return Err(SmilesError::InvalidRingBond(ring_number));
                    }
                    let bond = match (opening_bond, explicit) {
                        (Some(a), Some(b)) if a != b => {
                            return Err(SmilesError::ConflictingRingBond(ring_number))
                        }
                        (Some(bond), _) | (None, Some(bond)) => bond,
                        (None, None) => implicit_bond(&graph, start_atom, current),
                    };
                    graph.add_edge(start_atom, current, bond);
                } else {
                    ring_map.insert(ring_number, (current, explicit));
                }
                i += width;
            }
            '[' => {
                let end = chars[i..]
                    .iter()
                    .position(|&x| x == ']')
                    .map(|offset| i + offset)
                    .ok_or(SmilesError::UnclosedBracket(i))?;
                let content: String = chars[i + 1..end].iter().collect();
                let (_, parsed) = all_consuming(bracket_atom)(&content)
                    .map_err(|_| SmilesError::InvalidBracketAtom(content.clone()))?;

                let atom = Atom {
                    element: parsed.element,
                    aromatic: parsed.aromatic,
                    charge: parsed.charge,
                    isotope: parsed.isotope,
                    hydrogens: parsed.hydrogens,
                    no_implicit: true,
                    radicals: 0,
                };
                current_atom = Some(add_atom(&mut graph, current_atom, bond_type.take(), atom));
                i = end + 1;
            }
            '@' | '/' | '\\' => {
                // Stereochemistry does not affect any computed value.
                i += 1;
            }
            '.' => {
                if let Some((_, at)) = bond_type {
                    return Err(SmilesError::DanglingBond(at));
                }
                current_atom = None;
                i += 1;
            }
            _ => {
                let (atom, width) = organic_atom(&chars, i).ok_or(SmilesError::UnexpectedCharacter(c, i))?;
                current_atom = Some(add_atom(&mut graph, current_atom, bond_type.take(), atom));
                i += width;
            }
        }
    }

    if let Some((_, at)) = bond_type {
        return Err(SmilesError::DanglingBond(at));
    }
    if !branch_stack.is_empty() {
        return Err(SmilesError::UnclosedBranch(branch_stack.len()));
    }
    if let Some((&ring_number, _)) = ring_map.iter().next() {
        return Err(SmilesError::UnclosedRing(ring_number));
    }
    Ok(graph)
}

fn implicit_bond(graph: &MoleculeGraph, a: NodeIndex, b: NodeIndex) -> Bond {
    if graph[a].aromatic && graph[b].aromatic {
        Bond::Aromatic
    } else {
        Bond::Single
    }
}

fn add_atom(
    graph: &mut MoleculeGraph,
    previous: Option<NodeIndex>,
    bond: Option<(Bond, usize)>,
    atom: Atom,
) -> NodeIndex {
    let new_atom = graph.add_node(atom);
    if let Some(prev_atom) = previous {
        let bond = match bond {
            Some((bond, _)) => bond,
            None => implicit_bond(graph, prev_atom, new_atom),
        };
        graph.add_edge(prev_atom, new_atom, bond);
    }
    new_atom
}
