use std::fmt::{Display, Formatter, Result as FmtResult};

/// Chemical elements understood by the parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    H,
    Li,
    B,
    C,
    N,
    O,
    F,
    Na,
    Mg,
    Al,
    Si,
    P,
    S,
    Cl,
    K,
    Ca,
    As,
    Se,
    Br,
    I,
}

struct ElementData {
    symbol: &'static str,
    atomic_number: u8,
    average_mass: f64,
    monoisotopic_mass: f64,
    valences: &'static [u8],
    outer_electrons: u8,
    bond_radius: f64,
}

// Indexed by the enum discriminant, keep in declaration order.
const ELEMENTS: [ElementData; 20] = [
    ElementData { symbol: "H", atomic_number: 1, average_mass: 1.008, monoisotopic_mass: 1.00782503223, valences: &[1], outer_electrons: 1, bond_radius: 0.33 },
    ElementData { symbol: "Li", atomic_number: 3, average_mass: 6.94, monoisotopic_mass: 7.0160034366, valences: &[1], outer_electrons: 1, bond_radius: 1.23 },
    ElementData { symbol: "B", atomic_number: 5, average_mass: 10.812, monoisotopic_mass: 11.00930536, valences: &[3], outer_electrons: 3, bond_radius: 0.88 },
    ElementData { symbol: "C", atomic_number: 6, average_mass: 12.011, monoisotopic_mass: 12.0, valences: &[4], outer_electrons: 4, bond_radius: 0.77 },
    ElementData { symbol: "N", atomic_number: 7, average_mass: 14.007, monoisotopic_mass: 14.00307400443, valences: &[3], outer_electrons: 5, bond_radius: 0.7 },
    ElementData { symbol: "O", atomic_number: 8, average_mass: 15.999, monoisotopic_mass: 15.99491461957, valences: &[2], outer_electrons: 6, bond_radius: 0.66 },
    ElementData { symbol: "F", atomic_number: 9, average_mass: 18.998, monoisotopic_mass: 18.99840316273, valences: &[1], outer_electrons: 7, bond_radius: 0.611 },
    ElementData { symbol: "Na", atomic_number: 11, average_mass: 22.99, monoisotopic_mass: 22.989769282, valences: &[1], outer_electrons: 1, bond_radius: 1.54 },
    ElementData { symbol: "Mg", atomic_number: 12, average_mass: 24.305, monoisotopic_mass: 23.985041697, valences: &[2], outer_electrons: 2, bond_radius: 1.36 },
    ElementData { symbol: "Al", atomic_number: 13, average_mass: 26.982, monoisotopic_mass: 26.98153853, valences: &[3], outer_electrons: 3, bond_radius: 1.18 },
    ElementData { symbol: "Si", atomic_number: 14, average_mass: 28.086, monoisotopic_mass: 27.97692653465, valences: &[4], outer_electrons: 4, bond_radius: 1.17 },
    ElementData { symbol: "P", atomic_number: 15, average_mass: 30.974, monoisotopic_mass: 30.97376199842, valences: &[3, 5], outer_electrons: 5, bond_radius: 1.1 },
    ElementData { symbol: "S", atomic_number: 16, average_mass: 32.067, monoisotopic_mass: 31.9720711744, valences: &[2, 4, 6], outer_electrons: 6, bond_radius: 1.04 },
    ElementData { symbol: "Cl", atomic_number: 17, average_mass: 35.453, monoisotopic_mass: 34.968852682, valences: &[1], outer_electrons: 7, bond_radius: 0.997 },
    ElementData { symbol: "K", atomic_number: 19, average_mass: 39.098, monoisotopic_mass: 38.9637064864, valences: &[1], outer_electrons: 1, bond_radius: 2.03 },
    ElementData { symbol: "Ca", atomic_number: 20, average_mass: 40.078, monoisotopic_mass: 39.962590863, valences: &[2], outer_electrons: 2, bond_radius: 1.74 },
    ElementData { symbol: "As", atomic_number: 33, average_mass: 74.922, monoisotopic_mass: 74.92159457, valences: &[3, 5], outer_electrons: 5, bond_radius: 1.21 },
    ElementData { symbol: "Se", atomic_number: 34, average_mass: 78.971, monoisotopic_mass: 79.9165218, valences: &[2, 4, 6], outer_electrons: 6, bond_radius: 1.17 },
    ElementData { symbol: "Br", atomic_number: 35, average_mass: 79.904, monoisotopic_mass: 78.9183376, valences: &[1], outer_electrons: 7, bond_radius: 1.141 },
    ElementData { symbol: "I", atomic_number: 53, average_mass: 126.904, monoisotopic_mass: 126.9044719, valences: &[1], outer_electrons: 7, bond_radius: 1.333 },
];

const ALL: [Element; 20] = [
    Element::H,
    Element::Li,
    Element::B,
    Element::C,
    Element::N,
    Element::O,
    Element::F,
    Element::Na,
    Element::Mg,
    Element::Al,
    Element::Si,
    Element::P,
    Element::S,
    Element::Cl,
    Element::K,
    Element::Ca,
    Element::As,
    Element::Se,
    Element::Br,
    Element::I,
];

impl Element {
    fn data(&self) -> &'static ElementData {
        &ELEMENTS[*self as usize]
    }

    /// Look up an element by its capitalized symbol, e.g. `"Cl"`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        ALL.iter().copied().find(|e| e.symbol() == symbol)
    }

    /// Look up an element written in aromatic (lowercase) SMILES form.
    pub fn from_aromatic_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "b" => Some(Element::B),
            "c" => Some(Element::C),
            "n" => Some(Element::N),
            "o" => Some(Element::O),
            "p" => Some(Element::P),
            "s" => Some(Element::S),
            "se" => Some(Element::Se),
            "as" => Some(Element::As),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.data().symbol
    }

    pub fn atomic_number(&self) -> u8 {
        self.data().atomic_number
    }

    /// Standard atomic weight.
    pub fn average_mass(&self) -> f64 {
        self.data().average_mass
    }

    /// Mass of the most abundant isotope.
    pub fn monoisotopic_mass(&self) -> f64 {
        self.data().monoisotopic_mass
    }

    /// Allowed neutral valences, smallest first.
    pub fn default_valences(&self) -> &'static [u8] {
        self.data().valences
    }

    pub fn outer_electrons(&self) -> u8 {
        self.data().outer_electrons
    }

    /// Single-bond radius in Å, used for surface-area estimates.
    pub fn bond_radius(&self) -> f64 {
        self.data().bond_radius
    }

    /// Valences allowed for this element carrying `charge`, smallest first.
    ///
    /// Charges shift the valence isoelectronically: N+ behaves like C, O- like F,
    /// B- like C; carbon loses one valence for either sign.
    pub fn valences_with_charge(&self, charge: i8) -> Vec<u8> {
        let shift: i32 = match self.outer_electrons() {
            4 => -(charge as i32).abs(),
            5..=7 => charge as i32,
            _ => -(charge as i32),
        };
        self.default_valences()
            .iter()
            .map(|&v| v as i32 + shift)
            .filter(|&v| v >= 0)
            .map(|v| v as u8)
            .collect()
    }

    pub fn is_carbon(&self) -> bool {
        *self == Element::C
    }

    pub fn is_hydrogen(&self) -> bool {
        *self == Element::H
    }

    pub fn is_halogen(&self) -> bool {
        matches!(self, Element::F | Element::Cl | Element::Br | Element::I)
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.symbol())
    }
}
