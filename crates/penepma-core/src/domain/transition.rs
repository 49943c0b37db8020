//! Atomic subshells and characteristic x-ray transitions.
//!
//! A transition is written to PENEPMA input files as the packed integer
//! `Z*1e6 + dest*1e4 + src*1e2` and read back from output tables through the
//! IUPAC subshell labels (`K`, `L3`, `M5`, ...).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const MAX_ATOMIC_NUMBER: u8 = 99;

const ELEMENT_SYMBOLS: [&str; MAX_ATOMIC_NUMBER as usize] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es",
];

pub fn element_symbol(z: u8) -> Option<&'static str> {
    if z == 0 || z > MAX_ATOMIC_NUMBER {
        return None;
    }
    Some(ELEMENT_SYMBOLS[usize::from(z) - 1])
}

pub fn atomic_number_for_symbol(symbol: &str) -> Option<u8> {
    let normalized = symbol.trim();
    if normalized.is_empty() {
        return None;
    }

    ELEMENT_SYMBOLS
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(normalized))
        .and_then(|index| u8::try_from(index + 1).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subshell {
    K,
    L1,
    L2,
    L3,
    M1,
    M2,
    M3,
    M4,
    M5,
    N1,
    N2,
    N3,
    N4,
    N5,
    N6,
    N7,
    O1,
    O2,
    O3,
    O4,
    O5,
    O6,
    O7,
    P1,
    P2,
    P3,
    P4,
    P5,
    Q1,
}

const SUBSHELLS: [Subshell; 29] = [
    Subshell::K,
    Subshell::L1,
    Subshell::L2,
    Subshell::L3,
    Subshell::M1,
    Subshell::M2,
    Subshell::M3,
    Subshell::M4,
    Subshell::M5,
    Subshell::N1,
    Subshell::N2,
    Subshell::N3,
    Subshell::N4,
    Subshell::N5,
    Subshell::N6,
    Subshell::N7,
    Subshell::O1,
    Subshell::O2,
    Subshell::O3,
    Subshell::O4,
    Subshell::O5,
    Subshell::O6,
    Subshell::O7,
    Subshell::P1,
    Subshell::P2,
    Subshell::P3,
    Subshell::P4,
    Subshell::P5,
    Subshell::Q1,
];

impl Subshell {
    /// PENELOPE subshell index, `K = 1` through `Q1 = 29`.
    pub fn index(self) -> u32 {
        SUBSHELLS
            .iter()
            .position(|candidate| *candidate == self)
            .map_or(0, |position| position as u32 + 1)
    }

    pub fn from_index(index: u32) -> Option<Self> {
        if index == 0 {
            return None;
        }
        SUBSHELLS.get(index as usize - 1).copied()
    }

    pub const fn iupac(self) -> &'static str {
        match self {
            Self::K => "K",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::M1 => "M1",
            Self::M2 => "M2",
            Self::M3 => "M3",
            Self::M4 => "M4",
            Self::M5 => "M5",
            Self::N1 => "N1",
            Self::N2 => "N2",
            Self::N3 => "N3",
            Self::N4 => "N4",
            Self::N5 => "N5",
            Self::N6 => "N6",
            Self::N7 => "N7",
            Self::O1 => "O1",
            Self::O2 => "O2",
            Self::O3 => "O3",
            Self::O4 => "O4",
            Self::O5 => "O5",
            Self::O6 => "O6",
            Self::O7 => "O7",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
            Self::P5 => "P5",
            Self::Q1 => "Q1",
        }
    }

    pub fn from_iupac(label: &str) -> Option<Self> {
        let normalized = label.trim();
        SUBSHELLS
            .iter()
            .copied()
            .find(|subshell| subshell.iupac().eq_ignore_ascii_case(normalized))
    }
}

impl Display for Subshell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).iupac())
    }
}

/// Electron moving from `src` into a vacancy of the inner `dest` subshell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub z: u8,
    pub dest: Subshell,
    pub src: Subshell,
}

impl Transition {
    /// Returns `None` for transitions PENELOPE does not tabulate.
    pub fn new(z: u8, src: Subshell, dest: Subshell) -> Option<Self> {
        if element_symbol(z).is_none() || src.index() <= dest.index() {
            return None;
        }
        Some(Self { z, dest, src })
    }

    pub fn from_iupac(z: u8, dest: &str, src: &str) -> Option<Self> {
        let dest = Subshell::from_iupac(dest)?;
        let src = Subshell::from_iupac(src)?;
        Self::new(z, src, dest)
    }

    pub fn code(self) -> u64 {
        u64::from(self.z) * 1_000_000
            + u64::from(self.dest.index()) * 10_000
            + u64::from(self.src.index()) * 100
    }

    pub fn from_code(code: u64) -> Option<Self> {
        if code % 100 != 0 {
            return None;
        }
        let z = u8::try_from(code / 1_000_000).ok()?;
        let dest = Subshell::from_index(((code / 10_000) % 100) as u32)?;
        let src = Subshell::from_index(((code / 100) % 100) as u32)?;
        Self::new(z, src, dest)
    }

    pub fn symbol(self) -> &'static str {
        element_symbol(self.z).unwrap_or("?")
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}-{}", self.symbol(), self.dest, self.src)
    }
}
