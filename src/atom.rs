use crate::element::Element;

/// What a graph vertex stands for.
///
/// Most vertices are real elements. Pseudoatoms carry an arbitrary textual
/// label (abbreviations like `"CoA"`, polymer stars, template residues);
/// two pseudoatoms compare equal when their labels do. R-sites are numbered
/// attachment placeholders from query structures; for matching purposes any
/// R-site is interchangeable with any other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtomKind {
    Element(Element),
    Pseudo(String),
    RSite(u32),
}

/// Radical state of an atom. `None` is the common closed-shell case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Radical {
    #[default]
    None,
    Singlet,
    Doublet,
    Triplet,
}

/// Vertex payload of a molecular graph.
///
/// `Atom` stores the intrinsic per-atom fields that structural edits carry
/// around and the matcher compares. Hydrogens are ordinary vertices here —
/// there is no implicit-hydrogen counter; the stereocenter pyramid's empty
/// slot covers the one place an implicit position matters.
///
/// # Examples
///
/// ```
/// use molgraph::{Atom, Element};
///
/// let carbon = Atom::element(Element::C);
/// assert_eq!(carbon.atomic_num(), Some(6));
/// assert_eq!(carbon.charge, 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element, pseudoatom label, or R-site number.
    pub kind: AtomKind,
    /// Formal charge in elementary charge units.
    pub charge: i8,
    /// Mass number. `0` means natural isotopic abundance (the common case).
    pub isotope: u16,
    /// Explicitly assigned valence, if any. `None` leaves valence to
    /// perception layers outside this crate.
    pub valence: Option<u8>,
    /// Radical state.
    pub radical: Radical,
    /// Cartesian coordinates, populated by format readers and layout code.
    /// The engine itself never interprets them.
    pub xyz: [f64; 3],
}

impl Atom {
    pub fn element(el: Element) -> Self {
        Atom {
            kind: AtomKind::Element(el),
            charge: 0,
            isotope: 0,
            valence: None,
            radical: Radical::None,
            xyz: [0.0; 3],
        }
    }

    pub fn pseudo(label: impl Into<String>) -> Self {
        Atom {
            kind: AtomKind::Pseudo(label.into()),
            ..Atom::element(Element::C)
        }
    }

    pub fn rsite(index: u32) -> Self {
        Atom {
            kind: AtomKind::RSite(index),
            ..Atom::element(Element::C)
        }
    }

    /// Atomic number for element atoms, `None` for pseudoatoms and R-sites.
    pub fn atomic_num(&self) -> Option<u8> {
        match &self.kind {
            AtomKind::Element(el) => Some(el.atomic_num()),
            AtomKind::Pseudo(_) | AtomKind::RSite(_) => None,
        }
    }

    pub fn is_element(&self, el: Element) -> bool {
        self.kind == AtomKind::Element(el)
    }

    pub fn is_hydrogen(&self) -> bool {
        self.is_element(Element::H)
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(self.kind, AtomKind::Pseudo(_))
    }

    pub fn is_rsite(&self) -> bool {
        matches!(self.kind, AtomKind::RSite(_))
    }
}

impl Default for Atom {
    fn default() -> Self {
        Atom::element(Element::C)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let c = Atom::element(Element::C);
        assert_eq!(c.atomic_num(), Some(6));
        assert!(!c.is_hydrogen());

        let h = Atom::element(Element::H);
        assert!(h.is_hydrogen());

        let star = Atom::pseudo("Pol");
        assert_eq!(star.atomic_num(), None);
        assert!(star.is_pseudo());

        let r = Atom::rsite(2);
        assert!(r.is_rsite());
        assert_eq!(r.atomic_num(), None);
    }

    #[test]
    fn pseudo_compare_by_label() {
        assert_eq!(Atom::pseudo("CoA").kind, Atom::pseudo("CoA").kind);
        assert_ne!(Atom::pseudo("CoA").kind, Atom::pseudo("NAD").kind);
    }
}
