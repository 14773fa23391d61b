#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    /// Aromatic bonds are their own symbol for matching purposes; this
    /// crate never converts them to alternating Kekulé orders.
    Aromatic,
}

/// Drawing-direction marker on a bond, anchored at the bond's begin atom.
///
/// Markers feed stereo perception in layers outside this crate; inside it
/// they matter in two places: `flip_bond` resets the marker of a re-pointed
/// bond (the anchor that gave it meaning is gone), and
/// `flip_bond_with_direction` keeps whichever of two candidate bonds
/// carries the higher-priority marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondDirection {
    #[default]
    None,
    /// Squiggly "either" wedge.
    Either,
    UpOrUnspecified,
    DownOrUnspecified,
    Up,
    Down,
}

impl BondDirection {
    /// Priority used when two bonds compete to survive a re-pointing:
    /// none < either < up/down-or-unspecified < up = down.
    pub fn priority(self) -> u8 {
        match self {
            BondDirection::None => 0,
            BondDirection::Either => 1,
            BondDirection::UpOrUnspecified | BondDirection::DownOrUnspecified => 2,
            BondDirection::Up | BondDirection::Down => 3,
        }
    }
}

/// Edge payload of a molecular graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bond {
    pub order: BondOrder,
    pub direction: BondDirection,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Bond {
            order,
            direction: BondDirection::None,
        }
    }

    pub fn single() -> Self {
        Bond::new(BondOrder::Single)
    }

    pub fn double() -> Self {
        Bond::new(BondOrder::Double)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_priorities_ordered() {
        use BondDirection::*;
        assert!(None.priority() < Either.priority());
        assert!(Either.priority() < UpOrUnspecified.priority());
        assert_eq!(UpOrUnspecified.priority(), DownOrUnspecified.priority());
        assert!(DownOrUnspecified.priority() < Up.priority());
        assert_eq!(Up.priority(), Down.priority());
    }

    #[test]
    fn defaults() {
        let b = Bond::default();
        assert_eq!(b.order, BondOrder::Single);
        assert_eq!(b.direction, BondDirection::None);
        assert_eq!(Bond::double().order, BondOrder::Double);
    }
}
