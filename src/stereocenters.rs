//! Tetrahedral stereocenter overlay.
//!
//! Configuration is encoded by pyramid slot order alone: two pyramids over
//! the same four neighbors describe the same center exactly when one is an
//! even permutation of the other. Slot 3 may be `None` for an implicit
//! hydrogen or lone pair; a `None` slot participates in parity like any
//! other entry.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::VertexId;

/// Enhanced stereo membership of one center.
///
/// `And`/`Or` carry a group number; centers in the same `And` group invert
/// together, centers in an `Or` group describe alternative configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoType {
    Abs,
    And(u16),
    Or(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stereocenter {
    pub kind: StereoType,
    pub pyramid: [Option<VertexId>; 4],
}

/// All tetrahedral centers of one molecule, keyed by center vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stereocenters {
    centers: BTreeMap<VertexId, Stereocenter>,
}

impl Stereocenters {
    pub(crate) fn insert(&mut self, v: VertexId, center: Stereocenter) {
        self.centers.insert(v, center);
    }

    pub fn get(&self, v: VertexId) -> Option<&Stereocenter> {
        self.centers.get(&v)
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.centers.contains_key(&v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &Stereocenter)> {
        self.centers.iter().map(|(&v, c)| (v, c))
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub(crate) fn remove(&mut self, v: VertexId) -> Option<Stereocenter> {
        self.centers.remove(&v)
    }

    pub(crate) fn clear(&mut self) {
        self.centers.clear();
    }

    /// Swaps two pyramid slots, producing the opposite configuration.
    pub(crate) fn invert_pyramid(&mut self, v: VertexId) -> bool {
        match self.centers.get_mut(&v) {
            Some(center) => {
                center.pyramid.swap(0, 1);
                true
            }
            None => false,
        }
    }

    /// Replaces `old` with `new` in the pyramid of `center`, keeping the
    /// slot position (and with it the parity). Used when a bond is
    /// re-pointed under a retained center.
    pub(crate) fn repoint_neighbor(&mut self, center: VertexId, old: VertexId, new: VertexId) -> bool {
        if let Some(c) = self.centers.get_mut(&center) {
            for slot in &mut c.pyramid {
                if *slot == Some(old) {
                    *slot = Some(new);
                    return true;
                }
            }
        }
        false
    }

    /// A neighbor of `center` is no longer bonded to it. The slot degrades
    /// to the implicit placeholder when the pyramid has none yet; otherwise
    /// the center can no longer be described and is dropped.
    pub(crate) fn forget_neighbor(&mut self, center: VertexId, gone: VertexId) {
        let Some(c) = self.centers.get_mut(&center) else {
            return;
        };
        if !c.pyramid.contains(&Some(gone)) {
            return;
        }
        if c.pyramid.iter().any(|slot| slot.is_none()) {
            self.centers.remove(&center);
            return;
        }
        for slot in &mut c.pyramid {
            if *slot == Some(gone) {
                *slot = None;
                break;
            }
        }
    }

    /// Cascade hook for vertex removal: centers on removed vertices go
    /// away, referencing pyramids degrade or go away per
    /// [`forget_neighbor`](Self::forget_neighbor).
    pub(crate) fn purge_removed(&mut self, removed: &BTreeSet<VertexId>) {
        self.centers.retain(|v, _| !removed.contains(v));
        let affected: Vec<(VertexId, Vec<VertexId>)> = self
            .centers
            .iter()
            .filter_map(|(&v, c)| {
                let gone: Vec<VertexId> = c
                    .pyramid
                    .iter()
                    .filter_map(|slot| slot.filter(|u| removed.contains(u)))
                    .collect();
                if gone.is_empty() {
                    None
                } else {
                    Some((v, gone))
                }
            })
            .collect();
        for (v, gone) in affected {
            if gone.len() > 1 {
                self.centers.remove(&v);
            } else {
                self.forget_neighbor(v, gone[0]);
            }
        }
    }

    /// Carries centers from `src` into `self` under a vertex mapping
    /// (indexed by source vertex). Centers whose vertex or any explicit
    /// pyramid neighbor is unmapped are left behind.
    pub(crate) fn translate_from(&mut self, src: &Stereocenters, mapping: &[Option<VertexId>]) {
        'centers: for (v, center) in src.iter() {
            let Some(nv) = mapping.get(v.index()).copied().flatten() else {
                continue;
            };
            let mut pyramid = [None; 4];
            for (slot, out) in center.pyramid.iter().zip(&mut pyramid) {
                match slot {
                    None => {}
                    Some(u) => match mapping.get(u.index()).copied().flatten() {
                        Some(nu) => *out = Some(nu),
                        None => continue 'centers,
                    },
                }
            }
            self.centers.insert(
                nv,
                Stereocenter {
                    kind: center.kind,
                    pyramid,
                },
            );
        }
    }
}

/// Whether `to` is an even permutation of `from`.
///
/// `None` when the two are not permutations of each other (different
/// entries, or repeated entries that cannot be matched one to one).
pub(crate) fn pyramid_parity<T: Eq + Copy>(from: &[T; 4], to: &[T; 4]) -> Option<bool> {
    let mut perm = [usize::MAX; 4];
    let mut used = [false; 4];
    for (i, f) in from.iter().enumerate() {
        let j = to
            .iter()
            .enumerate()
            .position(|(j, t)| !used[j] && t == f)?;
        used[j] = true;
        perm[i] = j;
    }
    let mut visited = [false; 4];
    let mut swaps = 0usize;
    for i in 0..4 {
        if visited[i] {
            continue;
        }
        let mut cycle_len = 0;
        let mut j = i;
        while !visited[j] {
            visited[j] = true;
            j = perm[j];
            cycle_len += 1;
        }
        swaps += cycle_len - 1;
    }
    Some(swaps % 2 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VertexId {
        VertexId::new(i)
    }

    fn center(pyramid: [Option<VertexId>; 4]) -> Stereocenter {
        Stereocenter {
            kind: StereoType::Abs,
            pyramid,
        }
    }

    #[test]
    fn parity_of_rotation_is_even() {
        let a = [v(0), v(1), v(2), v(3)];
        let rot = [v(1), v(2), v(0), v(3)];
        assert_eq!(pyramid_parity(&a, &a), Some(true));
        assert_eq!(pyramid_parity(&a, &rot), Some(true));
    }

    #[test]
    fn parity_of_swap_is_odd() {
        let a = [v(0), v(1), v(2), v(3)];
        let swapped = [v(1), v(0), v(2), v(3)];
        assert_eq!(pyramid_parity(&a, &swapped), Some(false));
    }

    #[test]
    fn parity_rejects_different_entries() {
        let a = [v(0), v(1), v(2), v(3)];
        let b = [v(0), v(1), v(2), v(9)];
        assert_eq!(pyramid_parity(&a, &b), None);
    }

    #[test]
    fn parity_with_none_slot() {
        let a = [Some(v(0)), Some(v(1)), Some(v(2)), None];
        let b = [Some(v(1)), Some(v(0)), Some(v(2)), None];
        assert_eq!(pyramid_parity(&a, &a), Some(true));
        assert_eq!(pyramid_parity(&a, &b), Some(false));
    }

    #[test]
    fn invert_flips_parity() {
        let mut sc = Stereocenters::default();
        let before = [Some(v(1)), Some(v(2)), Some(v(3)), Some(v(4))];
        sc.insert(v(0), center(before));
        assert!(sc.invert_pyramid(v(0)));
        let after = sc.get(v(0)).unwrap().pyramid;
        assert_eq!(pyramid_parity(&before, &after), Some(false));
        assert!(!sc.invert_pyramid(v(9)));
    }

    #[test]
    fn forget_neighbor_degrades_then_drops() {
        let mut sc = Stereocenters::default();
        sc.insert(v(0), center([Some(v(1)), Some(v(2)), Some(v(3)), Some(v(4))]));
        sc.forget_neighbor(v(0), v(4));
        assert_eq!(
            sc.get(v(0)).unwrap().pyramid,
            [Some(v(1)), Some(v(2)), Some(v(3)), None]
        );
        // second loss has no free slot left
        sc.forget_neighbor(v(0), v(3));
        assert!(sc.get(v(0)).is_none());
    }

    #[test]
    fn purge_removes_center_on_removed_vertex() {
        let mut sc = Stereocenters::default();
        sc.insert(v(0), center([Some(v(1)), Some(v(2)), Some(v(3)), None]));
        sc.insert(v(5), center([Some(v(6)), Some(v(7)), Some(v(8)), None]));
        let removed = BTreeSet::from([v(0)]);
        sc.purge_removed(&removed);
        assert!(!sc.contains(v(0)));
        assert!(sc.contains(v(5)));
    }

    #[test]
    fn purge_drops_center_losing_two_neighbors() {
        let mut sc = Stereocenters::default();
        sc.insert(v(0), center([Some(v(1)), Some(v(2)), Some(v(3)), Some(v(4))]));
        let removed = BTreeSet::from([v(1), v(2)]);
        sc.purge_removed(&removed);
        assert!(!sc.contains(v(0)));
    }

    #[test]
    fn translate_drops_incomplete() {
        let mut src = Stereocenters::default();
        src.insert(v(0), center([Some(v(1)), Some(v(2)), Some(v(3)), None]));
        src.insert(v(4), center([Some(v(5)), Some(v(6)), Some(v(7)), None]));
        // v(5) has no image: the second center cannot be carried over
        let mut mapping = vec![None; 8];
        for (i, slot) in mapping.iter_mut().enumerate() {
            if i != 5 {
                *slot = Some(v(10 + i));
            }
        }
        let mut dst = Stereocenters::default();
        dst.translate_from(&src, &mapping);
        assert_eq!(dst.len(), 1);
        assert_eq!(
            dst.get(v(10)).unwrap().pyramid,
            [Some(v(11)), Some(v(12)), Some(v(13)), None]
        );
    }
}
