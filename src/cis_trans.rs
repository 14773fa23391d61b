//! Cis/trans configuration overlay for double bonds.
//!
//! Each entry names four substituent vertices around one edge: slots 0 and
//! 1 hang off the begin endpoint, slots 2 and 3 off the end endpoint. Slots
//! 0 and 2 are the reference substituents and are always present; 1 and 3
//! may be `None` for an implicit hydrogen. The parity relates the two
//! references: `Cis` puts them on the same side.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{EdgeId, VertexId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CisTrans {
    Cis,
    Trans,
}

impl CisTrans {
    pub fn flipped(self) -> Self {
        match self {
            CisTrans::Cis => CisTrans::Trans,
            CisTrans::Trans => CisTrans::Cis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CisTransBond {
    pub parity: CisTrans,
    pub substituents: [Option<VertexId>; 4],
}

impl CisTransBond {
    /// Slot index (0..4) holding `v`, if any.
    pub fn slot_of(&self, v: VertexId) -> Option<usize> {
        self.substituents.iter().position(|&s| s == Some(v))
    }

    /// Drops `gone` from the substituent frame. A lost partner slot just
    /// empties; a lost reference is replaced by its partner with the parity
    /// flipped. Returns false when the entry can no longer be described.
    pub(crate) fn forget_vertex(&mut self, gone: VertexId) -> bool {
        for side in [0, 2] {
            if self.substituents[side] == Some(gone) {
                match self.substituents[side + 1].take() {
                    Some(partner) => {
                        self.substituents[side] = Some(partner);
                        self.parity = self.parity.flipped();
                    }
                    None => return false,
                }
            } else if self.substituents[side + 1] == Some(gone) {
                self.substituents[side + 1] = None;
            }
        }
        true
    }
}

/// All cis/trans entries of one molecule, keyed by edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CisTransBonds {
    entries: BTreeMap<EdgeId, CisTransBond>,
}

impl CisTransBonds {
    pub(crate) fn insert(&mut self, e: EdgeId, entry: CisTransBond) {
        self.entries.insert(e, entry);
    }

    pub fn get(&self, e: EdgeId) -> Option<&CisTransBond> {
        self.entries.get(&e)
    }

    pub fn contains(&self, e: EdgeId) -> bool {
        self.entries.contains_key(&e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, &CisTransBond)> {
        self.entries.iter().map(|(&e, c)| (e, c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn remove(&mut self, e: EdgeId) -> Option<CisTransBond> {
        self.entries.remove(&e)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Cascade hook for removals: entries on removed edges go away, lost
    /// substituents degrade per [`CisTransBond::forget_vertex`].
    pub(crate) fn purge_removed(
        &mut self,
        removed_vertices: &BTreeSet<VertexId>,
        removed_edges: &BTreeSet<EdgeId>,
    ) {
        self.entries.retain(|e, entry| {
            if removed_edges.contains(e) {
                return false;
            }
            for &gone in removed_vertices {
                if entry.slot_of(gone).is_some() && !entry.forget_vertex(gone) {
                    return false;
                }
            }
            true
        });
    }

    /// Degrades one entry after it lost the substituent `gone`, dropping
    /// the entry when it can no longer be described.
    pub(crate) fn forget_substituent(&mut self, e: EdgeId, gone: VertexId) {
        let dead = match self.entries.get_mut(&e) {
            Some(entry) => entry.slot_of(gone).is_some() && !entry.forget_vertex(gone),
            None => false,
        };
        if dead {
            self.entries.remove(&e);
        }
    }

    /// Replaces `old` with `new` on one side of an entry (`side` is 0 for
    /// the begin endpoint, 2 for the end endpoint). The substituent kept
    /// its bond, so the geometry and the parity are unchanged. The other
    /// side is left alone even when it also references `old`.
    pub(crate) fn repoint_substituent(
        &mut self,
        e: EdgeId,
        side: usize,
        old: VertexId,
        new: VertexId,
    ) {
        if let Some(entry) = self.entries.get_mut(&e) {
            for slot in &mut entry.substituents[side..side + 2] {
                if *slot == Some(old) {
                    *slot = Some(new);
                }
            }
        }
    }

    /// Carries entries from `src` into `self` under vertex and edge
    /// mappings (both indexed by source handle). Unmapped partners empty
    /// their slot; an unmapped reference is replaced by its mapped partner
    /// with a parity flip, or fails the entry.
    pub(crate) fn translate_from(
        &mut self,
        src: &CisTransBonds,
        vertex_mapping: &[Option<VertexId>],
        edge_mapping: &[Option<EdgeId>],
    ) {
        let map = |u: VertexId| vertex_mapping.get(u.index()).copied().flatten();
        'entries: for (e, entry) in src.iter() {
            let Some(ne) = edge_mapping.get(e.index()).copied().flatten() else {
                continue;
            };
            let mut out = CisTransBond {
                parity: entry.parity,
                substituents: [None; 4],
            };
            for side in [0, 2] {
                let reference = entry.substituents[side].and_then(map);
                let partner = entry.substituents[side + 1].and_then(map);
                match (reference, partner) {
                    (Some(r), p) => {
                        out.substituents[side] = Some(r);
                        out.substituents[side + 1] = p;
                    }
                    (None, Some(p)) => {
                        out.substituents[side] = Some(p);
                        out.parity = out.parity.flipped();
                    }
                    (None, None) => continue 'entries,
                }
            }
            self.entries.insert(ne, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VertexId {
        VertexId::new(i)
    }

    fn e(i: usize) -> EdgeId {
        EdgeId::new(i)
    }

    fn frame(a: usize, b: usize, c: usize, d: usize) -> [Option<VertexId>; 4] {
        [Some(v(a)), Some(v(b)), Some(v(c)), Some(v(d))]
    }

    #[test]
    fn forget_partner_empties_slot() {
        let mut entry = CisTransBond {
            parity: CisTrans::Cis,
            substituents: frame(1, 2, 3, 4),
        };
        assert!(entry.forget_vertex(v(2)));
        assert_eq!(entry.parity, CisTrans::Cis);
        assert_eq!(entry.substituents, [Some(v(1)), None, Some(v(3)), Some(v(4))]);
    }

    #[test]
    fn forget_reference_promotes_partner_and_flips() {
        let mut entry = CisTransBond {
            parity: CisTrans::Cis,
            substituents: frame(1, 2, 3, 4),
        };
        assert!(entry.forget_vertex(v(1)));
        assert_eq!(entry.parity, CisTrans::Trans);
        assert_eq!(entry.substituents, [Some(v(2)), None, Some(v(3)), Some(v(4))]);
    }

    #[test]
    fn forget_reference_without_partner_fails() {
        let mut entry = CisTransBond {
            parity: CisTrans::Trans,
            substituents: [Some(v(1)), None, Some(v(3)), Some(v(4))],
        };
        assert!(!entry.forget_vertex(v(1)));
    }

    #[test]
    fn repoint_touches_one_side_only() {
        let mut ct = CisTransBonds::default();
        // v(1) appears on both sides; only the begin side is re-homed
        ct.insert(
            e(0),
            CisTransBond {
                parity: CisTrans::Cis,
                substituents: [Some(v(1)), Some(v(2)), Some(v(3)), Some(v(1))],
            },
        );
        ct.repoint_substituent(e(0), 0, v(1), v(9));
        let entry = ct.get(e(0)).unwrap();
        assert_eq!(entry.parity, CisTrans::Cis);
        assert_eq!(entry.substituents, [Some(v(9)), Some(v(2)), Some(v(3)), Some(v(1))]);
    }

    #[test]
    fn purge_drops_entries_on_removed_edges() {
        let mut ct = CisTransBonds::default();
        ct.insert(
            e(0),
            CisTransBond {
                parity: CisTrans::Cis,
                substituents: frame(1, 2, 3, 4),
            },
        );
        ct.insert(
            e(1),
            CisTransBond {
                parity: CisTrans::Cis,
                substituents: frame(5, 6, 7, 8),
            },
        );
        ct.purge_removed(&BTreeSet::new(), &BTreeSet::from([e(0)]));
        assert!(!ct.contains(e(0)));
        assert!(ct.contains(e(1)));
    }

    #[test]
    fn purge_degrades_by_lost_substituent() {
        let mut ct = CisTransBonds::default();
        ct.insert(
            e(0),
            CisTransBond {
                parity: CisTrans::Cis,
                substituents: frame(1, 2, 3, 4),
            },
        );
        ct.purge_removed(&BTreeSet::from([v(3)]), &BTreeSet::new());
        let entry = ct.get(e(0)).unwrap();
        assert_eq!(entry.parity, CisTrans::Trans);
        assert_eq!(entry.substituents, [Some(v(1)), Some(v(2)), Some(v(4)), None]);
    }

    #[test]
    fn translate_keeps_parity_under_full_mapping() {
        let mut src = CisTransBonds::default();
        src.insert(
            e(2),
            CisTransBond {
                parity: CisTrans::Trans,
                substituents: frame(0, 1, 2, 3),
            },
        );
        let vmap: Vec<Option<VertexId>> = (0..4).map(|i| Some(v(10 + i))).collect();
        let mut emap = vec![None; 3];
        emap[2] = Some(e(7));
        let mut dst = CisTransBonds::default();
        dst.translate_from(&src, &vmap, &emap);
        let entry = dst.get(e(7)).unwrap();
        assert_eq!(entry.parity, CisTrans::Trans);
        assert_eq!(entry.substituents, frame(10, 11, 12, 13));
    }

    #[test]
    fn translate_promotes_when_reference_unmapped() {
        let mut src = CisTransBonds::default();
        src.insert(
            e(0),
            CisTransBond {
                parity: CisTrans::Cis,
                substituents: frame(0, 1, 2, 3),
            },
        );
        let mut vmap: Vec<Option<VertexId>> = (0..4).map(|i| Some(v(10 + i))).collect();
        vmap[0] = None;
        let emap = vec![Some(e(5))];
        let mut dst = CisTransBonds::default();
        dst.translate_from(&src, &vmap, &emap);
        let entry = dst.get(e(5)).unwrap();
        assert_eq!(entry.parity, CisTrans::Trans);
        assert_eq!(entry.substituents, [Some(v(11)), None, Some(v(12)), Some(v(13))]);
    }
}
