//! S-group overlay: data labels, superatom abbreviations, repeating units
//! and multiple groups, arranged in a parent/child hierarchy.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::StructuralError;
use crate::graph::{EdgeId, Pool, VertexId};

/// Stable handle of an S-group within one molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SGroupId(u32);

impl SGroupId {
    pub fn new(index: usize) -> Self {
        SGroupId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-text payload attached to a set of atoms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataGroup {
    pub field_name: String,
    pub data: String,
}

/// One contraction attachment: the interior atom that carries an external
/// bond, and optionally the leaving atom it displaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperatomAttachmentPoint {
    pub atom: VertexId,
    pub leaving: Option<VertexId>,
    pub id: String,
}

/// Abbreviated fragment shown as a single label when contracted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Superatom {
    pub label: String,
    pub attachment_points: Vec<SuperatomAttachmentPoint>,
    /// Edges crossing the group boundary.
    pub bond_connections: Vec<EdgeId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Connectivity {
    #[default]
    Unknown,
    HeadToHead,
    HeadToTail,
}

/// Structural repeating unit with a subscript label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatingUnit {
    pub connectivity: Connectivity,
    pub subscript: String,
}

/// A fragment repeated `multiplier` times; `parent_atoms` lists the first
/// repetition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipleGroup {
    pub multiplier: u16,
    pub parent_atoms: Vec<VertexId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SGroupKind {
    Data(DataGroup),
    Superatom(Superatom),
    RepeatingUnit(RepeatingUnit),
    Multiple(MultipleGroup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SGroup {
    pub atoms: Vec<VertexId>,
    pub bonds: Vec<EdgeId>,
    pub parent: Option<SGroupId>,
    pub kind: SGroupKind,
}

impl SGroup {
    fn with_kind(kind: SGroupKind) -> Self {
        SGroup {
            atoms: Vec::new(),
            bonds: Vec::new(),
            parent: None,
            kind,
        }
    }

    pub fn data(field_name: impl Into<String>, data: impl Into<String>) -> Self {
        Self::with_kind(SGroupKind::Data(DataGroup {
            field_name: field_name.into(),
            data: data.into(),
        }))
    }

    pub fn superatom(label: impl Into<String>) -> Self {
        Self::with_kind(SGroupKind::Superatom(Superatom {
            label: label.into(),
            ..Superatom::default()
        }))
    }

    pub fn repeating_unit(connectivity: Connectivity, subscript: impl Into<String>) -> Self {
        Self::with_kind(SGroupKind::RepeatingUnit(RepeatingUnit {
            connectivity,
            subscript: subscript.into(),
        }))
    }

    pub fn multiple(multiplier: u16) -> Self {
        Self::with_kind(SGroupKind::Multiple(MultipleGroup {
            multiplier,
            parent_atoms: Vec::new(),
        }))
    }

    pub fn as_multiple(&self) -> Option<&MultipleGroup> {
        match &self.kind {
            SGroupKind::Multiple(mg) => Some(mg),
            _ => None,
        }
    }

    pub fn as_superatom(&self) -> Option<&Superatom> {
        match &self.kind {
            SGroupKind::Superatom(sa) => Some(sa),
            _ => None,
        }
    }
}

/// All S-groups of one molecule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SGroups {
    pool: Pool<SGroup>,
}

impl SGroups {
    pub(crate) fn add(&mut self, group: SGroup) -> SGroupId {
        SGroupId(self.pool.insert(group))
    }

    pub fn get(&self, id: SGroupId) -> Option<&SGroup> {
        self.pool.get(id.0)
    }

    pub fn contains(&self, id: SGroupId) -> bool {
        self.pool.contains(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SGroupId, &SGroup)> {
        self.pool.iter().map(|(i, g)| (SGroupId(i), g))
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.len() == 0
    }

    /// Removes a group; its children are re-homed to its parent.
    pub(crate) fn remove(&mut self, id: SGroupId) -> Option<SGroup> {
        let removed = self.pool.remove(id.0)?;
        for (_, g) in self.pool.iter_mut() {
            if g.parent == Some(id) {
                g.parent = removed.parent;
            }
        }
        Some(removed)
    }

    /// Re-parents `child`, rejecting chains that would loop back to it.
    pub(crate) fn set_parent(
        &mut self,
        child: SGroupId,
        parent: Option<SGroupId>,
    ) -> Result<(), StructuralError> {
        if !self.contains(child) {
            return Err(StructuralError::UnknownSGroup(child));
        }
        if let Some(p) = parent {
            if !self.contains(p) {
                return Err(StructuralError::UnknownSGroup(p));
            }
            let mut cursor = Some(p);
            while let Some(g) = cursor {
                if g == child {
                    return Err(StructuralError::ParentCycle(child));
                }
                cursor = self.get(g).and_then(|sg| sg.parent);
            }
        }
        if let Some(g) = self.pool.get_mut(child.0) {
            g.parent = parent;
        }
        Ok(())
    }

    /// Cascade hook for removals. Reference lists shrink to the survivors;
    /// a group whose atom list empties out is deleted, with children
    /// re-homed to its nearest surviving ancestor.
    pub(crate) fn purge_removed(
        &mut self,
        removed_vertices: &BTreeSet<VertexId>,
        removed_edges: &BTreeSet<EdgeId>,
    ) {
        let mut doomed: Vec<SGroupId> = Vec::new();
        for (i, g) in self.pool.iter_mut() {
            let had_atoms = !g.atoms.is_empty();
            g.atoms.retain(|a| !removed_vertices.contains(a));
            g.bonds.retain(|b| !removed_edges.contains(b));
            match &mut g.kind {
                SGroupKind::Data(_) | SGroupKind::RepeatingUnit(_) => {}
                SGroupKind::Superatom(sa) => {
                    sa.attachment_points
                        .retain(|ap| !removed_vertices.contains(&ap.atom));
                    for ap in &mut sa.attachment_points {
                        if ap.leaving.is_some_and(|l| removed_vertices.contains(&l)) {
                            ap.leaving = None;
                        }
                    }
                    sa.bond_connections.retain(|b| !removed_edges.contains(b));
                }
                SGroupKind::Multiple(mg) => {
                    mg.parent_atoms.retain(|a| !removed_vertices.contains(a));
                }
            }
            if had_atoms && g.atoms.is_empty() {
                doomed.push(SGroupId(i));
            }
        }
        // re-home children across any chain of deleted ancestors
        let mut parent_of_doomed: BTreeMap<SGroupId, Option<SGroupId>> = BTreeMap::new();
        for &id in &doomed {
            if let Some(g) = self.pool.get(id.0) {
                parent_of_doomed.insert(id, g.parent);
            }
        }
        let surviving_ancestor = |mut p: Option<SGroupId>| -> Option<SGroupId> {
            while let Some(q) = p {
                match parent_of_doomed.get(&q) {
                    Some(&next) => p = next,
                    None => return Some(q),
                }
            }
            None
        };
        for (_, g) in self.pool.iter_mut() {
            g.parent = surviving_ancestor(g.parent);
        }
        for id in doomed {
            self.pool.remove(id.0);
        }
    }

    /// Carries groups from `src` into `self` under vertex and edge
    /// mappings. A group travels when at least one of its atoms does (or
    /// when it never referenced atoms); reference lists shrink to the
    /// mapped subset, and parent links are rebuilt among the carried
    /// groups.
    pub(crate) fn translate_from(
        &mut self,
        src: &SGroups,
        vertex_mapping: &[Option<VertexId>],
        edge_mapping: &[Option<EdgeId>],
    ) {
        let vmap = |u: VertexId| vertex_mapping.get(u.index()).copied().flatten();
        let emap = |e: EdgeId| edge_mapping.get(e.index()).copied().flatten();

        let mut carried: BTreeMap<SGroupId, SGroupId> = BTreeMap::new();
        for (old_id, g) in src.iter() {
            let atoms: Vec<VertexId> = g.atoms.iter().copied().filter_map(vmap).collect();
            if !g.atoms.is_empty() && atoms.is_empty() {
                continue;
            }
            let bonds: Vec<EdgeId> = g.bonds.iter().copied().filter_map(emap).collect();
            let kind = match &g.kind {
                SGroupKind::Data(d) => SGroupKind::Data(d.clone()),
                SGroupKind::RepeatingUnit(ru) => SGroupKind::RepeatingUnit(ru.clone()),
                SGroupKind::Superatom(sa) => SGroupKind::Superatom(Superatom {
                    label: sa.label.clone(),
                    attachment_points: sa
                        .attachment_points
                        .iter()
                        .filter_map(|ap| {
                            Some(SuperatomAttachmentPoint {
                                atom: vmap(ap.atom)?,
                                leaving: ap.leaving.and_then(vmap),
                                id: ap.id.clone(),
                            })
                        })
                        .collect(),
                    bond_connections: sa.bond_connections.iter().copied().filter_map(emap).collect(),
                }),
                SGroupKind::Multiple(mg) => SGroupKind::Multiple(MultipleGroup {
                    multiplier: mg.multiplier,
                    parent_atoms: mg.parent_atoms.iter().copied().filter_map(vmap).collect(),
                }),
            };
            let new_id = self.add(SGroup {
                atoms,
                bonds,
                parent: None,
                kind,
            });
            carried.insert(old_id, new_id);
        }
        for (&old_id, &new_id) in &carried {
            let parent = src
                .get(old_id)
                .and_then(|g| g.parent)
                .and_then(|p| carried.get(&p).copied());
            if let Some(g) = self.pool.get_mut(new_id.0) {
                g.parent = parent;
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.pool.clear();
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

    #[test]
    fn remove_rehomes_children() {
        let mut sg = SGroups::default();
        let top = sg.add(SGroup::data("top", ""));
        let mid = sg.add(SGroup::data("mid", ""));
        let leaf = sg.add(SGroup::data("leaf", ""));
        sg.set_parent(mid, Some(top)).unwrap();
        sg.set_parent(leaf, Some(mid)).unwrap();
        sg.remove(mid);
        assert_eq!(sg.get(leaf).unwrap().parent, Some(top));
    }

    #[test]
    fn parent_cycle_rejected() {
        let mut sg = SGroups::default();
        let a = sg.add(SGroup::data("a", ""));
        let b = sg.add(SGroup::data("b", ""));
        sg.set_parent(b, Some(a)).unwrap();
        assert_eq!(
            sg.set_parent(a, Some(b)),
            Err(StructuralError::ParentCycle(a))
        );
        assert_eq!(
            sg.set_parent(a, Some(a)),
            Err(StructuralError::ParentCycle(a))
        );
    }

    #[test]
    fn purge_shrinks_and_deletes_emptied() {
        let mut sg = SGroups::default();
        let mut keep = SGroup::repeating_unit(Connectivity::HeadToTail, "n");
        keep.atoms = vec![v(0), v(1)];
        let keep = sg.add(keep);
        let mut gone = SGroup::superatom("Abv");
        gone.atoms = vec![v(2)];
        let gone = sg.add(gone);
        let mut child = SGroup::data("child", "");
        child.atoms = vec![v(0)];
        let child = sg.add(child);
        sg.set_parent(child, Some(gone)).unwrap();

        sg.purge_removed(&BTreeSet::from([v(1), v(2)]), &BTreeSet::new());

        // the repeating unit survives losing part of its membership
        assert_eq!(sg.get(keep).unwrap().atoms, vec![v(0)]);
        // the superatom lost every member atom and went with them
        assert!(!sg.contains(gone));
        assert_eq!(sg.get(child).unwrap().parent, None);
    }

    #[test]
    fn purge_rehomes_across_deleted_chain() {
        // top <- mid <- inner <- leaf, with mid and inner emptied at once
        let mut sg = SGroups::default();
        let mut top = SGroup::data("top", "");
        top.atoms = vec![v(0)];
        let top = sg.add(top);
        let mut mid = SGroup::data("mid", "");
        mid.atoms = vec![v(1)];
        let mid = sg.add(mid);
        let mut inner = SGroup::data("inner", "");
        inner.atoms = vec![v(1)];
        let inner = sg.add(inner);
        let mut leaf = SGroup::data("leaf", "");
        leaf.atoms = vec![v(2)];
        let leaf = sg.add(leaf);
        sg.set_parent(mid, Some(top)).unwrap();
        sg.set_parent(inner, Some(mid)).unwrap();
        sg.set_parent(leaf, Some(inner)).unwrap();

        sg.purge_removed(&BTreeSet::from([v(1)]), &BTreeSet::new());

        assert!(!sg.contains(mid));
        assert!(!sg.contains(inner));
        assert_eq!(sg.get(leaf).unwrap().parent, Some(top));
    }

    #[test]
    fn purge_cleans_superatom_references() {
        let mut sg = SGroups::default();
        let mut group = SGroup::superatom("Abv");
        group.atoms = vec![v(0), v(1)];
        if let SGroupKind::Superatom(sa) = &mut group.kind {
            sa.attachment_points.push(SuperatomAttachmentPoint {
                atom: v(0),
                leaving: Some(v(5)),
                id: "1".into(),
            });
            sa.attachment_points.push(SuperatomAttachmentPoint {
                atom: v(1),
                leaving: None,
                id: "2".into(),
            });
            sa.bond_connections = vec![e(0), e(1)];
        }
        let id = sg.add(group);
        sg.purge_removed(&BTreeSet::from([v(1), v(5)]), &BTreeSet::from([e(1)]));
        let sa = sg.get(id).unwrap().as_superatom().unwrap();
        assert_eq!(sa.attachment_points.len(), 1);
        assert_eq!(sa.attachment_points[0].leaving, None);
        assert_eq!(sa.bond_connections, vec![e(0)]);
    }

    #[test]
    fn translate_rebuilds_parent_links() {
        let mut src = SGroups::default();
        let mut parent = SGroup::data("parent", "");
        parent.atoms = vec![v(0)];
        let parent = src.add(parent);
        let mut child = SGroup::data("child", "");
        child.atoms = vec![v(1)];
        let child = src.add(child);
        let mut orphan = SGroup::data("orphan", "");
        orphan.atoms = vec![v(2)];
        let orphan_child = src.add(orphan);
        src.set_parent(child, Some(parent)).unwrap();
        src.set_parent(orphan_child, Some(parent)).unwrap();

        // v(2) is not carried: the orphan group stays behind
        let vmap = vec![Some(v(10)), Some(v(11)), None];
        let mut dst = SGroups::default();
        dst.translate_from(&src, &vmap, &[]);

        assert_eq!(dst.len(), 2);
        let carried_child = dst
            .iter()
            .find(|(_, g)| g.atoms == vec![v(11)])
            .map(|(id, _)| id)
            .unwrap();
        let carried_parent = dst
            .iter()
            .find(|(_, g)| g.atoms == vec![v(10)])
            .map(|(id, _)| id)
            .unwrap();
        assert_eq!(dst.get(carried_child).unwrap().parent, Some(carried_parent));
    }
}
