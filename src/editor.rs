//! Structural editing: merging submolecules in, removing pieces, and
//! re-pointing bonds.
//!
//! Every operation validates its inputs completely before touching the
//! molecule; an `Err` means nothing changed. Overlays are updated before
//! the graph so their hooks still see the old adjacency.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::bond::BondDirection;
use crate::error::{Error, StructuralError, UnsupportedOperation};
use crate::graph::{EdgeId, VertexId};
use crate::mol::Molecule;
use crate::sgroups::SGroupId;

/// Where each source handle landed after a merge.
///
/// Indexed by source handle; handles outside the copied subset map to
/// `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    vertices: Vec<Option<VertexId>>,
    edges: Vec<Option<EdgeId>>,
}

impl Mapping {
    pub fn vertex(&self, v: VertexId) -> Option<VertexId> {
        self.vertices.get(v.index()).copied().flatten()
    }

    pub fn edge(&self, e: EdgeId) -> Option<EdgeId> {
        self.edges.get(e.index()).copied().flatten()
    }

    pub fn vertices(&self) -> &[Option<VertexId>] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Option<EdgeId>] {
        &self.edges
    }

    /// Chains two merges: `a.compose(b)` maps through `a`, then `b`.
    pub fn compose(&self, then: &Mapping) -> Mapping {
        Mapping {
            vertices: self
                .vertices
                .iter()
                .map(|slot| slot.and_then(|mid| then.vertex(mid)))
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|slot| slot.and_then(|mid| then.edge(mid)))
                .collect(),
        }
    }
}

impl Molecule {
    /// Copies a subset of `src` into this molecule, overlays included.
    ///
    /// `vertices` is treated as a set and copied in the given order. With
    /// `edges: None` every `src` edge between copied vertices comes along;
    /// an explicit list restricts the copy to exactly those edges, each of
    /// which must stay inside the vertex subset. Edge orientation is
    /// preserved. Overlay entries travel when everything they reference
    /// does, with the same degradation rules as removal.
    pub fn merge_with_submolecule(
        &mut self,
        src: &Molecule,
        vertices: &[VertexId],
        edges: Option<&[EdgeId]>,
    ) -> Result<Mapping, StructuralError> {
        validate_subset(src, vertices, edges)?;
        Ok(self.merge_unchecked(src, vertices, edges))
    }

    /// Replaces this molecule with a subset of `src`. The molecule is
    /// untouched when validation fails.
    pub fn make_submolecule(
        &mut self,
        src: &Molecule,
        vertices: &[VertexId],
        edges: Option<&[EdgeId]>,
    ) -> Result<Mapping, StructuralError> {
        validate_subset(src, vertices, edges)?;
        self.clear();
        Ok(self.merge_unchecked(src, vertices, edges))
    }

    /// Extracts a subset of this molecule into a fresh one.
    pub fn submolecule(
        &self,
        vertices: &[VertexId],
        edges: Option<&[EdgeId]>,
    ) -> Result<(Molecule, Mapping), StructuralError> {
        let mut out = Molecule::new();
        let mapping = out.make_submolecule(self, vertices, edges)?;
        Ok((out, mapping))
    }

    fn merge_unchecked(
        &mut self,
        src: &Molecule,
        vertices: &[VertexId],
        edges: Option<&[EdgeId]>,
    ) -> Mapping {
        let mut mapping = Mapping {
            vertices: vec![None; src.graph.vertex_end()],
            edges: vec![None; src.graph.edge_end()],
        };
        for &v in vertices {
            if mapping.vertices[v.index()].is_none() {
                mapping.vertices[v.index()] = Some(self.graph.add_vertex(src.graph.vertex(v).clone()));
            }
        }
        let mut copy_edge = |graph: &mut crate::graph::Graph<_, _>, e: EdgeId| {
            if mapping.edges[e.index()].is_some() {
                return;
            }
            let (beg, end) = src.graph.edge_ends(e);
            let (Some(nb), Some(ne)) = (mapping.vertices[beg.index()], mapping.vertices[end.index()])
            else {
                return;
            };
            mapping.edges[e.index()] = Some(graph.add_edge(nb, ne, src.graph.edge(e).clone()));
        };
        match edges {
            Some(list) => {
                for &e in list {
                    copy_edge(&mut self.graph, e);
                }
            }
            None => {
                for e in src.graph.edges() {
                    copy_edge(&mut self.graph, e);
                }
            }
        }

        self.stereocenters.translate_from(&src.stereocenters, &mapping.vertices);
        self.cis_trans
            .translate_from(&src.cis_trans, &mapping.vertices, &mapping.edges);
        self.sgroups
            .translate_from(&src.sgroups, &mapping.vertices, &mapping.edges);
        self.attachments.translate_from(&src.attachments, &mapping.vertices);
        self.annotations
            .translate_from(&src.annotations, &mapping.vertices, &mapping.edges);

        debug!(
            "merged {} atoms and {} bonds into molecule of {}",
            vertices.len(),
            mapping.edges.iter().flatten().count(),
            self.atom_count()
        );
        mapping
    }

    /// Removes atoms together with their incident bonds, cascading through
    /// the overlays.
    pub fn remove_atoms(&mut self, atoms: &[VertexId]) -> Result<(), StructuralError> {
        for &v in atoms {
            if !self.graph.contains_vertex(v) {
                return Err(StructuralError::UnknownVertex(v));
            }
        }
        let removed_vertices: BTreeSet<VertexId> = atoms.iter().copied().collect();
        let mut removed_edges = BTreeSet::new();
        for &v in &removed_vertices {
            removed_edges.extend(self.graph.neighbors(v).map(|(e, _)| e));
        }
        self.remove_core(removed_vertices, removed_edges);
        Ok(())
    }

    /// Removes bonds, leaving their endpoints in place.
    pub fn remove_bonds(&mut self, bonds: &[EdgeId]) -> Result<(), StructuralError> {
        for &e in bonds {
            if !self.graph.contains_edge(e) {
                return Err(StructuralError::UnknownEdge(e));
            }
        }
        self.remove_core(BTreeSet::new(), bonds.iter().copied().collect());
        Ok(())
    }

    fn remove_core(&mut self, removed_vertices: BTreeSet<VertexId>, removed_edges: BTreeSet<EdgeId>) {
        let centers_before: Vec<VertexId> = self.stereocenters.iter().map(|(v, _)| v).collect();

        self.stereocenters.purge_removed(&removed_vertices);
        // a removed bond severs the neighbor link even when both endpoints stay
        let mut severed: Vec<(EdgeId, VertexId)> = Vec::new();
        for &e in &removed_edges {
            if let Some((a, b)) = self.graph.try_edge_ends(e) {
                if !removed_vertices.contains(&a) && !removed_vertices.contains(&b) {
                    self.stereocenters.forget_neighbor(a, b);
                    self.stereocenters.forget_neighbor(b, a);
                    for (ce, entry) in self.cis_trans.iter() {
                        if removed_edges.contains(&ce) {
                            continue;
                        }
                        let Some((cb, cen)) = self.graph.try_edge_ends(ce) else {
                            continue;
                        };
                        let beg_side = &entry.substituents[..2];
                        let end_side = &entry.substituents[2..];
                        if (cb == a && beg_side.contains(&Some(b)))
                            || (cen == a && end_side.contains(&Some(b)))
                        {
                            severed.push((ce, b));
                        }
                        if (cb == b && beg_side.contains(&Some(a)))
                            || (cen == b && end_side.contains(&Some(a)))
                        {
                            severed.push((ce, a));
                        }
                    }
                }
            }
        }
        self.cis_trans.purge_removed(&removed_vertices, &removed_edges);
        for (ce, gone) in severed {
            self.cis_trans.forget_substituent(ce, gone);
        }
        self.sgroups.purge_removed(&removed_vertices, &removed_edges);
        self.attachments.purge_removed(&removed_vertices);
        self.annotations.purge_removed(&removed_vertices, &removed_edges);

        for &e in &removed_edges {
            self.graph.remove_edge(e);
        }
        for &v in &removed_vertices {
            self.graph.remove_vertex(v);
        }

        for center in centers_before {
            if self.graph.contains_vertex(center) && !self.stereocenters.contains(center) {
                self.reset_wedges_at(center);
            }
        }

        debug!(
            "removed {} atoms and {} bonds",
            removed_vertices.len(),
            removed_edges.len()
        );
    }

    /// Wedge marks describe the configuration of the center at their begin
    /// atom; once that center is gone they are stale.
    fn reset_wedges_at(&mut self, center: VertexId) {
        let stale: Vec<EdgeId> = self
            .graph
            .neighbors(center)
            .map(|(e, _)| e)
            .filter(|&e| {
                self.graph.edge_ends(e).0 == center
                    && !matches!(
                        self.graph.edge(e).direction,
                        BondDirection::None | BondDirection::Either
                    )
            })
            .collect();
        for e in stale {
            self.graph.edge_mut(e).direction = BondDirection::None;
        }
    }

    /// Moves one endpoint of `e` from `old_end` to `new_end`, keeping the
    /// edge handle and its payload.
    ///
    /// Fails when the move would create a self-loop or a duplicate of an
    /// existing bond. The stereocenter on the retained endpoint follows the
    /// move; stereo information around the abandoned endpoint degrades as
    /// if the bond had been removed there.
    pub fn flip_bond(
        &mut self,
        e: EdgeId,
        old_end: VertexId,
        new_end: VertexId,
    ) -> Result<(), StructuralError> {
        let pivot = self.validate_flip(e, old_end, new_end)?;
        if old_end == new_end {
            return Ok(());
        }
        if self.graph.find_edge(pivot, new_end).is_some() {
            return Err(StructuralError::ParallelEdge {
                a: pivot,
                b: new_end,
            });
        }
        self.flip_unchecked(e, old_end, new_end, pivot);
        Ok(())
    }

    /// [`flip_bond`](Self::flip_bond) that resolves collisions by
    /// direction priority: when a bond between the pivot and `new_end`
    /// already exists, the bond with the weaker direction mark is removed.
    /// Returns the surviving bond.
    pub fn flip_bond_with_direction(
        &mut self,
        e: EdgeId,
        old_end: VertexId,
        new_end: VertexId,
    ) -> Result<EdgeId, StructuralError> {
        let pivot = self.validate_flip(e, old_end, new_end)?;
        if old_end == new_end {
            return Ok(e);
        }
        match self.graph.find_edge(pivot, new_end) {
            None => {
                self.flip_unchecked(e, old_end, new_end, pivot);
                Ok(e)
            }
            Some(existing) => {
                let moved = self.graph.edge(e).direction.priority();
                let standing = self.graph.edge(existing).direction.priority();
                if moved > standing {
                    self.remove_bonds(&[existing])?;
                    self.flip_unchecked(e, old_end, new_end, pivot);
                    Ok(e)
                } else {
                    self.remove_bonds(&[e])?;
                    Ok(existing)
                }
            }
        }
    }

    fn validate_flip(
        &self,
        e: EdgeId,
        old_end: VertexId,
        new_end: VertexId,
    ) -> Result<VertexId, StructuralError> {
        let Some((a, b)) = self.graph.try_edge_ends(e) else {
            return Err(StructuralError::UnknownEdge(e));
        };
        let pivot = if a == old_end {
            b
        } else if b == old_end {
            a
        } else {
            return Err(StructuralError::NotAnEndpoint { edge: e, vertex: old_end });
        };
        if !self.graph.contains_vertex(new_end) {
            return Err(StructuralError::UnknownVertex(new_end));
        }
        if new_end == pivot {
            return Err(StructuralError::WouldSelfLoop { edge: e, vertex: new_end });
        }
        Ok(pivot)
    }

    fn flip_unchecked(&mut self, e: EdgeId, old_end: VertexId, new_end: VertexId, pivot: VertexId) {
        let had_center_at_old = self.stereocenters.contains(old_end);

        self.stereocenters.repoint_neighbor(pivot, old_end, new_end);
        self.stereocenters.forget_neighbor(old_end, pivot);

        // the pivot keeps its bond across the flip, so its sides re-home
        // old_end -> new_end; the old end genuinely loses the pivot
        let mut moves: Vec<(EdgeId, usize)> = Vec::new();
        let mut losses: Vec<(EdgeId, VertexId)> = Vec::new();
        for (ce, entry) in self.cis_trans.iter() {
            if ce == e {
                continue;
            }
            let Some((cb, cen)) = self.graph.try_edge_ends(ce) else {
                continue;
            };
            let beg_side = &entry.substituents[..2];
            let end_side = &entry.substituents[2..];
            if cb == pivot && beg_side.contains(&Some(old_end)) {
                moves.push((ce, 0));
            }
            if cen == pivot && end_side.contains(&Some(old_end)) {
                moves.push((ce, 2));
            }
            if (cb == old_end && beg_side.contains(&Some(pivot)))
                || (cen == old_end && end_side.contains(&Some(pivot)))
            {
                losses.push((ce, pivot));
            }
        }
        self.cis_trans.remove(e);
        for (ce, side) in moves {
            self.cis_trans.repoint_substituent(ce, side, old_end, new_end);
        }
        for (ce, gone) in losses {
            self.cis_trans.forget_substituent(ce, gone);
        }

        self.graph.change_edge_end(e, old_end, new_end);
        self.graph.edge_mut(e).direction = BondDirection::None;

        if had_center_at_old && !self.stereocenters.contains(old_end) {
            self.reset_wedges_at(old_end);
        }

        debug!("flipped bond {e}: {old_end} -> {new_end}");
    }

    /// Shrinks a multiple group back to its first repetition. Bonds
    /// leaving the repeated region are re-pointed onto the corresponding
    /// atoms of the kept block; the extra atoms are removed with the usual
    /// cascade.
    pub fn collapse_multiple_group(&mut self, id: SGroupId) -> Result<(), Error> {
        let (atoms, parents) = {
            let group = self
                .sgroups
                .get(id)
                .ok_or(StructuralError::UnknownSGroup(id))?;
            let mg = group
                .as_multiple()
                .ok_or(UnsupportedOperation::NotAMultipleGroup(id))?;
            (group.atoms.clone(), mg.parent_atoms.clone())
        };
        let k = parents.len();
        if k == 0 || atoms.len() <= k {
            return Err(UnsupportedOperation::AlreadyCollapsed(id).into());
        }
        // the `i mod k` representative correspondence needs the member list
        // to open with the parent block
        let leading: BTreeSet<VertexId> = atoms[..k].iter().copied().collect();
        let parent_set: BTreeSet<VertexId> = parents.iter().copied().collect();
        if leading != parent_set {
            return Err(StructuralError::InconsistentMultipleGroup(id).into());
        }
        let position: BTreeMap<VertexId, usize> =
            atoms.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let doomed: BTreeSet<VertexId> = atoms[k..].iter().copied().collect();

        // bonds from a doomed atom out of the group follow it to its
        // representative; bonds within the group die with the repetitions
        let mut crossings: Vec<(EdgeId, VertexId, VertexId)> = Vec::new();
        for &r in &doomed {
            for (e, o) in self.graph.neighbors(r) {
                if !position.contains_key(&o) {
                    // member order carries the correspondence; the parent
                    // list is only a set
                    crossings.push((e, r, atoms[position[&r] % k]));
                }
            }
        }
        for (e, r, rep) in crossings {
            if self.graph.contains_edge(e) {
                self.flip_bond_with_direction(e, r, rep)?;
            }
        }
        let doomed: Vec<VertexId> = doomed.into_iter().collect();
        self.remove_atoms(&doomed)?;
        debug!("collapsed multiple group {id} to {k} atoms");
        Ok(())
    }
}

fn validate_subset(
    src: &Molecule,
    vertices: &[VertexId],
    edges: Option<&[EdgeId]>,
) -> Result<(), StructuralError> {
    let mut vset = BTreeSet::new();
    for &v in vertices {
        if !src.graph.contains_vertex(v) {
            return Err(StructuralError::UnknownVertex(v));
        }
        vset.insert(v);
    }
    if let Some(list) = edges {
        for &e in list {
            let Some((beg, end)) = src.graph.try_edge_ends(e) else {
                return Err(StructuralError::UnknownEdge(e));
            };
            for endpoint in [beg, end] {
                if !vset.contains(&endpoint) {
                    return Err(StructuralError::ForeignEndpoint { edge: e, vertex: endpoint });
                }
            }
        }
    }
    Ok(())
}
