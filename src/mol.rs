use std::fmt;

use crate::annotations::Annotations;
use crate::atom::Atom;
use crate::attachments::AttachmentPoints;
use crate::bond::{Bond, BondDirection, BondOrder};
use crate::cis_trans::{CisTrans, CisTransBond, CisTransBonds};
use crate::element::Element;
use crate::error::StructuralError;
use crate::graph::{EdgeId, Graph, VertexId};
use crate::sgroups::{SGroup, SGroupId, SGroupKind, SGroups};
use crate::stereocenters::{Stereocenter, Stereocenters, StereoType};

/// A molecular graph with its chemistry overlays.
///
/// The graph hands out stable handles; every overlay keys its entries by
/// those handles. Plain construction (`add_atom`, `add_bond`) panics on
/// dead handles, same as indexing. Overlay setters validate against the
/// graph and report [`StructuralError`] instead, because their reference
/// frames are easy to get wrong.
pub struct Molecule {
    pub(crate) graph: Graph<Atom, Bond>,
    pub(crate) stereocenters: Stereocenters,
    pub(crate) cis_trans: CisTransBonds,
    pub(crate) sgroups: SGroups,
    pub(crate) attachments: AttachmentPoints,
    pub(crate) annotations: Annotations,
}

impl Molecule {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            stereocenters: Stereocenters::default(),
            cis_trans: CisTransBonds::default(),
            sgroups: SGroups::default(),
            attachments: AttachmentPoints::default(),
            annotations: Annotations::default(),
        }
    }

    pub fn graph(&self) -> &Graph<Atom, Bond> {
        &self.graph
    }

    pub fn atom(&self, v: VertexId) -> &Atom {
        self.graph.vertex(v)
    }

    pub fn atom_mut(&mut self, v: VertexId) -> &mut Atom {
        self.graph.vertex_mut(v)
    }

    pub fn try_atom(&self, v: VertexId) -> Option<&Atom> {
        self.graph.try_vertex(v)
    }

    pub fn bond(&self, e: EdgeId) -> &Bond {
        self.graph.edge(e)
    }

    pub fn bond_mut(&mut self, e: EdgeId) -> &mut Bond {
        self.graph.edge_mut(e)
    }

    pub fn try_bond(&self, e: EdgeId) -> Option<&Bond> {
        self.graph.try_edge(e)
    }

    pub fn add_atom(&mut self, atom: Atom) -> VertexId {
        self.graph.add_vertex(atom)
    }

    pub fn add_element(&mut self, element: Element) -> VertexId {
        self.add_atom(Atom::element(element))
    }

    /// Panics on dead endpoints, a self-bond, or a duplicate bond; the
    /// graph stays simple.
    pub fn add_bond(&mut self, a: VertexId, b: VertexId, order: BondOrder) -> EdgeId {
        assert!(
            self.graph.find_edge(a, b).is_none(),
            "parallel bond {a}-{b}"
        );
        self.graph.add_edge(a, b, Bond::new(order))
    }

    pub fn atom_count(&self) -> usize {
        self.graph.vertex_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn atoms(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.graph.vertices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph.edges()
    }

    pub fn neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.graph.neighbor_vertices(v)
    }

    /// `(bond, neighbor)` pairs around an atom.
    pub fn incident_bonds(&self, v: VertexId) -> impl Iterator<Item = (EdgeId, VertexId)> + '_ {
        self.graph.neighbors(v)
    }

    pub fn degree(&self, v: VertexId) -> usize {
        self.graph.degree(v)
    }

    pub fn bond_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.graph.find_edge(a, b)
    }

    pub fn bond_endpoints(&self, e: EdgeId) -> Option<(VertexId, VertexId)> {
        self.graph.try_edge_ends(e)
    }

    pub fn set_atom_xyz(&mut self, v: VertexId, xyz: [f64; 3]) {
        self.atom_mut(v).xyz = xyz;
    }

    pub fn set_bond_direction(&mut self, e: EdgeId, direction: BondDirection) {
        self.bond_mut(e).direction = direction;
    }

    pub fn stereocenters(&self) -> &Stereocenters {
        &self.stereocenters
    }

    /// Registers a tetrahedral center over `center`.
    ///
    /// Slots 0..2 must hold distinct neighbors of `center`; slot 3 may be
    /// `None` for an implicit hydrogen or lone pair. The slot order is the
    /// configuration.
    pub fn add_stereocenter(
        &mut self,
        center: VertexId,
        kind: StereoType,
        pyramid: [Option<VertexId>; 4],
    ) -> Result<(), StructuralError> {
        if !self.graph.contains_vertex(center) {
            return Err(StructuralError::UnknownVertex(center));
        }
        if pyramid[..3].iter().any(|slot| slot.is_none()) {
            return Err(StructuralError::IncompletePyramid(center));
        }
        for (i, &slot) in pyramid.iter().enumerate() {
            let Some(v) = slot else { continue };
            if !self.graph.contains_vertex(v) {
                return Err(StructuralError::UnknownVertex(v));
            }
            if self.graph.find_edge(center, v).is_none() {
                return Err(StructuralError::NotANeighbor { center, vertex: v });
            }
            if pyramid[..i].contains(&Some(v)) {
                return Err(StructuralError::DuplicatePyramidEntry { center, vertex: v });
            }
        }
        self.stereocenters.insert(center, Stereocenter { kind, pyramid });
        Ok(())
    }

    pub fn remove_stereocenter(&mut self, center: VertexId) -> bool {
        self.stereocenters.remove(center).is_some()
    }

    /// Swaps two pyramid slots of a center, inverting its configuration.
    pub fn invert_stereocenter(&mut self, center: VertexId) -> bool {
        self.stereocenters.invert_pyramid(center)
    }

    pub fn cis_trans_bonds(&self) -> &CisTransBonds {
        &self.cis_trans
    }

    /// Registers a cis/trans configuration on a double bond.
    ///
    /// Substituent slots 0 and 1 must be neighbors of the begin endpoint,
    /// slots 2 and 3 neighbors of the end endpoint; 0 and 2 are required.
    pub fn set_cis_trans(
        &mut self,
        e: EdgeId,
        parity: CisTrans,
        substituents: [Option<VertexId>; 4],
    ) -> Result<(), StructuralError> {
        let Some((beg, end)) = self.graph.try_edge_ends(e) else {
            return Err(StructuralError::UnknownEdge(e));
        };
        if self.graph.edge(e).order != BondOrder::Double {
            return Err(StructuralError::NotADoubleBond(e));
        }
        if substituents[0].is_none() || substituents[2].is_none() {
            return Err(StructuralError::MissingReference(e));
        }
        for (i, &slot) in substituents.iter().enumerate() {
            let Some(v) = slot else { continue };
            if !self.graph.contains_vertex(v) {
                return Err(StructuralError::UnknownVertex(v));
            }
            let anchor = if i < 2 { beg } else { end };
            if v == beg || v == end || substituents[..i].contains(&Some(v)) {
                return Err(StructuralError::InvalidSubstituent { edge: e, vertex: v });
            }
            if self.graph.find_edge(anchor, v).is_none() {
                return Err(StructuralError::NotANeighbor {
                    center: anchor,
                    vertex: v,
                });
            }
        }
        self.cis_trans.insert(e, CisTransBond { parity, substituents });
        Ok(())
    }

    pub fn remove_cis_trans(&mut self, e: EdgeId) -> bool {
        self.cis_trans.remove(e).is_some()
    }

    pub fn sgroups(&self) -> &SGroups {
        &self.sgroups
    }

    pub fn sgroup(&self, id: SGroupId) -> Option<&SGroup> {
        self.sgroups.get(id)
    }

    /// Adds an S-group after checking every handle it references.
    pub fn add_sgroup(&mut self, group: SGroup) -> Result<SGroupId, StructuralError> {
        for &a in &group.atoms {
            if !self.graph.contains_vertex(a) {
                return Err(StructuralError::UnknownVertex(a));
            }
        }
        for &b in &group.bonds {
            if !self.graph.contains_edge(b) {
                return Err(StructuralError::UnknownEdge(b));
            }
        }
        match &group.kind {
            SGroupKind::Data(_) | SGroupKind::RepeatingUnit(_) => {}
            SGroupKind::Superatom(sa) => {
                for ap in &sa.attachment_points {
                    if !self.graph.contains_vertex(ap.atom) {
                        return Err(StructuralError::UnknownVertex(ap.atom));
                    }
                    if let Some(l) = ap.leaving {
                        if !self.graph.contains_vertex(l) {
                            return Err(StructuralError::UnknownVertex(l));
                        }
                    }
                }
                for &b in &sa.bond_connections {
                    if !self.graph.contains_edge(b) {
                        return Err(StructuralError::UnknownEdge(b));
                    }
                }
            }
            SGroupKind::Multiple(mg) => {
                for &a in &mg.parent_atoms {
                    if !self.graph.contains_vertex(a) {
                        return Err(StructuralError::UnknownVertex(a));
                    }
                }
            }
        }
        Ok(self.sgroups.add(group))
    }

    pub fn set_sgroup_parent(
        &mut self,
        child: SGroupId,
        parent: Option<SGroupId>,
    ) -> Result<(), StructuralError> {
        self.sgroups.set_parent(child, parent)
    }

    pub fn remove_sgroup(&mut self, id: SGroupId) -> Option<SGroup> {
        self.sgroups.remove(id)
    }

    pub fn attachment_points(&self) -> &AttachmentPoints {
        &self.attachments
    }

    pub fn add_attachment_point(
        &mut self,
        atom: VertexId,
        dest: VertexId,
        id: impl Into<String>,
    ) -> Result<(), StructuralError> {
        for v in [atom, dest] {
            if !self.graph.contains_vertex(v) {
                return Err(StructuralError::UnknownVertex(v));
            }
        }
        self.attachments.add(atom, dest, id);
        Ok(())
    }

    pub fn remove_attachment_points(&mut self, atom: VertexId) {
        self.attachments.remove_for_atom(atom);
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn set_alias(&mut self, v: VertexId, alias: impl Into<String>) {
        self.annotations.set_alias(v, alias);
    }

    pub fn clear_alias(&mut self, v: VertexId) {
        self.annotations.clear_alias(v);
    }

    pub fn select_atom(&mut self, v: VertexId, on: bool) {
        self.annotations.select_atom(v, on);
    }

    pub fn select_bond(&mut self, e: EdgeId, on: bool) {
        self.annotations.select_bond(e, on);
    }

    pub fn highlight_atom(&mut self, v: VertexId, on: bool) {
        self.annotations.highlight_atom(v, on);
    }

    pub fn highlight_bond(&mut self, e: EdgeId, on: bool) {
        self.annotations.highlight_bond(e, on);
    }

    pub fn clear_selection(&mut self) {
        self.annotations.clear_selection();
    }

    pub fn clear_highlighting(&mut self) {
        self.annotations.clear_highlighting();
    }

    /// Empties the molecule, overlays included. Handles from before the
    /// clear are dead.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.stereocenters.clear();
        self.cis_trans.clear();
        self.sgroups.clear();
        self.attachments.clear();
        self.annotations.clear();
    }
}

impl Default for Molecule {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Molecule {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            stereocenters: self.stereocenters.clone(),
            cis_trans: self.cis_trans.clone(),
            sgroups: self.sgroups.clone(),
            attachments: self.attachments.clone(),
            annotations: self.annotations.clone(),
        }
    }
}

/// Handle-for-handle equality: same slot layout, same payloads, same
/// overlay entries.
impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.graph == other.graph
            && self.stereocenters == other.stereocenters
            && self.cis_trans == other.cis_trans
            && self.sgroups == other.sgroups
            && self.attachments == other.attachments
            && self.annotations == other.annotations
    }
}

impl fmt::Debug for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Molecule")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .field("stereocenters", &self.stereocenters.len())
            .field("cis_trans", &self.cis_trans.len())
            .field("sgroups", &self.sgroups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> (Molecule, Vec<VertexId>) {
        let mut mol = Molecule::new();
        let vs: Vec<_> = (0..n).map(|_| mol.add_element(Element::C)).collect();
        for w in vs.windows(2) {
            mol.add_bond(w[0], w[1], BondOrder::Single);
        }
        (mol, vs)
    }

    #[test]
    fn build_and_query() {
        let (mol, vs) = chain(3);
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.degree(vs[1]), 2);
        assert!(mol.bond_between(vs[0], vs[1]).is_some());
        assert_eq!(mol.atom(vs[0]).atomic_num(), Some(6));
    }

    #[test]
    fn stereocenter_validation() {
        let mut mol = Molecule::new();
        let c = mol.add_element(Element::C);
        let mut nb = Vec::new();
        for el in [Element::F, Element::Cl, Element::Br] {
            let v = mol.add_element(el);
            mol.add_bond(c, v, BondOrder::Single);
            nb.push(v);
        }
        let stray = mol.add_element(Element::O);

        assert_eq!(
            mol.add_stereocenter(c, StereoType::Abs, [Some(nb[0]), Some(nb[1]), None, None]),
            Err(StructuralError::IncompletePyramid(c))
        );
        assert_eq!(
            mol.add_stereocenter(
                c,
                StereoType::Abs,
                [Some(nb[0]), Some(nb[1]), Some(stray), None]
            ),
            Err(StructuralError::NotANeighbor { center: c, vertex: stray })
        );
        assert_eq!(
            mol.add_stereocenter(
                c,
                StereoType::Abs,
                [Some(nb[0]), Some(nb[1]), Some(nb[1]), None]
            ),
            Err(StructuralError::DuplicatePyramidEntry { center: c, vertex: nb[1] })
        );
        mol.add_stereocenter(c, StereoType::Abs, [Some(nb[0]), Some(nb[1]), Some(nb[2]), None])
            .unwrap();
        assert!(mol.stereocenters().contains(c));
    }

    #[test]
    fn cis_trans_validation() {
        // F-C=C-F with one hydrogen on each carbon
        let mut mol = Molecule::new();
        let c1 = mol.add_element(Element::C);
        let c2 = mol.add_element(Element::C);
        let f1 = mol.add_element(Element::F);
        let f2 = mol.add_element(Element::F);
        let single = mol.add_bond(c1, f1, BondOrder::Single);
        mol.add_bond(c2, f2, BondOrder::Single);
        let double = mol.add_bond(c1, c2, BondOrder::Double);

        assert_eq!(
            mol.set_cis_trans(single, CisTrans::Cis, [Some(c1), None, Some(f2), None]),
            Err(StructuralError::NotADoubleBond(single))
        );
        assert_eq!(
            mol.set_cis_trans(double, CisTrans::Cis, [None, None, Some(f2), None]),
            Err(StructuralError::MissingReference(double))
        );
        assert_eq!(
            mol.set_cis_trans(double, CisTrans::Cis, [Some(c2), None, Some(f2), None]),
            Err(StructuralError::InvalidSubstituent { edge: double, vertex: c2 })
        );
        assert_eq!(
            mol.set_cis_trans(double, CisTrans::Cis, [Some(f2), None, Some(f1), None]),
            Err(StructuralError::NotANeighbor { center: c1, vertex: f2 })
        );
        mol.set_cis_trans(double, CisTrans::Cis, [Some(f1), None, Some(f2), None])
            .unwrap();
        assert_eq!(mol.cis_trans_bonds().get(double).unwrap().parity, CisTrans::Cis);
    }

    #[test]
    fn sgroup_references_checked() {
        let (mut mol, vs) = chain(2);
        let mut group = SGroup::data("MW", "30.07");
        group.atoms = vec![vs[0], VertexId::new(99)];
        assert_eq!(
            mol.add_sgroup(group),
            Err(StructuralError::UnknownVertex(VertexId::new(99)))
        );
        let mut group = SGroup::data("MW", "30.07");
        group.atoms = vec![vs[0], vs[1]];
        let id = mol.add_sgroup(group).unwrap();
        assert!(mol.sgroup(id).is_some());
    }

    #[test]
    fn clear_empties_overlays() {
        let (mut mol, vs) = chain(2);
        mol.set_alias(vs[0], "R1");
        mol.select_atom(vs[1], true);
        mol.clear();
        assert_eq!(mol.atom_count(), 0);
        assert!(mol.annotations().alias(VertexId::new(0)).is_none());
        let v = mol.add_element(Element::C);
        assert_eq!(v.index(), 0);
    }

    #[test]
    fn equality_is_handle_for_handle() {
        let (a, _) = chain(3);
        let (b, _) = chain(3);
        assert_eq!(a, b);
        let (mut c, vs) = chain(3);
        c.atom_mut(vs[0]).charge = 1;
        assert_ne!(a, c);
    }

    #[test]
    #[should_panic(expected = "parallel bond")]
    fn duplicate_bond_panics() {
        let (mut mol, vs) = chain(2);
        mol.add_bond(vs[1], vs[0], BondOrder::Double);
    }
}
