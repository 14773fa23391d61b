//! Editor-facing annotations: atom aliases plus selection and highlight
//! marks. None of these affect matching.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{EdgeId, VertexId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    aliases: BTreeMap<VertexId, String>,
    selected_atoms: BTreeSet<VertexId>,
    selected_bonds: BTreeSet<EdgeId>,
    highlighted_atoms: BTreeSet<VertexId>,
    highlighted_bonds: BTreeSet<EdgeId>,
}

impl Annotations {
    pub fn alias(&self, v: VertexId) -> Option<&str> {
        self.aliases.get(&v).map(String::as_str)
    }

    pub(crate) fn set_alias(&mut self, v: VertexId, alias: impl Into<String>) {
        self.aliases.insert(v, alias.into());
    }

    pub(crate) fn clear_alias(&mut self, v: VertexId) {
        self.aliases.remove(&v);
    }

    pub fn is_atom_selected(&self, v: VertexId) -> bool {
        self.selected_atoms.contains(&v)
    }

    pub fn is_bond_selected(&self, e: EdgeId) -> bool {
        self.selected_bonds.contains(&e)
    }

    pub fn is_atom_highlighted(&self, v: VertexId) -> bool {
        self.highlighted_atoms.contains(&v)
    }

    pub fn is_bond_highlighted(&self, e: EdgeId) -> bool {
        self.highlighted_bonds.contains(&e)
    }

    pub fn selected_atoms(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.selected_atoms.iter().copied()
    }

    pub fn highlighted_atoms(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.highlighted_atoms.iter().copied()
    }

    pub(crate) fn select_atom(&mut self, v: VertexId, on: bool) {
        if on {
            self.selected_atoms.insert(v);
        } else {
            self.selected_atoms.remove(&v);
        }
    }

    pub(crate) fn select_bond(&mut self, e: EdgeId, on: bool) {
        if on {
            self.selected_bonds.insert(e);
        } else {
            self.selected_bonds.remove(&e);
        }
    }

    pub(crate) fn highlight_atom(&mut self, v: VertexId, on: bool) {
        if on {
            self.highlighted_atoms.insert(v);
        } else {
            self.highlighted_atoms.remove(&v);
        }
    }

    pub(crate) fn highlight_bond(&mut self, e: EdgeId, on: bool) {
        if on {
            self.highlighted_bonds.insert(e);
        } else {
            self.highlighted_bonds.remove(&e);
        }
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected_atoms.clear();
        self.selected_bonds.clear();
    }

    pub(crate) fn clear_highlighting(&mut self) {
        self.highlighted_atoms.clear();
        self.highlighted_bonds.clear();
    }

    pub(crate) fn purge_removed(
        &mut self,
        removed_vertices: &BTreeSet<VertexId>,
        removed_edges: &BTreeSet<EdgeId>,
    ) {
        self.aliases.retain(|v, _| !removed_vertices.contains(v));
        self.selected_atoms.retain(|v| !removed_vertices.contains(v));
        self.highlighted_atoms.retain(|v| !removed_vertices.contains(v));
        self.selected_bonds.retain(|e| !removed_edges.contains(e));
        self.highlighted_bonds.retain(|e| !removed_edges.contains(e));
    }

    pub(crate) fn translate_from(
        &mut self,
        src: &Annotations,
        vertex_mapping: &[Option<VertexId>],
        edge_mapping: &[Option<EdgeId>],
    ) {
        let vmap = |u: &VertexId| vertex_mapping.get(u.index()).copied().flatten();
        let emap = |e: &EdgeId| edge_mapping.get(e.index()).copied().flatten();
        for (v, alias) in &src.aliases {
            if let Some(nv) = vmap(v) {
                self.aliases.insert(nv, alias.clone());
            }
        }
        self.selected_atoms.extend(src.selected_atoms.iter().filter_map(vmap));
        self.highlighted_atoms
            .extend(src.highlighted_atoms.iter().filter_map(vmap));
        self.selected_bonds.extend(src.selected_bonds.iter().filter_map(emap));
        self.highlighted_bonds
            .extend(src.highlighted_bonds.iter().filter_map(emap));
    }

    pub(crate) fn clear(&mut self) {
        self.aliases.clear();
        self.clear_selection();
        self.clear_highlighting();
    }
}
