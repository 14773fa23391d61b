//! Connected component decomposition with dense component ids.

use petgraph::unionfind::UnionFind;

use crate::graph::VertexId;
use crate::mol::Molecule;

/// Partition of a molecule's live vertices into connected components.
///
/// Component ids are dense, assigned in ascending order of each
/// component's lowest vertex. Ignored vertices belong to no component and
/// their incident bonds connect nothing.
pub struct ComponentDecomposer {
    component: Vec<Option<u32>>,
    components: Vec<Vec<VertexId>>,
    edge_counts: Vec<usize>,
}

impl ComponentDecomposer {
    pub fn new(mol: &Molecule) -> Self {
        Self::with_ignored(mol, |_| false)
    }

    pub fn with_ignored(mol: &Molecule, mut ignored: impl FnMut(VertexId) -> bool) -> Self {
        let n = mol.graph().vertex_end();
        let mut skip = vec![false; n];
        for v in mol.atoms() {
            skip[v.index()] = ignored(v);
        }

        let mut uf = UnionFind::<u32>::new(n);
        for e in mol.bonds() {
            let (a, b) = mol.graph().edge_ends(e);
            if !skip[a.index()] && !skip[b.index()] {
                uf.union(a.index() as u32, b.index() as u32);
            }
        }

        let mut dense: Vec<Option<u32>> = vec![None; n];
        let mut component: Vec<Option<u32>> = vec![None; n];
        let mut components: Vec<Vec<VertexId>> = Vec::new();
        for v in mol.atoms() {
            if skip[v.index()] {
                continue;
            }
            let root = uf.find_mut(v.index() as u32) as usize;
            let id = match dense[root] {
                Some(id) => id,
                None => {
                    let id = components.len() as u32;
                    dense[root] = Some(id);
                    components.push(Vec::new());
                    id
                }
            };
            component[v.index()] = Some(id);
            components[id as usize].push(v);
        }

        let mut edge_counts = vec![0usize; components.len()];
        for e in mol.bonds() {
            let (a, b) = mol.graph().edge_ends(e);
            if let (Some(ca), Some(_)) = (component[a.index()], component[b.index()]) {
                edge_counts[ca as usize] += 1;
            }
        }

        ComponentDecomposer {
            component,
            components,
            edge_counts,
        }
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Dense id of the component holding `v`; `None` for ignored or dead
    /// vertices.
    pub fn component_of(&self, v: VertexId) -> Option<usize> {
        self.component.get(v.index()).copied().flatten().map(|id| id as usize)
    }

    pub fn vertices_of(&self, id: usize) -> &[VertexId] {
        &self.components[id]
    }

    pub fn vertex_count(&self, id: usize) -> usize {
        self.components[id].len()
    }

    pub fn edge_count(&self, id: usize) -> usize {
        self.edge_counts[id]
    }

    /// `(vertex_count, edge_count)` per component, sorted; two molecules
    /// with different profiles cannot be isomorphic.
    pub fn size_profile(&self) -> Vec<(usize, usize)> {
        let mut profile: Vec<(usize, usize)> = (0..self.component_count())
            .map(|id| (self.vertex_count(id), self.edge_count(id)))
            .collect();
        profile.sort_unstable();
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondOrder;
    use crate::element::Element;

    fn disconnected() -> (Molecule, Vec<VertexId>) {
        // C-C-C and O=O
        let mut mol = Molecule::new();
        let vs: Vec<_> = (0..3).map(|_| mol.add_element(Element::C)).collect();
        mol.add_bond(vs[0], vs[1], BondOrder::Single);
        mol.add_bond(vs[1], vs[2], BondOrder::Single);
        let o1 = mol.add_element(Element::O);
        let o2 = mol.add_element(Element::O);
        mol.add_bond(o1, o2, BondOrder::Double);
        let mut all = vs;
        all.push(o1);
        all.push(o2);
        (mol, all)
    }

    #[test]
    fn two_fragments() {
        let (mol, vs) = disconnected();
        let decomp = ComponentDecomposer::new(&mol);
        assert_eq!(decomp.component_count(), 2);
        assert_eq!(decomp.component_of(vs[0]), decomp.component_of(vs[2]));
        assert_ne!(decomp.component_of(vs[0]), decomp.component_of(vs[3]));
        assert_eq!(decomp.size_profile(), vec![(2, 1), (3, 2)]);
    }

    #[test]
    fn ignoring_a_cut_vertex_splits() {
        let mut mol = Molecule::new();
        let vs: Vec<_> = (0..3).map(|_| mol.add_element(Element::C)).collect();
        mol.add_bond(vs[0], vs[1], BondOrder::Single);
        mol.add_bond(vs[1], vs[2], BondOrder::Single);
        let middle = vs[1];
        let decomp = ComponentDecomposer::with_ignored(&mol, |v| v == middle);
        assert_eq!(decomp.component_count(), 2);
        assert_eq!(decomp.component_of(middle), None);
        assert_eq!(decomp.size_profile(), vec![(1, 0), (1, 0)]);
    }

    #[test]
    fn ring_edge_count() {
        let mut mol = Molecule::new();
        let vs: Vec<_> = (0..6).map(|_| mol.add_element(Element::C)).collect();
        for i in 0..6 {
            mol.add_bond(vs[i], vs[(i + 1) % 6], BondOrder::Single);
        }
        let decomp = ComponentDecomposer::new(&mol);
        assert_eq!(decomp.component_count(), 1);
        assert_eq!(decomp.vertex_count(0), 6);
        assert_eq!(decomp.edge_count(0), 6);
        assert_eq!(decomp.vertices_of(0).len(), 6);
    }

    #[test]
    fn ids_stable_after_removal() {
        let (mut mol, vs) = disconnected();
        mol.remove_atoms(&[vs[1]]).unwrap();
        let decomp = ComponentDecomposer::new(&mol);
        // C . C . O=O
        assert_eq!(decomp.component_count(), 3);
        assert_eq!(decomp.size_profile(), vec![(1, 0), (1, 0), (2, 1)]);
    }
}
