//! Indexed vertex/edge store underneath [`Molecule`](crate::Molecule).
//!
//! Handles stay stable across arbitrary removals: a freed slot is recycled
//! by later insertions (LIFO), but never while a structural operation is in
//! flight, so overlay layers can key their entries by raw handle. Edge
//! endpoints are stored in insertion order; that order is meaningful to
//! directional overlays and changes only through the crate-internal
//! re-pointing primitive used by `flip_bond`.

use std::fmt;

/// Stable handle of a vertex within one graph instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(u32);

/// Stable handle of an edge within one graph instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(u32);

impl VertexId {
    pub fn new(index: usize) -> Self {
        VertexId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub fn new(index: usize) -> Self {
        EdgeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

enum Slot<T> {
    Occupied(T),
    Free { next_free: Option<u32> },
}

/// Slot arena with a LIFO free list.
///
/// Also backs the S-group table, which needs the same stable-handle
/// discipline as vertices and edges.
pub(crate) struct Pool<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Pool<T> {
    pub(crate) fn new() -> Self {
        Pool {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> u32 {
        self.len += 1;
        match self.free_head {
            Some(idx) => {
                let next = match self.slots[idx as usize] {
                    Slot::Free { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free list points at occupied slot"),
                };
                self.free_head = next;
                self.slots[idx as usize] = Slot::Occupied(value);
                idx
            }
            None => {
                self.slots.push(Slot::Occupied(value));
                (self.slots.len() - 1) as u32
            }
        }
    }

    pub(crate) fn remove(&mut self, idx: u32) -> Option<T> {
        match self.slots.get_mut(idx as usize) {
            Some(slot @ Slot::Occupied(_)) => {
                let old = std::mem::replace(
                    slot,
                    Slot::Free {
                        next_free: self.free_head,
                    },
                );
                self.free_head = Some(idx);
                self.len -= 1;
                match old {
                    Slot::Occupied(value) => Some(value),
                    Slot::Free { .. } => unreachable!(),
                }
            }
            _ => None,
        }
    }

    pub(crate) fn get(&self, idx: u32) -> Option<&T> {
        match self.slots.get(idx as usize) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, idx: u32) -> Option<&mut T> {
        match self.slots.get_mut(idx as usize) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn contains(&self, idx: u32) -> bool {
        matches!(self.slots.get(idx as usize), Some(Slot::Occupied(_)))
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Exclusive upper bound of live indices; lets callers size flat
    /// index-keyed scratch arrays.
    pub(crate) fn end(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match slot {
            Slot::Occupied(value) => Some((i as u32, value)),
            Slot::Free { .. } => None,
        })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Occupied(value) => Some((i as u32, value)),
                Slot::Free { .. } => None,
            })
    }

    pub(crate) fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter().map(|(i, _)| i)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Pool::new()
    }
}

impl<T: PartialEq> PartialEq for Pool<T> {
    fn eq(&self, other: &Self) -> bool {
        // free-list layout is irrelevant; occupied (index, value) pairs decide
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Clone> Clone for Pool<T> {
    fn clone(&self) -> Self {
        let slots = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Occupied(value) => Slot::Occupied(value.clone()),
                Slot::Free { next_free } => Slot::Free {
                    next_free: *next_free,
                },
            })
            .collect();
        Pool {
            slots,
            free_head: self.free_head,
            len: self.len,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct VertexSlot<V> {
    data: V,
    adj: Vec<(EdgeId, VertexId)>,
}

#[derive(Debug, Clone, PartialEq)]
struct EdgeSlot<E> {
    data: E,
    beg: VertexId,
    end: VertexId,
}

/// Undirected graph with stable integer handles and payloads on both
/// vertices and edges.
///
/// Accessors taking a handle panic when the handle is dead, the way
/// petgraph index lookups do; `try_` variants return `Option` for
/// callers unsure whether a handle is still live.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph<V, E> {
    vertices: Pool<VertexSlot<V>>,
    edges: Pool<EdgeSlot<E>>,
}

impl<V, E> Graph<V, E> {
    pub fn new() -> Self {
        Graph {
            vertices: Pool::new(),
            edges: Pool::new(),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
    }

    pub fn add_vertex(&mut self, data: V) -> VertexId {
        VertexId(self.vertices.insert(VertexSlot {
            data,
            adj: Vec::new(),
        }))
    }

    /// Adds an undirected edge; the `(a, b)` order is preserved as the
    /// edge's begin/end orientation.
    ///
    /// Panics when either endpoint is dead or when `a == b` (molecular
    /// graphs have no self-loops).
    pub fn add_edge(&mut self, a: VertexId, b: VertexId, data: E) -> EdgeId {
        assert!(a != b, "self-loop {a}-{b}");
        assert!(self.vertices.contains(a.0), "no vertex {a}");
        assert!(self.vertices.contains(b.0), "no vertex {b}");
        let e = EdgeId(self.edges.insert(EdgeSlot { data, beg: a, end: b }));
        self.vertices.get_mut(a.0).unwrap().adj.push((e, b));
        self.vertices.get_mut(b.0).unwrap().adj.push((e, a));
        e
    }

    /// Removes a vertex and every edge incident to it.
    pub fn remove_vertex(&mut self, v: VertexId) -> Option<V> {
        let incident: Vec<EdgeId> = self.vertices.get(v.0)?.adj.iter().map(|&(e, _)| e).collect();
        for e in incident {
            self.remove_edge(e);
        }
        self.vertices.remove(v.0).map(|slot| slot.data)
    }

    pub fn remove_edge(&mut self, e: EdgeId) -> Option<E> {
        let slot = self.edges.remove(e.0)?;
        for endpoint in [slot.beg, slot.end] {
            if let Some(vs) = self.vertices.get_mut(endpoint.0) {
                vs.adj.retain(|&(adj_e, _)| adj_e != e);
            }
        }
        Some(slot.data)
    }

    pub fn vertex(&self, v: VertexId) -> &V {
        &self.vertices.get(v.0).unwrap_or_else(|| panic!("no vertex {v}")).data
    }

    pub fn vertex_mut(&mut self, v: VertexId) -> &mut V {
        &mut self
            .vertices
            .get_mut(v.0)
            .unwrap_or_else(|| panic!("no vertex {v}"))
            .data
    }

    pub fn try_vertex(&self, v: VertexId) -> Option<&V> {
        self.vertices.get(v.0).map(|slot| &slot.data)
    }

    pub fn edge(&self, e: EdgeId) -> &E {
        &self.edges.get(e.0).unwrap_or_else(|| panic!("no edge {e}")).data
    }

    pub fn edge_mut(&mut self, e: EdgeId) -> &mut E {
        &mut self
            .edges
            .get_mut(e.0)
            .unwrap_or_else(|| panic!("no edge {e}"))
            .data
    }

    pub fn try_edge(&self, e: EdgeId) -> Option<&E> {
        self.edges.get(e.0).map(|slot| &slot.data)
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains(v.0)
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edges.contains(e.0)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Exclusive upper bound of live vertex indices.
    pub fn vertex_end(&self) -> usize {
        self.vertices.end()
    }

    /// Exclusive upper bound of live edge indices.
    pub fn edge_end(&self) -> usize {
        self.edges.end()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.indices().map(VertexId)
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.indices().map(EdgeId)
    }

    /// Iterates `(edge, neighbor)` pairs around `v`, in no meaningful order.
    pub fn neighbors(&self, v: VertexId) -> impl Iterator<Item = (EdgeId, VertexId)> + '_ {
        self.vertices
            .get(v.0)
            .unwrap_or_else(|| panic!("no vertex {v}"))
            .adj
            .iter()
            .copied()
    }

    pub fn neighbor_vertices(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.neighbors(v).map(|(_, n)| n)
    }

    pub fn degree(&self, v: VertexId) -> usize {
        self.vertices
            .get(v.0)
            .unwrap_or_else(|| panic!("no vertex {v}"))
            .adj
            .len()
    }

    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.vertices
            .get(a.0)?
            .adj
            .iter()
            .find(|&&(_, n)| n == b)
            .map(|&(e, _)| e)
    }

    /// Stored `(begin, end)` endpoints of an edge.
    pub fn edge_ends(&self, e: EdgeId) -> (VertexId, VertexId) {
        let slot = self.edges.get(e.0).unwrap_or_else(|| panic!("no edge {e}"));
        (slot.beg, slot.end)
    }

    pub fn try_edge_ends(&self, e: EdgeId) -> Option<(VertexId, VertexId)> {
        self.edges.get(e.0).map(|slot| (slot.beg, slot.end))
    }

    /// Given one endpoint of `e`, returns the other.
    pub fn other_end(&self, e: EdgeId, v: VertexId) -> VertexId {
        let (beg, end) = self.edge_ends(e);
        if beg == v {
            end
        } else {
            debug_assert_eq!(end, v, "vertex {v} is not an endpoint of edge {e}");
            beg
        }
    }

    /// Re-points one endpoint of `e` from `old_end` to `new_end`, keeping
    /// the edge handle. Callers (the flip operations) validate that the
    /// move does not create a self-loop or a parallel edge and notify
    /// overlays first.
    pub(crate) fn change_edge_end(&mut self, e: EdgeId, old_end: VertexId, new_end: VertexId) {
        let slot = self.edges.get_mut(e.0).unwrap_or_else(|| panic!("no edge {e}"));
        let other = if slot.beg == old_end {
            slot.beg = new_end;
            slot.end
        } else {
            debug_assert_eq!(slot.end, old_end, "vertex {old_end} is not an endpoint of {e}");
            slot.end = new_end;
            slot.beg
        };
        self.vertices
            .get_mut(old_end.0)
            .unwrap_or_else(|| panic!("no vertex {old_end}"))
            .adj
            .retain(|&(adj_e, _)| adj_e != e);
        self.vertices
            .get_mut(new_end.0)
            .unwrap_or_else(|| panic!("no vertex {new_end}"))
            .adj
            .push((e, other));
        for (adj_e, n) in &mut self.vertices.get_mut(other.0).unwrap().adj {
            if *adj_e == e {
                *n = new_end;
            }
        }
    }
}

impl<V, E> Default for Graph<V, E> {
    fn default() -> Self {
        Self::new()
    }
}
