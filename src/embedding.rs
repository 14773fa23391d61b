//! Backtracking enumeration of query-into-target embeddings.
//!
//! The enumerator is resumable: each [`find_next`](EmbeddingEnumerator::find_next)
//! call runs the search until the next complete embedding and leaves the
//! mapping in place for inspection, so callers can walk all embeddings
//! without materializing them. Matching semantics live entirely in an
//! [`EmbeddingRules`] implementation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::graph::{EdgeId, VertexId};
use crate::mol::Molecule;

/// Matching predicates plus a final veto over complete embeddings.
pub trait EmbeddingRules {
    fn atoms_match(&self, query: VertexId, target: VertexId) -> bool;

    fn bonds_match(&self, query_bond: EdgeId, target_bond: EdgeId) -> bool;

    /// Last look at a complete embedding. Returning false discards it and
    /// resumes the search.
    fn accept(&self, embedding: &Embedding<'_>) -> bool {
        let _ = embedding;
        true
    }
}

/// Read-only view of a complete (or partial) mapping, indexed by handle.
pub struct Embedding<'e> {
    vertices: &'e [Option<VertexId>],
    edges: &'e [Option<EdgeId>],
    preimages: &'e [Option<VertexId>],
}

impl Embedding<'_> {
    pub fn vertex_image(&self, q: VertexId) -> Option<VertexId> {
        self.vertices.get(q.index()).copied().flatten()
    }

    pub fn edge_image(&self, q: EdgeId) -> Option<EdgeId> {
        self.edges.get(q.index()).copied().flatten()
    }

    pub fn vertex_preimage(&self, t: VertexId) -> Option<VertexId> {
        self.preimages.get(t.index()).copied().flatten()
    }

    /// Query-to-target vertex images, indexed by query vertex.
    pub fn vertex_mapping(&self) -> &[Option<VertexId>] {
        self.vertices
    }

    pub fn edge_mapping(&self) -> &[Option<EdgeId>] {
        self.edges
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Found,
    NoMatch,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Running,
    Done,
}

struct Frame {
    qv: VertexId,
    candidates: Vec<VertexId>,
    pos: usize,
}

/// Enumerates embeddings of `query` into `target` under a rules object.
///
/// Ignored vertices take no part in the search: they are never mapped, and
/// edges touching them are never required. Ignores must be set before the
/// first `find_next`.
pub struct EmbeddingEnumerator<'a, R> {
    query: &'a Molecule,
    target: &'a Molecule,
    rules: R,
    q_ignored: Vec<bool>,
    t_ignored: Vec<bool>,
    order: Vec<VertexId>,
    stack: Vec<Frame>,
    q2t: Vec<Option<VertexId>>,
    q2t_edges: Vec<Option<EdgeId>>,
    t2q: Vec<Option<VertexId>>,
    phase: Phase,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, R: EmbeddingRules> EmbeddingEnumerator<'a, R> {
    pub fn new(query: &'a Molecule, target: &'a Molecule, rules: R) -> Self {
        EmbeddingEnumerator {
            query,
            target,
            rules,
            q_ignored: vec![false; query.graph().vertex_end()],
            t_ignored: vec![false; target.graph().vertex_end()],
            order: Vec::new(),
            stack: Vec::new(),
            q2t: vec![None; query.graph().vertex_end()],
            q2t_edges: vec![None; query.graph().edge_end()],
            t2q: vec![None; target.graph().vertex_end()],
            phase: Phase::NotStarted,
            cancel: None,
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn ignore_query_vertex(&mut self, v: VertexId) {
        debug_assert_eq!(self.phase, Phase::NotStarted, "ignores are fixed once the search runs");
        self.q_ignored[v.index()] = true;
    }

    pub fn ignore_target_vertex(&mut self, v: VertexId) {
        debug_assert_eq!(self.phase, Phase::NotStarted, "ignores are fixed once the search runs");
        self.t_ignored[v.index()] = true;
    }

    pub fn is_query_vertex_ignored(&self, v: VertexId) -> bool {
        self.q_ignored[v.index()]
    }

    pub fn is_target_vertex_ignored(&self, v: VertexId) -> bool {
        self.t_ignored[v.index()]
    }

    /// Installs a flag polled between candidate selections; raising it
    /// makes the search return [`SearchStatus::Cancelled`].
    pub fn set_cancel_token(&mut self, token: Arc<AtomicBool>) {
        self.cancel = Some(token);
    }

    /// Runs until the next acceptable embedding. `Found` leaves the
    /// mapping in place; calling again resumes behind it. After `NoMatch`
    /// or `Cancelled` the enumeration is over.
    pub fn find_next(&mut self) -> SearchStatus {
        match self.phase {
            Phase::Done => SearchStatus::NoMatch,
            Phase::NotStarted => {
                self.order = self.build_order();
                self.phase = Phase::Running;
                trace!(
                    "embedding search over {} query and {} target vertices",
                    self.order.len(),
                    self.target.atom_count()
                );
                if self.order.is_empty() {
                    self.phase = Phase::Done;
                    return if self.accept_current() {
                        SearchStatus::Found
                    } else {
                        SearchStatus::NoMatch
                    };
                }
                self.push_frame(0);
                self.advance()
            }
            Phase::Running => {
                let qv = match self.stack.last() {
                    Some(top) => top.qv,
                    None => {
                        self.phase = Phase::Done;
                        return SearchStatus::NoMatch;
                    }
                };
                self.unmap(qv);
                self.advance()
            }
        }
    }

    pub fn embedding(&self) -> Embedding<'_> {
        Embedding {
            vertices: &self.q2t,
            edges: &self.q2t_edges,
            preimages: &self.t2q,
        }
    }

    pub fn vertex_image(&self, q: VertexId) -> Option<VertexId> {
        self.q2t.get(q.index()).copied().flatten()
    }

    pub fn edge_image(&self, q: EdgeId) -> Option<EdgeId> {
        self.q2t_edges.get(q.index()).copied().flatten()
    }

    pub fn vertex_preimage(&self, t: VertexId) -> Option<VertexId> {
        self.t2q.get(t.index()).copied().flatten()
    }

    /// Query-to-target vertex images, indexed by query vertex.
    pub fn vertex_mapping(&self) -> &[Option<VertexId>] {
        &self.q2t
    }

    pub fn edge_mapping(&self) -> &[Option<EdgeId>] {
        &self.q2t_edges
    }

    /// Target-to-query preimages, indexed by target vertex.
    pub fn preimage_mapping(&self) -> &[Option<VertexId>] {
        &self.t2q
    }

    fn advance(&mut self) -> SearchStatus {
        loop {
            if self.is_cancelled() {
                self.phase = Phase::Done;
                return SearchStatus::Cancelled;
            }
            let depth = self.stack.len() - 1;
            let qv = self.stack[depth].qv;
            let mut descended = false;
            while self.stack[depth].pos < self.stack[depth].candidates.len() {
                let tv = self.stack[depth].candidates[self.stack[depth].pos];
                self.stack[depth].pos += 1;
                if !self.is_feasible(qv, tv) {
                    continue;
                }
                self.map(qv, tv);
                if self.stack.len() == self.order.len() {
                    if self.accept_current() {
                        return SearchStatus::Found;
                    }
                    self.unmap(qv);
                    continue;
                }
                let next = self.stack.len();
                self.push_frame(next);
                descended = true;
                break;
            }
            if descended {
                continue;
            }
            self.stack.pop();
            match self.stack.last() {
                Some(parent) => {
                    let pqv = parent.qv;
                    self.unmap(pqv);
                }
                None => {
                    self.phase = Phase::Done;
                    return SearchStatus::NoMatch;
                }
            }
        }
    }

    /// BFS over each query component, so every vertex after a component
    /// seed has an already-mapped neighbor to anchor its candidates.
    /// Seeds go highest-degree first.
    fn build_order(&self) -> Vec<VertexId> {
        let mut order = Vec::new();
        let mut seen = vec![false; self.query.graph().vertex_end()];
        let mut seeds: Vec<VertexId> = self
            .query
            .atoms()
            .filter(|v| !self.q_ignored[v.index()])
            .collect();
        seeds.sort_by_key(|&v| (std::cmp::Reverse(self.query.degree(v)), v));
        for seed in seeds {
            if seen[seed.index()] {
                continue;
            }
            seen[seed.index()] = true;
            let mut queue = VecDeque::from([seed]);
            while let Some(v) = queue.pop_front() {
                order.push(v);
                let mut next: Vec<VertexId> = self
                    .query
                    .neighbors(v)
                    .filter(|n| !self.q_ignored[n.index()] && !seen[n.index()])
                    .collect();
                next.sort_unstable();
                for n in next {
                    seen[n.index()] = true;
                    queue.push_back(n);
                }
            }
        }
        order
    }

    fn push_frame(&mut self, depth: usize) {
        let qv = self.order[depth];
        let anchor = self
            .query
            .incident_bonds(qv)
            .filter(|(_, qn)| !self.q_ignored[qn.index()])
            .find_map(|(_, qn)| self.q2t[qn.index()]);
        let mut candidates: Vec<VertexId> = match anchor {
            Some(ti) => self
                .target
                .neighbors(ti)
                .filter(|tv| !self.t_ignored[tv.index()])
                .collect(),
            None => self
                .target
                .atoms()
                .filter(|tv| !self.t_ignored[tv.index()])
                .collect(),
        };
        candidates.sort_unstable();
        self.stack.push(Frame { qv, candidates, pos: 0 });
    }

    fn is_feasible(&self, qv: VertexId, tv: VertexId) -> bool {
        if self.t2q[tv.index()].is_some() {
            return false;
        }
        if !self.rules.atoms_match(qv, tv) {
            return false;
        }
        for (qe, qn) in self.query.incident_bonds(qv) {
            if self.q_ignored[qn.index()] {
                continue;
            }
            if let Some(tn) = self.q2t[qn.index()] {
                match self.target.bond_between(tv, tn) {
                    Some(te) => {
                        if !self.rules.bonds_match(qe, te) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    }

    fn map(&mut self, qv: VertexId, tv: VertexId) {
        self.q2t[qv.index()] = Some(tv);
        self.t2q[tv.index()] = Some(qv);
        for (qe, qn) in self.query.incident_bonds(qv) {
            if self.q_ignored[qn.index()] {
                continue;
            }
            if let Some(tn) = self.q2t[qn.index()] {
                if let Some(te) = self.target.bond_between(tv, tn) {
                    self.q2t_edges[qe.index()] = Some(te);
                }
            }
        }
    }

    fn unmap(&mut self, qv: VertexId) {
        if let Some(tv) = self.q2t[qv.index()].take() {
            self.t2q[tv.index()] = None;
        }
        for (qe, _) in self.query.incident_bonds(qv) {
            self.q2t_edges[qe.index()] = None;
        }
    }

    fn accept_current(&self) -> bool {
        self.rules.accept(&Embedding {
            vertices: &self.q2t,
            edges: &self.q2t_edges,
            preimages: &self.t2q,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }
}
