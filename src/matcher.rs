//! Exact and substructure matching with chemistry-aware predicates.
//!
//! Both matchers drive an [`EmbeddingEnumerator`] with the same atom and
//! bond compatibility rules; they differ in totality. [`ExactMatcher`]
//! demands a bijection between the non-ignored graphs and checks stereo
//! consistency in both directions; [`SubstructureMatcher`] embeds the
//! query anywhere in the target and checks stereo one way only.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use bitflags::bitflags;
use tracing::debug;

use crate::atom::{Atom, AtomKind};
use crate::cis_trans::CisTransBond;
use crate::components::ComponentDecomposer;
use crate::embedding::{Embedding, EmbeddingEnumerator, EmbeddingRules, SearchStatus};
use crate::error::ValidationError;
use crate::graph::{EdgeId, VertexId};
use crate::mol::Molecule;
use crate::stereocenters::pyramid_parity;

bitflags! {
    /// Which atom properties take part in matching.
    ///
    /// `NONE` is an explicit "connectivity and atom kind only" request and
    /// cannot be combined with the other flags. `FRAGMENTS` swaps the
    /// component-count pruning step for a cheap count bound.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MatchFlags: u32 {
        const NONE = 1 << 0;
        const ELECTRONS = 1 << 1;
        const ISOTOPE = 1 << 2;
        const STEREO = 1 << 3;
        const FRAGMENTS = 1 << 4;
        const ALL = Self::ELECTRONS.bits() | Self::ISOTOPE.bits() | Self::STEREO.bits();
    }
}

fn validate_flags(flags: MatchFlags) -> Result<(), ValidationError> {
    if flags.contains(MatchFlags::NONE) && flags != MatchFlags::NONE {
        return Err(ValidationError::ConflictingFlags);
    }
    Ok(())
}

/// Exact (bijective) matcher over two molecules.
///
/// Terminal hydrogens are ignored on both sides, except hydrogens with an
/// explicit isotope when `ISOTOPE` is requested. Setup runs the cheap
/// rejections once; `find` / `find_next` then enumerate acceptable
/// bijections.
pub struct ExactMatcher<'a> {
    enumerator: EmbeddingEnumerator<'a, ChemRules<'a>>,
    doomed: bool,
}

impl<'a> ExactMatcher<'a> {
    pub fn new(
        query: &'a Molecule,
        target: &'a Molecule,
        flags: MatchFlags,
    ) -> Result<Self, ValidationError> {
        validate_flags(flags)?;
        let q_skip = hydrogen_mask(query, flags);
        let t_skip = hydrogen_mask(target, flags);
        let (qv, qe) = masked_counts(query, &q_skip);
        let (tv, te) = masked_counts(target, &t_skip);
        let mut doomed = qv != tv || qe != te;
        if !doomed {
            doomed = pruned(query, target, &q_skip, &t_skip, (qv, qe), (tv, te), flags);
        }
        if doomed {
            debug!(
                "exact match rejected at setup: query {}v/{}e vs target {}v/{}e",
                qv, qe, tv, te
            );
        }
        let rules = ChemRules { query, target, flags, mutual: true };
        let mut enumerator = EmbeddingEnumerator::new(query, target, rules);
        for v in query.atoms() {
            if q_skip[v.index()] {
                enumerator.ignore_query_vertex(v);
            }
        }
        for v in target.atoms() {
            if t_skip[v.index()] {
                enumerator.ignore_target_vertex(v);
            }
        }
        Ok(ExactMatcher { enumerator, doomed })
    }

    pub fn find(&mut self) -> SearchStatus {
        self.find_next()
    }

    pub fn find_next(&mut self) -> SearchStatus {
        if self.doomed {
            return SearchStatus::NoMatch;
        }
        self.enumerator.find_next()
    }

    /// Query-to-target images of the last found mapping, per query vertex.
    pub fn query_mapping(&self) -> &[Option<VertexId>] {
        self.enumerator.vertex_mapping()
    }

    /// Target-to-query preimages of the last found mapping, per target vertex.
    pub fn target_mapping(&self) -> &[Option<VertexId>] {
        self.enumerator.preimage_mapping()
    }

    pub fn set_cancel_token(&mut self, token: Arc<AtomicBool>) {
        self.enumerator.set_cancel_token(token);
    }
}

/// Substructure (monomorphism) matcher.
///
/// Every query atom must map, including explicit hydrogens; nothing is
/// pre-ignored. Stereo requirements flow from query to target only, so a
/// target may carry configurations the query does not ask about.
pub struct SubstructureMatcher<'a> {
    enumerator: EmbeddingEnumerator<'a, ChemRules<'a>>,
    doomed: bool,
}

impl<'a> SubstructureMatcher<'a> {
    pub fn new(
        query: &'a Molecule,
        target: &'a Molecule,
        flags: MatchFlags,
    ) -> Result<Self, ValidationError> {
        validate_flags(flags)?;
        let doomed = flags.contains(MatchFlags::FRAGMENTS)
            && (query.atom_count() > target.atom_count()
                || query.bond_count() > target.bond_count());
        if doomed {
            debug!(
                "substructure match rejected at setup: query {}v/{}e vs target {}v/{}e",
                query.atom_count(),
                query.bond_count(),
                target.atom_count(),
                target.bond_count()
            );
        }
        let rules = ChemRules { query, target, flags, mutual: false };
        let enumerator = EmbeddingEnumerator::new(query, target, rules);
        Ok(SubstructureMatcher { enumerator, doomed })
    }

    pub fn find(&mut self) -> SearchStatus {
        self.find_next()
    }

    pub fn find_next(&mut self) -> SearchStatus {
        if self.doomed {
            return SearchStatus::NoMatch;
        }
        self.enumerator.find_next()
    }

    pub fn query_mapping(&self) -> &[Option<VertexId>] {
        self.enumerator.vertex_mapping()
    }

    pub fn target_mapping(&self) -> &[Option<VertexId>] {
        self.enumerator.preimage_mapping()
    }

    pub fn set_cancel_token(&mut self, token: Arc<AtomicBool>) {
        self.enumerator.set_cancel_token(token);
    }
}

/// Shared matching rules: kind equality, optional electron/isotope fields,
/// bond order equality, stereo verification at acceptance.
struct ChemRules<'a> {
    query: &'a Molecule,
    target: &'a Molecule,
    flags: MatchFlags,
    mutual: bool,
}

impl EmbeddingRules for ChemRules<'_> {
    fn atoms_match(&self, q: VertexId, t: VertexId) -> bool {
        atoms_compatible(self.query.atom(q), self.target.atom(t), self.flags)
    }

    fn bonds_match(&self, qe: EdgeId, te: EdgeId) -> bool {
        self.query.bond(qe).order == self.target.bond(te).order
    }

    fn accept(&self, embedding: &Embedding<'_>) -> bool {
        if !self.flags.contains(MatchFlags::STEREO) {
            return true;
        }
        self.stereo_consistent(embedding)
    }
}

impl ChemRules<'_> {
    fn stereo_consistent(&self, emb: &Embedding<'_>) -> bool {
        for (qv, qc) in self.query.stereocenters().iter() {
            let Some(tv) = emb.vertex_image(qv) else { continue };
            let Some(tc) = self.target.stereocenters().get(tv) else {
                return false;
            };
            if qc.kind != tc.kind {
                return false;
            }
            // Substituents with no image on either side fall back to the
            // implicit slot, so the parities stay comparable.
            let mapped = qc.pyramid.map(|slot| slot.and_then(|v| emb.vertex_image(v)));
            let visible = tc
                .pyramid
                .map(|slot| slot.filter(|&v| emb.vertex_preimage(v).is_some()));
            if pyramid_parity(&mapped, &visible) != Some(true) {
                return false;
            }
        }
        for (qe, q_entry) in self.query.cis_trans_bonds().iter() {
            let Some(te) = emb.edge_image(qe) else { continue };
            let Some(t_entry) = self.target.cis_trans_bonds().get(te) else {
                return false;
            };
            if !cis_trans_consistent(self.query, self.target, emb, qe, q_entry, te, t_entry) {
                return false;
            }
        }
        if self.mutual {
            for (tv, _) in self.target.stereocenters().iter() {
                match emb.vertex_preimage(tv) {
                    Some(qv) if self.query.stereocenters().contains(qv) => {}
                    _ => return false,
                }
            }
            for (te, _) in self.target.cis_trans_bonds().iter() {
                let Some((tb, tn)) = self.target.bond_endpoints(te) else {
                    continue;
                };
                let (Some(qa), Some(qb)) = (emb.vertex_preimage(tb), emb.vertex_preimage(tn))
                else {
                    return false;
                };
                match self.query.bond_between(qa, qb) {
                    Some(qe) if self.query.cis_trans_bonds().contains(qe) => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

fn atoms_compatible(qa: &Atom, ta: &Atom, flags: MatchFlags) -> bool {
    if !kinds_compatible(&qa.kind, &ta.kind) {
        return false;
    }
    if flags.contains(MatchFlags::ELECTRONS)
        && (qa.charge != ta.charge || qa.valence != ta.valence || qa.radical != ta.radical)
    {
        return false;
    }
    if flags.contains(MatchFlags::ISOTOPE) && qa.isotope != ta.isotope {
        return false;
    }
    true
}

/// Elements by atomic number, pseudoatoms by label, any R-site matches any
/// other R-site.
fn kinds_compatible(q: &AtomKind, t: &AtomKind) -> bool {
    match (q, t) {
        (AtomKind::Element(a), AtomKind::Element(b)) => a == b,
        (AtomKind::Pseudo(a), AtomKind::Pseudo(b)) => a == b,
        (AtomKind::RSite(_), AtomKind::RSite(_)) => true,
        _ => false,
    }
}

/// Verifies that a target cis/trans entry encodes the same geometry as a
/// query entry under the mapping, whichever reference substituents and
/// edge orientation either side happens to record.
fn cis_trans_consistent(
    query: &Molecule,
    target: &Molecule,
    emb: &Embedding<'_>,
    qe: EdgeId,
    q_entry: &CisTransBond,
    te: EdgeId,
    t_entry: &CisTransBond,
) -> bool {
    let Some((qb, _)) = query.bond_endpoints(qe) else {
        return true;
    };
    let Some((tb, tn)) = target.bond_endpoints(te) else {
        return true;
    };
    let qb_image = emb.vertex_image(qb);
    let swapped = if qb_image == Some(tb) {
        false
    } else if qb_image == Some(tn) {
        true
    } else {
        return false;
    };
    // Resolve each query side through the mapping, falling back to the
    // partner (one parity flip) when the reference has no image.
    let mapped_side = |reference: usize| -> Option<(VertexId, bool)> {
        if let Some(img) = q_entry.substituents[reference].and_then(|v| emb.vertex_image(v)) {
            return Some((img, false));
        }
        q_entry.substituents[reference + 1]
            .and_then(|v| emb.vertex_image(v))
            .map(|img| (img, true))
    };
    let (beg_ref, end_ref) = match (mapped_side(0), mapped_side(2)) {
        (Some(b), Some(e)) => (b, e),
        // a side with no mapped substituent leaves nothing to verify
        _ => return true,
    };
    // A recorded substituent resolves by slot; an unrecorded neighbor of
    // the right endpoint can only be the implicit partner of that side's
    // reference, one flip away.
    let locate = |image: VertexId, on_end_side: bool| -> Option<usize> {
        if let Some(j) = t_entry.slot_of(image) {
            return Some(j);
        }
        let (anchor, far) = if on_end_side { (tn, tb) } else { (tb, tn) };
        let base = if on_end_side { 2 } else { 0 };
        if t_entry.substituents[base + 1].is_none()
            && image != far
            && target.neighbors(anchor).any(|o| o == image)
        {
            Some(base + 1)
        } else {
            None
        }
    };
    let Some(jb) = locate(beg_ref.0, swapped) else {
        return false;
    };
    let Some(je) = locate(end_ref.0, !swapped) else {
        return false;
    };
    if (jb < 2) == swapped {
        return false;
    }
    if (jb < 2) == (je < 2) {
        return false;
    }
    let mut parity = t_entry.parity;
    if jb % 2 == 1 {
        parity = parity.flipped();
    }
    if je % 2 == 1 {
        parity = parity.flipped();
    }
    if beg_ref.1 {
        parity = parity.flipped();
    }
    if end_ref.1 {
        parity = parity.flipped();
    }
    parity == q_entry.parity
}

/// Terminal hydrogens both matchers may skip: degree-one H atoms, unless
/// `ISOTOPE` keeps an explicitly labeled one.
fn hydrogen_mask(mol: &Molecule, flags: MatchFlags) -> Vec<bool> {
    let mut mask = vec![false; mol.graph().vertex_end()];
    for v in mol.atoms() {
        let atom = mol.atom(v);
        if !atom.is_hydrogen() || mol.degree(v) != 1 {
            continue;
        }
        if flags.contains(MatchFlags::ISOTOPE) && atom.isotope != 0 {
            continue;
        }
        mask[v.index()] = true;
    }
    mask
}

fn masked_counts(mol: &Molecule, skip: &[bool]) -> (usize, usize) {
    let vertices = mol.atoms().filter(|v| !skip[v.index()]).count();
    let bonds = mol
        .bonds()
        .filter(|&e| match mol.bond_endpoints(e) {
            Some((a, b)) => !skip[a.index()] && !skip[b.index()],
            None => false,
        })
        .count();
    (vertices, bonds)
}

fn pruned(
    query: &Molecule,
    target: &Molecule,
    q_skip: &[bool],
    t_skip: &[bool],
    (qv, qe): (usize, usize),
    (tv, te): (usize, usize),
    flags: MatchFlags,
) -> bool {
    if flags.contains(MatchFlags::FRAGMENTS) {
        return qv > tv || qe > te;
    }
    let qc = ComponentDecomposer::with_ignored(query, |v| q_skip[v.index()]).component_count();
    let tc = ComponentDecomposer::with_ignored(target, |v| t_skip[v.index()]).component_count();
    qc > tc
}

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Order-independent content hash over atoms and bonds.
///
/// Terminal hydrogens and their bonds are left out, mirroring the exact
/// matcher's default view: unequal keys rule out a full-flag exact match,
/// equal keys promise nothing.
pub fn structure_key(mol: &Molecule) -> u64 {
    let skip = hydrogen_mask(mol, MatchFlags::empty());
    let mut vertex_count = 0u64;
    let mut vertex_sum = 0u64;
    for v in mol.atoms().filter(|v| !skip[v.index()]) {
        vertex_count += 1;
        vertex_sum = vertex_sum.wrapping_add(atom_key(mol.atom(v)));
    }
    let mut edge_count = 0u64;
    let mut edge_sum = 0u64;
    for e in mol.bonds() {
        let Some((a, b)) = mol.bond_endpoints(e) else { continue };
        if skip[a.index()] || skip[b.index()] {
            continue;
        }
        edge_count += 1;
        edge_sum = edge_sum.wrapping_add(fold_word(FNV_OFFSET, mol.bond(e).order as u64));
    }
    let mut key = FNV_OFFSET;
    for word in [vertex_count, edge_count, vertex_sum, edge_sum] {
        key = fold_word(key, word);
    }
    key
}

fn atom_key(atom: &Atom) -> u64 {
    let mut h = FNV_OFFSET;
    match &atom.kind {
        AtomKind::Element(el) => {
            h = fold_word(h, 1);
            h = fold_word(h, *el as u64);
        }
        AtomKind::Pseudo(label) => {
            h = fold_word(h, 2);
            for byte in label.bytes() {
                h = (h ^ u64::from(byte)).wrapping_mul(FNV_PRIME);
            }
        }
        // R-sites match each other regardless of index, so the index must
        // stay out of the key.
        AtomKind::RSite(_) => {
            h = fold_word(h, 3);
        }
    }
    h = fold_word(h, atom.charge as u8 as u64);
    h = fold_word(h, u64::from(atom.isotope));
    h = fold_word(h, atom.valence.map_or(0, |v| u64::from(v) + 1));
    fold_word(h, atom.radical as u64)
}

fn fold_word(mut h: u64, word: u64) -> u64 {
    for byte in word.to_le_bytes() {
        h = (h ^ u64::from(byte)).wrapping_mul(FNV_PRIME);
    }
    h
}
