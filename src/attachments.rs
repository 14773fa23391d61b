//! Template attachment points: named connection slots on template atoms.

use std::collections::BTreeSet;

use crate::graph::VertexId;

/// One attachment slot: `atom` is the template atom, `dest` the vertex the
/// slot connects to, `id` the slot name ("Al", "Br", ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAttachmentPoint {
    pub atom: VertexId,
    pub dest: VertexId,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentPoints {
    points: Vec<TemplateAttachmentPoint>,
}

impl AttachmentPoints {
    pub(crate) fn add(&mut self, atom: VertexId, dest: VertexId, id: impl Into<String>) {
        self.points.push(TemplateAttachmentPoint {
            atom,
            dest,
            id: id.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateAttachmentPoint> {
        self.points.iter()
    }

    pub fn for_atom(&self, atom: VertexId) -> impl Iterator<Item = &TemplateAttachmentPoint> {
        self.points.iter().filter(move |p| p.atom == atom)
    }

    /// Destination vertex of the slot named `id` on `atom`.
    pub fn find_by_id(&self, atom: VertexId, id: &str) -> Option<VertexId> {
        self.points
            .iter()
            .find(|p| p.atom == atom && p.id == id)
            .map(|p| p.dest)
    }

    /// Slot name under which `dest` is attached to `atom`.
    pub fn find_by_dest(&self, atom: VertexId, dest: VertexId) -> Option<&str> {
        self.points
            .iter()
            .find(|p| p.atom == atom && p.dest == dest)
            .map(|p| p.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(crate) fn remove_for_atom(&mut self, atom: VertexId) {
        self.points.retain(|p| p.atom != atom);
    }

    pub(crate) fn purge_removed(&mut self, removed: &BTreeSet<VertexId>) {
        self.points
            .retain(|p| !removed.contains(&p.atom) && !removed.contains(&p.dest));
    }

    /// Carries points whose both ends are mapped.
    pub(crate) fn translate_from(&mut self, src: &AttachmentPoints, mapping: &[Option<VertexId>]) {
        let map = |u: VertexId| mapping.get(u.index()).copied().flatten();
        for p in src.iter() {
            if let (Some(atom), Some(dest)) = (map(p.atom), map(p.dest)) {
                self.points.push(TemplateAttachmentPoint {
                    atom,
                    dest,
                    id: p.id.clone(),
                });
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VertexId {
        VertexId::new(i)
    }

    #[test]
    fn lookup_by_id_and_dest() {
        let mut aps = AttachmentPoints::default();
        aps.add(v(0), v(1), "Al");
        aps.add(v(0), v(2), "Br");
        aps.add(v(3), v(4), "Al");
        assert_eq!(aps.find_by_id(v(0), "Br"), Some(v(2)));
        assert_eq!(aps.find_by_id(v(0), "Cx"), None);
        assert_eq!(aps.find_by_dest(v(0), v(1)), Some("Al"));
        assert_eq!(aps.for_atom(v(0)).count(), 2);
    }

    #[test]
    fn purge_drops_either_end() {
        let mut aps = AttachmentPoints::default();
        aps.add(v(0), v(1), "Al");
        aps.add(v(2), v(3), "Al");
        aps.purge_removed(&BTreeSet::from([v(1), v(2)]));
        assert!(aps.is_empty());
    }

    #[test]
    fn translate_requires_both_ends() {
        let mut src = AttachmentPoints::default();
        src.add(v(0), v(1), "Al");
        src.add(v(0), v(2), "Br");
        let mapping = vec![Some(v(5)), Some(v(6)), None];
        let mut dst = AttachmentPoints::default();
        dst.translate_from(&src, &mapping);
        assert_eq!(dst.len(), 1);
        assert_eq!(dst.find_by_id(v(5), "Al"), Some(v(6)));
    }
}
