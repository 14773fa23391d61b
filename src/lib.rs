pub mod annotations;
pub mod atom;
pub mod attachments;
pub mod bond;
pub mod cis_trans;
pub mod components;
pub mod editor;
pub mod element;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod matcher;
pub mod mol;
pub mod sgroups;
pub mod stereocenters;

pub use annotations::Annotations;
pub use atom::{Atom, AtomKind, Radical};
pub use attachments::{AttachmentPoints, TemplateAttachmentPoint};
pub use bond::{Bond, BondDirection, BondOrder};
pub use cis_trans::{CisTrans, CisTransBond, CisTransBonds};
pub use components::ComponentDecomposer;
pub use editor::Mapping;
pub use element::Element;
pub use embedding::{Embedding, EmbeddingEnumerator, EmbeddingRules, SearchStatus};
pub use error::{Error, StructuralError, UnsupportedOperation, ValidationError};
pub use graph::{EdgeId, Graph, VertexId};
pub use matcher::{structure_key, ExactMatcher, MatchFlags, SubstructureMatcher};
pub use mol::Molecule;
pub use sgroups::{
    Connectivity, DataGroup, MultipleGroup, RepeatingUnit, SGroup, SGroupId, SGroupKind, SGroups,
    Superatom, SuperatomAttachmentPoint,
};
pub use stereocenters::{Stereocenter, Stereocenters, StereoType};
