use thiserror::Error;

use crate::graph::{EdgeId, VertexId};
use crate::sgroups::SGroupId;

/// Referential integrity violation in an operation's inputs.
///
/// Editing operations validate before mutating; when one of these comes
/// back, the molecule is unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StructuralError {
    #[error("no vertex {0}")]
    UnknownVertex(VertexId),

    #[error("no edge {0}")]
    UnknownEdge(EdgeId),

    #[error("no s-group {0}")]
    UnknownSGroup(SGroupId),

    /// An explicitly listed edge reaches outside the vertex subset of a
    /// merge.
    #[error("edge {edge} has endpoint {vertex} outside the vertex subset")]
    ForeignEndpoint { edge: EdgeId, vertex: VertexId },

    #[error("vertex {vertex} is not an endpoint of edge {edge}")]
    NotAnEndpoint { edge: EdgeId, vertex: VertexId },

    #[error("moving edge {edge} onto vertex {vertex} would create a self-loop")]
    WouldSelfLoop { edge: EdgeId, vertex: VertexId },

    #[error("an edge between {a} and {b} already exists")]
    ParallelEdge { a: VertexId, b: VertexId },

    #[error("s-group parent chain through {0} would form a cycle")]
    ParentCycle(SGroupId),

    #[error("vertex {vertex} is not a neighbor of {center}")]
    NotANeighbor { center: VertexId, vertex: VertexId },

    #[error("pyramid of {center} repeats vertex {vertex}")]
    DuplicatePyramidEntry { center: VertexId, vertex: VertexId },

    #[error("pyramid of {0} needs at least three explicit neighbors")]
    IncompletePyramid(VertexId),

    #[error("cis/trans frame of edge {0} is missing a reference substituent")]
    MissingReference(EdgeId),

    #[error("vertex {vertex} cannot be a substituent of edge {edge}")]
    InvalidSubstituent { edge: EdgeId, vertex: VertexId },

    #[error("edge {0} is not a double bond")]
    NotADoubleBond(EdgeId),

    /// A multiple group whose leading member atoms are not its parent
    /// atoms cannot be collapsed positionally.
    #[error("member list of multiple group {0} does not start with its parent atoms")]
    InconsistentMultipleGroup(SGroupId),
}

/// The molecule's current state does not admit the requested operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedOperation {
    #[error("multiple group {0} is already collapsed")]
    AlreadyCollapsed(SGroupId),

    #[error("s-group {0} is not a multiple group")]
    NotAMultipleGroup(SGroupId),
}

/// Malformed caller-supplied parameters.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("NONE cannot be combined with other match flags")]
    ConflictingFlags,
}

/// Any failure a molecule operation can report.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperation),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
