use thiserror::Error;

/// Errors reported by the intersection service.
///
/// These correspond to invalid-operation conditions of the scene lifecycle;
/// a ray that misses everything is not an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RtcError {
    #[error("scene must be committed before it can be queried")]
    NotCommitted,

    #[error("scene has already been committed")]
    AlreadyCommitted,

    #[error("cannot attach geometry to a committed scene")]
    AttachAfterCommit,

    #[error("instanced scene must be committed before it is instanced")]
    UncommittedInstanceScene,

    #[error("instanced scene contains instances; only one instancing level is supported")]
    NestedInstance,

    #[error("instance transform must be a pure translation")]
    UnsupportedTransform,

    #[error("quad {quad} references vertex {index} but only {vertex_count} vertices exist")]
    InvalidIndex {
        quad: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("sphere radius must be positive, got {0}")]
    InvalidRadius(f32),
}

pub type RtcResult<T> = Result<T, RtcError>;
