use thiserror::Error;

pub type AccuFlowResult<T> = Result<T, AccuFlowError>;

#[derive(Debug, Error)]
pub enum AccuFlowError {
    #[error("malformed program descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("unknown accumulator `{0}`")]
    UnknownAccumulator(String),

    #[error("unknown bind parameter `{0}`")]
    UnknownBinding(String),

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("attribute `{0}` not present on record")]
    MissingAttribute(String),

    #[error("superstep limit of {max_gss} reached before convergence")]
    DeadlineExceeded { max_gss: u64 },

    #[error("vertex `{vertex}` failed in phase `{phase}` at superstep {superstep}: {source}")]
    VertexProgram {
        vertex: String,
        phase: String,
        superstep: u64,
        #[source]
        source: Box<AccuFlowError>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AccuFlowError {
    /// Wraps an evaluation error with the vertex, phase and superstep it occurred in.
    pub fn in_vertex(self, vertex: &str, phase: &str, superstep: u64) -> Self {
        AccuFlowError::VertexProgram {
            vertex: vertex.to_string(),
            phase: phase.to_string(),
            superstep,
            source: Box::new(self),
        }
    }
}
