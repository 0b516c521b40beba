use thiserror::Error;

/// Errors raised while generating a spatial graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Indicates an invalid generation parameter.
    #[error("invalid graph parameters: {0}")]
    InvalidParams(&'static str),
    /// Rejection sampling gave up before reaching the requested count.
    #[error("could not place {what} after {attempts} attempts")]
    Exhausted { what: &'static str, attempts: usize },
}
