use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The render side has shut down; the batch was not delivered.
    #[error("photo pool is closed")]
    Closed,

    #[error("no photo at index {0}")]
    NoSuchPhoto(usize),
}
