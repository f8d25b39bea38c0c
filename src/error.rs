use thiserror::Error;

/// The ways an [`AvlTree`][crate::AvlTree] operation can fail.
///
/// A value that simply isn't in the tree is not an error: lookups report that with `Ok(false)` or
/// `Ok(None)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AvlError {
    /// An absent value was passed where a value is required.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}
