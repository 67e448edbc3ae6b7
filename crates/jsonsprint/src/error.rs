use thiserror::Error;

/// Failure of a serialization task.
///
/// Disqualification conditions are never errors; they route subtrees to the
/// general-purpose serializer. Errors are structural and synchronous, with no
/// partial output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StringifyError {
    /// The value graph contains a cycle.
    #[error("Converting circular structure to JSON")]
    CircularStructure,
    /// The general-purpose serializer exceeded its recursion budget.
    #[error("Maximum serialization depth exceeded")]
    NestingTooDeep,
}
