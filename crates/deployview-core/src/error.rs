use thiserror::Error;

/// Failures that make a snapshot impossible to lay out.
///
/// Dangling owner or dependency references are not errors; the engine drops
/// them while indexing relations.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Duplicate resource uid: {0}")]
    DuplicateUid(String),
    #[error("Resource with empty uid (kind {kind}, name {name:?})")]
    EmptyUid { kind: String, name: String },
    #[error("Ownership and dependency relations form a cycle through: {}", .uids.join(", "))]
    RelationCycle { uids: Vec<String> },
    #[error("Malformed resource snapshot: {0}")]
    MalformedSnapshot(#[from] serde_json::Error),
}
