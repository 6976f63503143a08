use serde::{Deserialize, Serialize};

/// A collection (folder) in the library, flattened from the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collection {
    pub key: String,
    pub name: String,
    pub parent: Option<String>,
}
