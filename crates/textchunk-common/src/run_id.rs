//! Identifier for one chunking run

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Random identifier recorded on the tracing span of a chunking call
///
/// Lets log lines from one call be grouped when many documents are chunked
/// by the same process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RunId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_run_id_serializes_as_uuid_string() {
        let id = RunId::from(Uuid::nil());
        let json = serde_json::to_string(&id).expect("Should serialize");
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }
}
