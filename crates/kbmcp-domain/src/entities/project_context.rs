//! The Remember sub-server's request-scoped active-project slot.

use serde::{Deserialize, Serialize};

use super::knowledge_base::KnowledgeBase;

/// Binds the current caller to one memory knowledge base.
///
/// Starts empty; populated by `memory_set_project`; consumed by every
/// other Remember operation, which raises if it is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    /// The bound project's name.
    pub project_name: String,
    /// The memory knowledge base bound to this project.
    pub knowledge_base: KnowledgeBase,
}
