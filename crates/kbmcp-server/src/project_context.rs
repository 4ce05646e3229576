//! The Remember sub-server's request-scoped active-project slot (§3, §4.4).
//!
//! One instance lives per running server; every Remember tool call reads
//! or writes it. Modeled as a `RwLock` rather than true per-connection
//! state, matching the resolved Open Question in the design ledger: this
//! process serves one active project binding at a time, set by
//! `memory_set_project` and read by every other Remember operation.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use kbmcp_domain::entities::ProjectContext;
use kbmcp_domain::error::{Error, Result};

/// Message returned when a Remember tool other than `set_project` is
/// called before any project has been bound.
const NO_PROJECT_MSG: &str =
    "no active project; call memory_set_project before using this tool";

/// The shared `Option<ProjectContext>` slot, cloneable across tool
/// handlers sharing one server instance.
#[derive(Debug, Clone, Default)]
pub struct ProjectSlot {
    inner: Arc<RwLock<Option<ProjectContext>>>,
}

impl ProjectSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current binding, recovering from lock poisoning.
    fn read(&self) -> RwLockReadGuard<'_, Option<ProjectContext>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Write the current binding, recovering from lock poisoning.
    fn write(&self) -> RwLockWriteGuard<'_, Option<ProjectContext>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Bind a new active project, replacing any previous binding.
    pub fn set(&self, context: ProjectContext) {
        *self.write() = Some(context);
    }

    /// The currently bound project, if any, without requiring one.
    pub fn get(&self) -> Option<ProjectContext> {
        self.read().clone()
    }

    /// The currently bound project, or a classified error if unset. Every
    /// Remember operation but `set_project` calls this and lets the error
    /// propagate to the tool dispatcher per §7's ordinary propagation rule.
    pub fn require(&self) -> Result<ProjectContext> {
        self.get().ok_or_else(|| Error::generic(NO_PROJECT_MSG))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbmcp_domain::entities::{KnowledgeBase, KB_TYPE_MEMORY};

    fn kb(name: &str) -> KnowledgeBase {
        KnowledgeBase {
            name: name.to_string(),
            kb_type: KB_TYPE_MEMORY.to_string(),
            description: String::new(),
            data_source: format!("Workspace-`{name}`"),
            backend_id: format!("kbmcp-memory.{name}-00000000"),
            doc_count: 0,
        }
    }

    #[test]
    fn require_fails_before_set_project() {
        let slot = ProjectSlot::new();
        assert!(slot.require().is_err());
    }

    #[test]
    fn set_then_require_round_trips() {
        let slot = ProjectSlot::new();
        slot.set(ProjectContext { project_name: "proj-a".to_string(), knowledge_base: kb("proj-a") });
        let bound = slot.require().unwrap();
        assert_eq!(bound.project_name, "proj-a");
    }

    #[test]
    fn set_replaces_previous_binding() {
        let slot = ProjectSlot::new();
        slot.set(ProjectContext { project_name: "proj-a".to_string(), knowledge_base: kb("proj-a") });
        slot.set(ProjectContext { project_name: "proj-b".to_string(), knowledge_base: kb("proj-b") });
        assert_eq!(slot.require().unwrap().project_name, "proj-b");
    }
}
