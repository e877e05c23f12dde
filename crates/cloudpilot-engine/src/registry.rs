//! Flow registry / suspension manager.
//!
//! Decouples the synchronous stage pipeline from a possibly long-delayed
//! external decision. A suspended flow is a state snapshot plus a
//! single-resolution decision slot, both keyed by the flow handle and both
//! removed together when the decision arrives. The registry is the only
//! state shared between flows; its lock guards map bookkeeping only, never
//! I/O.

use std::collections::HashMap;
use std::sync::Mutex;

use cloudpilot_utils::error::FlowError;
use cloudpilot_utils::types::FlowId;

use crate::state::FlowState;

/// Pending decision slot: the question and context surfaced to the human.
///
/// Single-resolution: the slot exists until exactly one answer consumes it.
#[derive(Debug, Clone)]
pub struct DecisionSlot {
    /// Question to put to the human.
    pub question: String,
}

#[derive(Default)]
struct RegistryMaps {
    states: HashMap<FlowId, FlowState>,
    decisions: HashMap<FlowId, DecisionSlot>,
}

/// Tracks suspended flows awaiting an external decision.
#[derive(Default)]
pub struct FlowRegistry {
    inner: Mutex<RegistryMaps>,
}

impl FlowRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a flow's state and register its pending decision.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::AlreadySuspended` if a pending suspension already
    /// exists for the handle. Stage execution is single-threaded per flow,
    /// so this only happens on a programming error, and it must never be
    /// silent.
    pub fn suspend(
        &self,
        flow_id: FlowId,
        state: FlowState,
        question: impl Into<String>,
    ) -> Result<(), FlowError> {
        let mut maps = self.inner.lock().expect("flow registry lock poisoned");
        if maps.decisions.contains_key(&flow_id) {
            return Err(FlowError::AlreadySuspended {
                flow_id: flow_id.to_string(),
            });
        }
        maps.states.insert(flow_id, state);
        maps.decisions.insert(
            flow_id,
            DecisionSlot {
                question: question.into(),
            },
        );
        Ok(())
    }

    /// Resolve a pending decision and hand back the parked state.
    ///
    /// Removes both registry entries; a second resume of the same handle
    /// fails like any unknown handle. The registry is untouched on the
    /// unknown-handle path.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::UnknownFlow` if no suspension is registered for
    /// the handle.
    pub fn resume(&self, flow_id: FlowId) -> Result<FlowState, FlowError> {
        let mut maps = self.inner.lock().expect("flow registry lock poisoned");
        if !maps.decisions.contains_key(&flow_id) {
            return Err(FlowError::UnknownFlow {
                flow_id: flow_id.to_string(),
            });
        }
        maps.decisions.remove(&flow_id);
        maps.states.remove(&flow_id).ok_or(FlowError::UnknownFlow {
            flow_id: flow_id.to_string(),
        })
    }

    /// Question registered for a pending suspension, if any. Lets a caller
    /// re-render the prompt for a flow that has been parked for a while.
    #[must_use]
    pub fn pending_question(&self, flow_id: FlowId) -> Option<String> {
        self.inner
            .lock()
            .expect("flow registry lock poisoned")
            .decisions
            .get(&flow_id)
            .map(|slot| slot.question.clone())
    }

    /// Whether the handle has a pending suspension.
    #[must_use]
    pub fn is_suspended(&self, flow_id: FlowId) -> bool {
        self.inner
            .lock()
            .expect("flow registry lock poisoned")
            .decisions
            .contains_key(&flow_id)
    }

    /// Number of flows currently suspended.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner
            .lock()
            .expect("flow registry lock poisoned")
            .decisions
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspend_then_resume_returns_the_snapshot() {
        let registry = FlowRegistry::new();
        let flow_id = FlowId::new();
        let state = FlowState::new("create a bucket");

        registry.suspend(flow_id, state, "Apply this plan?").unwrap();
        assert!(registry.is_suspended(flow_id));
        assert_eq!(
            registry.pending_question(flow_id).as_deref(),
            Some("Apply this plan?")
        );

        let resumed = registry.resume(flow_id).unwrap();
        assert_eq!(resumed.task, "create a bucket");
        assert!(!registry.is_suspended(flow_id));
        assert!(registry.pending_question(flow_id).is_none());
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn resume_unknown_handle_fails_without_touching_registry() {
        let registry = FlowRegistry::new();
        let parked = FlowId::new();
        registry
            .suspend(parked, FlowState::new("task"), "q")
            .unwrap();

        let err = registry.resume(FlowId::new()).unwrap_err();
        assert!(matches!(err, FlowError::UnknownFlow { .. }));
        assert_eq!(registry.pending_count(), 1);
        assert!(registry.is_suspended(parked));
    }

    #[test]
    fn second_resume_fails_like_unknown_handle() {
        let registry = FlowRegistry::new();
        let flow_id = FlowId::new();
        registry
            .suspend(flow_id, FlowState::new("task"), "q")
            .unwrap();

        registry.resume(flow_id).unwrap();
        let err = registry.resume(flow_id).unwrap_err();
        assert!(matches!(err, FlowError::UnknownFlow { .. }));
    }

    #[test]
    fn double_suspend_is_rejected() {
        let registry = FlowRegistry::new();
        let flow_id = FlowId::new();
        registry
            .suspend(flow_id, FlowState::new("task"), "q")
            .unwrap();

        let err = registry
            .suspend(flow_id, FlowState::new("task"), "q")
            .unwrap_err();
        assert!(matches!(err, FlowError::AlreadySuspended { .. }));
    }

    #[test]
    fn distinct_flows_are_independent() {
        let registry = FlowRegistry::new();
        let a = FlowId::new();
        let b = FlowId::new();
        registry.suspend(a, FlowState::new("task a"), "q").unwrap();
        registry.suspend(b, FlowState::new("task b"), "q").unwrap();

        assert_eq!(registry.resume(a).unwrap().task, "task a");
        assert!(registry.is_suspended(b));
        assert_eq!(registry.resume(b).unwrap().task, "task b");
    }
}
