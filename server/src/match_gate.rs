//! Group readiness gate for match start

use crate::session_registry::SessionRegistry;

/// Fires once, the first time every registered session is ready
///
/// There is no reset: once the match has started, later `Ready` commands
/// and later joiners never fire it again.
#[derive(Debug, Default)]
pub struct MatchGate {
    started: bool,
}

impl MatchGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly on the evaluation that opens the gate
    pub fn evaluate(&mut self, registry: &SessionRegistry) -> bool {
        if self.started || !registry.all_ready() {
            return false;
        }
        self.started = true;
        true
    }

    pub fn has_started(&self) -> bool {
        self.started
    }
}
