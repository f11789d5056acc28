use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// How long a button waits for its second activation.
pub const CONFIRM_WINDOW: Duration = Duration::from_millis(3500);

/// Identifies one armed confirmation. A timer carrying an older token is
/// stale and has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfirmToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Idle,
    Confirming(ConfirmToken),
    Executing,
}

/// What the caller must do after an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Schedule an expiry for this token after [`CONFIRM_WINDOW`].
    Arm(ConfirmToken),
    /// Run the guarded action now.
    Execute,
    /// Already executing; nothing to do.
    Ignored,
}

/// Click-to-confirm state machine, one entry per key. Keys without an entry
/// are idle.
#[derive(Debug, Clone)]
pub struct ConfirmGate<K> {
    states: HashMap<K, GateState>,
    next_token: u64,
}

impl<K> Default for ConfirmGate<K> {
    fn default() -> Self {
        Self {
            states: HashMap::new(),
            next_token: 1,
        }
    }
}

impl<K: Eq + Hash + Clone> ConfirmGate<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &K) -> GateState {
        self.states.get(key).copied().unwrap_or_default()
    }

    pub fn activate(&mut self, key: &K) -> GateAction {
        match self.state(key) {
            GateState::Idle => {
                let token = ConfirmToken(self.next_token);
                self.next_token += 1;
                self.states.insert(key.clone(), GateState::Confirming(token));
                GateAction::Arm(token)
            }
            GateState::Confirming(_) => {
                self.states.insert(key.clone(), GateState::Executing);
                GateAction::Execute
            }
            GateState::Executing => GateAction::Ignored,
        }
    }

    /// Timer callback. Returns true if the key went back to idle.
    pub fn expire(&mut self, key: &K, token: ConfirmToken) -> bool {
        if self.state(key) == GateState::Confirming(token) {
            self.states.remove(key);
            true
        } else {
            false
        }
    }

    /// The guarded action finished, whatever its outcome.
    pub fn finish(&mut self, key: &K) {
        self.states.remove(key);
    }

    /// Drop pending confirmations (rows were re-rendered). Executing entries
    /// stay so an in-flight action cannot be started twice.
    pub fn clear_pending(&mut self) {
        self.states.retain(|_, state| *state == GateState::Executing);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn executing_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == GateState::Executing)
            .count()
    }
}

// ── Button presentation ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTone {
    Primary,
    Warning,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonLabels {
    pub idle: &'static str,
    pub confirming: &'static str,
    pub executing: &'static str,
}

pub const RECOVER_LABELS: ButtonLabels = ButtonLabels {
    idle: "Récupérer",
    confirming: "Confirmer",
    executing: "Récupération...",
};

/// Everything the widget needs, derived only from the gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonView {
    pub label: &'static str,
    pub tone: ButtonTone,
    pub enabled: bool,
}

impl ButtonView {
    pub fn for_state(state: GateState, labels: ButtonLabels) -> Self {
        match state {
            GateState::Idle => Self {
                label: labels.idle,
                tone: ButtonTone::Primary,
                enabled: true,
            },
            GateState::Confirming(_) => Self {
                label: labels.confirming,
                tone: ButtonTone::Warning,
                enabled: true,
            },
            GateState::Executing => Self {
                label: labels.executing,
                tone: ButtonTone::Busy,
                enabled: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(gate: &ConfirmGate<&'static str>, key: &'static str) -> ButtonView {
        ButtonView::for_state(gate.state(&key), RECOVER_LABELS)
    }

    #[test]
    fn test_single_activation_only_arms() {
        let mut gate = ConfirmGate::new();
        assert!(matches!(gate.activate(&"a"), GateAction::Arm(_)));
        assert_eq!(view(&gate, "a").label, "Confirmer");
        assert!(view(&gate, "a").enabled);
    }

    #[test]
    fn test_second_activation_executes() {
        let mut gate = ConfirmGate::new();
        gate.activate(&"a");
        assert_eq!(gate.activate(&"a"), GateAction::Execute);
        assert_eq!(gate.state(&"a"), GateState::Executing);
        assert_eq!(view(&gate, "a").label, "Récupération...");
        assert!(!view(&gate, "a").enabled);

        // Further clicks while running do nothing.
        assert_eq!(gate.activate(&"a"), GateAction::Ignored);
    }

    #[test]
    fn test_timeout_reverts_view_exactly() {
        let mut gate = ConfirmGate::new();
        let before = view(&gate, "a");

        let GateAction::Arm(token) = gate.activate(&"a") else {
            panic!("first activation must arm");
        };
        assert_ne!(view(&gate, "a"), before);

        assert!(gate.expire(&"a", token));
        assert_eq!(view(&gate, "a"), before);
        assert_eq!(gate.state(&"a"), GateState::Idle);
    }

    #[test]
    fn test_activation_after_timeout_rearms() {
        let mut gate = ConfirmGate::new();
        let GateAction::Arm(first) = gate.activate(&"a") else {
            panic!("first activation must arm");
        };
        gate.expire(&"a", first);

        let GateAction::Arm(second) = gate.activate(&"a") else {
            panic!("activation after timeout must re-arm");
        };
        assert_ne!(first, second);

        // The old timer firing late must not cancel the new confirmation.
        assert!(!gate.expire(&"a", first));
        assert_eq!(gate.state(&"a"), GateState::Confirming(second));
    }

    #[test]
    fn test_expire_does_not_touch_executing() {
        let mut gate = ConfirmGate::new();
        let GateAction::Arm(token) = gate.activate(&"a") else {
            panic!("first activation must arm");
        };
        gate.activate(&"a");
        assert!(!gate.expire(&"a", token));
        assert_eq!(gate.state(&"a"), GateState::Executing);

        gate.finish(&"a");
        assert_eq!(view(&gate, "a"), ButtonView::for_state(GateState::Idle, RECOVER_LABELS));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut gate = ConfirmGate::new();
        gate.activate(&"a");
        assert!(matches!(gate.activate(&"b"), GateAction::Arm(_)));
        assert_eq!(gate.activate(&"a"), GateAction::Execute);
        assert!(matches!(gate.state(&"b"), GateState::Confirming(_)));
    }

    #[test]
    fn test_clear_pending_keeps_executing() {
        let mut gate = ConfirmGate::new();
        gate.activate(&"a");
        gate.activate(&"a");
        gate.activate(&"b");

        gate.clear_pending();
        assert_eq!(gate.state(&"a"), GateState::Executing);
        assert_eq!(gate.state(&"b"), GateState::Idle);
        assert_eq!(gate.executing_count(), 1);
    }
}
