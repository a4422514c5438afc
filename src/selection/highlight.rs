use crate::feature::FeatureId;

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum HighlightState {
    #[default]
    Idle,
    Active(FeatureId),
}

/// Visual-state change for one feature, applied by the host in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HighlightSignal {
    Activate(FeatureId),
    Deactivate(FeatureId),
}

/// Exclusive hover highlight: at most one active feature, and the old one
/// is always deactivated before the new one lights up.
#[derive(Default)]
pub struct HighlightController {
    state: HighlightState,
}

impl HighlightController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &HighlightState {
        &self.state
    }

    pub fn active(&self) -> Option<&FeatureId> {
        match &self.state {
            HighlightState::Idle => None,
            HighlightState::Active(id) => Some(id),
        }
    }

    /// Feed the resolver's pick for the current pointer position
    pub fn update(&mut self, resolved: Option<&FeatureId>) -> Vec<HighlightSignal> {
        let next = match resolved {
            Some(id) => HighlightState::Active(id.clone()),
            None => HighlightState::Idle,
        };
        if next == self.state {
            return Vec::new();
        }

        let mut signals = Vec::with_capacity(2);
        if let HighlightState::Active(old) = std::mem::replace(&mut self.state, next) {
            signals.push(HighlightSignal::Deactivate(old));
        }
        if let HighlightState::Active(new) = &self.state {
            signals.push(HighlightSignal::Activate(new.clone()));
        }
        signals
    }

    /// Pointer left the map entirely
    pub fn leave(&mut self) -> Vec<HighlightSignal> {
        self.update(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> FeatureId {
        FeatureId::from(s)
    }

    #[test]
    fn test_idle_to_active() {
        let mut hl = HighlightController::new();
        assert_eq!(hl.update(Some(&id("a"))), vec![HighlightSignal::Activate(id("a"))]);
        assert_eq!(hl.active(), Some(&id("a")));
    }

    #[test]
    fn test_same_id_is_noop() {
        let mut hl = HighlightController::new();
        hl.update(Some(&id("a")));
        assert!(hl.update(Some(&id("a"))).is_empty());
        assert!(hl.update(Some(&id("a"))).is_empty());
        assert_eq!(hl.state(), &HighlightState::Active(id("a")));
    }

    #[test]
    fn test_switch_deactivates_first() {
        let mut hl = HighlightController::new();
        hl.update(Some(&id("a")));
        assert_eq!(
            hl.update(Some(&id("b"))),
            vec![HighlightSignal::Deactivate(id("a")), HighlightSignal::Activate(id("b"))]
        );
        assert_eq!(hl.active(), Some(&id("b")));
    }

    #[test]
    fn test_leave_and_idle_noop() {
        let mut hl = HighlightController::new();
        assert!(hl.update(None).is_empty());
        hl.update(Some(&id("a")));
        assert_eq!(hl.leave(), vec![HighlightSignal::Deactivate(id("a"))]);
        assert_eq!(hl.state(), &HighlightState::Idle);
        assert!(hl.leave().is_empty());
    }

    #[test]
    fn test_never_two_active() {
        // Replay the signal stream and track what the host would see lit
        let mut hl = HighlightController::new();
        let mut lit: Vec<FeatureId> = Vec::new();
        let path = ["a", "a", "b", "", "c", "b", "b", "", "", "a"];

        for step in path {
            let resolved = (!step.is_empty()).then(|| id(step));
            for signal in hl.update(resolved.as_ref()) {
                match signal {
                    HighlightSignal::Activate(x) => {
                        assert!(!lit.contains(&x), "duplicate activation of {x}");
                        lit.push(x);
                    }
                    HighlightSignal::Deactivate(x) => lit.retain(|l| *l != x),
                }
                assert!(lit.len() <= 1);
            }
            assert_eq!(lit.first(), hl.active());
        }
    }
}
