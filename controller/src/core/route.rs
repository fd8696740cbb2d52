//! Ordered route steps and their wire encoding

use shared::{ControlMessage, RouteStep, RouteStepKind, StepId};

use crate::error::{ControllerError, ControllerResult};

/// Mutable, ordered list of route steps
#[derive(Debug, Clone, Default)]
pub struct RouteLedger {
    steps: Vec<RouteStep>,
}

impl RouteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step with a fresh id
    pub fn append(&mut self, kind: RouteStepKind) -> StepId {
        let mut id = StepId::new();
        while self.contains(id) {
            id = StepId::new();
        }
        self.steps.push(RouteStep { id, kind });
        id
    }

    /// Pop the tail; `None` on an empty ledger
    pub fn remove_last(&mut self) -> Option<RouteStep> {
        self.steps.pop()
    }

    /// Remove the step with this id; `None` when absent
    pub fn remove_by_id(&mut self, id: StepId) -> Option<RouteStep> {
        let index = self.steps.iter().position(|step| step.id == id)?;
        Some(self.steps.remove(index))
    }

    /// Drop every step, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.steps.len();
        self.steps.clear();
        removed
    }

    pub fn contains(&self, id: StepId) -> bool {
        self.steps.iter().any(|step| step.id == id)
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Letters in ledger order; may be empty
    pub fn letters(&self) -> String {
        self.steps.iter().map(|step| step.kind.wire_letter()).collect()
    }

    /// Wire encoding of the route, refused when there is nothing to send
    pub fn encode(&self) -> ControllerResult<String> {
        if self.steps.is_empty() {
            return Err(ControllerError::EmptyRoute);
        }
        Ok(self.letters())
    }

    pub fn to_message(&self) -> ControllerResult<ControlMessage> {
        self.encode().map(ControlMessage::route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_of(kinds: &[RouteStepKind]) -> RouteLedger {
        let mut ledger = RouteLedger::new();
        for kind in kinds {
            ledger.append(*kind);
        }
        ledger
    }

    #[test]
    fn test_encode_preserves_order() {
        let ledger = ledger_of(&[RouteStepKind::Left, RouteStepKind::Straight, RouteStepKind::Pick]);
        assert_eq!(ledger.encode().unwrap(), "LSP");
    }

    #[test]
    fn test_encode_full_alphabet() {
        let ledger = ledger_of(&[
            RouteStepKind::Left,
            RouteStepKind::Right,
            RouteStepKind::Straight,
            RouteStepKind::UTurn,
            RouteStepKind::Pick,
            RouteStepKind::Drop,
            RouteStepKind::Stop,
        ]);
        assert_eq!(ledger.encode().unwrap(), "LRSUPDS");
    }

    #[test]
    fn test_empty_ledger_refuses_to_encode() {
        let ledger = RouteLedger::new();
        assert!(matches!(ledger.encode(), Err(ControllerError::EmptyRoute)));
        assert!(matches!(ledger.to_message(), Err(ControllerError::EmptyRoute)));
        assert_eq!(ledger.letters(), "");
    }

    #[test]
    fn test_ids_unique_even_for_repeated_kinds() {
        let mut ledger = RouteLedger::new();
        let a = ledger.append(RouteStepKind::Left);
        let b = ledger.append(RouteStepKind::Left);
        let c = ledger.append(RouteStepKind::Left);

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_remove_by_id_keeps_remaining_order() {
        let mut ledger = RouteLedger::new();
        ledger.append(RouteStepKind::Left);
        let middle = ledger.append(RouteStepKind::Right);
        ledger.append(RouteStepKind::Drop);

        let removed = ledger.remove_by_id(middle).unwrap();
        assert_eq!(removed.kind, RouteStepKind::Right);
        assert_eq!(ledger.encode().unwrap(), "LD");
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut ledger = ledger_of(&[RouteStepKind::Left, RouteStepKind::Right]);
        assert!(ledger.remove_by_id(StepId::new()).is_none());
        assert_eq!(ledger.encode().unwrap(), "LR");
    }

    #[test]
    fn test_remove_last_pops_tail_and_tolerates_empty() {
        let mut ledger = ledger_of(&[RouteStepKind::Pick, RouteStepKind::UTurn]);

        assert_eq!(ledger.remove_last().unwrap().kind, RouteStepKind::UTurn);
        assert_eq!(ledger.remove_last().unwrap().kind, RouteStepKind::Pick);
        assert!(ledger.remove_last().is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_clear_reports_removed_count() {
        let mut ledger = ledger_of(&[RouteStepKind::Left, RouteStepKind::Stop]);
        assert_eq!(ledger.clear(), 2);
        assert!(ledger.is_empty());
        assert_eq!(ledger.clear(), 0);
    }

    #[test]
    fn test_to_message_wraps_letters() {
        let ledger = ledger_of(&[RouteStepKind::Left, RouteStepKind::Right]);
        assert_eq!(ledger.to_message().unwrap(), ControlMessage::route("LR"));
    }
}
