//! The fixed incubation sequence and next-step resolution.

use std::collections::HashSet;

use crate::types::ActionType;

/// Actions that must all complete for a project to launch, in order.
pub const INCUBATION_PIPELINE: [ActionType; 6] = [
    ActionType::MintIdentity,
    ActionType::SetupTreasury,
    ActionType::OpenChannel,
    ActionType::ApproveBudget,
    ActionType::DeployPool,
    ActionType::LockLiquidity,
];

/// First pipeline entry not in `completed`, or `None` once every entry is.
///
/// Depends on set membership only, so it can be re-derived from the ledger
/// after a failure or restart.
pub fn next_action(completed: &HashSet<ActionType>) -> Option<ActionType> {
    INCUBATION_PIPELINE
        .into_iter()
        .find(|kind| !completed.contains(kind))
}

pub fn is_complete(completed: &HashSet<ActionType>) -> bool {
    next_action(completed).is_none()
}

/// Zero-based position in the pipeline.
pub fn position(kind: ActionType) -> Option<usize> {
    INCUBATION_PIPELINE.iter().position(|k| *k == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(kinds: &[ActionType]) -> HashSet<ActionType> {
        kinds.iter().copied().collect()
    }

    #[test]
    fn test_next_action_in_order() {
        assert_eq!(next_action(&set(&[])), Some(ActionType::MintIdentity));
        assert_eq!(
            next_action(&set(&[ActionType::MintIdentity])),
            Some(ActionType::SetupTreasury)
        );
        assert_eq!(
            next_action(&set(&[ActionType::MintIdentity, ActionType::SetupTreasury])),
            Some(ActionType::OpenChannel)
        );
    }

    #[test]
    fn test_next_action_ignores_order_and_extras() {
        // a gap earlier in the pipeline is offered first
        let completed = set(&[ActionType::SetupTreasury, ActionType::DeployPool]);
        assert_eq!(next_action(&completed), Some(ActionType::MintIdentity));
        assert_eq!(next_action(&completed), next_action(&completed));

        let with_extras = set(&[ActionType::ProcessPayment, ActionType::VerifyVesting]);
        assert_eq!(next_action(&with_extras), Some(ActionType::MintIdentity));
    }

    #[test]
    fn test_none_iff_superset() {
        let mut all = set(&INCUBATION_PIPELINE);
        assert_eq!(next_action(&all), None);
        assert!(is_complete(&all));
        all.insert(ActionType::VerifyVesting);
        assert!(is_complete(&all));
        for kind in INCUBATION_PIPELINE {
            let mut missing = set(&INCUBATION_PIPELINE);
            missing.remove(&kind);
            assert_eq!(next_action(&missing), Some(kind));
        }
    }

    #[test]
    fn test_non_pipeline_types_have_no_position() {
        assert_eq!(position(ActionType::MintIdentity), Some(0));
        assert_eq!(position(ActionType::LockLiquidity), Some(5));
        assert_eq!(position(ActionType::ProcessPayment), None);
    }
}
