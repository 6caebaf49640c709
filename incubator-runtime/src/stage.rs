use crate::types::Stage;

/// Project stage for a count of completed actions.
///
/// Depends only on the count, never on which actions completed.
pub fn stage_for(completed_count: usize) -> Stage {
    match completed_count {
        0 => Stage::Applied,
        1..=2 => Stage::Screening,
        3..=4 => Stage::Incubating,
        5 => Stage::Launching,
        _ => Stage::Launched,
    }
}
