//! Result aggregation.

use push_core::{AggregatedResult, DispatchOutcome, Target};

/// Combine per-endpoint outcomes into the response for `target`.
pub fn aggregate(target: &Target, outcomes: Vec<DispatchOutcome>) -> AggregatedResult {
    let sent_count = outcomes.iter().filter(|o| o.success).count();

    AggregatedResult {
        target_kind: target.kind(),
        target_value: target.pet_id().map(str::to_string),
        sent_count,
        failed_count: outcomes.len() - sent_count,
        outcomes,
    }
}
