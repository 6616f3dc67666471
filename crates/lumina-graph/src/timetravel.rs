//! Time travel: project the graph's health statuses as they looked N days
//! ago.
//!
//! This is not a temporal store. The contract is a deterministic override
//! table: each entry names a node and the offset past which it reverts to an
//! earlier status (failures are recent, so the further back, the healthier
//! the graph looks). The projection is pure — it never touches the stored
//! statuses — so moving the slider back to a lower offset exactly restores
//! what that offset showed before.

use crate::{HealthStatus, LineageGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound of the slider. Offsets are clamped to it.
pub const MAX_TIME_TRAVEL_DAYS: u8 = 5;

/// One row of the override table: once the requested offset exceeds
/// `healthy_after_days`, `node_id` is shown with `past_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOverride {
    pub node_id: String,
    pub healthy_after_days: u8,
    pub past_status: HealthStatus,
}

impl StatusOverride {
    pub fn healthy_after(node_id: &str, days: u8) -> Self {
        Self {
            node_id: node_id.to_string(),
            healthy_after_days: days,
            past_status: HealthStatus::Healthy,
        }
    }
}

/// The demo override table: the attribution model broke two days ago, the
/// marketing dashboard three days ago. Sample data — a real deployment would
/// derive this table from an incident history.
pub fn demo_overrides() -> Vec<StatusOverride> {
    vec![
        StatusOverride::healthy_after("fct_attribution", 1),
        StatusOverride::healthy_after("dash_mkt", 2),
    ]
}

/// Materialize the status view at `days_ago`. `0` means present: the live
/// statuses, untouched. Overrides for ids not in the graph are ignored.
pub fn project(
    graph: &LineageGraph,
    overrides: &[StatusOverride],
    days_ago: u8,
) -> HashMap<String, HealthStatus> {
    let days_ago = days_ago.min(MAX_TIME_TRAVEL_DAYS);
    let mut statuses: HashMap<String, HealthStatus> = graph
        .nodes()
        .iter()
        .map(|n| (n.id.clone(), n.status))
        .collect();

    if days_ago == 0 {
        return statuses;
    }
    for ov in overrides {
        if days_ago > ov.healthy_after_days {
            if let Some(status) = statuses.get_mut(&ov.node_id) {
                *status = ov.past_status;
            }
        }
    }
    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_graph;

    #[test]
    fn offset_zero_is_the_live_view() {
        let graph = seed_graph();
        let projected = project(&graph, &demo_overrides(), 0);
        for node in graph.nodes() {
            assert_eq!(projected[&node.id], node.status);
        }
    }

    #[test]
    fn overrides_kick_in_past_their_threshold() {
        let graph = seed_graph();
        let overrides = demo_overrides();

        let day1 = project(&graph, &overrides, 1);
        assert_eq!(day1["fct_attribution"], HealthStatus::Error);

        let day2 = project(&graph, &overrides, 2);
        assert_eq!(day2["fct_attribution"], HealthStatus::Healthy);
        assert_eq!(day2["dash_mkt"], HealthStatus::Error);

        let day3 = project(&graph, &overrides, 3);
        assert_eq!(day3["dash_mkt"], HealthStatus::Healthy);
        // Unrelated nodes keep their live status at every offset.
        assert_eq!(day3["stg_events"], HealthStatus::Error);
    }

    #[test]
    fn projection_is_reversible() {
        let graph = seed_graph();
        let overrides = demo_overrides();

        let before = project(&graph, &overrides, 0);
        let _ = project(&graph, &overrides, 3);
        let after = project(&graph, &overrides, 0);
        assert_eq!(before, after);
        // The graph itself was never mutated.
        assert_eq!(graph.node("dash_mkt").unwrap().status, HealthStatus::Error);
    }

    #[test]
    fn offset_clamps_to_max() {
        let graph = seed_graph();
        let overrides = demo_overrides();
        assert_eq!(
            project(&graph, &overrides, 200),
            project(&graph, &overrides, MAX_TIME_TRAVEL_DAYS)
        );
    }

    #[test]
    fn override_for_missing_node_is_ignored() {
        let graph = seed_graph();
        let overrides = vec![StatusOverride::healthy_after("ghost", 0)];
        let projected = project(&graph, &overrides, 3);
        assert!(!projected.contains_key("ghost"));
    }
}
