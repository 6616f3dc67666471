//! Incident derivation: turn the graph's live health statuses into a
//! severity-ordered incident list for the alerts surface.

use crate::{HealthStatus, LineageGraph};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    Warning,
}

/// One active incident, tied to the asset that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Id of the asset this incident points at.
    pub source_id: String,
}

/// One incident per non-Healthy asset: Error -> Critical, Warning ->
/// Warning. Ordered severity-first, then by asset id, so the list is stable
/// across renders.
pub fn derive_incidents(graph: &LineageGraph) -> Vec<Incident> {
    let mut incidents: Vec<Incident> = graph
        .nodes()
        .iter()
        .filter_map(|node| {
            let severity = match node.status {
                HealthStatus::Error => Severity::Critical,
                HealthStatus::Warning => Severity::Warning,
                HealthStatus::Healthy => return None,
            };
            let title = match node.status {
                HealthStatus::Error => format!("{} is failing", node.label),
                _ => format!("Quality degraded on {}", node.label),
            };
            Some(Incident {
                severity,
                title,
                description: node.description.clone(),
                source_id: node.id.clone(),
            })
        })
        .collect();
    incidents.sort_by(|a, b| a.severity.cmp(&b.severity).then(a.source_id.cmp(&b.source_id)));
    incidents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_graph;

    #[test]
    fn seed_incidents_are_severity_ordered() {
        let incidents = derive_incidents(&seed_graph());
        // 3 errors + 1 warning in the seed catalog.
        assert_eq!(incidents.len(), 4);
        assert_eq!(incidents[0].severity, Severity::Critical);
        assert_eq!(incidents[3].severity, Severity::Warning);
        assert_eq!(incidents[3].source_id, "fct_sales");

        let criticals: Vec<&str> = incidents
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .map(|i| i.source_id.as_str())
            .collect();
        assert_eq!(criticals, ["dash_mkt", "fct_attribution", "stg_events"]);
    }

    #[test]
    fn healthy_graph_has_no_incidents() {
        let mut graph = seed_graph();
        let ids: Vec<String> = graph.nodes().iter().map(|n| n.id.clone()).collect();
        for id in ids {
            graph.update_node_status(&id, HealthStatus::Healthy);
        }
        assert!(derive_incidents(&graph).is_empty());
    }
}
