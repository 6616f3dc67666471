//! The initial demo catalog: a small retail data stack with one broken
//! lineage branch (clickstream -> sessionization -> attribution -> marketing
//! dashboard) and one healthy branch feeding the executive dashboard.

use crate::{
    AssetKind, ColumnSchema, DataAsset, HealthStatus, LineageEdge, LineageGraph, Position,
};
use chrono::{Duration, Utc};

fn column(name: &str, column_type: &str, is_pii: bool, description: &str) -> ColumnSchema {
    ColumnSchema {
        name: name.to_string(),
        column_type: column_type.to_string(),
        is_pii,
        description: description.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn asset(
    id: &str,
    label: &str,
    kind: AssetKind,
    status: HealthStatus,
    description: &str,
    owner: &str,
    updated_days_ago: i64,
    row_count: Option<u64>,
    freshness: &str,
    tags: &[&str],
    quality_score: u8,
    schema: Vec<ColumnSchema>,
    x: f64,
    y: f64,
) -> DataAsset {
    DataAsset {
        id: id.to_string(),
        label: label.to_string(),
        kind,
        status,
        description: description.to_string(),
        owner: owner.to_string(),
        last_updated: Utc::now() - Duration::days(updated_days_ago),
        row_count,
        freshness: freshness.to_string(),
        schema,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        quality_score,
        position: Position { x, y },
    }
}

/// Build the seed graph loaded at startup.
pub fn seed_graph() -> LineageGraph {
    let nodes = vec![
        // Layer 1: sources
        asset(
            "sap_raw",
            "SAP_ORDERS_RAW",
            AssetKind::Source,
            HealthStatus::Healthy,
            "Raw replication of SAP VBAK/VBAP tables.",
            "Ingestion Team",
            0,
            Some(1_542_000),
            "15 mins",
            &["PII", "Finance"],
            98,
            vec![
                column("order_id", "varchar", false, "PK"),
                column("customer_email", "varchar", true, "Customer Email"),
            ],
            50.0,
            100.0,
        ),
        asset(
            "clickstream",
            "WEB_CLICKS_STREAM",
            AssetKind::Source,
            HealthStatus::Healthy,
            "Kafka stream of website events.",
            "Web Team",
            0,
            Some(50_000_000),
            "Real-time",
            &["High Volume"],
            85,
            vec![
                column("session_id", "uuid", false, "Session ID"),
                column("url", "varchar", false, "Page URL"),
            ],
            50.0,
            300.0,
        ),
        // Layer 2: transformation / staging
        asset(
            "stg_orders",
            "STG_CLEAN_ORDERS",
            AssetKind::Transform,
            HealthStatus::Healthy,
            "Cleaned orders with standardized currency.",
            "Core Data Team",
            0,
            Some(1_541_800),
            "1 hour",
            &["Silver"],
            99,
            vec![
                column("order_id", "varchar", false, "PK"),
                column("amount_usd", "decimal", false, "Normalized Amount"),
            ],
            400.0,
            100.0,
        ),
        asset(
            "stg_events",
            "STG_USER_SESSIONS",
            AssetKind::Transform,
            HealthStatus::Error,
            "Sessionized web events. FAILED due to schema mismatch.",
            "Core Data Team",
            1,
            Some(4_500_000),
            "25 hours",
            &["Silver", "Broken"],
            40,
            vec![],
            400.0,
            300.0,
        ),
        // Layer 3: semantic models
        asset(
            "dim_customer",
            "DIM_CUSTOMER_360",
            AssetKind::Model,
            HealthStatus::Healthy,
            "Golden record of customer attributes.",
            "Analytics Eng",
            0,
            Some(50_000),
            "4 hours",
            &["Gold", "PII"],
            95,
            vec![],
            800.0,
            50.0,
        ),
        asset(
            "fct_sales",
            "FCT_DAILY_SALES",
            AssetKind::Model,
            HealthStatus::Warning,
            "Aggregated daily sales facts.",
            "Analytics Eng",
            0,
            Some(1_200),
            "4 hours",
            &["Gold"],
            92,
            vec![],
            800.0,
            200.0,
        ),
        asset(
            "fct_attribution",
            "FCT_MKT_ATTRIBUTION",
            AssetKind::Model,
            HealthStatus::Error,
            "Marketing attribution model linking sales to clicks.",
            "Marketing Data",
            2,
            Some(0),
            "48 hours",
            &["Gold"],
            0,
            vec![],
            800.0,
            350.0,
        ),
        // Layer 4: consumption
        asset(
            "dash_exec",
            "EXEC_OVERVIEW_DASH",
            AssetKind::Dashboard,
            HealthStatus::Healthy,
            "Tableau dashboard for C-Suite.",
            "BI Team",
            0,
            Some(0),
            "4 hours",
            &["Critical"],
            100,
            vec![],
            1200.0,
            100.0,
        ),
        asset(
            "dash_mkt",
            "MARKETING_ROI_DASH",
            AssetKind::Dashboard,
            HealthStatus::Error,
            "PowerBI dashboard for Marketing Ops.",
            "Marketing Ops",
            3,
            Some(0),
            "STALE",
            &["Critical"],
            0,
            vec![],
            1200.0,
            350.0,
        ),
    ];

    let edges = ["e1", "e2", "e3", "e4", "e5", "e6", "e7", "e8", "e9"]
        .into_iter()
        .zip([
            ("sap_raw", "stg_orders"),
            ("clickstream", "stg_events"),
            ("stg_orders", "dim_customer"),
            ("stg_orders", "fct_sales"),
            ("stg_orders", "fct_attribution"),
            ("stg_events", "fct_attribution"),
            ("dim_customer", "dash_exec"),
            ("fct_sales", "dash_exec"),
            ("fct_attribution", "dash_mkt"),
        ])
        .map(|(id, (source, target))| LineageEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        })
        .collect::<Vec<_>>();

    LineageGraph::from_parts(nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_shape() {
        let graph = seed_graph();
        assert_eq!(graph.node_count(), 9);
        assert_eq!(graph.edge_count(), 9);
    }

    #[test]
    fn seed_has_the_broken_branch() {
        let graph = seed_graph();
        for id in ["stg_events", "fct_attribution", "dash_mkt"] {
            assert_eq!(graph.node(id).unwrap().status, HealthStatus::Error, "{id}");
        }
        assert_eq!(
            graph.node("fct_sales").unwrap().status,
            HealthStatus::Warning
        );
    }

    #[test]
    fn seed_schema_flags_pii() {
        let graph = seed_graph();
        let sap = graph.node("sap_raw").unwrap();
        assert!(sap.schema.iter().any(|c| c.is_pii));
    }
}
