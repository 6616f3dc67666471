//! Simulated catalog connectors.
//!
//! Stands in for the external warehouse / orchestrator / BI systems: accepts
//! any credentials and returns fixed discovery payloads per source kind. The
//! dbt payload deliberately references the Snowflake payload's table and the
//! pre-existing `dim_customer` model, so sync order exercises the merge
//! engine's dangling-edge handling.

use crate::{ConnectorPort, IngestError, IngestionResult, SourceKind};
use async_trait::async_trait;
use chrono::Utc;
use lumina_graph::{AssetKind, ColumnSchema, DataAsset, HealthStatus, LineageEdge, Position};
use std::collections::HashSet;
use std::time::Duration;

/// Scripted connector for demos and tests.
#[derive(Debug, Default)]
pub struct MockConnector {
    latency: Duration,
    failing: HashSet<SourceKind>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate network latency on `connect`/`sync`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make `sync` fail for the given kind.
    pub fn with_failure(mut self, kind: SourceKind) -> Self {
        self.failing.insert(kind);
        self
    }
}

#[async_trait]
impl ConnectorPort for MockConnector {
    async fn connect(&self, _kind: SourceKind, _credentials: &serde_json::Value) -> bool {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        true
    }

    async fn sync(&self, kind: SourceKind) -> Result<IngestionResult, IngestError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.contains(&kind) {
            return Err(IngestError::Connector(format!(
                "{} metadata API unreachable",
                kind.as_str()
            )));
        }
        Ok(payload_for(kind))
    }
}

fn column(name: &str, column_type: &str, description: &str) -> ColumnSchema {
    ColumnSchema {
        name: name.to_string(),
        column_type: column_type.to_string(),
        is_pii: false,
        description: description.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn discovered(
    id: &str,
    label: &str,
    kind: AssetKind,
    status: HealthStatus,
    description: &str,
    owner: &str,
    row_count: u64,
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
        last_updated: Utc::now(),
        row_count: Some(row_count),
        freshness: freshness.to_string(),
        schema,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        quality_score,
        position: Position { x, y },
    }
}

fn edge(id: &str, source: &str, target: &str) -> LineageEdge {
    LineageEdge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
    }
}

fn payload_for(kind: SourceKind) -> IngestionResult {
    match kind {
        SourceKind::Snowflake => IngestionResult {
            nodes: vec![discovered(
                "sf_ads_raw",
                "RAW_AD_CAMPAIGNS",
                AssetKind::Source,
                HealthStatus::Healthy,
                "Raw advertising spend data from 3rd party API dump.",
                "Marketing Eng",
                85_000,
                "2 hours",
                &["Snowflake", "External"],
                100,
                vec![
                    column("campaign_id", "varchar", "Campaign ID"),
                    column("daily_spend", "float", "Daily Spend USD"),
                ],
                50.0,
                500.0,
            )],
            edges: vec![],
            summary: "Scanned ACCOUNT_USAGE.TABLES. Found 1 new table.".to_string(),
        },
        SourceKind::Dbt => IngestionResult {
            nodes: vec![
                discovered(
                    "dbt_stg_ads",
                    "STG_AD_PERFORMANCE",
                    AssetKind::Transform,
                    HealthStatus::Healthy,
                    "Cleaned ad performance metrics via dbt model.",
                    "Analytics Eng",
                    85_000,
                    "2 hours",
                    &["dbt", "Silver"],
                    98,
                    vec![
                        column("campaign_id", "varchar", "ID"),
                        column("roas", "float", "Return on Ad Spend"),
                    ],
                    400.0,
                    500.0,
                ),
                discovered(
                    "dbt_model_roas",
                    "FCT_ROAS_ANALYSIS",
                    AssetKind::Model,
                    HealthStatus::Healthy,
                    "Final fact table for ROAS analysis.",
                    "Marketing Data",
                    1_200,
                    "2 hours",
                    &["dbt", "Gold"],
                    95,
                    vec![],
                    800.0,
                    500.0,
                ),
            ],
            edges: vec![
                // Dangling until the Snowflake source has been synced.
                edge("e_new_1", "sf_ads_raw", "dbt_stg_ads"),
                edge("e_new_2", "dbt_stg_ads", "dbt_model_roas"),
                // Joins with the pre-existing customer model.
                edge("e_new_3", "dim_customer", "dbt_model_roas"),
            ],
            summary: "Parsed manifest.json. Found 2 models and 3 lineage relationships."
                .to_string(),
        },
        SourceKind::Tableau => IngestionResult {
            nodes: vec![discovered(
                "tab_marketing_exec",
                "CMO_DASHBOARD",
                AssetKind::Dashboard,
                HealthStatus::Warning,
                "Executive marketing overview.",
                "Marketing Ops",
                0,
                "1 day",
                &["Tableau", "Critical"],
                80,
                vec![],
                1200.0,
                500.0,
            )],
            edges: vec![edge("e_new_4", "dbt_model_roas", "tab_marketing_exec")],
            summary: "Scanned Tableau Metadata API. Found 1 Dashboard linked to existing models."
                .to_string(),
        },
        SourceKind::Postgres | SourceKind::BigQuery => IngestionResult {
            nodes: vec![],
            edges: vec![],
            summary: "No changes detected.".to_string(),
        },
    }
}
