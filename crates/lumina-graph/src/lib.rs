//! Lumina lineage graph: the in-memory model of data assets and the lineage
//! relationships between them.
//!
//! The graph is the single source of truth read by every other component:
//! the traversal engine walks it, the view controller annotates it, the
//! time-travel projector overlays it, and the ingestion merge engine mutates
//! it. All mutation happens on one logical thread (the UI event loop); if
//! this crate is ever driven from multiple threads the graph must live behind
//! a single mutex or owner task, because `add_nodes`/`remove_node` race on
//! id-uniqueness checks otherwise.
//!
//! ## Module Organization
//!
//! - `traversal`: pure downstream-impact / upstream-root-cause closures
//! - `view`: view-mode state machine and render annotations
//! - `state`: explicit `GraphState` + event reducer for the render layer
//! - `timetravel`: deterministic past-status projection
//! - `alerts`: incident derivation from live health statuses
//! - `seed`: the initial demo catalog

pub mod alerts;
pub mod seed;
pub mod state;
pub mod timetravel;
pub mod traversal;
pub mod view;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub use alerts::{derive_incidents, Incident, Severity};
pub use state::{GraphEvent, GraphState};
pub use timetravel::{demo_overrides, project, StatusOverride, MAX_TIME_TRAVEL_DAYS};
pub use traversal::{downstream_closure, upstream_error_closure};
pub use view::{RenderAnnotation, ViewMode, ViewState};

// ============================================================================
// Core Types
// ============================================================================

/// What kind of data artifact an asset is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Source,
    Transform,
    Model,
    Dashboard,
}

/// Current health of an asset, as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
}

/// One column of an asset's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub is_pii: bool,
    pub description: String,
}

/// 2D layout coordinate. Owned by the render layer; the engine never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A node in the lineage graph: a table, stream, model, or dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAsset {
    /// Stable, globally unique key.
    pub id: String,
    pub label: String,
    pub kind: AssetKind,
    pub status: HealthStatus,
    pub description: String,
    pub owner: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    pub freshness: String,
    pub schema: Vec<ColumnSchema>,
    pub tags: Vec<String>,
    /// 0-100.
    pub quality_score: u8,
    pub position: Position,
}

/// A directed lineage relationship: data flows `source` -> `target`.
///
/// Multiple edges between the same pair are allowed as long as their ids
/// differ. Self-loops are not expected but the traversal engine tolerates
/// arbitrary directed graphs, cycles included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

// ============================================================================
// Lineage Graph
// ============================================================================

/// The live (nodes, edges) pair.
///
/// Invariants maintained by every operation:
/// - node ids are unique (first writer wins, later duplicates are no-ops)
/// - every stored edge references two live node ids (dangling edges from a
///   partial ingestion batch are dropped at add time, never stored)
/// - removing a node removes every edge incident to it
///
/// No operation returns an error: duplicate ids, dangling edges, and unknown
/// ids are all silent no-ops per the merge contract.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LineageGraph {
    nodes: Vec<DataAsset>,
    edges: Vec<LineageEdge>,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    #[serde(skip)]
    edge_ids: HashSet<String>,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a seed batch, applying the same dedup/drop rules as
    /// incremental adds.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = DataAsset>,
        edges: impl IntoIterator<Item = LineageEdge>,
    ) -> Self {
        let mut graph = Self::new();
        graph.add_nodes(nodes);
        graph.add_edges(edges);
        graph
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_ids.contains(id)
    }

    pub fn node(&self, id: &str) -> Option<&DataAsset> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> &[DataAsset] {
        &self.nodes
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[LineageEdge] {
        &self.edges
    }

    /// Add a batch of nodes. An incoming node whose id already exists is
    /// skipped, not merged (first writer wins). Returns how many were added.
    pub fn add_nodes(&mut self, batch: impl IntoIterator<Item = DataAsset>) -> usize {
        let mut added = 0;
        for node in batch {
            if self.node_index.contains_key(&node.id) {
                tracing::debug!(id = %node.id, "skipping duplicate node");
                continue;
            }
            self.node_index.insert(node.id.clone(), self.nodes.len());
            self.nodes.push(node);
            added += 1;
        }
        added
    }

    /// Add a batch of edges. Duplicate edge ids are skipped; edges whose
    /// `source` or `target` is not a live node id are dropped silently.
    /// Returns how many were added.
    pub fn add_edges(&mut self, batch: impl IntoIterator<Item = LineageEdge>) -> usize {
        let mut added = 0;
        for edge in batch {
            if self.edge_ids.contains(&edge.id) {
                tracing::debug!(id = %edge.id, "skipping duplicate edge");
                continue;
            }
            if !self.contains_node(&edge.source) || !self.contains_node(&edge.target) {
                tracing::debug!(
                    id = %edge.id,
                    source = %edge.source,
                    target = %edge.target,
                    "dropping edge with missing endpoint"
                );
                continue;
            }
            self.edge_ids.insert(edge.id.clone());
            self.edges.push(edge);
            added += 1;
        }
        added
    }

    /// Remove a node and every edge incident to it. Removing an id that is
    /// not present is a no-op. Returns whether anything changed.
    pub fn remove_node(&mut self, id: &str) -> bool {
        if !self.node_index.contains_key(id) {
            return false;
        }
        self.nodes.retain(|n| n.id != id);
        self.edges.retain(|e| {
            let keep = e.source != id && e.target != id;
            if !keep {
                self.edge_ids.remove(&e.id);
            }
            keep
        });
        self.rebuild_node_index();
        tracing::info!(%id, "removed node and incident edges");
        true
    }

    /// Overwrite a node's health status. Unknown id is a no-op.
    pub fn update_node_status(&mut self, id: &str, status: HealthStatus) -> bool {
        match self.node_index.get(id) {
            Some(&i) => {
                self.nodes[i].status = status;
                true
            }
            None => false,
        }
    }

    /// Move a node. Called by the render layer after drag; the engine treats
    /// positions as opaque.
    pub fn set_position(&mut self, id: &str, position: Position) -> bool {
        match self.node_index.get(id) {
            Some(&i) => {
                self.nodes[i].position = position;
                true
            }
            None => false,
        }
    }

    fn rebuild_node_index(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
    }
}
