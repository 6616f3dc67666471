//! View-mode state machine and render annotations.
//!
//! The controller owns only (mode, selection). Everything visual is derived:
//! annotations are recomputed from scratch as a pure function of
//! (mode, selection, snapshot) on every render, never patched incrementally,
//! so no mode change can leave stale highlighting behind.

use crate::traversal::{downstream_closure, upstream_error_closure_with};
use crate::{HealthStatus, LineageEdge, LineageGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The active interaction mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewMode {
    #[default]
    Standard,
    /// Highlight the downstream closure of the selected node.
    ImpactAnalysis,
    /// Highlight the upstream error path of the selected node.
    RootCause,
}

/// Stroke colors, matching the render layer's palette.
pub const NEUTRAL_STROKE: &str = "#64748b";
pub const IMPACT_STROKE: &str = "#3b82f6";
pub const ROOT_CAUSE_STROKE: &str = "#ef4444";

const DIMMED_NODE_OPACITY: f32 = 0.2;
const FADED_EDGE_OPACITY: f32 = 0.1;
const HIGHLIGHT_WIDTH: f32 = 2.0;

/// Transient per-node / per-edge visual state handed to the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderAnnotation {
    pub opacity: f32,
    pub stroke: &'static str,
    pub stroke_width: f32,
}

impl RenderAnnotation {
    /// Full opacity, default stroke. What every node and edge shows when no
    /// highlight is active.
    pub const NEUTRAL: Self = Self {
        opacity: 1.0,
        stroke: NEUTRAL_STROKE,
        stroke_width: 1.0,
    };

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

impl Default for RenderAnnotation {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

// ============================================================================
// View State
// ============================================================================

/// (mode, selection) pair driving the highlight pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    mode: ViewMode,
    selected: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Switch modes. Always clears the selection, so every annotation
    /// recomputes to neutral on the next render.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.selected = None;
    }

    /// Record a node click. Selecting an id that is not in the graph is a
    /// no-op.
    pub fn click_node(&mut self, id: &str, graph: &LineageGraph) {
        if graph.contains_node(id) {
            self.selected = Some(id.to_string());
        }
    }

    /// Click on empty canvas: clear selection, keep the mode.
    pub fn click_pane(&mut self) {
        self.selected = None;
    }

    /// Drop the selection if it references `id` (called after a deletion).
    pub fn forget(&mut self, id: &str) {
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
    }

    /// The id set currently highlighted, or `None` when nothing is (Standard
    /// mode, or no selection). `statuses` is the materialized status view the
    /// root-cause walk reads — live statuses or a time-travel projection.
    pub fn active_closure(
        &self,
        graph: &LineageGraph,
        statuses: &HashMap<&str, HealthStatus>,
    ) -> Option<BTreeSet<String>> {
        let selected = self.selected.as_deref()?;
        match self.mode {
            ViewMode::Standard => None,
            ViewMode::ImpactAnalysis => Some(downstream_closure(selected, graph.edges())),
            ViewMode::RootCause => Some(upstream_error_closure_with(
                selected,
                statuses,
                graph.edges(),
            )),
        }
    }
}

// ============================================================================
// Annotation Functions
// ============================================================================

/// Visual state for one node given the active closure. Nodes outside the
/// closure dim; in Standard mode (closure `None`) nothing dims.
pub fn node_annotation(node_id: &str, closure: Option<&BTreeSet<String>>) -> RenderAnnotation {
    match closure {
        Some(set) if !set.contains(node_id) => RenderAnnotation {
            opacity: DIMMED_NODE_OPACITY,
            ..RenderAnnotation::NEUTRAL
        },
        _ => RenderAnnotation::NEUTRAL,
    }
}

/// Visual state for one edge. An edge with both endpoints in the closure is
/// highlighted in the mode's color; every other edge fades.
pub fn edge_annotation(
    edge: &LineageEdge,
    mode: ViewMode,
    closure: Option<&BTreeSet<String>>,
) -> RenderAnnotation {
    let Some(set) = closure else {
        return RenderAnnotation::NEUTRAL;
    };
    if set.contains(&edge.source) && set.contains(&edge.target) {
        RenderAnnotation {
            opacity: 1.0,
            stroke: match mode {
                ViewMode::RootCause => ROOT_CAUSE_STROKE,
                _ => IMPACT_STROKE,
            },
            stroke_width: HIGHLIGHT_WIDTH,
        }
    } else {
        RenderAnnotation {
            opacity: FADED_EDGE_OPACITY,
            ..RenderAnnotation::NEUTRAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{asset, edge};

    fn three_node_graph() -> LineageGraph {
        LineageGraph::from_parts(
            [
                asset("a", HealthStatus::Error),
                asset("b", HealthStatus::Error),
                asset("c", HealthStatus::Healthy),
            ],
            [edge("e1", "a", "b"), edge("e2", "b", "c")],
        )
    }

    fn live_statuses(graph: &LineageGraph) -> HashMap<&str, HealthStatus> {
        graph
            .nodes()
            .iter()
            .map(|n| (n.id.as_str(), n.status))
            .collect()
    }

    #[test]
    fn set_mode_clears_selection() {
        let graph = three_node_graph();
        let mut view = ViewState::new();
        view.set_mode(ViewMode::ImpactAnalysis);
        view.click_node("a", &graph);
        assert_eq!(view.selected(), Some("a"));

        view.set_mode(ViewMode::RootCause);
        assert_eq!(view.selected(), None);
        assert!(view.active_closure(&graph, &live_statuses(&graph)).is_none());
    }

    #[test]
    fn clicking_unknown_node_is_noop() {
        let graph = three_node_graph();
        let mut view = ViewState::new();
        view.set_mode(ViewMode::ImpactAnalysis);
        view.click_node("ghost", &graph);
        assert_eq!(view.selected(), None);
    }

    #[test]
    fn standard_mode_never_dims() {
        let graph = three_node_graph();
        let mut view = ViewState::new();
        view.click_node("a", &graph);

        let closure = view.active_closure(&graph, &live_statuses(&graph));
        assert!(closure.is_none());
        for node in graph.nodes() {
            assert!(node_annotation(&node.id, closure.as_ref()).is_neutral());
        }
        for e in graph.edges() {
            assert!(edge_annotation(e, view.mode(), closure.as_ref()).is_neutral());
        }
    }

    #[test]
    fn impact_mode_dims_outside_closure_and_highlights_path_edges() {
        let graph = three_node_graph();
        let mut view = ViewState::new();
        view.set_mode(ViewMode::ImpactAnalysis);
        view.click_node("b", &graph);

        let closure = view.active_closure(&graph, &live_statuses(&graph)).unwrap();
        // b -> c is the downstream closure; a dims.
        assert_eq!(node_annotation("a", Some(&closure)).opacity, 0.2);
        assert!(node_annotation("b", Some(&closure)).is_neutral());

        let e1 = edge_annotation(&graph.edges()[0], view.mode(), Some(&closure));
        let e2 = edge_annotation(&graph.edges()[1], view.mode(), Some(&closure));
        assert_eq!(e1.opacity, 0.1);
        assert_eq!(e2.stroke, IMPACT_STROKE);
        assert_eq!(e2.stroke_width, 2.0);
    }

    #[test]
    fn root_cause_uses_its_own_stroke() {
        let graph = three_node_graph();
        let mut view = ViewState::new();
        view.set_mode(ViewMode::RootCause);
        view.click_node("b", &graph);

        let closure = view.active_closure(&graph, &live_statuses(&graph)).unwrap();
        let e1 = edge_annotation(&graph.edges()[0], view.mode(), Some(&closure));
        assert_eq!(e1.stroke, ROOT_CAUSE_STROKE);
    }

    #[test]
    fn pane_click_clears_selection_but_keeps_mode() {
        let graph = three_node_graph();
        let mut view = ViewState::new();
        view.set_mode(ViewMode::ImpactAnalysis);
        view.click_node("a", &graph);
        view.click_pane();
        assert_eq!(view.selected(), None);
        assert_eq!(view.mode(), ViewMode::ImpactAnalysis);
    }
}
