//! Explicit graph state and event reducer.
//!
//! The render layer holds one `GraphState` value and feeds it `GraphEvent`s;
//! it reads back derived values (annotations, projected statuses) after each
//! event. The engine itself carries no UI-framework dependency.
//!
//! Async completions (ingestion merges) carry the generation token minted
//! when the call started; the reducer drops a completion whose token no
//! longer matches, so a stale response cannot be applied over a graph the
//! user has edited in the meantime.

use crate::timetravel::{demo_overrides, project, StatusOverride, MAX_TIME_TRAVEL_DAYS};
use crate::view::{edge_annotation, node_annotation, RenderAnnotation, ViewMode, ViewState};
use crate::{DataAsset, HealthStatus, LineageEdge, LineageGraph};
use std::collections::{BTreeSet, HashMap};

/// Everything that can happen to the graph view.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    ModeSelected(ViewMode),
    NodeClicked(String),
    PaneClicked,
    NodeDeleted(String),
    StatusUpdated { id: String, status: HealthStatus },
    TimeTravelSet(u8),
    /// Completion of an async ingestion sync. `generation` must match the
    /// value of [`GraphState::generation`] observed when the sync started,
    /// otherwise the batch is discarded.
    MergeCompleted {
        generation: u64,
        nodes: Vec<DataAsset>,
        edges: Vec<LineageEdge>,
    },
}

/// The full engine-side state: graph, view machine, time-travel offset.
#[derive(Debug, Clone)]
pub struct GraphState {
    graph: LineageGraph,
    view: ViewState,
    time_travel_days: u8,
    overrides: Vec<StatusOverride>,
    generation: u64,
}

impl GraphState {
    pub fn new(graph: LineageGraph) -> Self {
        Self {
            graph,
            view: ViewState::new(),
            time_travel_days: 0,
            overrides: demo_overrides(),
            generation: 0,
        }
    }

    pub fn with_overrides(mut self, overrides: Vec<StatusOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn graph(&self) -> &LineageGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut LineageGraph {
        &mut self.graph
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn time_travel_days(&self) -> u8 {
        self.time_travel_days
    }

    /// Token to attach to an async completion. Bumped whenever the graph
    /// topology changes, which invalidates in-flight sync responses.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply one event.
    pub fn apply(&mut self, event: GraphEvent) {
        match event {
            GraphEvent::ModeSelected(mode) => self.view.set_mode(mode),
            GraphEvent::NodeClicked(id) => self.view.click_node(&id, &self.graph),
            GraphEvent::PaneClicked => self.view.click_pane(),
            GraphEvent::NodeDeleted(id) => {
                if self.graph.remove_node(&id) {
                    self.view.forget(&id);
                    self.generation += 1;
                }
            }
            GraphEvent::StatusUpdated { id, status } => {
                self.graph.update_node_status(&id, status);
            }
            GraphEvent::TimeTravelSet(days) => {
                self.time_travel_days = days.min(MAX_TIME_TRAVEL_DAYS);
            }
            GraphEvent::MergeCompleted {
                generation,
                nodes,
                edges,
            } => {
                if generation != self.generation {
                    tracing::warn!(
                        stale = generation,
                        current = self.generation,
                        "discarding stale ingestion result"
                    );
                    return;
                }
                let nodes_added = self.graph.add_nodes(nodes);
                let edges_added = self.graph.add_edges(edges);
                if nodes_added > 0 || edges_added > 0 {
                    self.generation += 1;
                }
            }
        }
    }

    /// Health statuses as currently displayed: the live values at offset 0,
    /// the projected past view otherwise.
    pub fn displayed_statuses(&self) -> HashMap<String, HealthStatus> {
        project(&self.graph, &self.overrides, self.time_travel_days)
    }

    fn active_closure(&self) -> Option<BTreeSet<String>> {
        let displayed = self.displayed_statuses();
        let statuses: HashMap<&str, HealthStatus> =
            displayed.iter().map(|(id, s)| (id.as_str(), *s)).collect();
        self.view.active_closure(&self.graph, &statuses)
    }

    /// Per-node render annotations for the current (mode, selection, offset).
    pub fn node_annotations(&self) -> HashMap<String, RenderAnnotation> {
        let closure = self.active_closure();
        self.graph
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), node_annotation(&n.id, closure.as_ref())))
            .collect()
    }

    /// Per-edge render annotations for the current (mode, selection, offset).
    pub fn edge_annotations(&self) -> HashMap<String, RenderAnnotation> {
        let closure = self.active_closure();
        self.graph
            .edges()
            .iter()
            .map(|e| {
                (
                    e.id.clone(),
                    edge_annotation(e, self.view.mode(), closure.as_ref()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_graph;
    use crate::tests::{asset, edge};

    #[test]
    fn mode_switch_resets_every_annotation_to_neutral() {
        let mut state = GraphState::new(seed_graph());
        state.apply(GraphEvent::ModeSelected(ViewMode::ImpactAnalysis));
        state.apply(GraphEvent::NodeClicked("stg_orders".to_string()));
        assert!(state.node_annotations().values().any(|a| !a.is_neutral()));

        state.apply(GraphEvent::ModeSelected(ViewMode::RootCause));
        assert!(state.node_annotations().values().all(|a| a.is_neutral()));
        assert!(state.edge_annotations().values().all(|a| a.is_neutral()));
    }

    #[test]
    fn deleting_selected_node_clears_selection() {
        let mut state = GraphState::new(seed_graph());
        state.apply(GraphEvent::NodeClicked("dash_mkt".to_string()));
        assert_eq!(state.view().selected(), Some("dash_mkt"));

        state.apply(GraphEvent::NodeDeleted("dash_mkt".to_string()));
        assert_eq!(state.view().selected(), None);
        assert!(!state.graph().contains_node("dash_mkt"));
    }

    #[test]
    fn stale_merge_is_discarded() {
        let mut state = GraphState::new(seed_graph());
        let token = state.generation();

        // Topology changes while the sync is in flight.
        state.apply(GraphEvent::NodeDeleted("dash_exec".to_string()));
        let before = state.graph().node_count();

        state.apply(GraphEvent::MergeCompleted {
            generation: token,
            nodes: vec![asset("late", HealthStatus::Healthy)],
            edges: vec![],
        });
        assert_eq!(state.graph().node_count(), before);
    }

    #[test]
    fn fresh_merge_applies_and_bumps_generation() {
        let mut state = GraphState::new(seed_graph());
        let token = state.generation();

        state.apply(GraphEvent::MergeCompleted {
            generation: token,
            nodes: vec![asset("new_table", HealthStatus::Healthy)],
            edges: vec![edge("e_new", "stg_orders", "new_table")],
        });
        assert!(state.graph().contains_node("new_table"));
        assert!(state.graph().contains_edge("e_new"));
        assert_eq!(state.generation(), token + 1);
    }

    #[test]
    fn root_cause_respects_time_travel_projection() {
        let mut state = GraphState::new(seed_graph());
        state.apply(GraphEvent::ModeSelected(ViewMode::RootCause));
        state.apply(GraphEvent::TimeTravelSet(3));
        state.apply(GraphEvent::NodeClicked("dash_mkt".to_string()));

        // At offset 3 the dashboard shows Healthy: the error path is empty,
        // so every node (the clicked one included) falls outside the closure.
        assert!(state
            .node_annotations()
            .values()
            .all(|a| a.opacity == 0.2));

        state.apply(GraphEvent::TimeTravelSet(0));
        state.apply(GraphEvent::NodeClicked("dash_mkt".to_string()));
        let annotations = state.node_annotations();
        assert!(annotations["dash_mkt"].is_neutral());
        assert!(annotations["fct_attribution"].is_neutral());
        assert_eq!(annotations["sap_raw"].opacity, 0.2);
    }

    #[test]
    fn time_travel_offset_clamps() {
        let mut state = GraphState::new(seed_graph());
        state.apply(GraphEvent::TimeTravelSet(99));
        assert_eq!(state.time_travel_days(), MAX_TIME_TRAVEL_DAYS);
    }
}
