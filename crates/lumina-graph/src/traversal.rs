//! Lineage traversals: downstream impact and upstream root cause.
//!
//! Both walks are breadth-first over an explicit snapshot and never mutate
//! it. A visited-set guard makes them terminate on arbitrary directed graphs,
//! cycles included. Results are `BTreeSet`s so identical inputs always
//! produce identical, deterministically ordered output.

use crate::{DataAsset, HealthStatus, LineageEdge};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Every asset reachable from `start` by following edges source -> target,
/// including `start` itself.
///
/// The start id is seeded into the frontier before any membership check, so
/// an id that is not in the edge set still yields the singleton `{start}`.
pub fn downstream_closure(start: &str, edges: &[LineageEdge]) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    let mut queue = VecDeque::from([start.to_string()]);

    while let Some(current) = queue.pop_front() {
        if !closure.insert(current.clone()) {
            continue;
        }
        for edge in edges.iter().filter(|e| e.source == current) {
            queue.push_back(edge.target.clone());
        }
    }
    closure
}

/// The upstream error path from `start`: walk edges backward
/// (target -> source), but only add a node to the result and keep expanding
/// through it while its status is not Healthy.
///
/// A Healthy node is a firewall: it is excluded from the result and its
/// predecessors are not explored through it. If `start` itself is Healthy
/// (or unknown), the result is empty — "no error path".
pub fn upstream_error_closure(
    start: &str,
    nodes: &[DataAsset],
    edges: &[LineageEdge],
) -> BTreeSet<String> {
    let statuses: HashMap<&str, HealthStatus> =
        nodes.iter().map(|n| (n.id.as_str(), n.status)).collect();
    upstream_error_closure_with(start, &statuses, edges)
}

/// [`upstream_error_closure`] against an explicit status view, e.g. the
/// materialized output of the time-travel projector.
pub fn upstream_error_closure_with(
    start: &str,
    statuses: &HashMap<&str, HealthStatus>,
    edges: &[LineageEdge],
) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::from([start.to_string()]);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        match statuses.get(current.as_str()) {
            Some(status) if *status != HealthStatus::Healthy => {
                closure.insert(current.clone());
                for edge in edges.iter().filter(|e| e.target == current) {
                    queue.push_back(edge.source.clone());
                }
            }
            // Healthy or unknown: do not include, do not expand.
            _ => {}
        }
    }
    closure
}
