// SPDX-License-Identifier: MIT

//! `CellDag`: the dependency graph with topological ordering, cycle
//! detection, parallel-layer discovery, critical-path analysis, and
//! live execution-state tracking (§4.2).

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

use hive_core::CellId;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::DagError;
use crate::node::{CellNode, CellState};

/// The DAG's serialized form: every node plus the completed/running/
/// failed id sets, so a restarted scheduler can reconstruct execution
/// state (§4.2 "Serialization").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagDocument {
    pub nodes: Vec<CellNode>,
    pub completed: Vec<CellId>,
    pub running: Vec<CellId>,
    pub failed: Vec<CellId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

struct Inner {
    nodes: IndexMap<CellId, CellNode>,
    cached_topo: Option<Vec<CellId>>,
    cached_layers: Option<Vec<Vec<CellId>>>,
}

impl Inner {
    fn invalidate(&mut self) {
        self.cached_topo = None;
        self.cached_layers = None;
    }
}

/// The dependency graph. Interior-mutable so the Queen and Pool can
/// share one instance across threads; every public method takes `&self`
/// and locks internally.
pub struct CellDag {
    inner: RwLock<Inner>,
}

impl Default for CellDag {
    fn default() -> Self {
        Self::new()
    }
}

impl CellDag {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                nodes: IndexMap::new(),
                cached_topo: None,
                cached_layers: None,
            }),
        }
    }

    #[instrument(skip(self))]
    pub fn add_cell(
        &self,
        id: CellId,
        dependencies: Vec<CellId>,
        priority: i64,
        estimated_duration_secs: u64,
    ) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        if inner.nodes.contains_key(&id) {
            return Err(DagError::DuplicateCell(id));
        }
        let mut node = CellNode::new(id.clone(), dependencies.clone(), priority, estimated_duration_secs);

        // Backfill: any already-present node that declared a dependency
        // on `id` (a forward reference) becomes one of its dependents.
        for (other_id, other_node) in inner.nodes.iter() {
            if other_node.dependencies.contains(&id) {
                node.dependents.push(other_id.clone());
            }
        }
        // Forward-link: for each dependency that already exists, record
        // `id` as one of its dependents.
        for dep in &node.dependencies {
            if let Some(dep_node) = inner.nodes.get_mut(dep) {
                if !dep_node.dependents.contains(&id) {
                    dep_node.dependents.push(id.clone());
                }
            }
        }

        inner.nodes.insert(id, node);
        inner.invalidate();
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn update_dependencies(&self, id: &CellId, dependencies: Vec<CellId>) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        if !inner.nodes.contains_key(id) {
            return Err(DagError::UnknownCell(id.clone()));
        }
        let old_deps = inner.nodes[id].dependencies.clone();
        for dep in &old_deps {
            if let Some(dep_node) = inner.nodes.get_mut(dep) {
                dep_node.dependents.retain(|d| d != id);
            }
        }
        for dep in &dependencies {
            if let Some(dep_node) = inner.nodes.get_mut(dep) {
                if !dep_node.dependents.contains(id) {
                    dep_node.dependents.push(id.clone());
                }
            }
        }
        #[allow(clippy::unwrap_used)]
        {
            inner.nodes.get_mut(id).unwrap().dependencies = dependencies;
        }
        inner.invalidate();
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn remove_cell(&self, id: &CellId) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .shift_remove(id)
            .ok_or_else(|| DagError::UnknownCell(id.clone()))?;
        for dep in &node.dependencies {
            if let Some(dep_node) = inner.nodes.get_mut(dep) {
                dep_node.dependents.retain(|d| d != id);
            }
        }
        for dependent in &node.dependents {
            if let Some(dependent_node) = inner.nodes.get_mut(dependent) {
                dependent_node.dependencies.retain(|d| d != id);
            }
        }
        inner.invalidate();
        Ok(())
    }

    /// DFS with white/gray/black coloring. Returns the witnessing cycle
    /// (reversed for readability) if one exists.
    pub fn detect_cycle(&self) -> Option<Vec<CellId>> {
        let inner = self.inner.read();
        detect_cycle_locked(&inner.nodes)
    }

    #[instrument(skip(self))]
    pub fn topological_sort(&self) -> Result<Vec<CellId>, DagError> {
        if let Some(path) = self.detect_cycle() {
            warn!(?path, "cycle detected, refusing to order");
            return Err(DagError::CycleDetected { path });
        }
        {
            let inner = self.inner.read();
            if let Some(cached) = &inner.cached_topo {
                return Ok(cached.clone());
            }
        }
        let mut inner = self.inner.write();
        if let Some(cached) = &inner.cached_topo {
            return Ok(cached.clone());
        }
        let order = topological_sort_locked(&inner.nodes);
        inner.cached_topo = Some(order.clone());
        Ok(order)
    }

    #[instrument(skip(self))]
    pub fn get_parallel_layers(&self) -> Result<Vec<Vec<CellId>>, DagError> {
        if let Some(path) = self.detect_cycle() {
            return Err(DagError::CycleDetected { path });
        }
        {
            let inner = self.inner.read();
            if let Some(cached) = &inner.cached_layers {
                return Ok(cached.clone());
            }
        }
        let mut inner = self.inner.write();
        if let Some(cached) = &inner.cached_layers {
            return Ok(cached.clone());
        }
        let topo = topological_sort_locked(&inner.nodes);
        let layers = parallel_layers_locked(&mut inner.nodes, &topo);
        inner.cached_layers = Some(layers.clone());
        debug!(layer_count = layers.len(), "computed parallel layers");
        Ok(layers)
    }

    /// Admission-control view of [`Self::get_parallel_layers`]: each
    /// layer is truncated to at most `limit` entries (lowest priority
    /// first deferred). The DAG's own layers are unaffected; this is a
    /// scheduler-facing view only (§4.2.1, §9 open question).
    pub fn get_parallel_layers_admitted(&self, limit: usize) -> Result<Vec<Vec<CellId>>, DagError> {
        let layers = self.get_parallel_layers()?;
        if limit == 0 {
            return Ok(layers);
        }
        Ok(layers
            .into_iter()
            .map(|mut layer| {
                if layer.len() > limit {
                    layer.truncate(limit);
                }
                layer
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub fn get_critical_path(&self) -> Result<Vec<CellId>, DagError> {
        if let Some(path) = self.detect_cycle() {
            return Err(DagError::CycleDetected { path });
        }
        let inner = self.inner.read();
        let topo = topological_sort_locked(&inner.nodes);
        Ok(critical_path_locked(&inner.nodes, &topo))
    }

    /// Nodes in `pending` whose full dependency set is `completed`,
    /// sorted by descending priority.
    pub fn get_ready_cells(&self) -> Vec<CellId> {
        let inner = self.inner.read();
        let mut ready: Vec<CellId> = inner
            .nodes
            .values()
            .filter(|n| {
                n.state == CellState::Pending
                    && n.dependencies
                        .iter()
                        .all(|d| inner.nodes.get(d).map(|dn| dn.state == CellState::Completed).unwrap_or(false))
            })
            .map(|n| n.id.clone())
            .collect();
        ready.sort_by(|a, b| inner.nodes[b].priority.cmp(&inner.nodes[a].priority));
        ready
    }

    pub fn mark_running(&self, id: &CellId, now: u64) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or_else(|| DagError::UnknownCell(id.clone()))?;
        node.state = CellState::Running;
        node.started_at = Some(now);
        Ok(())
    }

    pub fn mark_completed(&self, id: &CellId, now: u64) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or_else(|| DagError::UnknownCell(id.clone()))?;
        node.state = CellState::Completed;
        node.completed_at = Some(now);
        Ok(())
    }

    /// Marks `id` failed, then propagates: BFS over `dependents`,
    /// flipping any `pending` descendant to `blocked` (property 6).
    #[instrument(skip(self))]
    pub fn mark_failed(&self, id: &CellId, now: u64) -> Result<Vec<CellId>, DagError> {
        let mut inner = self.inner.write();
        if !inner.nodes.contains_key(id) {
            return Err(DagError::UnknownCell(id.clone()));
        }
        {
            #[allow(clippy::unwrap_used)]
            let node = inner.nodes.get_mut(id).unwrap();
            node.state = CellState::Failed;
            node.completed_at = Some(now);
        }

        let mut blocked = Vec::new();
        let mut queue: VecDeque<CellId> = inner.nodes[id].dependents.clone().into();
        let mut visited: HashSet<CellId> = HashSet::new();
        while let Some(next) = queue.pop_front() {
            if !visited.insert(next.clone()) {
                continue;
            }
            if let Some(node) = inner.nodes.get_mut(&next) {
                if node.state == CellState::Pending {
                    node.state = CellState::Blocked;
                    blocked.push(next.clone());
                }
                for dependent in node.dependents.clone() {
                    queue.push_back(dependent);
                }
            }
        }
        debug!(blocked_count = blocked.len(), "propagated failure");
        Ok(blocked)
    }

    /// Manually reset `id` to `pending`, clearing its timestamps. Does
    /// NOT auto-unblock descendants (§9 open question: preserved
    /// manual-reset semantics).
    pub fn reset_cell(&self, id: &CellId) -> Result<(), DagError> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or_else(|| DagError::UnknownCell(id.clone()))?;
        node.state = CellState::Pending;
        node.started_at = None;
        node.completed_at = None;
        Ok(())
    }

    pub fn contains(&self, id: &CellId) -> bool {
        self.inner.read().nodes.contains_key(id)
    }

    pub fn node(&self, id: &CellId) -> Option<CellNode> {
        self.inner.read().nodes.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }

    pub fn all_nodes(&self) -> Vec<CellNode> {
        self.inner.read().nodes.values().cloned().collect()
    }

    /// Serialize the graph plus its completed/running/failed id sets
    /// into a single structured document (§4.2, property 10: round-trip).
    pub fn to_dict(&self) -> DagDocument {
        let inner = self.inner.read();
        let mut completed = Vec::new();
        let mut running = Vec::new();
        let mut failed = Vec::new();
        for node in inner.nodes.values() {
            match node.state {
                CellState::Completed => completed.push(node.id.clone()),
                CellState::Running => running.push(node.id.clone()),
                CellState::Failed => failed.push(node.id.clone()),
                _ => {}
            }
        }
        DagDocument {
            nodes: inner.nodes.values().cloned().collect(),
            completed,
            running,
            failed,
        }
    }

    /// Reconstruct a graph from a previously serialized document.
    /// Dependents are rebuilt from each node's declared dependencies
    /// rather than trusted from the document, so a hand-edited or
    /// partially-written document cannot desync the two directions.
    pub fn from_dict(doc: DagDocument) -> Self {
        let dag = Self::new();
        {
            let mut inner = dag.inner.write();
            for mut node in doc.nodes {
                node.dependents.clear();
                inner.nodes.insert(node.id.clone(), node);
            }
            let ids: Vec<CellId> = inner.nodes.keys().cloned().collect();
            for id in &ids {
                #[allow(clippy::unwrap_used)]
                let deps = inner.nodes.get(id).unwrap().dependencies.clone();
                for dep in deps {
                    if let Some(dep_node) = inner.nodes.get_mut(&dep) {
                        if !dep_node.dependents.contains(id) {
                            dep_node.dependents.push(id.clone());
                        }
                    }
                }
            }
            inner.invalidate();
        }
        dag
    }

    /// Atomically persist [`Self::to_dict`] to `path` (tmp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), DagError> {
        let doc = self.to_dict();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&doc)?;
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Load a graph previously written by [`Self::save`].
    pub fn load(path: &Path) -> Result<Self, DagError> {
        let text = fs::read_to_string(path)?;
        let doc: DagDocument = serde_json::from_str(&text)?;
        Ok(Self::from_dict(doc))
    }
}

fn detect_cycle_locked(nodes: &IndexMap<CellId, CellNode>) -> Option<Vec<CellId>> {
    let mut color: HashMap<CellId, Color> = nodes.keys().map(|k| (k.clone(), Color::White)).collect();
    let mut stack: Vec<CellId> = Vec::new();

    fn visit(
        id: &CellId,
        nodes: &IndexMap<CellId, CellNode>,
        color: &mut HashMap<CellId, Color>,
        stack: &mut Vec<CellId>,
    ) -> Option<Vec<CellId>> {
        color.insert(id.clone(), Color::Gray);
        stack.push(id.clone());
        if let Some(node) = nodes.get(id) {
            for dep in &node.dependencies {
                match color.get(dep).copied() {
                    Some(Color::Gray) => {
                        let start = stack.iter().position(|c| c == dep).unwrap_or(0);
                        let mut cycle: Vec<CellId> = stack[start..].to_vec();
                        cycle.reverse();
                        return Some(cycle);
                    }
                    Some(Color::White) | None => {
                        if let Some(cycle) = visit(dep, nodes, color, stack) {
                            return Some(cycle);
                        }
                    }
                    Some(Color::Black) => {}
                }
            }
        }
        stack.pop();
        color.insert(id.clone(), Color::Black);
        None
    }

    for id in nodes.keys() {
        if color.get(id).copied() == Some(Color::White) {
            if let Some(cycle) = visit(id, nodes, &mut color, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn topological_sort_locked(nodes: &IndexMap<CellId, CellNode>) -> Vec<CellId> {
    let mut in_degree: HashMap<CellId, usize> = nodes
        .iter()
        .map(|(id, n)| (id.clone(), n.dependencies.len()))
        .collect();
    let mut ready: Vec<CellId> = nodes
        .values()
        .filter(|n| n.dependencies.is_empty())
        .map(|n| n.id.clone())
        .collect();
    let mut result = Vec::with_capacity(nodes.len());

    while !ready.is_empty() {
        ready.sort_by(|a, b| nodes[b].priority.cmp(&nodes[a].priority));
        let next = ready.remove(0);
        result.push(next.clone());
        if let Some(node) = nodes.get(&next) {
            for dependent in &node.dependents {
                if let Some(deg) = in_degree.get_mut(dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(dependent.clone());
                    }
                }
            }
        }
    }
    result
}

fn parallel_layers_locked(nodes: &mut IndexMap<CellId, CellNode>, topo: &[CellId]) -> Vec<Vec<CellId>> {
    let mut level: HashMap<CellId, u32> = HashMap::new();
    for id in topo {
        #[allow(clippy::unwrap_used)]
        let deps = nodes.get(id).unwrap().dependencies.clone();
        let lvl = deps
            .iter()
            .map(|d| level.get(d).copied().unwrap_or(0) + 1)
            .max()
            .unwrap_or(0);
        level.insert(id.clone(), lvl);
        if let Some(node) = nodes.get_mut(id) {
            node.level = lvl;
        }
    }
    let max_level = level.values().copied().max().unwrap_or(0);
    let mut layers: Vec<Vec<CellId>> = vec![Vec::new(); (max_level + 1) as usize];
    for id in topo {
        layers[level[id] as usize].push(id.clone());
    }
    for layer in layers.iter_mut() {
        layer.sort_by(|a, b| nodes[b].priority.cmp(&nodes[a].priority));
    }
    layers
}

fn critical_path_locked(nodes: &IndexMap<CellId, CellNode>, topo: &[CellId]) -> Vec<CellId> {
    let mut dist: HashMap<CellId, u64> = HashMap::new();
    let mut pred: HashMap<CellId, Option<CellId>> = HashMap::new();

    for id in topo {
        #[allow(clippy::unwrap_used)]
        let node = nodes.get(id).unwrap();
        let mut best: Option<(u64, CellId)> = None;
        for dep in &node.dependencies {
            if let Some(&d) = dist.get(dep) {
                if best.as_ref().map(|(b, _)| d > *b).unwrap_or(true) {
                    best = Some((d, dep.clone()));
                }
            }
        }
        match best {
            Some((d, dep_id)) => {
                dist.insert(id.clone(), d + node.estimated_duration_secs);
                pred.insert(id.clone(), Some(dep_id));
            }
            None => {
                dist.insert(id.clone(), node.estimated_duration_secs);
                pred.insert(id.clone(), None);
            }
        }
    }

    let Some(sink) = dist.iter().max_by_key(|(_, d)| **d).map(|(id, _)| id.clone()) else {
        return Vec::new();
    };

    let mut path = vec![sink.clone()];
    let mut current = sink;
    while let Some(Some(prev)) = pred.get(&current) {
        path.push(prev.clone());
        current = prev.clone();
    }
    path.reverse();
    path
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
