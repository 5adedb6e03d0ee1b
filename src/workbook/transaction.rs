use super::workbook::{ChangeSet, Workbook};
use crate::dependency::DependencyGraph;
use crate::evaluator::{CellResolver, Resolution};
use crate::formula::CellRef;
use crate::types::{CellAddress, CellValue};
use std::collections::{HashMap, HashSet};

/// A read-only view of the workbook's cell values captured before a
/// mutation, used to construct cells during the mutate phase without
/// borrowing the workbook mutably and immutably at once. Values seen through
/// it may be stale by the time the transaction's recompute phase runs —
/// that's fine, recompute corrects everything it touches.
pub(super) struct SnapshotResolver {
    sheets: HashSet<String>,
    values: HashMap<(String, String), CellValue>,
}

impl SnapshotResolver {
    pub(super) fn capture(wb: &Workbook) -> SnapshotResolver {
        let mut sheets = HashSet::new();
        let mut values = HashMap::new();
        for sheet in wb.sheets() {
            let lower = sheet.name().to_ascii_lowercase();
            for (_, cell) in sheet.iter_cells() {
                values.insert((lower.clone(), cell.reference().addr_upper.clone()), cell.value().clone());
            }
            sheets.insert(lower);
        }
        SnapshotResolver { sheets, values }
    }
}

impl CellResolver for SnapshotResolver {
    fn resolve(&self, sheet_lower: &str, addr_upper: &str) -> Resolution {
        if !self.sheets.contains(sheet_lower) {
            return Resolution::MissingSheet;
        }
        match self.values.get(&(sheet_lower.to_string(), addr_upper.to_string())) {
            Some(v) => Resolution::Value(v.clone()),
            None => Resolution::Value(CellValue::Blank),
        }
    }
}

impl Workbook {
    /// Run `mutate` inside an update transaction: snapshot, mutate, rebuild
    /// the dependency graph, mark cycles, recompute the acyclic remainder,
    /// diff, and notify. `dirty` restricts graph work to the transitive
    /// dependents of the given cells; `None` means "recompute everything",
    /// used by operations whose edge changes are too diffuse to name
    /// precisely (rename, paste, sheet deletion).
    pub(super) fn run_transaction<F>(&mut self, dirty: Option<HashSet<CellRef>>, mutate: F) -> crate::Result<()>
    where
        F: FnOnce(&mut Workbook, &dyn CellResolver) -> crate::Result<()>,
    {
        let _span = tracing::debug_span!("update_transaction").entered();
        let pre = self.full_snapshot();
        {
            let _span = tracing::debug_span!("mutate").entered();
            let resolver = SnapshotResolver::capture(self);
            mutate(self, &resolver)?;
        }
        self.recompute(dirty);
        let post = self.full_snapshot();
        let changed = diff(&pre, &post);
        tracing::debug!(changed = changed.len(), "transaction complete");
        if !changed.is_empty() {
            self.notify(&changed);
        }
        Ok(())
    }

    fn full_snapshot(&self) -> HashMap<(String, String), CellValue> {
        let mut snapshot = HashMap::new();
        for sheet in self.sheets() {
            for (_, cell) in sheet.iter_cells() {
                snapshot.insert((sheet.name().to_string(), cell.reference().addr_upper.clone()), cell.value().clone());
            }
        }
        snapshot
    }

    fn notify(&self, changed: &ChangeSet) {
        for notifier in self.notifiers() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| notifier(self, changed)));
            if result.is_err() {
                tracing::warn!("notifier panicked; continuing with remaining notifiers");
            }
        }
    }

    pub(super) fn build_dependency_graph(&self) -> DependencyGraph<CellRef> {
        let _span = tracing::debug_span!("rebuild_dependency_graph").entered();
        let mut graph = DependencyGraph::new();
        for sheet in self.sheets() {
            for (_, cell) in sheet.iter_cells() {
                let me = cell.reference().clone();
                graph.add_vertex(me.clone());
                for dep in cell.dependencies() {
                    graph.add_dependency(me.clone(), dep);
                }
            }
        }
        graph
    }

    fn recompute(&mut self, dirty: Option<HashSet<CellRef>>) {
        let graph = self.build_dependency_graph();
        let scope: HashSet<CellRef> = match &dirty {
            Some(seeds) => graph.reachable_dependents(seeds),
            None => graph.vertices().cloned().collect(),
        };
        let sub = graph.subgraph(&scope);

        let cyclic = {
            let _span = tracing::debug_span!("cycle_detection").entered();
            let cyclic = sub.cyclic_vertices();
            if !cyclic.is_empty() {
                tracing::warn!(count = cyclic.len(), "marking cells circular");
            }
            for v in &cyclic {
                self.mark_cell_cyclical(v);
            }
            cyclic
        };

        let acyclic: HashSet<CellRef> = scope.difference(&cyclic).cloned().collect();
        let acyclic_graph = sub.subgraph(&acyclic);

        let _span = tracing::debug_span!("topological_recompute").entered();
        if let Some(order) = acyclic_graph.topological_order() {
            for vref in order {
                self.recompute_one(&vref);
            }
        }
    }

    fn mark_cell_cyclical(&mut self, vref: &CellRef) {
        if let Some(sheet) = self.sheet_by_lower_mut(&vref.sheet_lower) {
            if let Some(cell) = sheet.get_cell_mut_by_ref(vref) {
                cell.mark_cyclical();
            }
        }
    }

    /// Dangling vertices (referenced but never populated) have no cell to
    /// find and are silently skipped, as are literal (non-formula) cells,
    /// whose value never depends on anything else.
    fn recompute_one(&mut self, vref: &CellRef) {
        let tree = self
            .sheet_by_lower(&vref.sheet_lower)
            .and_then(|s| s.get_cell_by_ref(vref))
            .and_then(|c| c.tree());
        let Some(tree) = tree else { return };
        let value = crate::evaluator::evaluate(&tree, vref, self, self.functions());
        if let Some(sheet) = self.sheet_by_lower_mut(&vref.sheet_lower) {
            if let Some(cell) = sheet.get_cell_mut_by_ref(vref) {
                cell.set_value(value);
            }
        }
    }
}

fn diff(pre: &HashMap<(String, String), CellValue>, post: &HashMap<(String, String), CellValue>) -> ChangeSet {
    let mut changed = ChangeSet::new();
    for (key, value) in post {
        match pre.get(key) {
            Some(old) if old == value => {}
            _ => {
                changed.insert(key.clone());
            }
        }
    }
    for key in pre.keys() {
        if !post.contains_key(key) {
            changed.insert(key.clone());
        }
    }
    changed
}

impl CellResolver for Workbook {
    fn resolve(&self, sheet_lower: &str, addr_upper: &str) -> Resolution {
        match self.sheet_by_lower(sheet_lower) {
            None => Resolution::MissingSheet,
            Some(sheet) => {
                let value = match CellAddress::parse(addr_upper) {
                    Ok(addr) => sheet.get_cell_value(&addr),
                    Err(_) => CellValue::Blank,
                };
                Resolution::Value(value)
            }
        }
    }
}
