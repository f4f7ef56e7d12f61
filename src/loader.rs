//! Batch accumulation and chunked bulk writes.
//!
//! Rows are buffered per destination table and flushed as one bulk write
//! per table inside a single transaction, making the chunk the commit
//! boundary. The loader is the throughput-critical path: no per-row
//! statements ever reach the store outside a flush.

use crate::error::EtlError;
use crate::warehouse::models::{ConflictPolicy, Table, WarehouseRow};
use crate::warehouse::WarehouseStore;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Default)]
pub struct BatchLoader {
    buffers: BTreeMap<Table, Vec<WarehouseRow>>,
    policy_overrides: HashMap<Table, ConflictPolicy>,
}

impl BatchLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the conflict policy for one table. Tables keep their
    /// default policy otherwise (fail for dimensions and facts, ignore for
    /// bridges).
    pub fn with_policy(mut self, table: Table, policy: ConflictPolicy) -> Self {
        self.policy_overrides.insert(table, policy);
        self
    }

    pub fn push(&mut self, row: WarehouseRow) {
        self.buffers.entry(row.table()).or_default().push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = WarehouseRow>) {
        for row in rows {
            self.push(row);
        }
    }

    /// Total buffered rows across all tables. Fan-out stages size their
    /// chunks on this rather than on source rows.
    pub fn pending_rows(&self) -> usize {
        self.buffers.values().map(Vec::len).sum()
    }

    fn policy_for(&self, table: Table) -> ConflictPolicy {
        self.policy_overrides
            .get(&table)
            .copied()
            .unwrap_or_else(|| table.default_conflict_policy())
    }

    /// Write and commit every buffered row as one chunk. On error nothing
    /// from this chunk is committed and the buffers are left intact for
    /// the caller to inspect or drop.
    pub fn flush(
        &mut self,
        store: &mut WarehouseStore,
    ) -> Result<BTreeMap<Table, usize>, EtlError> {
        if self.buffers.is_empty() {
            return Ok(BTreeMap::new());
        }
        let written = store.write_chunk(&self.buffers, |table| self.policy_for(table))?;
        for (table, count) in &written {
            debug!(table = table.name(), rows = count, "chunk flushed");
        }
        self.buffers.clear();
        Ok(written)
    }
}

/// Running per-table totals across a stage.
pub fn accumulate(totals: &mut BTreeMap<Table, usize>, written: BTreeMap<Table, usize>) {
    for (table, count) in written {
        *totals.entry(table).or_default() += count;
    }
}
