//! End-to-end execution of Query 5.

use std::path::Path;
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{JoinStrategy, LoadOptions, QueryParams};
use crate::error::Result;
use crate::index::DimensionIndexes;
use crate::join::{aggregate_dense, aggregate_hashed, to_result_map, ResultMap};
use crate::lineitem::{load_lineitems, LineItem};
use crate::tables::Tables;

/// A pool with exactly `threads` workers (at least one). Shared by the load and join phases.
pub fn build_pool(threads: usize) -> Result<ThreadPool> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("q5-worker-{i}"))
        .build()?)
}

/// Runs the join over already loaded data.
///
/// Every nation of the region appears in the result, with 0.0 if nothing matched.
/// Fails only when the region does not exist.
pub fn execute_query5(
    query: &QueryParams,
    tables: &Tables,
    items: &[LineItem],
    pool: &ThreadPool,
    strategy: JoinStrategy,
) -> Result<ResultMap> {
    let start = Instant::now();
    let result = match strategy {
        JoinStrategy::Dense => {
            let idx = DimensionIndexes::build(query, tables)?;
            let totals = aggregate_dense(items, &idx, pool);
            to_result_map(&idx.nations.names, &totals)
        }
        JoinStrategy::Hash => aggregate_hashed(query, tables, items)?,
    };
    tracing::info!(
        threads = pool.current_num_threads(),
        ?strategy,
        elapsed_ms = start.elapsed().as_millis() as u64,
        nations = result.len(),
        "executed query 5"
    );
    Ok(result)
}

/// Loads the dimension tables and `lineitem.tbl` from `table_dir`, then runs the query.
pub fn run(
    query: &QueryParams,
    table_dir: &Path,
    threads: usize,
    options: LoadOptions,
    strategy: JoinStrategy,
) -> Result<ResultMap> {
    query.validate()?;
    let pool = build_pool(threads)?;
    let tables = Tables::load(table_dir)?;
    // fail on an unknown region before paying for the fact table
    tables.region_key(&query.region)?;
    let lineitems = load_lineitems(&table_dir.join("lineitem.tbl"), &pool, options)?;
    if !lineitems.degraded_partitions.is_empty() {
        tracing::warn!(
            partitions = ?lineitems.degraded_partitions,
            "result is missing the records of unreadable partitions"
        );
    }
    execute_query5(query, &tables, &lineitems.records, &pool, strategy)
}
