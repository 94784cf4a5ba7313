//! Join of lineitem against the dimension indexes, summing revenue per nation.

use std::collections::BTreeMap;
use std::ops::Range;

use ahash::AHashMap;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::config::QueryParams;
use crate::error::Result;
use crate::index::DimensionIndexes;
use crate::lineitem::LineItem;
use crate::tables::Tables;

/// Nation name -> total revenue.
pub type ResultMap = BTreeMap<String, f64>;

/// `workers` contiguous slices of `0..len` of `ceil(len / workers)` items
/// each. Trailing slices are empty when there are fewer items than workers.
pub fn slice_bounds(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let chunk = len.div_ceil(workers);
    (0..workers)
        .map(|t| {
            let b = (t * chunk).min(len);
            let e = (b + chunk).min(len);
            b..e
        })
        .collect()
}

/// Revenue of `items` by nation position, into a fresh accumulator.
fn accumulate(items: &[LineItem], idx: &DimensionIndexes) -> Vec<f64> {
    let mut acc = vec![0.0; idx.nations.len()];
    for li in items {
        if let Some(slot) = idx.nation_slot(li.order_key, li.supp_key) {
            acc[slot] += li.revenue();
        }
    }
    acc
}

/// Element-wise sum of the per-worker accumulators.
pub fn reduce_partials(partials: &[Vec<f64>], width: usize) -> Vec<f64> {
    let mut totals = vec![0.0; width];
    for acc in partials {
        for (t, v) in totals.iter_mut().zip(acc) {
            *t += v;
        }
    }
    totals
}

/// Per-nation revenue, one slice of `items` per thread of `pool`.
/// Position `i` of the result belongs to `idx.nations.names[i]`.
pub fn aggregate_dense(items: &[LineItem], idx: &DimensionIndexes, pool: &ThreadPool) -> Vec<f64> {
    let bounds = slice_bounds(items.len(), pool.current_num_threads());
    let partials: Vec<Vec<f64>> = pool.install(|| {
        bounds
            .par_iter()
            .map(|r| accumulate(&items[r.clone()], idx))
            .collect()
    });
    reduce_partials(&partials, idx.nations.len())
}

/// Pairs nation names with their totals. Nations sharing a name are summed.
pub fn to_result_map(names: &[String], totals: &[f64]) -> ResultMap {
    let mut map = ResultMap::new();
    for (name, total) in names.iter().zip(totals) {
        *map.entry(name.clone()).or_insert(0.0) += total;
    }
    map
}

/// Query 5 computed with hash maps on a single thread, straight from the
/// tables. Slower; used to cross-check the dense path.
pub fn aggregate_hashed(query: &QueryParams, tables: &Tables, items: &[LineItem]) -> Result<ResultMap> {
    let region_key = tables.region_key(&query.region)?;

    let mut result = ResultMap::new();
    let mut nation_name: AHashMap<i32, &str> = AHashMap::new();
    for n in tables.nations.iter().filter(|n| n.region_key == region_key) {
        nation_name.insert(n.key, &n.name);
        result.insert(n.name.clone(), 0.0);
    }

    let order_customer: AHashMap<i32, i32> = tables
        .orders
        .iter()
        .filter(|o| query.in_window(&o.order_date))
        .map(|o| (o.key, o.cust_key))
        .collect();
    let customer_nation: AHashMap<i32, i32> =
        tables.customers.iter().map(|c| (c.key, c.nation_key)).collect();
    let supplier_nation: AHashMap<i32, i32> = tables
        .suppliers
        .iter()
        .filter(|s| nation_name.contains_key(&s.nation_key))
        .map(|s| (s.key, s.nation_key))
        .collect();

    for li in items {
        let Some(cust) = order_customer.get(&li.order_key) else {
            continue;
        };
        let Some(cust_nation) = customer_nation.get(cust) else {
            continue;
        };
        let Some(supp_nation) = supplier_nation.get(&li.supp_key) else {
            continue;
        };
        if cust_nation != supp_nation {
            continue;
        }
        if let Some(total) = nation_name
            .get(cust_nation)
            .and_then(|name| result.get_mut(*name))
        {
            *total += li.revenue();
        }
    }
    Ok(result)
}
