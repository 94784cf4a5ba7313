//! Dense, array-indexed lookups over the dimension tables.
//!
//! Keys index straight into a `Vec`, so a lookup is one bounds check and one
//! load. The memory cost scales with the largest key rather than with the
//! number of rows, which is only reasonable while keys are dense (as in
//! generated TPC-H data).

use crate::config::QueryParams;
use crate::error::Result;
use crate::tables::Tables;

const ABSENT: i32 = -1;

/// `key -> value` for keys in `0..=max_key`. Anything else is absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenseIndex {
    slots: Vec<i32>,
}

impl DenseIndex {
    /// All slots start absent. A negative `max_key` gives an index that holds nothing.
    pub fn with_max_key(max_key: i32) -> Self {
        let len = usize::try_from(max_key).map_or(0, |k| k + 1);
        Self {
            slots: vec![ABSENT; len],
        }
    }

    /// Returns false if `key` is out of range; nothing is stored then.
    pub fn insert(&mut self, key: i32, value: i32) -> bool {
        match usize::try_from(key).ok().and_then(|k| self.slots.get_mut(k)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn get(&self, key: i32) -> Option<i32> {
        let k = usize::try_from(key).ok()?;
        match self.slots.get(k) {
            Some(&v) if v != ABSENT => Some(v),
            _ => None,
        }
    }

    /// Number of slots, i.e. `max_key + 1`.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The nations of the queried region.
///
/// Positions follow the order nations appear in `nation.tbl` and only select
/// accumulator slots; the final [`ResultMap`](crate::join::ResultMap) is keyed
/// by name.
#[derive(Clone, Debug)]
pub struct NationIndex {
    /// Position `i` holds the name of the nation stored at position `i`.
    /// Names may repeat; see [`to_result_map`](crate::join::to_result_map).
    pub names: Vec<String>,
    /// nation key -> position in `names`
    pub position: DenseIndex,
}

impl NationIndex {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Everything the join needs, built once and then only read.
#[derive(Clone, Debug)]
pub struct DimensionIndexes {
    pub nations: NationIndex,
    /// order key -> customer key, only for orders inside the date window
    pub order_customer: DenseIndex,
    /// customer key -> nation key
    pub customer_nation: DenseIndex,
    /// supplier key -> nation key, only for suppliers in the region
    pub supplier_nation: DenseIndex,
}

fn max_key(keys: impl Iterator<Item = i32>) -> i32 {
    keys.fold(0, i32::max)
}

impl DimensionIndexes {
    /// Fails only when `query.region` is not in `tables.regions`.
    pub fn build(query: &QueryParams, tables: &Tables) -> Result<Self> {
        let region_key = tables.region_key(&query.region)?;

        let mut names = Vec::new();
        let mut position = DenseIndex::with_max_key(max_key(tables.nations.iter().map(|n| n.key)));
        for n in tables.nations.iter().filter(|n| n.region_key == region_key) {
            if position.insert(n.key, names.len() as i32) {
                names.push(n.name.clone());
            }
        }
        let nations = NationIndex { names, position };

        let mut order_customer =
            DenseIndex::with_max_key(max_key(tables.orders.iter().map(|o| o.key)));
        for o in tables.orders.iter().filter(|o| query.in_window(&o.order_date)) {
            order_customer.insert(o.key, o.cust_key);
        }

        let mut customer_nation =
            DenseIndex::with_max_key(max_key(tables.customers.iter().map(|c| c.key)));
        for c in &tables.customers {
            customer_nation.insert(c.key, c.nation_key);
        }

        let mut supplier_nation =
            DenseIndex::with_max_key(max_key(tables.suppliers.iter().map(|s| s.key)));
        for s in &tables.suppliers {
            if nations.position.get(s.nation_key).is_some() {
                supplier_nation.insert(s.key, s.nation_key);
            }
        }

        tracing::debug!(
            region_key,
            nations = nations.len(),
            order_slots = order_customer.len(),
            customer_slots = customer_nation.len(),
            supplier_slots = supplier_nation.len(),
            "built dimension indexes"
        );
        Ok(Self {
            nations,
            order_customer,
            customer_nation,
            supplier_nation,
        })
    }

    /// Position in `nations.names` that a lineitem with these keys is credited to,
    /// or `None` if it drops out of the join.
    #[inline]
    pub fn nation_slot(&self, order_key: i32, supp_key: i32) -> Option<usize> {
        let cust = self.order_customer.get(order_key)?;
        let cust_nation = self.customer_nation.get(cust)?;
        let supp_nation = self.supplier_nation.get(supp_key)?;
        if cust_nation != supp_nation {
            return None;
        }
        self.nations.position.get(cust_nation).map(|p| p as usize)
    }
}
