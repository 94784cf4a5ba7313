//! TPC-H Query 5 over pipe-delimited `.tbl` files.
//!
//! Revenue per nation of a region, for orders in a date window where the
//! customer and the supplier share a nation. `lineitem.tbl` is split into
//! line-aligned byte ranges and parsed in parallel; the join uses arrays
//! indexed by key instead of hash maps, also in parallel, with one private
//! accumulator per worker.

pub mod config;
pub mod error;
pub mod index;
pub mod join;
pub mod lineitem;
pub mod output;
pub mod parse;
pub mod partition;
pub mod query;
pub mod tables;

pub use config::{JoinStrategy, LoadOptions, ParsePolicy, PartitionErrorPolicy, QueryParams};
pub use error::{Q5Error, Result};
pub use join::ResultMap;
pub use query::{execute_query5, run};
