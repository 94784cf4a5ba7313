//! Query parameters and the knobs that control loading and joining.

use std::thread;

use clap::ValueEnum;

/// The three values that parameterise Query 5.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryParams {
    /// Region name, matched exactly against `region.tbl`.
    pub region: String,
    /// Inclusive lower bound on `o_orderdate`, `YYYY-MM-DD`.
    pub start_date: String,
    /// Exclusive upper bound on `o_orderdate`, `YYYY-MM-DD`.
    pub end_date: String,
}

impl QueryParams {
    pub fn new(
        region: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    /// Both dates must be `YYYY-MM-DD`.
    pub fn validate(&self) -> crate::error::Result<()> {
        for date in [&self.start_date, &self.end_date] {
            validate_date(date).map_err(crate::error::Q5Error::InvalidArgument)?;
        }
        Ok(())
    }

    /// Half-open date window test. Dates are fixed width so byte order is date order.
    #[inline]
    pub fn in_window(&self, date: &str) -> bool {
        date >= self.start_date.as_str() && date < self.end_date.as_str()
    }
}

/// How numeric fields of the fact table are parsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Fast parsers, malformed input degrades to a best-effort value.
    #[default]
    Lenient,
    /// Every materialized field must be well formed and the line must have 7+ fields.
    Strict,
}

/// What happens when a load task cannot reopen the fact file for its range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PartitionErrorPolicy {
    /// Abort the whole load.
    #[default]
    Fail,
    /// The task contributes zero records; the partition is reported as degraded.
    Skip,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub parse: ParsePolicy,
    pub on_partition_error: PartitionErrorPolicy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum JoinStrategy {
    /// Array-indexed lookups, parallel over slices of the fact table.
    #[default]
    Dense,
    /// Hash map lookups, single threaded. Reference computation.
    Hash,
}

/// Caps `requested` to the hardware concurrency, never below 1.
pub fn effective_threads(requested: usize) -> usize {
    let hw = match thread::available_parallelism() {
        Ok(n) => n.get(),
        Err(_) => {
            tracing::warn!("couldn't query the available parallelism, going single-threaded");
            1
        }
    };
    requested.clamp(1, hw.max(1))
}

/// Accepts `YYYY-MM-DD` only. Used as a clap value parser.
pub fn validate_date(s: &str) -> Result<String, String> {
    let b = s.as_bytes();
    let shape_ok = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b
            .iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if shape_ok {
        Ok(s.to_string())
    } else {
        Err(format!("expected a date as YYYY-MM-DD, got `{s}`"))
    }
}
