//! Parallel loader for `lineitem.tbl`, the fact table.

use std::fs::File;
use std::io;
use std::iter;
use std::path::Path;

use memchr::{memchr, memchr_iter};
use memmap2::Mmap;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::config::{LoadOptions, ParsePolicy, PartitionErrorPolicy};
use crate::error::{Q5Error, Result};
use crate::parse::{parse_decimal, parse_decimal_strict, parse_int, parse_int_strict};
use crate::partition::{line_aligned_ranges, ByteRange};

/// Only fields 0, 2, 5 and 6 of a lineitem row are kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineItem {
    pub order_key: i32,
    pub supp_key: i32,
    pub extended_price: f64,
    pub discount: f64,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            order_key: -1,
            supp_key: -1,
            extended_price: 0.0,
            discount: 0.0,
        }
    }
}

impl LineItem {
    /// `l_extendedprice * (1 - l_discount)`
    #[inline]
    pub fn revenue(&self) -> f64 {
        self.extended_price * (1.0 - self.discount)
    }
}

const ORDER_KEY: usize = 0;
const SUPP_KEY: usize = 2;
const EXTENDED_PRICE: usize = 5;
const DISCOUNT: usize = 6;
const MIN_FIELDS: usize = DISCOUNT + 1;

/// Per-task buffer capacity, grown as needed.
const INITIAL_CAPACITY: usize = 1024;

/// Calls `f(index, field)` for the first `MIN_FIELDS` fields of `line`.
/// Returns how many fields were visited.
#[inline]
fn for_each_field(line: &[u8], mut f: impl FnMut(usize, &[u8])) -> usize {
    let mut start = 0;
    let mut visited = 0;
    for (idx, end) in memchr_iter(b'|', line)
        .chain(iter::once(line.len()))
        .enumerate()
        .take(MIN_FIELDS)
    {
        f(idx, &line[start..end]);
        start = end + 1;
        visited = idx + 1;
    }
    visited
}

/// Best-effort parse: missing fields keep their defaults, bad digits are ignored.
pub fn parse_lineitem(line: &[u8]) -> LineItem {
    let mut item = LineItem::default();
    for_each_field(line, |idx, tok| match idx {
        ORDER_KEY => item.order_key = parse_int(tok),
        SUPP_KEY => item.supp_key = parse_int(tok),
        EXTENDED_PRICE => item.extended_price = parse_decimal(tok),
        DISCOUNT => item.discount = parse_decimal(tok),
        _ => {}
    });
    item
}

/// Checked parse. The error string names the offending field.
pub fn parse_lineitem_strict(line: &[u8]) -> std::result::Result<LineItem, String> {
    let mut item = LineItem::default();
    let mut bad: Option<String> = None;
    let fields = for_each_field(line, |idx, tok| {
        if bad.is_some() {
            return;
        }
        let ok = match idx {
            ORDER_KEY => parse_int_strict(tok).map(|v| item.order_key = v).is_some(),
            SUPP_KEY => parse_int_strict(tok).map(|v| item.supp_key = v).is_some(),
            EXTENDED_PRICE => parse_decimal_strict(tok)
                .map(|v| item.extended_price = v)
                .is_some(),
            DISCOUNT => parse_decimal_strict(tok).map(|v| item.discount = v).is_some(),
            _ => true,
        };
        if !ok {
            bad = Some(format!(
                "field {idx} is not numeric: `{}`",
                String::from_utf8_lossy(tok)
            ));
        }
    });
    if let Some(reason) = bad {
        return Err(reason);
    }
    if fields < MIN_FIELDS {
        return Err(format!("expected at least {MIN_FIELDS} fields, found {fields}"));
    }
    Ok(item)
}

/// Parses every line whose first byte lies in `range`.
/// `data` is the whole file; offsets in errors are absolute.
fn parse_range(data: &[u8], range: ByteRange, policy: ParsePolicy) -> Result<Vec<LineItem>> {
    let mut out = Vec::with_capacity(INITIAL_CAPACITY);
    let end = range.end.min(data.len());
    let mut pos = range.start;

    while pos < end {
        let line_end = match memchr(b'\n', &data[pos..]) {
            Some(nl) => pos + nl,
            None => data.len(),
        };
        let line = &data[pos..line_end];
        if !line.is_empty() {
            match policy {
                ParsePolicy::Lenient => out.push(parse_lineitem(line)),
                ParsePolicy::Strict => match parse_lineitem_strict(line) {
                    Ok(item) => out.push(item),
                    Err(reason) => {
                        return Err(Q5Error::MalformedField {
                            offset: pos,
                            reason,
                        })
                    }
                },
            }
        }
        pos = line_end + 1;
    }
    Ok(out)
}

/// The loaded fact table.
#[derive(Debug, Default)]
pub struct LineItems {
    /// Records in partition order.
    pub records: Vec<LineItem>,
    /// Partitions that could not be read and contributed nothing.
    /// Only ever non-empty under [`PartitionErrorPolicy::Skip`].
    pub degraded_partitions: Vec<usize>,
}

fn map_file(path: &Path) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // SAFETY: the file is treated as read-only input for the whole run
    unsafe { Mmap::map(&file) }
}

/// Loads `path` with one parsing task per thread of `pool`.
pub fn load_lineitems(path: &Path, pool: &ThreadPool, options: LoadOptions) -> Result<LineItems> {
    load_lineitems_with(path, pool, options, |p, _| map_file(p))
}

/// As [`load_lineitems`], with `open(path, partition)` supplying each task's
/// independent mapping of the file.
pub fn load_lineitems_with<F>(
    path: &Path,
    pool: &ThreadPool,
    options: LoadOptions,
    open: F,
) -> Result<LineItems>
where
    F: Fn(&Path, usize) -> io::Result<Mmap> + Sync,
{
    let file = File::open(path).map_err(|source| Q5Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let size = file.metadata()?.len();
    if size == 0 {
        tracing::info!(path = %path.display(), "empty fact table");
        return Ok(LineItems::default());
    }

    // SAFETY: as in map_file
    let whole = unsafe { Mmap::map(&file) }.map_err(|source| Q5Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let workers = pool.current_num_threads();
    let ranges = line_aligned_ranges(&whole, workers);
    drop(whole);
    drop(file);

    // --- per-task parsing into private buffers ---
    let locals: Vec<Result<Option<Vec<LineItem>>>> = pool.install(|| {
        ranges
            .par_iter()
            .enumerate()
            .map(|(t, &range)| {
                if range.is_empty() {
                    return Ok(Some(Vec::new()));
                }
                let data = match open(path, t) {
                    Ok(m) => m,
                    Err(source) => {
                        return match options.on_partition_error {
                            PartitionErrorPolicy::Fail => Err(Q5Error::Partition {
                                path: path.to_path_buf(),
                                partition: t,
                                source,
                            }),
                            PartitionErrorPolicy::Skip => {
                                tracing::warn!(
                                    partition = t,
                                    start = range.start,
                                    end = range.end,
                                    error = %source,
                                    "could not reopen fact table, partition contributes no records"
                                );
                                Ok(None)
                            }
                        };
                    }
                };
                let items = parse_range(&data, range, options.parse)?;
                tracing::debug!(partition = t, bytes = range.len(), records = items.len());
                Ok(Some(items))
            })
            .collect()
    });

    // --- merge in partition order ---
    let mut buffers = Vec::with_capacity(locals.len());
    let mut degraded_partitions = Vec::new();
    for (t, local) in locals.into_iter().enumerate() {
        match local? {
            Some(items) => buffers.push(items),
            None => degraded_partitions.push(t),
        }
    }
    let total = buffers.iter().map(Vec::len).sum();
    let mut records = Vec::with_capacity(total);
    for items in buffers {
        records.extend_from_slice(&items);
    }

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        partitions = ranges.len(),
        degraded = degraded_partitions.len(),
        "loaded fact table"
    );
    Ok(LineItems {
        records,
        degraded_partitions,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const ROW: &str = "5000|155190|1000|1|17|1000.0|0.10|0.02|N|O|1996-03-13|1996-02-12|1996-03-22|DELIVER IN PERSON|TRUCK|egular courts above the|";

    #[test]
    fn parse_fields_0_2_5_6() {
        let li = parse_lineitem(ROW.as_bytes());
        assert_eq!(5000, li.order_key);
        assert_eq!(1000, li.supp_key);
        assert!((li.extended_price - 1000.0).abs() < 1e-9);
        assert!((li.discount - 0.10).abs() < 1e-9);
        assert!((li.revenue() - 900.0).abs() < 1e-9);
        assert_eq!(Ok(li), parse_lineitem_strict(ROW.as_bytes()));
    }

    #[test]
    fn lenient_short_and_bad_lines() {
        for (input, order_key, supp_key) in [
            ("1|2|3", 1, 3),
            ("7", 7, -1),
            ("x|y|z|w|v|1.0|0.1", 0, 0),
            ("12|0|34|0|0|abc|", 12, 34),
        ] {
            let li = parse_lineitem(input.as_bytes());
            assert_eq!(order_key, li.order_key, "order key for `{input}`");
            assert_eq!(supp_key, li.supp_key, "supp key for `{input}`");
        }
    }

    #[test]
    fn strict_rejects() {
        for input in ["1|2|3", "1|0|2|0|0|1.0", "1|0|x|0|0|1.0|0.1", "1|0|2|0|0|1,5|0.1", ""] {
            assert!(
                parse_lineitem_strict(input.as_bytes()).is_err(),
                "strict parse should reject `{input}`"
            );
        }
    }

    #[test]
    fn parse_range_reads_whole_lines_from_start() {
        let data = b"1|0|10|0|0|1.0|0.0|\n\n2|0|20|0|0|2.0|0.0|\n3|0|30|0|0|3.0|0.0|";
        let all = parse_range(
            data,
            ByteRange {
                start: 0,
                end: data.len(),
            },
            ParsePolicy::Lenient,
        )
        .unwrap();
        assert_eq!(
            vec![1, 2, 3],
            all.iter().map(|l| l.order_key).collect::<Vec<_>>(),
            "empty lines are skipped, last line needs no terminator"
        );

        // a range ending mid-line still finishes that line
        let first = parse_range(data, ByteRange { start: 0, end: 5 }, ParsePolicy::Lenient).unwrap();
        assert_eq!(1, first.len());
        assert_eq!(10, first[0].supp_key);
    }

    #[test]
    fn strict_error_carries_offset() {
        let data = b"1|0|10|0|0|1.0|0.0|\nbad|line\n";
        let err = parse_range(
            data,
            ByteRange {
                start: 0,
                end: data.len(),
            },
            ParsePolicy::Strict,
        )
        .unwrap_err();
        match err {
            Q5Error::MalformedField { offset, .. } => assert_eq!(20, offset),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
