//! Splits a buffer of newline-terminated records into contiguous byte ranges,
//! one per worker, each starting on a line boundary.

use memchr::memchr;

/// Half-open byte range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// `workers` equal ranges over `[0, size)`; the last one absorbs the remainder.
pub fn nominal_ranges(size: usize, workers: usize) -> Vec<ByteRange> {
    let workers = workers.max(1);
    let chunk = size / workers;
    (0..workers)
        .map(|i| ByteRange {
            start: i * chunk,
            end: if i == workers - 1 { size } else { (i + 1) * chunk },
        })
        .collect()
}

/// Moves `pos` forward to the start of the next line, unless it already is one.
/// Returns `data.len()` if no line starts at or after `pos`.
fn align_to_line_start(data: &[u8], pos: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    if pos >= data.len() {
        return data.len();
    }
    // search from pos - 1 so a pos sitting right after '\n' stays put
    match memchr(b'\n', &data[pos - 1..]) {
        Some(nl) => pos + nl,
        None => data.len(),
    }
}

/// Partitions `data` into `workers` ranges whose starts sit on line boundaries.
///
/// The ranges are contiguous, never overlap and cover `[0, data.len())`.
/// Each range ends where the next begins, so it holds only whole lines.
/// When there are more workers than lines the surplus ranges are empty.
pub fn line_aligned_ranges(data: &[u8], workers: usize) -> Vec<ByteRange> {
    let nominal = nominal_ranges(data.len(), workers);
    let starts: Vec<usize> = nominal
        .iter()
        .map(|r| align_to_line_start(data, r.start))
        .collect();

    let mut ranges = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(data.len());
        debug_assert!(start <= end, "aligned starts must be monotonic");
        debug_assert!(
            start == 0 || start == data.len() || data[start - 1] == b'\n',
            "range start should be 0, the end, or one past a newline"
        );
        ranges.push(ByteRange { start, end });
    }
    ranges
}
