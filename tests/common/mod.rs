//! `.tbl` fixtures written into temporary directories.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

pub fn write_table(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(format!("{name}.tbl")), body).unwrap();
}

/// The worked example: INDIA earns 900.0, CHINA is in the region but earns nothing.
pub fn worked_example() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    write_table(p, "region", "1|ASIA|comment|\n");
    write_table(
        p,
        "nation",
        "10|INDIA|1|comment|\n20|CHINA|1|comment|\n30|US|2|comment|\n",
    );
    write_table(p, "customer", "100|Customer#100|addr|10|phone|0.00|SEG|c|\n200|Customer#200|addr|30|phone|0.00|SEG|c|\n");
    write_table(p, "supplier", "1000|Supplier#1000|addr|10|phone|0.00|c|\n");
    write_table(p, "orders", "5000|100|O|0.00|1995-06-15|1-URGENT|Clerk|0|c|\n");
    write_table(
        p,
        "lineitem",
        "5000|1|1000|1|1|1000.0|0.10|0.00|N|O|1995-07-01|1995-07-01|1995-07-01|NONE|AIR|c|\n",
    );
    dir
}

/// Deterministic pseudo-random sequence, enough to spread keys around.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }
}

/// A TPC-H shaped dataset: 5 regions, 25 nations, and `lineitems` fact rows.
pub fn generated(lineitems: usize, seed: u64) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    let mut rng = Lcg::new(seed);

    let regions = ["AFRICA", "AMERICA", "ASIA", "EUROPE", "MIDDLE EAST"];
    let mut body = String::new();
    for (k, name) in regions.iter().enumerate() {
        writeln!(body, "{k}|{name}|comment|").unwrap();
    }
    write_table(p, "region", &body);

    body.clear();
    for k in 0..25 {
        writeln!(body, "{k}|NATION{k:02}|{}|comment|", k % 5).unwrap();
    }
    write_table(p, "nation", &body);

    body.clear();
    for k in 1..=300 {
        writeln!(body, "{k}|Customer#{k}|addr|{}|phone|1.00|SEG|c|", rng.next(25)).unwrap();
    }
    write_table(p, "customer", &body);

    body.clear();
    for k in 1..=40 {
        writeln!(body, "{k}|Supplier#{k}|addr|{}|phone|1.00|c|", rng.next(25)).unwrap();
    }
    write_table(p, "supplier", &body);

    body.clear();
    for k in 1..=1500 {
        let year = 1992 + rng.next(7);
        let month = 1 + rng.next(12);
        let day = 1 + rng.next(28);
        writeln!(
            body,
            "{k}|{}|O|1.00|{year}-{month:02}-{day:02}|1-URGENT|Clerk|0|c|",
            1 + rng.next(300)
        )
        .unwrap();
    }
    write_table(p, "orders", &body);

    body.clear();
    for line in 0..lineitems {
        let order = 1 + rng.next(1500);
        let supp = 1 + rng.next(40);
        let price = 900 + rng.next(100_000);
        let discount = rng.next(11);
        writeln!(
            body,
            "{order}|{}|{supp}|{}|{}|{}.{:02}|0.{discount:02}|0.02|N|O|1996-01-01|1996-01-01|1996-01-01|NONE|AIR|comment|",
            line % 200,
            line % 7 + 1,
            rng.next(50),
            price / 100,
            price % 100
        )
        .unwrap();
    }
    write_table(p, "lineitem", &body);
    dir
}
