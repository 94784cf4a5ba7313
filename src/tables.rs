//! Dimension tables. They are small, so they are read sequentially.

use std::fs;
use std::path::Path;

use crate::error::{Q5Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub key: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nation {
    pub key: i32,
    pub name: String,
    pub region_key: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Customer {
    pub key: i32,
    pub nation_key: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Supplier {
    pub key: i32,
    pub nation_key: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub key: i32,
    pub cust_key: i32,
    /// `YYYY-MM-DD`
    pub order_date: String,
}

/// All dimension tables Query 5 touches.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    pub regions: Vec<Region>,
    pub nations: Vec<Nation>,
    pub customers: Vec<Customer>,
    pub suppliers: Vec<Supplier>,
    pub orders: Vec<Order>,
}

impl Tables {
    /// Reads the five dimension `.tbl` files from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let tables = Self {
            regions: read_table(dir, "region", 2, |f, line| {
                Ok(Region {
                    key: int_field(f[0], "region", line)?,
                    name: f[1].to_string(),
                })
            })?,
            nations: read_table(dir, "nation", 3, |f, line| {
                Ok(Nation {
                    key: int_field(f[0], "nation", line)?,
                    name: f[1].to_string(),
                    region_key: int_field(f[2], "nation", line)?,
                })
            })?,
            customers: read_table(dir, "customer", 4, |f, line| {
                Ok(Customer {
                    key: int_field(f[0], "customer", line)?,
                    nation_key: int_field(f[3], "customer", line)?,
                })
            })?,
            suppliers: read_table(dir, "supplier", 4, |f, line| {
                Ok(Supplier {
                    key: int_field(f[0], "supplier", line)?,
                    nation_key: int_field(f[3], "supplier", line)?,
                })
            })?,
            orders: read_table(dir, "orders", 6, |f, line| {
                Ok(Order {
                    key: int_field(f[0], "orders", line)?,
                    cust_key: int_field(f[1], "orders", line)?,
                    order_date: f[4].to_string(),
                })
            })?,
        };
        tracing::info!(
            regions = tables.regions.len(),
            nations = tables.nations.len(),
            customers = tables.customers.len(),
            suppliers = tables.suppliers.len(),
            orders = tables.orders.len(),
            "loaded dimension tables"
        );
        Ok(tables)
    }

    /// Key of the region called `name`.
    pub fn region_key(&self, name: &str) -> Result<i32> {
        self.regions
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.key)
            .ok_or_else(|| Q5Error::RegionNotFound(name.to_string()))
    }
}

fn int_field(s: &str, table: &'static str, line: usize) -> Result<i32> {
    s.trim().parse().map_err(|e| Q5Error::Malformed {
        table,
        line,
        reason: format!("`{s}`: {e}"),
    })
}

/// Reads `<dir>/<name>.tbl`, handing the split fields and 1-based line number
/// of every line with at least `min_fields` fields to `row`.
fn read_table<T>(
    dir: &Path,
    name: &'static str,
    min_fields: usize,
    mut row: impl FnMut(&[&str], usize) -> Result<T>,
) -> Result<Vec<T>> {
    let path = dir.join(format!("{name}.tbl"));
    let bytes = fs::read(&path).map_err(|source| Q5Error::Open {
        path: path.clone(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        Q5Error::Malformed {
            table: name,
            line: memchr::memchr_iter(b'\n', valid).count() + 1,
            reason: e.utf8_error().to_string(),
        }
    })?;

    let mut out = Vec::new();
    let mut fields: Vec<&str> = Vec::with_capacity(16);
    let mut short = 0usize;
    for (idx, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        fields.clear();
        fields.extend(line.split('|'));
        if fields.len() < min_fields {
            short += 1;
            continue;
        }
        out.push(row(&fields, idx + 1)?);
    }
    if short > 0 {
        tracing::warn!(table = name, skipped = short, "skipped rows with too few fields");
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(format!("{name}.tbl")), body).unwrap();
    }

    fn write_all(dir: &Path) {
        write(dir, "region", "0|AFRICA|lar deposits|\n2|ASIA|ges. thinly even|\n");
        write(
            dir,
            "nation",
            "8|INDIA|2|ss excuses cajole|\n9|INDONESIA|2| slyly express|\n\n",
        );
        write(dir, "customer", "1|Customer#000000001|IVhzIApeRb|15|25-989|711.56|BUILDING|x|\n");
        write(dir, "supplier", "1|Supplier#000000001| N kD4on9OM|17|27-918|5755.94|each|\nshort|row\n");
        write(dir, "orders", "1|37|O|131251.81|1996-01-02|5-LOW|Clerk#000000951|0|nstructions|\n");
    }

    #[test]
    fn loads_every_table() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        let t = Tables::load(dir.path()).unwrap();
        assert_eq!(
            vec![
                Region { key: 0, name: "AFRICA".into() },
                Region { key: 2, name: "ASIA".into() }
            ],
            t.regions
        );
        assert_eq!(2, t.nations.len());
        assert_eq!(2, t.nations[1].region_key);
        assert_eq!(vec![Customer { key: 1, nation_key: 15 }], t.customers);
        assert_eq!(vec![Supplier { key: 1, nation_key: 17 }], t.suppliers, "short row skipped");
        assert_eq!(
            vec![Order {
                key: 1,
                cust_key: 37,
                order_date: "1996-01-02".into()
            }],
            t.orders
        );
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        fs::remove_file(dir.path().join("orders.tbl")).unwrap();
        match Tables::load(dir.path()) {
            Err(Q5Error::Open { path, .. }) => assert!(path.ends_with("orders.tbl")),
            other => panic!("expected open error, got {other:?}"),
        }
    }

    #[test]
    fn non_utf8_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        fs::write(dir.path().join("nation.tbl"), b"8|INDIA|2|c|\n9|IND\xffNESIA|2|c|\n").unwrap();
        match Tables::load(dir.path()) {
            Err(Q5Error::Malformed { table, line, .. }) => {
                assert_eq!("nation", table);
                assert_eq!(2, line);
            }
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn region_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        let t = Tables::load(dir.path()).unwrap();
        assert_eq!(2, t.region_key("ASIA").unwrap());
        match t.region_key("asia") {
            Err(Q5Error::RegionNotFound(name)) => assert_eq!("asia", name),
            other => panic!("expected region-not-found, got {other:?}"),
        }
    }

    #[test]
    fn bad_key_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        write(dir.path(), "customer", "1|a|b|15|\nnope|a|b|15|\n");
        match Tables::load(dir.path()) {
            Err(Q5Error::Malformed { table, line, .. }) => {
                assert_eq!("customer", table);
                assert_eq!(2, line);
            }
            other => panic!("expected malformed error, got {other:?}"),
        }
    }
}
