use crate::nba::error::{DashError, Result};
use crate::nba::record::{records_from_value, Record, Scalar};
use crate::nba::upsert::{Dialect, MatchMode, UpsertBuilder};

use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;
use std::path::Path;
use std::time::Instant;

/// Surrogate primary key added to tables created from records.
pub const SURROGATE_KEY: &str = "id";

/// Runs statements against a database on behalf of the reshaping code.
pub trait QueryExecutor {
    fn fetch(&self, query: &str, args: &[Scalar]) -> Result<Vec<Record>>;
    fn execute(&self, statement: &str) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl QueryExecutor for SqliteStore {
    fn fetch(&self, query: &str, args: &[Scalar]) -> Result<Vec<Record>> {
        let load_start = Instant::now();
        let mut stmt = self.conn.prepare(query)?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            let mut r = Record::new();
            for (i, col) in column_names.iter().enumerate() {
                r.insert(col.as_str(), Scalar::from(row.get_ref(i)?));
            }
            Ok(r)
        })?;
        let records = rows.collect::<rusqlite::Result<Vec<Record>>>()?;
        log::debug!("fetched {} rows in {:?}", records.len(), load_start.elapsed());
        Ok(records)
    }

    fn execute(&self, statement: &str) -> Result<()> {
        self.conn.execute_batch(statement)?;
        Ok(())
    }
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("opening {}", path.as_ref().display());
        Ok(SqliteStore {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(SqliteStore {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn check_table_exists(&self, table_name: &str) -> Result<bool> {
        let mut find_table_stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?")?;
        Ok(find_table_stmt.exists(params![table_name])?)
    }

    fn create_statement(&self, table_name: &str, first: &Record) -> String {
        let mut column_defs = first
            .columns()
            .zip(first.values())
            .map(|(col, val)| {
                let ty = match val {
                    Scalar::Float(_) => "FLOAT",
                    Scalar::Int(_) => "INTEGER",
                    _ => "TEXT",
                };
                format!("{} {}", quote(col), ty)
            })
            .collect::<Vec<String>>();
        if !first.columns().any(|c| c.eq_ignore_ascii_case(SURROGATE_KEY)) {
            column_defs.insert(0, format!("{} integer primary key", SURROGATE_KEY));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ( {} );",
            quote(table_name),
            column_defs.join(", ")
        )
    }

    /// Creates `table_name` shaped like the first record, behind an `id`
    /// surrogate key unless the records carry their own `id`. Existing tables are kept.
    pub fn create_table(&self, table_name: &str, records: &[Record]) -> Result<bool> {
        let first = records.first().ok_or(DashError::EmptyInput)?;
        if self.check_table_exists(table_name)? {
            return Ok(false);
        }
        self.execute(&self.create_statement(table_name, first))?;
        log::info!("created table {}", table_name);
        Ok(true)
    }

    /// Appends records with bound parameters, in one transaction.
    pub fn insert_records(&self, table_name: &str, records: &[Record]) -> Result<usize> {
        if records.is_empty() {
            return Err(DashError::EmptyInput);
        }
        let tx = self.conn.unchecked_transaction()?;
        for r in records {
            let columns = r.columns().map(quote).collect::<Vec<_>>().join(", ");
            let placeholders = vec!["?"; r.len()].join(", ");
            let insert = format!(
                "INSERT INTO {} ( {} ) VALUES ( {} )",
                quote(table_name),
                columns,
                placeholders
            );
            tx.execute(&insert, params_from_iter(r.values()))?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn ensure_unique_index(&self, table_name: &str, key_columns: &[&str]) -> Result<()> {
        let index_name = format!("ux_{}_{}", table_name, key_columns.join("_"));
        let columns = key_columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
        self.execute(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ( {} );",
            quote(&index_name),
            quote(table_name),
            columns
        ))
    }

    /// Merges `records` into `table_name`, matching on `key_columns`.
    pub fn upsert(&self, table_name: &str, records: &[Record], key_columns: &[&str]) -> Result<usize> {
        let builder = UpsertBuilder::new(table_name, key_columns).dialect(Dialect::Sqlite);
        let stmt = builder.build(records)?;
        if builder.mode() == MatchMode::KeyEquality {
            self.ensure_unique_index(table_name, key_columns)?;
        }
        let load_start = Instant::now();
        self.execute(&stmt)?;
        log::info!(
            "Table {} updated: {} records in {:?}",
            table_name,
            records.len(),
            load_start.elapsed()
        );
        Ok(records.len())
    }

    /// Rows where any of `search_columns` contains `keyword`.
    pub fn search_table(
        &self,
        table_name: &str,
        select_column_names: &[&str],
        search_column_names: &[&str],
        keyword: &str,
    ) -> Result<Vec<Record>> {
        let where_stmt = search_column_names
            .iter()
            .map(|col| format!("{} LIKE ?1", quote(col)))
            .collect::<Vec<String>>()
            .join(" OR ");
        let select_stmt = if select_column_names.is_empty() {
            "*".to_string()
        } else {
            select_column_names.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
        };
        let search_stmt = format!("SELECT {} FROM {} WHERE {}", select_stmt, quote(table_name), where_stmt);
        log::debug!("{}", search_stmt);
        self.fetch(&search_stmt, &[Scalar::Text(format!("%{}%", keyword))])
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Fetches a JSON array of records over HTTP.
pub fn fetch_json_records(url: &str) -> anyhow::Result<Vec<Record>> {
    let r = ureq::get(url)
        .set("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:72.0) Gecko/20100101 Firefox/72.0")
        .set("Accept", "application/json, text/plain, */*")
        .set("Cache-Control", "no-cache")
        .call()?;
    let json: Value = r.into_json()?;
    Ok(records_from_value(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nba::record::rec;

    fn store_with_players() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        let records = vec![
            rec(&[("id", Scalar::Int(1)), ("name", "Curry".into()), ("score", Scalar::Float(30.5))]),
            rec(&[("id", Scalar::Int(2)), ("name", "James".into()), ("score", Scalar::Float(27.0))]),
        ];
        assert!(store.create_table("players", &records).unwrap());
        store.insert_records("players", &records).unwrap();
        store
    }

    #[test]
    fn create_then_fetch() {
        let store = store_with_players();
        assert!(store.check_table_exists("players").unwrap());
        assert!(!store.check_table_exists("teams").unwrap());
        let rows = store.fetch("SELECT id, name FROM players ORDER BY id", &[]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("name"), Some(&Scalar::from("James")));
        assert_eq!(rows[0].get("id"), Some(&Scalar::Int(1)));
    }

    fn table_columns(store: &SqliteStore, table: &str) -> Vec<(String, i64)> {
        store
            .fetch("SELECT name, pk FROM pragma_table_info(?1) ORDER BY cid", &[Scalar::from(table)])
            .unwrap()
            .iter()
            .map(|r| {
                let pk = match r.get("pk") {
                    Some(Scalar::Int(pk)) => *pk,
                    _ => 0,
                };
                (r.get("name").unwrap().to_string(), pk)
            })
            .collect()
    }

    #[test]
    fn create_adds_surrogate_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        let records = vec![rec(&[("name", "Curry".into())])];
        store.create_table("p", &records).unwrap();
        assert_eq!(
            table_columns(&store, "p"),
            vec![("id".to_string(), 1), ("name".to_string(), 0)]
        );
        store.insert_records("p", &records).unwrap();
        store.insert_records("p", &records).unwrap();
        let ids = store.fetch("SELECT id FROM p ORDER BY id", &[]).unwrap();
        assert_eq!(ids, vec![rec(&[("id", Scalar::Int(1))]), rec(&[("id", Scalar::Int(2))])]);
    }

    #[test]
    fn create_keeps_record_id_column() {
        let store = store_with_players();
        assert_eq!(
            table_columns(&store, "players"),
            vec![("id".to_string(), 0), ("name".to_string(), 0), ("score".to_string(), 0)]
        );
    }

    #[test]
    fn empty_batches_are_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(store.create_table("t", &[]), Err(DashError::EmptyInput)));
        assert!(matches!(store.insert_records("t", &[]), Err(DashError::EmptyInput)));
        assert!(!store.check_table_exists("t").unwrap());
    }

    #[test]
    fn upsert_into_table_name_needing_quotes() {
        let store = SqliteStore::open_in_memory().unwrap();
        let batch = vec![rec(&[("PlayerId", Scalar::Int(1)), ("Pts", Scalar::Int(30))])];
        store.create_table("box score", &batch).unwrap();
        store.upsert("box score", &batch, &["PlayerId"]).unwrap();
        let again = vec![rec(&[("PlayerId", Scalar::Int(1)), ("Pts", Scalar::Int(41))])];
        store.upsert("box score", &again, &["PlayerId"]).unwrap();
        let rows = store.fetch("SELECT Pts FROM \"box score\"", &[]).unwrap();
        assert_eq!(rows, vec![rec(&[("Pts", Scalar::Int(41))])]);
    }

    #[test]
    fn create_keeps_existing_table() {
        let store = store_with_players();
        let other = vec![rec(&[("x", Scalar::Int(1))])];
        assert!(!store.create_table("players", &other).unwrap());
    }

    #[test]
    fn upsert_updates_and_inserts() {
        let store = store_with_players();
        let batch = vec![
            rec(&[("id", Scalar::Int(2)), ("name", "LeBron".into()), ("score", Scalar::Float(28.0))]),
            rec(&[("id", Scalar::Int(3)), ("name", "O'Neal".into()), ("score", Scalar::Float(20.0))]),
        ];
        assert_eq!(store.upsert("players", &batch, &["id"]).unwrap(), 2);
        let rows = store.fetch("SELECT id, name FROM players ORDER BY id", &[]).unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get("name").unwrap().to_string()).collect();
        assert_eq!(names, vec!["Curry", "LeBron", "O'Neal"]);
    }

    #[test]
    fn always_insert_appends_duplicates() {
        let store = SqliteStore::open_in_memory().unwrap();
        let batch = vec![rec(&[("LastUpdated", "2019-01-01".into()), ("id", Scalar::Int(1))])];
        store.create_table("log", &batch).unwrap();
        store.upsert("log", &batch, &["LastUpdated"]).unwrap();
        store.upsert("log", &batch, &["LastUpdated"]).unwrap();
        let rows = store.fetch("SELECT * FROM log", &[]).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn search_binds_keyword() {
        let store = store_with_players();
        let rows = store.search_table("players", &["id"], &["name"], "urr").unwrap();
        assert_eq!(rows, vec![rec(&[("id", Scalar::Int(1))])]);
        let none = store.search_table("players", &[], &["name"], "' OR 1=1 --").unwrap();
        assert!(none.is_empty());
    }
}
