//! Bulk insert-or-update statement generation.
//!
//! Records are staged as a `VALUES` list and merged into the target table:
//! rows that match on the key columns are updated, the rest are inserted.
//! Nothing here touches a connection; the text is handed to a
//! [`QueryExecutor`](crate::nba::db::QueryExecutor).

use crate::nba::error::{DashError, Result};
use crate::nba::record::Record;

use std::str::FromStr;

/// Key column that switches a merge into always-insert mode when listed first.
pub const LAST_UPDATED: &str = "LastUpdated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// No join predicate; every staged row is treated as unmatched.
    AlwaysInsert,
    /// Rows match when every key column is equal.
    KeyEquality,
}

impl MatchMode {
    pub fn for_keys(key_columns: &[&str]) -> Self {
        match key_columns.first() {
            Some(&LAST_UPDATED) => MatchMode::AlwaysInsert,
            _ => MatchMode::KeyEquality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `#temp` staging table plus `MERGE`.
    MsSql,
    /// `INSERT .. ON CONFLICT .. DO UPDATE`.
    Sqlite,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::MsSql
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mssql" | "sqlserver" => Ok(Dialect::MsSql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(format!("unknown sql dialect {}", other)),
        }
    }
}

/// Builds the statement text. The MsSql dialect writes the table name as
/// given so schema-qualified names pass through; Sqlite quotes it.
#[derive(Debug, Clone)]
pub struct UpsertBuilder<'a> {
    table_name: &'a str,
    key_columns: Vec<&'a str>,
    mode: MatchMode,
    dialect: Dialect,
}

impl<'a> UpsertBuilder<'a> {
    pub fn new(table_name: &'a str, key_columns: &[&'a str]) -> Self {
        UpsertBuilder {
            table_name,
            key_columns: key_columns.to_vec(),
            mode: MatchMode::for_keys(key_columns),
            dialect: Default::default(),
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    fn is_key(&self, column: &str) -> bool {
        self.key_columns.iter().any(|k| *k == column)
    }

    fn quote(&self, ident: &str) -> String {
        match self.dialect {
            Dialect::MsSql => format!("[{}]", ident.replace(']', "]]")),
            Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Checks the batch and returns the column order taken from the first record.
    pub fn validate<'r>(&self, records: &'r [Record]) -> Result<Vec<&'r str>> {
        let first = records.first().ok_or(DashError::EmptyInput)?;
        let columns: Vec<&str> = first.columns().collect();
        for (row, r) in records.iter().enumerate().skip(1) {
            if !first.same_columns(r) {
                return Err(DashError::SchemaMismatch {
                    row,
                    expected: columns.join(", "),
                    found: r.columns().collect::<Vec<_>>().join(", "),
                });
            }
        }
        if self.mode == MatchMode::KeyEquality {
            if self.key_columns.is_empty() {
                return Err(DashError::NoKeyColumns);
            }
            if let Some(k) = self.key_columns.iter().find(|k| !first.contains(k)) {
                return Err(DashError::missing(k));
            }
        }
        Ok(columns)
    }

    /// `(v1,v2),(v1,v2)`, values ordered by `columns`.
    pub fn values_clause(&self, records: &[Record], columns: &[&str]) -> Result<String> {
        let mut tuples = Vec::with_capacity(records.len());
        for r in records {
            let mut literals = Vec::with_capacity(columns.len());
            for c in columns {
                literals.push(r.require(c)?.sql_literal());
            }
            tuples.push(format!("({})", literals.join(",")));
        }
        Ok(tuples.join(","))
    }

    pub fn column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| self.quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn source_column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| format!("Source.{}", self.quote(c)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Empty in always-insert mode.
    pub fn join_predicate(&self, columns: &[&str]) -> String {
        if self.mode == MatchMode::AlwaysInsert {
            return String::new();
        }
        columns
            .iter()
            .filter(|c| self.is_key(c))
            .map(|c| {
                let q = self.quote(c);
                format!("Target.{}=Source.{}", q, q)
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Assignments for every non-key column.
    pub fn update_assignments(&self, columns: &[&str]) -> String {
        let source = match self.dialect {
            Dialect::MsSql => "Source",
            Dialect::Sqlite => "excluded",
        };
        columns
            .iter()
            .filter(|c| !self.is_key(c))
            .map(|c| {
                let q = self.quote(c);
                format!("{}={}.{}", q, source, q)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn build(&self, records: &[Record]) -> Result<String> {
        let columns = self.validate(records)?;
        let values = self.values_clause(records, &columns)?;
        let column_list = self.column_list(&columns);
        let assignments = self.update_assignments(&columns);

        let stmt = match self.dialect {
            Dialect::MsSql => {
                let predicate = self.join_predicate(&columns);
                let mut stmt = format!(
                    "SELECT * INTO #temp FROM ( VALUES {} ) AS s ( {} ) MERGE INTO {} as Target USING #temp AS Source ",
                    values, column_list, self.table_name
                );
                if !predicate.is_empty() {
                    stmt.push_str(&format!("ON {} ", predicate));
                }
                stmt.push_str(&format!(
                    "WHEN NOT MATCHED THEN INSERT ( {} ) VALUES ( {} )",
                    column_list,
                    self.source_column_list(&columns)
                ));
                if !assignments.is_empty() {
                    stmt.push_str(&format!(" WHEN MATCHED THEN UPDATE SET {}", assignments));
                }
                stmt.push_str("; DROP TABLE #temp; ");
                stmt
            }
            Dialect::Sqlite => {
                let mut stmt = format!(
                    "INSERT INTO {} ( {} ) VALUES {}",
                    self.quote(self.table_name),
                    column_list,
                    values
                );
                if self.mode == MatchMode::KeyEquality {
                    let keys = columns
                        .iter()
                        .filter(|c| self.is_key(c))
                        .map(|c| self.quote(c))
                        .collect::<Vec<_>>()
                        .join(", ");
                    if assignments.is_empty() {
                        stmt.push_str(&format!(" ON CONFLICT ( {} ) DO NOTHING", keys));
                    } else {
                        stmt.push_str(&format!(
                            " ON CONFLICT ( {} ) DO UPDATE SET {}",
                            keys, assignments
                        ));
                    }
                }
                stmt.push(';');
                stmt
            }
        };
        log::debug!(
            "built {:?} upsert for {}: {} records, {} columns",
            self.dialect,
            self.table_name,
            records.len(),
            columns.len()
        );
        Ok(stmt)
    }
}

/// Staging/merge statement for `records` into `table_name`.
pub fn build_upsert(table_name: &str, records: &[Record], key_columns: &[&str]) -> Result<String> {
    UpsertBuilder::new(table_name, key_columns).build(records)
}
