//! SQL dialects
//!
//! The builder's contract is the ordering of positional arguments. A
//! dialect only decides how placeholders are spelled, which conflict
//! clause implements upsert, and which column types DDL uses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::FieldKind;

/// Target database dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `$1, $2, ...` and `ON CONFLICT (id) DO UPDATE`
    #[default]
    Postgres,
    /// `?1, ?2, ...` and `ON CONFLICT (id) DO UPDATE`
    Sqlite,
    /// `?` and `ON DUPLICATE KEY UPDATE`
    Mysql,
}

impl Dialect {
    /// Placeholder for the 1-based argument position
    pub fn placeholder(&self, ordinal: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", ordinal),
            Dialect::Sqlite => format!("?{}", ordinal),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Placeholders for positions `1..=count`
    pub fn placeholders(&self, count: usize) -> Vec<String> {
        (1..=count).map(|i| self.placeholder(i)).collect()
    }

    /// Conflict clause appended to an INSERT to make it an upsert on `id`
    ///
    /// `placeholders[i]` must be the VALUES placeholder bound to
    /// `columns[i]`, so no extra arguments are needed.
    pub fn upsert_clause(&self, columns: &[&str], placeholders: &[String]) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => {
                if columns.is_empty() {
                    return "ON CONFLICT (id) DO NOTHING".to_string();
                }
                let sets: Vec<String> = columns
                    .iter()
                    .zip(placeholders)
                    .map(|(col, ph)| format!("{}={}", col, ph))
                    .collect();
                format!("ON CONFLICT (id) DO UPDATE SET {}", sets.join(","))
            }
            Dialect::Mysql => {
                if columns.is_empty() {
                    return "ON DUPLICATE KEY UPDATE id=id".to_string();
                }
                let sets: Vec<String> = columns
                    .iter()
                    .map(|col| format!("{}=VALUES({})", col, col))
                    .collect();
                format!("ON DUPLICATE KEY UPDATE {}", sets.join(","))
            }
        }
    }

    /// Column type used by `CREATE TABLE` for a field kind
    pub fn column_type(&self, kind: FieldKind) -> Option<&'static str> {
        let ty = match (self, kind) {
            (_, FieldKind::Int32) => "INTEGER",
            (Dialect::Sqlite, FieldKind::Int64) => "INTEGER",
            (_, FieldKind::Int64) => "BIGINT",
            (Dialect::Mysql, FieldKind::String) => "VARCHAR(255)",
            (_, FieldKind::String) => "TEXT",
            (_, FieldKind::Bool) => "BOOLEAN",
            (Dialect::Mysql, FieldKind::Float) => "FLOAT",
            (_, FieldKind::Float) => "REAL",
            (Dialect::Postgres, FieldKind::Double) => "DOUBLE PRECISION",
            (Dialect::Sqlite, FieldKind::Double) => "REAL",
            (Dialect::Mysql, FieldKind::Double) => "DOUBLE",
            (Dialect::Postgres, FieldKind::Message) => "BYTEA",
            (_, FieldKind::Message) => "BLOB",
            (_, FieldKind::Enum) | (_, FieldKind::Other(_)) => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Mysql => write!(f, "mysql"),
        }
    }
}
