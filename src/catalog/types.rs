//! Table naming rules
//!
//! This module defines how record type names fold into table names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-folding transform from record type name to table name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableNaming {
    /// `DbUserRecord` -> `db_user_record`
    #[default]
    SnakeCase,
    /// `DbUserRecord` -> `dbuserrecord`
    LowerCase,
}

impl TableNaming {
    /// Fold a record type name into a table name
    pub fn table_name(&self, type_name: &str) -> String {
        match self {
            TableNaming::SnakeCase => camel_to_snake_case(type_name),
            TableNaming::LowerCase => type_name.to_lowercase(),
        }
    }
}

impl fmt::Display for TableNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableNaming::SnakeCase => write!(f, "snake_case"),
            TableNaming::LowerCase => write!(f, "lower_case"),
        }
    }
}

/// Insert `_` at every lowercase-to-uppercase boundary, then lowercase
fn camel_to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase();
        out.push(c.to_ascii_lowercase());
    }
    out
}
