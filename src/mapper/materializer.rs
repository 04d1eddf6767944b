//! Row materializer
//!
//! Turns a SELECT result set back into records by cloning a template per
//! row and writing each scanned column into the matching field.

use super::builder::StatementBuilder;
use super::codec;
use crate::error::Result;
use crate::record::Record;
use crate::store::{ColumnValue, RowScan, Store};

/// Select every row matching `filter` as a record cloned from `template`
///
/// Rows keep result-set order. Any scan or decode failure aborts the whole
/// select and no partial result is returned.
pub fn select_records<R: Record>(
    builder: &StatementBuilder<'_>,
    store: &mut dyn Store,
    template: &R,
    filter: &str,
) -> Result<Vec<R>> {
    let (sql, meta) = builder.build_select::<R>(filter)?;

    let fields: Vec<_> = meta.fields().copied().collect();
    let blank: Vec<ColumnValue> = fields
        .iter()
        .map(codec::scan_target)
        .collect::<Result<_>>()?;

    let mut records = Vec::new();
    store.query(&sql, &mut |row: &dyn RowScan| -> Result<()> {
        let mut targets = blank.clone();
        row.scan(&mut targets)?;

        let mut record = template.clone();
        for (field, scanned) in fields.iter().zip(targets) {
            codec::decode_field(&mut record, field, scanned)?;
        }
        records.push(record);
        Ok(())
    })?;

    Ok(records)
}
