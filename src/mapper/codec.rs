//! Value codec
//!
//! Converts between record field values and column values. Scalars pass
//! through unchanged; nested records travel as their protobuf encoding.

use crate::error::{Error, Result};
use crate::record::{FieldDescriptor, FieldKind, FieldRef, Record, ScalarValue};
use crate::store::ColumnValue;

/// Read a field and convert it to the value bound for its column
pub fn encode_field<R: Record>(record: &R, field: &FieldDescriptor) -> Result<ColumnValue> {
    let value = record.field(field.number).ok_or_else(|| Error::UnknownField {
        record: R::FULL_NAME.to_string(),
        number: field.number,
    })?;

    match value {
        FieldRef::Scalar(scalar) => {
            if scalar.kind() != field.kind {
                return Err(Error::TypeMismatch {
                    from: scalar.type_name().to_string(),
                    to: format!("{} column '{}'", field.kind, field.name),
                });
            }
            Ok(scalar_to_column(scalar))
        }
        FieldRef::Nested(nested) => {
            let bytes = nested.encode_bytes().map_err(|err| {
                Error::Serialization(format!("encode {}.{}: {}", R::FULL_NAME, field.name, err))
            })?;
            Ok(ColumnValue::Blob(bytes))
        }
        FieldRef::Absent => Ok(ColumnValue::Blob(Vec::new())),
    }
}

/// Allocate the scan target matching a field kind
pub fn scan_target(field: &FieldDescriptor) -> Result<ColumnValue> {
    let target = match field.kind {
        FieldKind::Int32 => ColumnValue::Int32(0),
        FieldKind::Int64 => ColumnValue::Int64(0),
        FieldKind::String => ColumnValue::Text(String::new()),
        FieldKind::Bool => ColumnValue::Bool(false),
        FieldKind::Float => ColumnValue::Float(0.0),
        FieldKind::Double => ColumnValue::Double(0.0),
        FieldKind::Message => ColumnValue::Blob(Vec::new()),
        kind => {
            return Err(Error::Serialization(format!(
                "no column representation for {} field '{}'",
                kind, field.name
            )))
        }
    };
    Ok(target)
}

/// Write a scanned column value back into its field
///
/// An empty blob leaves a nested field untouched.
pub fn decode_field<R: Record>(
    record: &mut R,
    field: &FieldDescriptor,
    scanned: ColumnValue,
) -> Result<()> {
    let scalar = match (field.kind, scanned) {
        (FieldKind::Message, ColumnValue::Blob(bytes)) => {
            if bytes.is_empty() {
                return Ok(());
            }
            let nested = record.nested_mut(field.number).ok_or_else(|| Error::UnknownField {
                record: R::FULL_NAME.to_string(),
                number: field.number,
            })?;
            return nested.replace_from(&bytes).map_err(|err| {
                Error::Serialization(format!("decode {}.{}: {}", R::FULL_NAME, field.name, err))
            });
        }
        (FieldKind::Int32, ColumnValue::Int32(v)) => ScalarValue::Int32(v),
        (FieldKind::Int64, ColumnValue::Int64(v)) => ScalarValue::Int64(v),
        (FieldKind::String, ColumnValue::Text(v)) => ScalarValue::String(v),
        (FieldKind::Bool, ColumnValue::Bool(v)) => ScalarValue::Bool(v),
        (FieldKind::Float, ColumnValue::Float(v)) => ScalarValue::Float(v),
        (FieldKind::Double, ColumnValue::Double(v)) => ScalarValue::Double(v),
        (kind, scanned) => {
            return Err(Error::TypeMismatch {
                from: scanned.type_name().to_string(),
                to: format!("{} field '{}'", kind, field.name),
            })
        }
    };
    record.set_scalar(field.number, scalar)
}

fn scalar_to_column(value: ScalarValue) -> ColumnValue {
    match value {
        ScalarValue::Int32(v) => ColumnValue::Int32(v),
        ScalarValue::Int64(v) => ColumnValue::Int64(v),
        ScalarValue::String(v) => ColumnValue::Text(v),
        ScalarValue::Bool(v) => ColumnValue::Bool(v),
        ScalarValue::Float(v) => ColumnValue::Float(v),
        ScalarValue::Double(v) => ColumnValue::Double(v),
    }
}
