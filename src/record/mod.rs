//! Record introspection
//!
//! Records are prost messages that additionally publish a static table of
//! field descriptors and by-number accessors. Everything generic in the
//! mapper works against these descriptors and the kind-tagged values below,
//! never against a concrete message type.

pub mod value;

pub use value::ScalarValue;

use std::fmt;

use crate::error::{Error, Result};

/// Name of the reserved field that carries the write operation
pub const OP_FIELD: &str = "op";

/// Name of the primary key field every writable record must declare
pub const ID_FIELD: &str = "id";

/// Kind of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// UTF-8 string
    String,
    /// Boolean
    Bool,
    /// Single-precision float
    Float,
    /// Double-precision float
    Double,
    /// Protobuf enum, only valid for the `op` field
    Enum,
    /// Nested record, persisted as serialized bytes
    Message,
    /// Any kind the mapper cannot store (bytes, repeated, map, ...)
    Other(&'static str),
}

impl FieldKind {
    /// Check if this kind maps to a native column value
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldKind::Int32
                | FieldKind::Int64
                | FieldKind::String
                | FieldKind::Bool
                | FieldKind::Float
                | FieldKind::Double
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Int32 => write!(f, "int32"),
            FieldKind::Int64 => write!(f, "int64"),
            FieldKind::String => write!(f, "string"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Double => write!(f, "double"),
            FieldKind::Enum => write!(f, "enum"),
            FieldKind::Message => write!(f, "message"),
            FieldKind::Other(label) => write!(f, "{}", label),
        }
    }
}

/// Static description of one record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name, also used as the column name
    pub name: &'static str,
    /// Protobuf field number, used as the accessor key
    pub number: u32,
    /// Field kind
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, number: u32, kind: FieldKind) -> Self {
        Self { name, number, kind }
    }
}

/// Borrowed view of a field's current value
pub enum FieldRef<'a> {
    /// A scalar (or enum number) value
    Scalar(ScalarValue),
    /// A set nested record
    Nested(&'a dyn NestedRecord),
    /// An unset nested record
    Absent,
}

/// Object-safe access to a nested record's wire encoding
pub trait NestedRecord: Send + Sync {
    /// Serialize to the canonical protobuf encoding
    fn encode_bytes(&self) -> Result<Vec<u8>>;

    /// Replace the contents with the decoded bytes
    fn replace_from(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<T> NestedRecord for T
where
    T: prost::Message + Default,
{
    fn encode_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    fn replace_from(&mut self, bytes: &[u8]) -> Result<()> {
        self.clear();
        self.merge(bytes)?;
        Ok(())
    }
}

/// A self-describing message usable as a table row
///
/// Implementations publish their descriptor table once and expose each
/// field by number. Reads of the `op` field return the enum number as
/// `ScalarValue::Int32`.
pub trait Record: prost::Message + Default + Clone + 'static {
    /// Fully-qualified schema name, e.g. `dbsvr.DbUserRecord`
    const FULL_NAME: &'static str;

    /// All fields in declaration order, including `op`
    fn descriptors() -> &'static [FieldDescriptor];

    /// Read a field by number
    fn field(&self, number: u32) -> Option<FieldRef<'_>>;

    /// Write a scalar field by number
    fn set_scalar(&mut self, number: u32, value: ScalarValue) -> Result<()>;

    /// Mutable access to a nested field, allocating it when unset
    fn nested_mut(&mut self, number: u32) -> Option<&mut dyn NestedRecord>;

    /// Unqualified type name, the last segment of `FULL_NAME`
    fn short_name() -> &'static str {
        Self::FULL_NAME
            .rsplit('.')
            .next()
            .unwrap_or(Self::FULL_NAME)
    }
}

/// Build the error for a `set_scalar` call no accessor accepted
///
/// Distinguishes an unknown field number from a value of the wrong kind.
pub fn rejected_write<R: Record>(number: u32, value: &ScalarValue) -> Error {
    match R::descriptors().iter().find(|f| f.number == number) {
        Some(field) => Error::TypeMismatch {
            from: value.type_name().to_string(),
            to: format!("{} field '{}'", field.kind, field.name),
        },
        None => Error::UnknownField {
            record: R::FULL_NAME.to_string(),
            number,
        },
    }
}
