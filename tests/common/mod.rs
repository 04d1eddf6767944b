//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use dbsvr::proto::{DbUserBaseInfo, ProtoCmd};
use dbsvr::record::{
    rejected_write, FieldDescriptor, FieldKind, FieldRef, NestedRecord, Record, ScalarValue,
};
use dbsvr::store::{ColumnValue, ExecOutcome, RowScan, SqliteStore, Store};
use dbsvr::transport::Session;
use dbsvr::Result;

/// A record with one field of every storable kind
#[derive(Clone, PartialEq, prost::Message)]
pub struct AllKinds {
    #[prost(enumeration = "dbsvr::proto::DbOpType", tag = "1")]
    pub op: i32,
    #[prost(int64, tag = "2")]
    pub id: i64,
    #[prost(int32, tag = "3")]
    pub count: i32,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(bool, tag = "5")]
    pub active: bool,
    #[prost(float, tag = "6")]
    pub ratio: f32,
    #[prost(double, tag = "7")]
    pub score: f64,
    #[prost(message, optional, tag = "8")]
    pub info: Option<DbUserBaseInfo>,
}

const ALL_KINDS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("op", 1, FieldKind::Enum),
    FieldDescriptor::new("id", 2, FieldKind::Int64),
    FieldDescriptor::new("count", 3, FieldKind::Int32),
    FieldDescriptor::new("name", 4, FieldKind::String),
    FieldDescriptor::new("active", 5, FieldKind::Bool),
    FieldDescriptor::new("ratio", 6, FieldKind::Float),
    FieldDescriptor::new("score", 7, FieldKind::Double),
    FieldDescriptor::new("info", 8, FieldKind::Message),
];

impl Record for AllKinds {
    const FULL_NAME: &'static str = "fixtures.AllKinds";

    fn descriptors() -> &'static [FieldDescriptor] {
        ALL_KINDS_FIELDS
    }

    fn field(&self, number: u32) -> Option<FieldRef<'_>> {
        let value = match number {
            1 => FieldRef::Scalar(ScalarValue::Int32(self.op)),
            2 => FieldRef::Scalar(ScalarValue::Int64(self.id)),
            3 => FieldRef::Scalar(ScalarValue::Int32(self.count)),
            4 => FieldRef::Scalar(ScalarValue::String(self.name.clone())),
            5 => FieldRef::Scalar(ScalarValue::Bool(self.active)),
            6 => FieldRef::Scalar(ScalarValue::Float(self.ratio)),
            7 => FieldRef::Scalar(ScalarValue::Double(self.score)),
            8 => match &self.info {
                Some(info) => FieldRef::Nested(info),
                None => FieldRef::Absent,
            },
            _ => return None,
        };
        Some(value)
    }

    fn set_scalar(&mut self, number: u32, value: ScalarValue) -> Result<()> {
        match (number, value) {
            (1, ScalarValue::Int32(v)) => self.op = v,
            (2, ScalarValue::Int64(v)) => self.id = v,
            (3, ScalarValue::Int32(v)) => self.count = v,
            (4, ScalarValue::String(v)) => self.name = v,
            (5, ScalarValue::Bool(v)) => self.active = v,
            (6, ScalarValue::Float(v)) => self.ratio = v,
            (7, ScalarValue::Double(v)) => self.score = v,
            (number, value) => return Err(rejected_write::<Self>(number, &value)),
        }
        Ok(())
    }

    fn nested_mut(&mut self, number: u32) -> Option<&mut dyn NestedRecord> {
        match number {
            8 => {
                let info = self.info.get_or_insert_with(DbUserBaseInfo::default);
                Some(info as &mut dyn NestedRecord)
            }
            _ => None,
        }
    }
}

/// A record without an `id` field
#[derive(Clone, PartialEq, prost::Message)]
pub struct Keyless {
    #[prost(enumeration = "dbsvr::proto::DbOpType", tag = "1")]
    pub op: i32,
    #[prost(string, tag = "2")]
    pub label: String,
}

const KEYLESS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("op", 1, FieldKind::Enum),
    FieldDescriptor::new("label", 2, FieldKind::String),
];

impl Record for Keyless {
    const FULL_NAME: &'static str = "fixtures.Keyless";

    fn descriptors() -> &'static [FieldDescriptor] {
        KEYLESS_FIELDS
    }

    fn field(&self, number: u32) -> Option<FieldRef<'_>> {
        match number {
            1 => Some(FieldRef::Scalar(ScalarValue::Int32(self.op))),
            2 => Some(FieldRef::Scalar(ScalarValue::String(self.label.clone()))),
            _ => None,
        }
    }

    fn set_scalar(&mut self, number: u32, value: ScalarValue) -> Result<()> {
        match (number, value) {
            (1, ScalarValue::Int32(v)) => self.op = v,
            (2, ScalarValue::String(v)) => self.label = v,
            (number, value) => return Err(rejected_write::<Self>(number, &value)),
        }
        Ok(())
    }

    fn nested_mut(&mut self, _number: u32) -> Option<&mut dyn NestedRecord> {
        None
    }
}

/// A record holding only scalars and an id, with a configurable width
#[derive(Clone, PartialEq, prost::Message)]
pub struct Flat {
    #[prost(enumeration = "dbsvr::proto::DbOpType", tag = "1")]
    pub op: i32,
    #[prost(int64, tag = "2")]
    pub id: i64,
    #[prost(string, tag = "3")]
    pub a: String,
    #[prost(int32, tag = "4")]
    pub b: i32,
}

const FLAT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("op", 1, FieldKind::Enum),
    FieldDescriptor::new("id", 2, FieldKind::Int64),
    FieldDescriptor::new("a", 3, FieldKind::String),
    FieldDescriptor::new("b", 4, FieldKind::Int32),
];

impl Record for Flat {
    const FULL_NAME: &'static str = "fixtures.Flat";

    fn descriptors() -> &'static [FieldDescriptor] {
        FLAT_FIELDS
    }

    fn field(&self, number: u32) -> Option<FieldRef<'_>> {
        let value = match number {
            1 => ScalarValue::Int32(self.op),
            2 => ScalarValue::Int64(self.id),
            3 => ScalarValue::String(self.a.clone()),
            4 => ScalarValue::Int32(self.b),
            _ => return None,
        };
        Some(FieldRef::Scalar(value))
    }

    fn set_scalar(&mut self, number: u32, value: ScalarValue) -> Result<()> {
        match (number, value) {
            (1, ScalarValue::Int32(v)) => self.op = v,
            (2, ScalarValue::Int64(v)) => self.id = v,
            (3, ScalarValue::String(v)) => self.a = v,
            (4, ScalarValue::Int32(v)) => self.b = v,
            (number, value) => return Err(rejected_write::<Self>(number, &value)),
        }
        Ok(())
    }

    fn nested_mut(&mut self, _number: u32) -> Option<&mut dyn NestedRecord> {
        None
    }
}

/// A record whose only column is the primary key
#[derive(Clone, PartialEq, prost::Message)]
pub struct OnlyId {
    #[prost(enumeration = "dbsvr::proto::DbOpType", tag = "1")]
    pub op: i32,
    #[prost(int64, tag = "2")]
    pub id: i64,
}

const ONLY_ID_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("op", 1, FieldKind::Enum),
    FieldDescriptor::new("id", 2, FieldKind::Int64),
];

impl Record for OnlyId {
    const FULL_NAME: &'static str = "fixtures.OnlyId";

    fn descriptors() -> &'static [FieldDescriptor] {
        ONLY_ID_FIELDS
    }

    fn field(&self, number: u32) -> Option<FieldRef<'_>> {
        match number {
            1 => Some(FieldRef::Scalar(ScalarValue::Int32(self.op))),
            2 => Some(FieldRef::Scalar(ScalarValue::Int64(self.id))),
            _ => None,
        }
    }

    fn set_scalar(&mut self, number: u32, value: ScalarValue) -> Result<()> {
        match (number, value) {
            (1, ScalarValue::Int32(v)) => self.op = v,
            (2, ScalarValue::Int64(v)) => self.id = v,
            (number, value) => return Err(rejected_write::<Self>(number, &value)),
        }
        Ok(())
    }

    fn nested_mut(&mut self, _number: u32) -> Option<&mut dyn NestedRecord> {
        None
    }
}

/// One statement seen by a `RecordingStore`
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub args: Vec<ColumnValue>,
}

/// SQLite store that logs every `exec` call
pub struct RecordingStore {
    inner: SqliteStore,
    log: Arc<Mutex<Vec<Executed>>>,
}

impl RecordingStore {
    pub fn new(inner: SqliteStore) -> (Self, Arc<Mutex<Vec<Executed>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                inner,
                log: log.clone(),
            },
            log,
        )
    }
}

impl Store for RecordingStore {
    fn backend(&self) -> &'static str {
        "recording"
    }

    fn exec(&mut self, sql: &str, args: &[ColumnValue]) -> Result<ExecOutcome> {
        self.log.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        self.inner.exec(sql, args)
    }

    fn query(
        &mut self,
        sql: &str,
        on_row: &mut dyn FnMut(&dyn RowScan) -> Result<()>,
    ) -> Result<()> {
        self.inner.query(sql, on_row)
    }
}

/// Session that keeps everything sent through it
#[derive(Default)]
pub struct MockSession {
    pub sent: Mutex<Vec<(ProtoCmd, Vec<u8>)>>,
}

impl MockSession {
    pub fn take(&self) -> Vec<(ProtoCmd, Vec<u8>)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl Session for MockSession {
    fn app_id(&self) -> &str {
        "1.1.2.1"
    }

    fn send(&self, cmd: ProtoCmd, payload: Vec<u8>) -> Result<()> {
        self.sent.lock().unwrap().push((cmd, payload));
        Ok(())
    }
}
