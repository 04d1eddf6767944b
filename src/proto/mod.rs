//! Wire protocol messages
//!
//! Hand-maintained prost definitions for the envelope, handshake and the
//! user record family, plus the `Record` accessor table for `DbUserRecord`.

use crate::error::Result;
use crate::record::{
    rejected_write, FieldDescriptor, FieldKind, FieldRef, NestedRecord, Record, ScalarValue,
};

/// Command identifiers carried in `ProtoPackage::cmd`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtoCmd {
    Unspecified = 0,
    IpcStreamAuthHandshake = 1,
    CsReqExample = 2,
    CsResExample = 3,
    DbsvrgoWriteDbUserRecordReq = 100,
    DbsvrgoSelectDbUserRecordReq = 101,
    DbsvrgoSelectDbUserRecordRes = 102,
}

/// Write operation carried in a record's `op` field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DbOpType {
    OpNone = 0,
    OpInsert = 1,
    OpReplace = 2,
    OpUpdate = 3,
    OpDelete = 4,
}

/// Transport envelope: a command id and its encoded payload
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoPackage {
    #[prost(enumeration = "ProtoCmd", tag = "1")]
    pub cmd: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub protocol: Vec<u8>,
}

/// First message on an IPC stream, identifying the peer application
#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoIpcStreamAuthHandshake {
    #[prost(bytes = "vec", tag = "1")]
    pub app_id: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoCsReqExample {
    #[prost(bytes = "vec", tag = "1")]
    pub test_context: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProtoCsResExample {
    #[prost(bytes = "vec", tag = "1")]
    pub test_context: Vec<u8>,
}

/// Nested profile data stored as a blob column of `db_user_record`
#[derive(Clone, PartialEq, prost::Message)]
pub struct DbUserBaseInfo {
    #[prost(int32, tag = "1")]
    pub level: i32,
}

/// One row of the `db_user_record` table
#[derive(Clone, PartialEq, prost::Message)]
pub struct DbUserRecord {
    #[prost(enumeration = "DbOpType", tag = "1")]
    pub op: i32,
    #[prost(int64, tag = "2")]
    pub id: i64,
    #[prost(string, tag = "3")]
    pub user_id: String,
    #[prost(string, tag = "4")]
    pub password: String,
    #[prost(message, optional, tag = "5")]
    pub base_info: Option<DbUserBaseInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SelectDbUserRecordReq {
    /// Raw filter appended after `WHERE`
    #[prost(string, tag = "1")]
    pub where_clause: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SelectDbUserRecordRes {
    #[prost(message, repeated, tag = "1")]
    pub user_record_list: Vec<DbUserRecord>,
}

const DB_USER_RECORD_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("op", 1, FieldKind::Enum),
    FieldDescriptor::new("id", 2, FieldKind::Int64),
    FieldDescriptor::new("userId", 3, FieldKind::String),
    FieldDescriptor::new("password", 4, FieldKind::String),
    FieldDescriptor::new("baseInfo", 5, FieldKind::Message),
];

impl Record for DbUserRecord {
    const FULL_NAME: &'static str = "dbsvr.DbUserRecord";

    fn descriptors() -> &'static [FieldDescriptor] {
        DB_USER_RECORD_FIELDS
    }

    fn field(&self, number: u32) -> Option<FieldRef<'_>> {
        let value = match number {
            1 => FieldRef::Scalar(ScalarValue::Int32(self.op)),
            2 => FieldRef::Scalar(ScalarValue::Int64(self.id)),
            3 => FieldRef::Scalar(ScalarValue::String(self.user_id.clone())),
            4 => FieldRef::Scalar(ScalarValue::String(self.password.clone())),
            5 => match &self.base_info {
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
            (3, ScalarValue::String(v)) => self.user_id = v,
            (4, ScalarValue::String(v)) => self.password = v,
            (number, value) => return Err(rejected_write::<Self>(number, &value)),
        }
        Ok(())
    }

    fn nested_mut(&mut self, number: u32) -> Option<&mut dyn NestedRecord> {
        match number {
            5 => {
                let info = self.base_info.get_or_insert_with(DbUserBaseInfo::default);
                Some(info as &mut dyn NestedRecord)
            }
            _ => None,
        }
    }
}
