//! Built-in command handlers

use prost::Message;
use tracing::{debug, error, info};

use super::{Envelope, WorkerContext};
use crate::error::{Error, Result};
use crate::proto::{
    DbUserRecord, ProtoCmd, ProtoCsResExample, ProtoIpcStreamAuthHandshake,
    SelectDbUserRecordReq, SelectDbUserRecordRes,
};
use crate::record::Record;

fn decode<M: Message + Default>(what: &'static str, envelope: &Envelope) -> Result<M> {
    M::decode(envelope.payload.as_slice()).map_err(|err| Error::decode(what, err))
}

pub fn handle_handshake(_ctx: &mut WorkerContext, envelope: &Envelope) -> Result<()> {
    let msg: ProtoIpcStreamAuthHandshake = decode("ProtoIpcStreamAuthHandshake", envelope)?;
    info!(app_id = %String::from_utf8_lossy(&msg.app_id), "rpc handshake accepted");
    Ok(())
}

pub fn handle_example_res(ctx: &mut WorkerContext, envelope: &Envelope) -> Result<()> {
    let msg: ProtoCsResExample = decode("ProtoCsResExample", envelope)?;
    let app_id = ctx
        .session
        .get()
        .map(|session| session.app_id().to_string())
        .unwrap_or_default();
    info!(
        app_id = %app_id,
        context = %String::from_utf8_lossy(&msg.test_context),
        "example response"
    );
    Ok(())
}

pub fn handle_write_user_record(ctx: &mut WorkerContext, envelope: &Envelope) -> Result<()> {
    let record: DbUserRecord = decode("DbUserRecord", envelope)?;
    debug!(?record, "write request");
    write_record(ctx, &record)
}

pub fn handle_select_user_record(ctx: &mut WorkerContext, envelope: &Envelope) -> Result<()> {
    let req: SelectDbUserRecordReq = decode("SelectDbUserRecordReq", envelope)?;
    debug!(filter = %req.where_clause, "select request");

    let records =
        ctx.mapper
            .select_records(&mut *ctx.store, &DbUserRecord::default(), &req.where_clause)?;
    info!(
        record = DbUserRecord::FULL_NAME,
        count = records.len(),
        "select completed"
    );

    let session = ctx.session.get().ok_or(Error::NotConnected)?;
    session.send_message(
        ProtoCmd::DbsvrgoSelectDbUserRecordRes,
        &SelectDbUserRecordRes {
            user_record_list: records,
        },
    )
}

/// Build and execute a write, logging the outcome
///
/// Store failures are logged with the statement and swallowed; there is no
/// acknowledgement path back to the sender.
pub fn write_record<R: Record>(ctx: &mut WorkerContext, record: &R) -> Result<()> {
    let stmt = ctx.mapper.build_write(record)?;
    match ctx.store.exec(&stmt.sql, &stmt.args) {
        Ok(outcome) => info!(
            record = R::FULL_NAME,
            rows_affected = outcome.rows_affected,
            last_insert_id = ?outcome.last_insert_id,
            "write applied"
        ),
        Err(err) => error!(
            record = R::FULL_NAME,
            sql = %stmt.sql,
            error = %err,
            "write failed"
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaRegistry;
    use crate::mapper::{Dialect, Mapper};
    use crate::proto::{DbOpType, ProtoPackage};
    use crate::store::SqliteStore;
    use crate::transport::{Session, SessionSlot};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<(ProtoCmd, Vec<u8>)>>,
    }

    impl Session for Outbox {
        fn app_id(&self) -> &str {
            "1.1.2.1"
        }

        fn send(&self, cmd: ProtoCmd, payload: Vec<u8>) -> Result<()> {
            self.sent.lock().unwrap().push((cmd, payload));
            Ok(())
        }
    }

    fn context() -> WorkerContext {
        let mapper = Mapper::new(Arc::new(SchemaRegistry::default()), Dialect::Sqlite);
        let mut store = SqliteStore::open_in_memory().unwrap();
        mapper.ensure_table::<DbUserRecord>(&mut store).unwrap();
        WorkerContext::new(mapper, Box::new(store), SessionSlot::new())
    }

    fn envelope(cmd: ProtoCmd, msg: &impl Message) -> Envelope {
        Envelope::from(ProtoPackage {
            cmd: cmd as i32,
            protocol: msg.encode_to_vec(),
        })
    }

    #[test]
    fn test_write_then_select_replies() {
        let mut ctx = context();
        let outbox = Arc::new(Outbox::default());
        ctx.session.set(outbox.clone());

        let record = DbUserRecord {
            op: DbOpType::OpInsert as i32,
            id: 3,
            user_id: "u3".into(),
            password: "p".into(),
            base_info: None,
        };
        handle_write_user_record(
            &mut ctx,
            &envelope(ProtoCmd::DbsvrgoWriteDbUserRecordReq, &record),
        )
        .unwrap();

        let req = SelectDbUserRecordReq {
            where_clause: "userId='u3'".into(),
        };
        handle_select_user_record(
            &mut ctx,
            &envelope(ProtoCmd::DbsvrgoSelectDbUserRecordReq, &req),
        )
        .unwrap();

        let sent = outbox.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ProtoCmd::DbsvrgoSelectDbUserRecordRes);
        let res = SelectDbUserRecordRes::decode(sent[0].1.as_slice()).unwrap();
        assert_eq!(res.user_record_list.len(), 1);
        assert_eq!(res.user_record_list[0].id, 3);
        // `op` is not a column, so it comes back unset
        assert_eq!(res.user_record_list[0].op, 0);
    }

    #[test]
    fn test_store_failure_is_swallowed() {
        let mapper = Mapper::new(Arc::new(SchemaRegistry::default()), Dialect::Sqlite);
        let store = SqliteStore::open_in_memory().unwrap();
        let mut ctx = WorkerContext::new(mapper, Box::new(store), SessionSlot::new());

        // No table exists, so the INSERT fails inside the store
        let record = DbUserRecord {
            op: DbOpType::OpInsert as i32,
            id: 1,
            ..Default::default()
        };
        assert!(write_record(&mut ctx, &record).is_ok());
    }

    #[test]
    fn test_bad_payload_is_decode_error() {
        let mut ctx = context();
        let bad = Envelope::new(ProtoCmd::DbsvrgoWriteDbUserRecordReq as i32, vec![0xff, 0xff]);
        let err = handle_write_user_record(&mut ctx, &bad).unwrap_err();
        assert_eq!(err.category(), "decode");
    }

    #[test]
    fn test_select_without_session() {
        let mut ctx = context();
        let req = SelectDbUserRecordReq::default();
        let err = handle_select_user_record(
            &mut ctx,
            &envelope(ProtoCmd::DbsvrgoSelectDbUserRecordReq, &req),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[test]
    fn test_handshake_decodes() {
        let mut ctx = context();
        let msg = ProtoIpcStreamAuthHandshake {
            app_id: b"1.1.2.1".to_vec(),
        };
        handle_handshake(&mut ctx, &envelope(ProtoCmd::IpcStreamAuthHandshake, &msg)).unwrap();
    }
}
