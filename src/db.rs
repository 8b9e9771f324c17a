use std::path::Path;
use std::str::FromStr;

use chrono::{FixedOffset, TimeZone};
use itertools::Itertools;
use log::{debug, info, warn};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, CachedStatement, Transaction};

use crate::error::Error;
use crate::iterutils::RouteErrorsExt;
use crate::models::{LogRecord, Method};

const SCHEMA: &str = include_str!("schema.sql");
const INSERT_CHUNK_SIZE: usize = 50_000;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init(path: impl AsRef<Path>) -> Result<DbPool, Error> {
    let manager = SqliteConnectionManager::file(path.as_ref());
    let pool = r2d2::Pool::new(manager)?;
    let conn = pool.get()?;
    conn.execute_batch(SCHEMA)?;
    Ok(pool)
}

pub struct BatchInsertor<'conn> {
    add_record: CachedStatement<'conn>,
}

impl<'conn> BatchInsertor<'conn> {
    pub fn new(tx: &'conn Transaction<'_>) -> Result<BatchInsertor<'conn>, Error> {
        let add_record = tx.prepare_cached(
            "
            INSERT INTO records(
                remote_host, timestamp_raw, method, page, protocol,
                status, size, event_unix, tz_offset_secs, epoch_seconds,
                extension, user_id, is_bot, session_id
            )
            VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )?;
        Ok(BatchInsertor { add_record })
    }

    pub fn add(&mut self, rec: &LogRecord) -> Result<(), Error> {
        let event_unix = rec.event_time.map(|dt| dt.timestamp());
        let tz_offset_secs = rec.event_time.map(|dt| dt.offset().local_minus_utc());
        self.add_record.execute(params![
            rec.remote_host,
            rec.timestamp_raw,
            rec.method.as_str(),
            rec.page,
            rec.protocol,
            rec.status,
            rec.size,
            event_unix,
            tz_offset_secs,
            rec.epoch_seconds,
            rec.extension,
            rec.user_id,
            rec.is_bot,
            rec.session_id,
        ])?;
        Ok(())
    }
}

/// Replaces the stored table with `records`, inserting in chunked
/// transactions with cached statements.
pub fn save_records(pool: &DbPool, records: &[LogRecord]) -> Result<(), Error> {
    let mut conn = pool.get()?;
    conn.execute("DELETE FROM records", [])?;
    for chunk in &records.iter().chunks(INSERT_CHUNK_SIZE) {
        let tx = conn.transaction()?;
        {
            let mut insertor = BatchInsertor::new(&tx)?;
            for rec in chunk {
                insertor.add(rec)?;
            }
        }
        tx.commit()?;
        debug!("committed a record chunk");
    }
    info!("saved {} records", records.len());
    Ok(())
}

/// Loads the stored table in insertion order. Rows that no longer decode are
/// skipped and counted, not fatal; the count comes back with the records.
pub fn load_records(pool: &DbPool) -> Result<(Vec<LogRecord>, usize), Error> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare_cached(
        "
        SELECT
            remote_host, timestamp_raw, method, page, protocol,
            status, size, event_unix, tz_offset_secs, epoch_seconds,
            extension, user_id, is_bot, session_id
        FROM records
        ORDER BY id
        ",
    )?;

    let (err_tx, err_rx) = crossbeam_channel::unbounded::<Error>();
    let records: Vec<LogRecord> = stmt
        .query([])?
        .mapped(row_to_record)
        .map(|res| res.map_err(Error::Sqlite))
        .route_errors(&err_tx)
        .collect();
    drop(err_tx);

    let undecodable = err_rx.try_iter().count();
    if undecodable > 0 {
        warn!("{} stored rows could not be decoded, skipped", undecodable);
    }
    info!("loaded {} records", records.len());
    Ok((records, undecodable))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogRecord> {
    let method_text: String = row.get(2)?;
    let method = Method::from_str(&method_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let event_unix: Option<i64> = row.get(7)?;
    let tz_offset_secs: Option<i32> = row.get(8)?;
    let event_time = match (event_unix, tz_offset_secs) {
        (Some(unix), Some(offset)) => {
            FixedOffset::east_opt(offset).and_then(|tz| tz.timestamp_opt(unix, 0).single())
        }
        _ => None,
    };

    Ok(LogRecord {
        remote_host: row.get(0)?,
        timestamp_raw: row.get(1)?,
        method,
        page: row.get(3)?,
        protocol: row.get(4)?,
        status: row.get(5)?,
        size: row.get(6)?,
        event_time,
        epoch_seconds: row.get(9)?,
        extension: row.get(10)?,
        user_id: row.get(11)?,
        is_bot: row.get(12)?,
        session_id: row.get(13)?,
    })
}
