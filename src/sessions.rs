use std::cmp::Ordering;
use std::collections::HashMap;

use log::info;

use crate::models::{LogRecord, SessionSummary};

/// Inactivity gap above which a user's next hit opens a new visit.
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 1800.0;

/// Fills `user_id` for every record. The log format carries no cookie or
/// login signal, so one host is one user. With `hash_hosts` the id becomes a
/// truncated md5 of the host; weak and short on purpose, reports built from
/// it should not pin-point a visitor.
pub fn assign_user_ids(records: &mut [LogRecord], hash_hosts: bool) {
    for rec in records.iter_mut() {
        rec.user_id = if hash_hosts {
            hash_host(&rec.remote_host)
        } else {
            rec.remote_host.clone()
        };
    }
}

pub fn hash_host(host: &str) -> String {
    let digest: [u8; 16] = md5::compute(host).into();
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

/// `(user_id, epoch_seconds)` ascending; records without a timestamp order
/// after the timestamped ones of the same user. Used with a stable sort, so
/// equal keys keep original input order.
fn chronological_cmp(a: &LogRecord, b: &LogRecord) -> Ordering {
    a.user_id
        .cmp(&b.user_id)
        .then_with(|| cmp_epoch(a.epoch_seconds, b.epoch_seconds))
}

pub(crate) fn cmp_epoch(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Partitions every user's hits into visits and assigns
/// `session_id = "{user_id}_{n}"`, where n counts that user's sessions from 1
/// cumulatively. A session ends only by an inter-hit gap strictly greater
/// than the timeout; a gap of exactly the timeout stays inside. The returned
/// table is sorted by `(user_id, epoch_seconds)`.
pub fn sessionize(mut records: Vec<LogRecord>, timeout_seconds: f64) -> Vec<LogRecord> {
    // Chronological order is established here, never trusted from callers.
    records.sort_by(chronological_cmp);

    let mut current_user: Option<String> = None;
    let mut prev_epoch: Option<f64> = None;
    let mut counter: u64 = 0;

    for rec in records.iter_mut() {
        if current_user.as_deref() != Some(rec.user_id.as_str()) {
            current_user = Some(rec.user_id.clone());
            counter = 0;
            prev_epoch = None;
        }
        // Delta to the user's previous hit. Undefined for the first hit and
        // whenever either endpoint lacks a timestamp; an undefined delta
        // always opens a new session.
        let delta = match (prev_epoch, rec.epoch_seconds) {
            (Some(prev), Some(cur)) => Some(cur - prev),
            _ => None,
        };
        let new_session = match delta {
            Some(d) => d > timeout_seconds,
            None => true,
        };
        if new_session {
            counter += 1;
        }
        rec.session_id = Some(format!("{}_{}", rec.user_id, counter));
        prev_epoch = rec.epoch_seconds;
    }

    let session_count = records
        .iter()
        .filter_map(|r| r.session_id.as_deref())
        .collect::<std::collections::HashSet<_>>()
        .len();
    info!(
        "identified {} sessions over {} records (timeout {}s)",
        session_count,
        records.len(),
        timeout_seconds
    );
    records
}

/// One row per session. `duration` is filled only for sessions with more
/// than one hit whose endpoints both carry a timestamp.
pub fn session_summaries(records: &[LogRecord]) -> Vec<SessionSummary> {
    let mut map: HashMap<&str, SessionSummary> = HashMap::new();
    for rec in records {
        let sid = match rec.session_id.as_deref() {
            Some(s) => s,
            None => continue,
        };
        let entry = map.entry(sid).or_insert_with(|| SessionSummary {
            session_id: sid.to_owned(),
            user_id: rec.user_id.clone(),
            start: None,
            end: None,
            hit_count: 0,
            duration: None,
        });
        entry.hit_count += 1;
        if let Some(t) = rec.epoch_seconds {
            entry.start = Some(entry.start.map_or(t, |s| s.min(t)));
            entry.end = Some(entry.end.map_or(t, |e| e.max(t)));
        }
    }

    let mut rows: Vec<SessionSummary> = map.into_values().collect();
    for row in rows.iter_mut() {
        if row.hit_count > 1 {
            row.duration = match (row.start, row.end) {
                (Some(start), Some(end)) => Some(end - start),
                _ => None,
            };
        }
    }
    rows.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then_with(|| cmp_epoch(a.start, b.start))
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    rows
}
