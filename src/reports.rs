//! Thin consumers of the sessionized table: count, aggregate, write CSV.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use log::info;

use crate::bots::{bot_host_counts, bot_proportions};
use crate::error::Error;
use crate::models::{LogRecord, SessionSummary};
use crate::sessions::{cmp_epoch, session_summaries};
use crate::stats::{describe, Describe};

/// Requests per extension over the whole table, busiest first. The empty
/// extension (directories, dotless pages) is counted too.
pub fn extension_distribution(records: &[LogRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for rec in records {
        *counts.entry(rec.extension.as_str()).or_default() += 1;
    }
    let mut rows: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(ext, count)| (ext.to_owned(), count))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

pub fn top_extensions(records: &[LogRecord], top_n: usize) -> Vec<(String, usize)> {
    extension_distribution(records)
        .into_iter()
        .filter(|(ext, _)| !ext.is_empty())
        .take(top_n)
        .collect()
}

/// Distinct sessions per visitor, most sessions first.
pub fn top_visitors(summaries: &[SessionSummary], top_n: usize) -> Vec<(String, usize)> {
    let mut per_user: HashMap<&str, usize> = HashMap::new();
    for summary in summaries {
        *per_user.entry(summary.user_id.as_str()).or_default() += 1;
    }
    let mut rows: Vec<(String, usize)> = per_user
        .into_iter()
        .map(|(user, sessions)| (user.to_owned(), sessions))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(top_n);
    rows
}

/// How many visitors made exactly N sessions, for N in `1..=max_sessions`.
/// Buckets with no visitors are present with a zero.
pub fn visitor_session_distribution(
    summaries: &[SessionSummary],
    max_sessions: usize,
) -> Vec<(usize, usize)> {
    let mut per_user: HashMap<&str, usize> = HashMap::new();
    for summary in summaries {
        *per_user.entry(summary.user_id.as_str()).or_default() += 1;
    }
    let mut buckets = vec![0usize; max_sessions];
    for sessions in per_user.into_values() {
        if (1..=max_sessions).contains(&sessions) {
            buckets[sessions - 1] += 1;
        }
    }
    (1..=max_sessions).zip(buckets).collect()
}

pub fn session_durations(summaries: &[SessionSummary]) -> Vec<f64> {
    summaries.iter().filter_map(|s| s.duration).collect()
}

pub fn hits_per_session(summaries: &[SessionSummary]) -> Vec<f64> {
    summaries.iter().map(|s| s.hit_count as f64).collect()
}

/// Session durations bucketed per minute: `[0,1) … [9,10)` then `10+`.
pub fn duration_distribution_minutes(durations: &[f64]) -> Vec<(String, usize)> {
    let mut buckets = vec![0usize; 11];
    for duration in durations {
        let minutes = duration / 60.0;
        let idx = if minutes >= 10.0 {
            10
        } else {
            minutes.floor() as usize
        };
        buckets[idx] += 1;
    }
    let mut rows: Vec<(String, usize)> = (0..10)
        .map(|i| (format!("{}-{} min", i, i + 1), buckets[i]))
        .collect();
    rows.push(("10+ min".to_owned(), buckets[10]));
    rows
}

struct Endpoints<'a> {
    first: &'a LogRecord,
    last: &'a LogRecord,
}

/// Earliest and latest hit of every session. Untimestamped hits lose against
/// timestamped ones; on equal timestamps the earliest-seen record wins, as
/// an idxmin/idxmax scan would.
fn session_endpoints(records: &[LogRecord]) -> HashMap<&str, Endpoints<'_>> {
    let mut map: HashMap<&str, Endpoints<'_>> = HashMap::new();
    for rec in records {
        let sid = match rec.session_id.as_deref() {
            Some(s) => s,
            None => continue,
        };
        match map.entry(sid) {
            Entry::Vacant(vacant) => {
                vacant.insert(Endpoints {
                    first: rec,
                    last: rec,
                });
            }
            Entry::Occupied(mut occupied) => {
                let endpoints = occupied.get_mut();
                if cmp_epoch(rec.epoch_seconds, endpoints.first.epoch_seconds) == Ordering::Less {
                    endpoints.first = rec;
                }
                if cmp_epoch(rec.epoch_seconds, endpoints.last.epoch_seconds) == Ordering::Greater {
                    endpoints.last = rec;
                }
            }
        }
    }
    map
}

fn count_pages<'a>(pages: impl Iterator<Item = &'a str>, top_n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for page in pages {
        *counts.entry(page).or_default() += 1;
    }
    let mut rows: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(page, count)| (page.to_owned(), count))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(top_n);
    rows
}

/// Pages that open the most sessions.
pub fn top_entry_pages(records: &[LogRecord], top_n: usize) -> Vec<(String, usize)> {
    let endpoints = session_endpoints(records);
    count_pages(endpoints.values().map(|e| e.first.page.as_str()), top_n)
}

/// Pages that close the most sessions.
pub fn top_exit_pages(records: &[LogRecord], top_n: usize) -> Vec<(String, usize)> {
    let endpoints = session_endpoints(records);
    count_pages(endpoints.values().map(|e| e.last.page.as_str()), top_n)
}

/// Most common pages of one-hit sessions.
pub fn top_single_access_pages(records: &[LogRecord], top_n: usize) -> Vec<(String, usize)> {
    let mut hits: HashMap<&str, usize> = HashMap::new();
    for rec in records {
        if let Some(sid) = rec.session_id.as_deref() {
            *hits.entry(sid).or_default() += 1;
        }
    }
    let endpoints = session_endpoints(records);
    count_pages(
        endpoints
            .iter()
            .filter(|(sid, _)| hits.get(*sid) == Some(&1))
            .map(|(_, e)| e.first.page.as_str()),
        top_n,
    )
}

fn by_session_time(records: &[LogRecord]) -> Vec<&LogRecord> {
    let mut sorted: Vec<&LogRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.session_id
            .cmp(&b.session_id)
            .then_with(|| cmp_epoch(a.epoch_seconds, b.epoch_seconds))
    });
    sorted
}

/// Time spent on each page: delta to the next hit of the same session, so
/// every session's last hit contributes nothing. Negative deltas are
/// dropped.
pub fn page_view_durations(records: &[LogRecord]) -> Vec<f64> {
    let sorted = by_session_time(records);
    let mut durations = Vec::new();
    for (cur, next) in sorted.iter().tuple_windows() {
        if cur.session_id.is_some() && cur.session_id == next.session_id {
            if let (Some(a), Some(b)) = (cur.epoch_seconds, next.epoch_seconds) {
                let delta = b - a;
                if delta >= 0.0 {
                    durations.push(delta);
                }
            }
        }
    }
    durations
}

/// Dwell time on the first and second page of each session, where defined.
pub fn first_second_page_durations(records: &[LogRecord]) -> (Vec<f64>, Vec<f64>) {
    let sorted = by_session_time(records);
    let mut first = Vec::new();
    let mut second = Vec::new();
    for (sid, group) in &sorted.into_iter().group_by(|r| r.session_id.clone()) {
        if sid.is_none() {
            continue;
        }
        let times: Vec<f64> = group.filter_map(|r| r.epoch_seconds).collect();
        if times.len() >= 2 {
            let delta = times[1] - times[0];
            if delta >= 0.0 {
                first.push(delta);
            }
        }
        if times.len() >= 3 {
            let delta = times[2] - times[1];
            if delta >= 0.0 {
                second.push(delta);
            }
        }
    }
    (first, second)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionPageTime {
    pub session_id: String,
    pub avg_seconds: f64,
    pub page_views: usize,
}

/// Average page-view time per session, quickest sessions first.
pub fn per_session_avg_page_time(records: &[LogRecord]) -> Vec<SessionPageTime> {
    let sorted = by_session_time(records);
    let mut rows = Vec::new();
    for (sid, group) in &sorted.into_iter().group_by(|r| r.session_id.clone()) {
        let sid = match sid {
            Some(s) => s,
            None => continue,
        };
        let times: Vec<f64> = group.filter_map(|r| r.epoch_seconds).collect();
        let durations: Vec<f64> = times
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|d| *d >= 0.0)
            .collect();
        if durations.is_empty() {
            continue;
        }
        rows.push(SessionPageTime {
            session_id: sid,
            avg_seconds: durations.iter().sum::<f64>() / durations.len() as f64,
            page_views: durations.len(),
        });
    }
    rows.sort_by(|a, b| {
        a.avg_seconds
            .partial_cmp(&b.avg_seconds)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    rows
}

/* ------------------------- CSV writing ------------------------- */

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

fn write_csv(path: &Path, header: &[&str], rows: Vec<Vec<String>>) -> Result<(), Error> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", header.iter().map(|h| csv_field(h)).join(","))?;
    for row in rows {
        writeln!(out, "{}", row.iter().map(|f| csv_field(f)).join(","))?;
    }
    out.flush()?;
    info!("wrote {}", path.display());
    Ok(())
}

fn fmt_f64(value: f64) -> String {
    format!("{}", value)
}

fn describe_rows(label: &str, d: &Describe) -> Vec<Vec<String>> {
    vec![
        vec![label.to_owned(), "count".to_owned(), d.count.to_string()],
        vec![label.to_owned(), "mean".to_owned(), fmt_f64(d.mean)],
        vec![
            label.to_owned(),
            "std".to_owned(),
            d.std.map(fmt_f64).unwrap_or_default(),
        ],
        vec![label.to_owned(), "min".to_owned(), fmt_f64(d.min)],
        vec![label.to_owned(), "25%".to_owned(), fmt_f64(d.q25)],
        vec![label.to_owned(), "50%".to_owned(), fmt_f64(d.median)],
        vec![label.to_owned(), "75%".to_owned(), fmt_f64(d.q75)],
        vec![label.to_owned(), "max".to_owned(), fmt_f64(d.max)],
        vec![
            label.to_owned(),
            "mode".to_owned(),
            d.modes.iter().map(|m| fmt_f64(*m)).join("; "),
        ],
    ]
}

fn count_rows(rows: Vec<(String, usize)>) -> Vec<Vec<String>> {
    rows.into_iter()
        .map(|(key, count)| vec![key, count.to_string()])
        .collect()
}

/// Default row count for the top-N tables.
pub const DEFAULT_TOP_N: usize = 10;

/// Extension tables over the freshly loaded table, before any filtering.
pub fn write_extension_reports(
    records: &[LogRecord],
    out_dir: &Path,
    top_n: usize,
) -> Result<(), Error> {
    fs::create_dir_all(out_dir)?;
    write_csv(
        &out_dir.join("all_extensions_distribution.csv"),
        &["extension", "requests"],
        count_rows(extension_distribution(records)),
    )?;
    write_csv(
        &out_dir.join(format!("top_{}_extensions.csv", top_n)),
        &["extension", "requests"],
        count_rows(top_extensions(records, top_n)),
    )
}

/// Bot tables over the flagged table, before the bot rows are dropped.
/// The details table is skipped when nothing was classified.
pub fn write_bot_reports(records: &[LogRecord], out_dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(out_dir)?;
    let bots = bot_host_counts(records);
    if !bots.is_empty() {
        write_csv(
            &out_dir.join("identified_bots_details.csv"),
            &["bot_host", "requests"],
            bots.into_iter()
                .map(|b| vec![b.host, b.requests.to_string()])
                .collect(),
        )?;
    }
    let proportions = bot_proportions(records);
    write_csv(
        &out_dir.join("bot_proportions_summary.csv"),
        &["category", "requests", "proportion"],
        vec![
            vec![
                "bot".to_owned(),
                proportions.bot_requests.to_string(),
                fmt_f64(proportions.bot_fraction()),
            ],
            vec![
                "human".to_owned(),
                proportions.human_requests.to_string(),
                fmt_f64(proportions.human_fraction()),
            ],
        ],
    )
}

/// The session/page/visitor battery over the stored sessionized table.
/// Tables with nothing to say (no multi-hit sessions, no page views) are
/// skipped, matching how the analysis behaves on such inputs.
pub fn write_session_reports(
    records: &[LogRecord],
    out_dir: &Path,
    top_n: usize,
) -> Result<(), Error> {
    fs::create_dir_all(out_dir)?;
    let summaries = session_summaries(records);

    let durations = session_durations(&summaries);
    if let Some(d) = describe(&durations) {
        write_csv(
            &out_dir.join("session_duration_stats.csv"),
            &["series", "stat", "value"],
            describe_rows("session_duration_seconds", &d),
        )?;
        write_csv(
            &out_dir.join("session_duration_distribution_minutes.csv"),
            &["duration_range", "sessions"],
            count_rows(duration_distribution_minutes(&durations)),
        )?;
    }
    if let Some(d) = describe(&hits_per_session(&summaries)) {
        write_csv(
            &out_dir.join("hits_per_session_stats.csv"),
            &["series", "stat", "value"],
            describe_rows("hits_per_session", &d),
        )?;
    }

    write_csv(
        &out_dir.join(format!("top_{}_visitors_by_sessions.csv", top_n)),
        &["user_id", "sessions"],
        count_rows(top_visitors(&summaries, top_n)),
    )?;
    write_csv(
        &out_dir.join("visitor_session_distribution_1_to_9.csv"),
        &["sessions", "unique_visitors"],
        visitor_session_distribution(&summaries, 9)
            .into_iter()
            .map(|(n, visitors)| vec![n.to_string(), visitors.to_string()])
            .collect(),
    )?;

    write_csv(
        &out_dir.join(format!("top_{}_entry_pages.csv", top_n)),
        &["page", "sessions_started"],
        count_rows(top_entry_pages(records, top_n)),
    )?;
    write_csv(
        &out_dir.join(format!("top_{}_exit_pages.csv", top_n)),
        &["page", "sessions_ended"],
        count_rows(top_exit_pages(records, top_n)),
    )?;
    write_csv(
        &out_dir.join(format!("top_{}_single_access_pages.csv", top_n)),
        &["page", "single_hit_sessions"],
        count_rows(top_single_access_pages(records, top_n)),
    )?;

    if let Some(d) = describe(&page_view_durations(records)) {
        write_csv(
            &out_dir.join("page_view_duration_stats.csv"),
            &["series", "stat", "value"],
            describe_rows("page_view_seconds", &d),
        )?;
    }
    let (first, second) = first_second_page_durations(records);
    let mut rows = Vec::new();
    if let Some(d) = describe(&first) {
        rows.extend(describe_rows("first_page_seconds", &d));
    }
    if let Some(d) = describe(&second) {
        rows.extend(describe_rows("second_page_seconds", &d));
    }
    if !rows.is_empty() {
        write_csv(
            &out_dir.join("first_second_page_duration_stats.csv"),
            &["series", "stat", "value"],
            rows,
        )?;
    }

    let page_times = per_session_avg_page_time(records);
    if !page_times.is_empty() {
        write_csv(
            &out_dir.join("per_session_avg_page_time.csv"),
            &["session_id", "avg_page_view_seconds", "page_views"],
            page_times
                .into_iter()
                .map(|r| {
                    vec![
                        r.session_id,
                        fmt_f64(r.avg_seconds),
                        r.page_views.to_string(),
                    ]
                })
                .collect(),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::bots::flag_bots;
    use crate::loader::load;
    use crate::sessions::{sessionize, DEFAULT_TIMEOUT_SECONDS};

    // Two visitors: "a" with a three-hit session plus a later single-hit
    // session, "b" with a two-hit session.
    fn fixture() -> Vec<LogRecord> {
        let input = "\
a - - [01/Jul/1995:00:00:00 -0400] \"GET /a.html HTTP/1.0\" 200 10\n\
a - - [01/Jul/1995:00:01:00 -0400] \"GET /b.html HTTP/1.0\" 200 10\n\
a - - [01/Jul/1995:00:02:00 -0400] \"GET /c.html HTTP/1.0\" 200 10\n\
a - - [01/Jul/1995:02:46:40 -0400] \"GET /d.html HTTP/1.0\" 200 10\n\
b - - [01/Jul/1995:00:00:00 -0400] \"GET /a.html HTTP/1.0\" 200 10\n\
b - - [01/Jul/1995:00:00:30 -0400] \"GET /e.html HTTP/1.0\" 200 10\n";
        let (records, _) = load(Cursor::new(input.as_bytes().to_vec())).unwrap();
        sessionize(flag_bots(records), DEFAULT_TIMEOUT_SECONDS)
    }

    #[test]
    fn entry_pages_count_session_openers() {
        let records = fixture();
        let entries = top_entry_pages(&records, 10);
        assert_eq!(
            entries,
            vec![
                ("/a.html".to_owned(), 2),
                ("/d.html".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn exit_pages_count_session_closers() {
        let records = fixture();
        let exits = top_exit_pages(&records, 10);
        assert_eq!(
            exits,
            vec![
                ("/c.html".to_owned(), 1),
                ("/d.html".to_owned(), 1),
                ("/e.html".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn single_access_pages_cover_one_hit_sessions_only() {
        let records = fixture();
        let singles = top_single_access_pages(&records, 10);
        assert_eq!(singles, vec![("/d.html".to_owned(), 1)]);
    }

    #[test]
    fn single_hit_sessions_carry_no_duration_but_count() {
        let records = fixture();
        let summaries = session_summaries(&records);
        assert_eq!(summaries.len(), 3);
        let durations = session_durations(&summaries);
        // a_2 is a single hit: present in hit stats, absent from durations.
        assert_eq!(durations.len(), 2);
        assert_eq!(hits_per_session(&summaries).len(), 3);
    }

    #[test]
    fn page_view_durations_skip_each_sessions_last_hit() {
        let records = fixture();
        let mut durations = page_view_durations(&records);
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap());
        // a_1 contributes 60+60, b_1 contributes 30; last hits contribute
        // nothing and neither does the single-hit a_2.
        assert_eq!(durations, vec![30.0, 60.0, 60.0]);
    }

    #[test]
    fn first_and_second_page_durations() {
        let records = fixture();
        let (first, second) = first_second_page_durations(&records);
        let mut first_sorted = first;
        first_sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(first_sorted, vec![30.0, 60.0]);
        assert_eq!(second, vec![60.0]);
    }

    #[test]
    fn per_session_averages_sort_quickest_first() {
        let records = fixture();
        let rows = per_session_avg_page_time(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].session_id, "b_1");
        assert_eq!(rows[0].avg_seconds, 30.0);
        assert_eq!(rows[1].session_id, "a_1");
        assert_eq!(rows[1].avg_seconds, 60.0);
        assert_eq!(rows[1].page_views, 2);
    }

    #[test]
    fn visitor_distribution_has_zero_buckets() {
        let records = fixture();
        let summaries = session_summaries(&records);
        let dist = visitor_session_distribution(&summaries, 4);
        // "b" made one session, "a" made two.
        assert_eq!(dist, vec![(1, 1), (2, 1), (3, 0), (4, 0)]);
        assert_eq!(
            top_visitors(&summaries, 1),
            vec![("a".to_owned(), 2)]
        );
    }

    #[test]
    fn duration_buckets_split_per_minute_with_overflow() {
        let durations = [5.0, 59.9, 60.0, 125.0, 3600.0];
        let rows = duration_distribution_minutes(&durations);
        assert_eq!(rows[0], ("0-1 min".to_owned(), 2));
        assert_eq!(rows[1], ("1-2 min".to_owned(), 1));
        assert_eq!(rows[2], ("2-3 min".to_owned(), 1));
        assert_eq!(rows[10], ("10+ min".to_owned(), 1));
    }

    #[test]
    fn extension_tables_rank_and_filter() {
        let records = fixture();
        let all = extension_distribution(&records);
        assert_eq!(all[0], ("html".to_owned(), 6));
        assert_eq!(top_extensions(&records, 5), vec![("html".to_owned(), 6)]);
    }

    #[test]
    fn csv_fields_get_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("with,comma"), "\"with,comma\"");
        assert_eq!(csv_field("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn session_reports_produce_the_expected_files() {
        let records = fixture();
        let dir = tempfile::tempdir().unwrap();
        write_session_reports(&records, dir.path(), 10).unwrap();

        for name in [
            "session_duration_stats.csv",
            "session_duration_distribution_minutes.csv",
            "hits_per_session_stats.csv",
            "top_10_visitors_by_sessions.csv",
            "visitor_session_distribution_1_to_9.csv",
            "top_10_entry_pages.csv",
            "top_10_exit_pages.csv",
            "top_10_single_access_pages.csv",
            "page_view_duration_stats.csv",
            "first_second_page_duration_stats.csv",
            "per_session_avg_page_time.csv",
        ] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }

        let entry_csv = std::fs::read_to_string(dir.path().join("top_10_entry_pages.csv")).unwrap();
        let mut lines = entry_csv.lines();
        assert_eq!(lines.next(), Some("page,sessions_started"));
        assert_eq!(lines.next(), Some("/a.html,2"));
    }

    #[test]
    fn extension_reports_produce_the_expected_files() {
        let records = fixture();
        let dir = tempfile::tempdir().unwrap();
        write_extension_reports(&records, dir.path(), 10).unwrap();

        let all = std::fs::read_to_string(dir.path().join("all_extensions_distribution.csv"))
            .unwrap();
        let mut lines = all.lines();
        assert_eq!(lines.next(), Some("extension,requests"));
        assert_eq!(lines.next(), Some("html,6"));
        assert!(dir.path().join("top_10_extensions.csv").exists());
    }

    #[test]
    fn bot_reports_skip_the_details_table_without_bots() {
        let records = fixture();
        let dir = tempfile::tempdir().unwrap();
        write_bot_reports(&records, dir.path()).unwrap();
        assert!(dir.path().join("bot_proportions_summary.csv").exists());
        assert!(!dir.path().join("identified_bots_details.csv").exists());
    }

    #[test]
    fn bot_reports_list_flagged_hosts() {
        let input = "\
crawler.x - - [01/Jul/1995:00:00:01 -0400] \"GET /robots.txt HTTP/1.0\" 200 10\n\
crawler.x - - [01/Jul/1995:00:00:02 -0400] \"GET /a.html HTTP/1.0\" 200 10\n\
human.y - - [01/Jul/1995:00:00:03 -0400] \"GET /a.html HTTP/1.0\" 200 10\n";
        let (records, _) = load(Cursor::new(input.as_bytes().to_vec())).unwrap();
        let records = flag_bots(records);

        let dir = tempfile::tempdir().unwrap();
        write_bot_reports(&records, dir.path()).unwrap();

        let details =
            std::fs::read_to_string(dir.path().join("identified_bots_details.csv")).unwrap();
        let mut lines = details.lines();
        assert_eq!(lines.next(), Some("bot_host,requests"));
        assert_eq!(lines.next(), Some("crawler.x,2"));

        let summary =
            std::fs::read_to_string(dir.path().join("bot_proportions_summary.csv")).unwrap();
        assert!(summary.contains("bot,2,"));
        assert!(summary.contains("human,1,"));
    }
}
