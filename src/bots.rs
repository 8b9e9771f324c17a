use std::collections::{HashMap, HashSet};

use log::info;

use crate::iterutils::ExtendTo;
use crate::models::LogRecord;

const SENTINEL_PATH: &str = "/robots.txt";

/// Requests issued by one host classified as a bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotHostCount {
    pub host: String,
    pub requests: usize,
}

/// Bot vs non-bot request split over the whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotProportions {
    pub total_requests: usize,
    pub bot_requests: usize,
    pub human_requests: usize,
}

impl BotProportions {
    pub fn bot_fraction(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.bot_requests as f64 / self.total_requests as f64
        }
    }

    pub fn human_fraction(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.human_requests as f64 / self.total_requests as f64
        }
    }
}

/// Marks every record of every host that requested `/robots.txt` (any case)
/// at least once. Host-level classification: the whole table is scanned
/// before any record is flagged, so hits made *before* the robots.txt
/// request are flagged too. No sentinel hit anywhere → everything stays
/// `is_bot = false`, which is not an error.
pub fn flag_bots(mut records: Vec<LogRecord>) -> Vec<LogRecord> {
    let mut bot_hosts: HashSet<String> = HashSet::new();
    records
        .iter()
        .filter(|r| r.page.eq_ignore_ascii_case(SENTINEL_PATH))
        .map(|r| r.remote_host.clone())
        .extend_to(&mut bot_hosts);

    if bot_hosts.is_empty() {
        info!("no hosts requested {}", SENTINEL_PATH);
    } else {
        info!(
            "{} hosts classified as bots via {}",
            bot_hosts.len(),
            SENTINEL_PATH
        );
    }

    for rec in records.iter_mut() {
        rec.is_bot = bot_hosts.contains(&rec.remote_host);
    }
    records
}

/// The bot-free table.
pub fn without_bots(records: Vec<LogRecord>) -> Vec<LogRecord> {
    records.into_iter().filter(|r| !r.is_bot).collect()
}

/// Requests per bot host, busiest first.
pub fn bot_host_counts(records: &[LogRecord]) -> Vec<BotHostCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for rec in records.iter().filter(|r| r.is_bot) {
        *counts.entry(rec.remote_host.as_str()).or_default() += 1;
    }
    let mut rows: Vec<BotHostCount> = counts
        .into_iter()
        .map(|(host, requests)| BotHostCount {
            host: host.to_owned(),
            requests,
        })
        .collect();
    rows.sort_by(|a, b| b.requests.cmp(&a.requests).then_with(|| a.host.cmp(&b.host)));
    rows
}

pub fn bot_proportions(records: &[LogRecord]) -> BotProportions {
    let bot_requests = records.iter().filter(|r| r.is_bot).count();
    BotProportions {
        total_requests: records.len(),
        bot_requests,
        human_requests: records.len() - bot_requests,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{bot_host_counts, bot_proportions, flag_bots, without_bots};
    use crate::loader::load;
    use crate::models::LogRecord;

    fn records_from(input: &str) -> Vec<LogRecord> {
        let (records, _) = load(Cursor::new(input.as_bytes().to_vec())).unwrap();
        records
    }

    #[test]
    fn robots_host_is_flagged_for_all_its_traffic() {
        let records = records_from(
            "\
5.6.7.8 - - [01/Jul/1995:00:00:01 -0400] \"GET /index.html HTTP/1.0\" 200 100\n\
5.6.7.8 - - [01/Jul/1995:00:00:05 -0400] \"GET /robots.txt HTTP/1.0\" 200 50\n\
5.6.7.8 - - [01/Jul/1995:00:00:09 -0400] \"GET /index.html HTTP/1.0\" 200 100\n\
1.2.3.4 - - [01/Jul/1995:00:00:11 -0400] \"GET /index.html HTTP/1.0\" 200 100\n",
        );
        let flagged = flag_bots(records);
        // The hit *before* the robots.txt request is flagged too.
        assert!(flagged
            .iter()
            .filter(|r| r.remote_host == "5.6.7.8")
            .all(|r| r.is_bot));
        assert!(flagged
            .iter()
            .filter(|r| r.remote_host == "1.2.3.4")
            .all(|r| !r.is_bot));

        let filtered = without_bots(flagged);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.iter().all(|r| r.remote_host != "5.6.7.8"));
    }

    #[test]
    fn sentinel_comparison_is_case_insensitive() {
        let records = records_from(
            "\
5.6.7.8 - - [01/Jul/1995:00:00:01 -0400] \"GET /ROBOTS.TXT HTTP/1.0\" 200 50\n\
5.6.7.8 - - [01/Jul/1995:00:00:05 -0400] \"GET /a.html HTTP/1.0\" 200 100\n",
        );
        let flagged = flag_bots(records);
        assert!(flagged.iter().all(|r| r.is_bot));
    }

    #[test]
    fn no_sentinel_hit_is_a_noop() {
        let records = records_from(
            "\
1.2.3.4 - - [01/Jul/1995:00:00:01 -0400] \"GET /a.html HTTP/1.0\" 200 100\n\
5.6.7.8 - - [01/Jul/1995:00:00:05 -0400] \"GET /b.html HTTP/1.0\" 200 100\n",
        );
        let flagged = flag_bots(records);
        assert!(flagged.iter().all(|r| !r.is_bot));
        assert_eq!(without_bots(flagged).len(), 2);
    }

    #[test]
    fn bot_tables_count_and_rank_hosts() {
        let records = records_from(
            "\
crawler.a - - [01/Jul/1995:00:00:01 -0400] \"GET /robots.txt HTTP/1.0\" 200 50\n\
crawler.b - - [01/Jul/1995:00:00:02 -0400] \"GET /robots.txt HTTP/1.0\" 200 50\n\
crawler.b - - [01/Jul/1995:00:00:03 -0400] \"GET /x.html HTTP/1.0\" 200 10\n\
human.c - - [01/Jul/1995:00:00:04 -0400] \"GET /y.html HTTP/1.0\" 200 10\n",
        );
        let flagged = flag_bots(records);
        let counts = bot_host_counts(&flagged);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].host, "crawler.b");
        assert_eq!(counts[0].requests, 2);
        assert_eq!(counts[1].host, "crawler.a");

        let props = bot_proportions(&flagged);
        assert_eq!(props.total_requests, 4);
        assert_eq!(props.bot_requests, 3);
        assert_eq!(props.human_requests, 1);
        assert!((props.bot_fraction() - 0.75).abs() < 1e-12);
    }
}
