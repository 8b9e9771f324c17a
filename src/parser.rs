use crate::models::{Method, ParsedLine};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ParseError(String);

impl ParseError {
    pub fn new(line: impl AsRef<str>) -> Self {
        ParseError(line.as_ref().to_owned())
    }

    /// The offending input line, for skip reporting.
    pub fn line(&self) -> &str {
        &self.0
    }
}

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unable to parse line '{}'", self.0)
    }
}

// NASA 1995 access log, Combined-Log-like fixed-field grammar:
//   <host> <ident> <user> [<timestamp>] "<METHOD> <path> <PROTOCOL>" <status> <size>
// ident/user are RFC-1413/auth noise and get matched but never captured.
// Anchored at both ends; partial matches are not log lines.
static LOG_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<host>\S+)\s+\S+\s+\S+\s+\[(?P<date>[^\]]+)\]\s+"(?P<method>GET|POST|HEAD|PUT|DELETE|OPTIONS|PATCH)\s+(?P<page>\S+)\s+(?P<proto>HTTP/\d\.\d)"\s+(?P<status>\d{3})\s+(?P<size>\S+)$"#,
    )
    .unwrap()
});

/// Turns one raw line into a `ParsedLine`, or reports why it is not one.
/// Never panics on malformed input; status/size stay raw strings here,
/// coercion is the loader's job.
pub fn parse(line: &str) -> Result<ParsedLine, ParseError> {
    if let Some(captures) = LOG_LINE_REGEX.captures(line) {
        if let (
            Some(hostmatch),
            Some(datematch),
            Some(methodmatch),
            Some(pagematch),
            Some(protomatch),
            Some(statusmatch),
            Some(sizematch),
        ) = (
            captures.name("host"),
            captures.name("date"),
            captures.name("method"),
            captures.name("page"),
            captures.name("proto"),
            captures.name("status"),
            captures.name("size"),
        ) {
            let method =
                Method::from_str(methodmatch.as_str()).map_err(|_| ParseError::new(line))?;
            Ok(ParsedLine {
                remote_host: hostmatch.as_str().to_owned(),
                timestamp_raw: datematch.as_str().to_owned(),
                method,
                page: pagematch.as_str().to_owned(),
                protocol: protomatch.as_str().to_owned(),
                status_raw: statusmatch.as_str().to_owned(),
                size_raw: sizematch.as_str().to_owned(),
            })
        } else {
            Err(ParseError::new(line))
        }
    } else {
        Err(ParseError::new(line))
    }
}
