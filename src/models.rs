use chrono::{DateTime, FixedOffset};

/// HTTP methods accepted by the line grammar. Anything else makes the whole
/// line unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Head,
    Put,
    Delete,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl std::fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown HTTP method '{}'", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl std::str::FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Case-sensitive on purpose, the log grammar is.
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "HEAD" => Ok(Method::Head),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            "PATCH" => Ok(Method::Patch),
            other => Err(UnknownMethod(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request line as matched by the grammar, before any column coercion.
/// `status_raw` is guaranteed to be three digits; `size_raw` is either a
/// decimal integer or the literal `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub remote_host: String,
    pub timestamp_raw: String,
    pub method: Method,
    pub page: String,
    pub protocol: String,
    pub status_raw: String,
    pub size_raw: String,
}

/// One fully derived table row. The loader fills everything except
/// `is_bot` (bot filter) and `session_id` (sessionizer).
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub remote_host: String,
    pub timestamp_raw: String,
    pub method: Method,
    pub page: String,
    pub protocol: String,
    pub status: Option<i64>,
    pub size: Option<i64>,
    pub event_time: Option<DateTime<FixedOffset>>,
    /// Seconds since 1995-01-01T00:00:00Z, from the UTC-normalized timestamp.
    /// The canonical ordering key for all time math.
    pub epoch_seconds: Option<f64>,
    pub extension: String,
    pub user_id: String,
    pub is_bot: bool,
    pub session_id: Option<String>,
}

impl LogRecord {
    pub fn from_parsed(line: ParsedLine) -> LogRecord {
        let ParsedLine {
            remote_host,
            timestamp_raw,
            method,
            page,
            protocol,
            status_raw,
            size_raw,
        } = line;
        LogRecord {
            user_id: remote_host.clone(),
            status: status_raw.parse().ok(),
            size: if size_raw == "-" {
                None
            } else {
                size_raw.parse().ok()
            },
            remote_host,
            timestamp_raw,
            method,
            page,
            protocol,
            event_time: None,
            epoch_seconds: None,
            extension: String::new(),
            is_bot: false,
            session_id: None,
        }
    }
}

/// Per-session aggregate, computed on demand from records sharing a
/// `session_id`. `duration` is only defined for sessions with more than one
/// hit and requires both endpoints to carry a timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub user_id: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub hit_count: usize,
    pub duration: Option<f64>,
}
