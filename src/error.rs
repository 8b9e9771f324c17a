use derive_more::{Display, From};

/// Fatal pipeline errors. Per-line problems never end up here, they are
/// skipped and counted by the loader.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "i/o error: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "database error: {}", _0)]
    Sqlite(rusqlite::Error),
    #[display(fmt = "connection pool error: {}", _0)]
    Pool(r2d2::Error),
    /// The file was readable but not a single line matched the grammar.
    /// Distinct from an I/O failure so callers can tell "ran but found
    /// nothing" from "never ran".
    #[display(
        fmt = "no valid records parsed ({} lines read, {} skipped)",
        total_lines,
        skipped
    )]
    #[from(ignore)]
    NoValidData { total_lines: usize, skipped: usize },
    /// The database exists but holds no records to report on.
    #[display(fmt = "no records stored in the database, run `process` first")]
    #[from(ignore)]
    EmptyStore,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Sqlite(e) => Some(e),
            Error::Pool(e) => Some(e),
            Error::NoValidData { .. } | Error::EmptyStore => None,
        }
    }
}
