use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::error::Error;
use crate::loader::lossy_lines;

/// Copies the first `num_lines` lines of `source` into `output`, reading as
/// permissively as the loader does. Returns how many lines were written,
/// which is fewer than asked when the source is short.
pub fn create_sample(source: &Path, output: &Path, num_lines: usize) -> Result<usize, Error> {
    info!(
        "reading first {} lines from {}",
        num_lines,
        source.display()
    );
    let reader = BufReader::new(File::open(source)?);
    let mut out = BufWriter::new(File::create(output)?);
    let mut written = 0usize;
    for line in lossy_lines(reader).take(num_lines) {
        writeln!(out, "{}", line?)?;
        written += 1;
    }
    out.flush()?;
    info!("wrote {} lines to {}", written, output.display());
    Ok(written)
}
