// Error sink - append-only record of inputs the pipeline skipped

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Append-only text log of `(context, detail)` pairs, one tab-separated
/// line each. Holds the recoverable rejections (bad fragments, unreadable
/// files) that the run continued past.
pub struct ErrorLog {
    writer: BufWriter<File>,
}

impl ErrorLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(ErrorLog {
            writer: BufWriter::new(file),
        })
    }

    pub fn record(&mut self, context: &str, detail: &str) -> io::Result<()> {
        writeln!(self.writer, "{}\t{}", context, detail)?;
        self.writer.flush()
    }
}
