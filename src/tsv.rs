use std::io::{self, Write};

use csv::{Terminator, WriterBuilder};

use crate::tcx_types::Leg;

pub const HEADER: [&str; 5] = ["Total", "Lap", "Distance", "Up", "Down"];

/// Tab-separated leg table written row by row to `W`.
///
/// The header goes out on construction, so even a track without a single
/// leg produces a valid table.
pub struct TsvWriter<W: Write> {
    out: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> TsvWriter<W> {
    pub fn new(out: W) -> io::Result<Self> {
        let mut out = WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(out);
        out.write_record(HEADER)?;
        Ok(Self { out, rows: 0 })
    }

    pub fn write_leg(&mut self, leg: &Leg) -> io::Result<()> {
        self.out.write_record([
            leg.total_seconds.to_string(),
            leg.lap_points.to_string(),
            format!("{:.6}", leg.distance),
            leg.up.to_string(),
            leg.down.to_string(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Legs written so far (header excluded).
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.out.into_inner().map_err(|e| e.into_error())
    }
}
