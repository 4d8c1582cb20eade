//! Audit trail for simulated picks.

use super::types::DayResult;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Observer for fully drawn simulated days. Must not draw randomness.
pub trait DaySink {
    fn record_day(&mut self, day: u32, result: &DayResult);

    fn finish(&mut self) {}
}

/// Discards everything.
pub struct NoopSink;

impl DaySink for NoopSink {
    fn record_day(&mut self, _day: u32, _result: &DayResult) {}
}

#[derive(Serialize)]
struct PickRow<'a> {
    day: u32,
    sport: &'a str,
    confidence: u32,
    odds: f64,
    result: &'static str,
    day_result: &'static str,
}

fn win_loss(won: bool) -> &'static str {
    if won {
        "Win"
    } else {
        "Loss"
    }
}

/// One CSV row per pick: `day,sport,confidence,odds,result,day_result`.
pub struct CsvPickLog<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl CsvPickLog<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        info!("Writing pick log to {:?}", path.as_ref());
        Ok(Self::new(csv::Writer::from_path(path)?))
    }
}

impl<W: Write> CsvPickLog<W> {
    pub fn new(writer: csv::Writer<W>) -> Self {
        Self { writer, rows: 0 }
    }

    pub fn from_writer(inner: W) -> Self {
        Self::new(csv::Writer::from_writer(inner))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, csv::Error> {
        self.writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

impl<W: Write> DaySink for CsvPickLog<W> {
    fn record_day(&mut self, day: u32, result: &DayResult) {
        for pick in &result.picks {
            let row = PickRow {
                day,
                sport: &pick.sport,
                confidence: pick.confidence,
                odds: pick.odds,
                result: win_loss(pick.outcome),
                day_result: win_loss(result.is_win),
            };
            // A broken log never stops the simulation
            if let Err(e) = self.writer.serialize(&row) {
                warn!("Failed to write pick log row for day {}: {}", day, e);
                return;
            }
            self.rows += 1;
        }
    }

    fn finish(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!("Failed to flush pick log: {}", e);
        }
    }
}
