use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::Readings;

/// Observable tuple of one completed month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthRecord {
    pub year: i32,
    /// One-based, 1 = January.
    pub month: u32,
    pub total_months: u32,
    /// Inches.
    pub precipitation: f32,
    /// Degrees Fahrenheit.
    pub temperature: f32,
    /// Inches.
    pub grain_height: f32,
    pub deer: u32,
    pub wolves: u32,
}

impl From<&Readings> for MonthRecord {
    fn from(readings: &Readings) -> Self {
        Self {
            year: readings.date.year,
            month: readings.date.month + 1,
            total_months: readings.date.total_months,
            precipitation: readings.climate.precipitation,
            temperature: readings.climate.temperature,
            grain_height: readings.grain_height,
            deer: readings.deer,
            wolves: readings.wolves,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Labelled, one line per month.
    Human,
    /// Fixed-width comma-separated columns.
    #[default]
    Csv,
    /// One JSON object per line.
    Json,
}

pub const CSV_HEADER: &str =
    "year, month, total_months, precipitation, temperature, grain_height, deer, wolves";

impl MonthRecord {
    pub fn write_to<W: Write + ?Sized>(
        &self,
        out: &mut W,
        format: OutputFormat,
    ) -> Result<(), RecordError> {
        match format {
            OutputFormat::Human => writeln!(
                out,
                "Year: {:4}, Month: {:2}, Total Month: {:2}, Precip (inches): {:6.2}, Temp (°F): {:6.2}, Height: {:6.2}, Deer #: {:4}, Wolf #: {:4}",
                self.year,
                self.month,
                self.total_months,
                self.precipitation,
                self.temperature,
                self.grain_height,
                self.deer,
                self.wolves
            )?,
            OutputFormat::Csv => writeln!(
                out,
                "{:4}, {:2}, {:2}, {:6.2}, {:6.2}, {:6.2}, {:4}, {:4}",
                self.year,
                self.month,
                self.total_months,
                self.precipitation,
                self.temperature,
                self.grain_height,
                self.deer,
                self.wolves
            )?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, self)?;
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to write month record: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode month record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination of the watcher's month records.
pub trait RecordSink {
    fn emit(&mut self, record: &MonthRecord) -> Result<(), RecordError>;

    fn finish(&mut self) -> Result<(), RecordError> {
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn emit(&mut self, record: &MonthRecord) -> Result<(), RecordError> {
        (**self).emit(record)
    }

    fn finish(&mut self) -> Result<(), RecordError> {
        (**self).finish()
    }
}


/// Formats records onto any writer.
pub struct WriterSink<W: Write> {
    out: W,
    format: OutputFormat,
    csv_header: bool,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            csv_header: false,
        }
    }

    /// Emits [`CSV_HEADER`] before the first record in CSV mode.
    pub fn with_csv_header(mut self, enabled: bool) -> Self {
        self.csv_header = enabled && self.format == OutputFormat::Csv;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for WriterSink<W> {
    fn emit(&mut self, record: &MonthRecord) -> Result<(), RecordError> {
        if self.csv_header {
            writeln!(self.out, "{CSV_HEADER}")?;
            self.csv_header = false;
        }
        record.write_to(&mut self.out, self.format)
    }

    fn finish(&mut self) -> Result<(), RecordError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<MonthRecord>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for VecSink {
    fn emit(&mut self, record: &MonthRecord) -> Result<(), RecordError> {
        self.records.push(*record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MonthRecord {
        MonthRecord {
            year: 2025,
            month: 1,
            total_months: 0,
            precipitation: 9.25,
            temperature: 41.5,
            grain_height: 130.0,
            deer: 21,
            wolves: 4,
        }
    }

    fn render(format: OutputFormat) -> String {
        let mut sink = WriterSink::new(Vec::new(), format);
        sink.emit(&sample()).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn csv_uses_fixed_columns() {
        assert_eq!(
            render(OutputFormat::Csv),
            "2025,  1,  0,   9.25,  41.50, 130.00,   21,    4\n"
        );
    }

    #[test]
    fn human_line_is_labelled() {
        assert_eq!(
            render(OutputFormat::Human),
            "Year: 2025, Month:  1, Total Month:  0, Precip (inches):   9.25, Temp (°F):  41.50, Height: 130.00, Deer #:   21, Wolf #:    4\n"
        );
    }

    #[test]
    fn json_lines_parse_back() {
        let line = render(OutputFormat::Json);
        assert!(line.ends_with('\n'));
        let parsed: MonthRecord = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn csv_header_is_written_once() {
        let mut sink = WriterSink::new(Vec::new(), OutputFormat::Csv).with_csv_header(true);
        sink.emit(&sample()).unwrap();
        sink.emit(&sample()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
    }

    #[test]
    fn header_is_ignored_outside_csv() {
        let mut sink = WriterSink::new(Vec::new(), OutputFormat::Human).with_csv_header(true);
        sink.emit(&sample()).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn write_errors_surface_as_record_errors() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut sink = WriterSink::new(Broken, OutputFormat::Csv);
        let err = sink.emit(&sample()).unwrap_err();
        assert!(matches!(err, RecordError::Io(_)));
    }
}
