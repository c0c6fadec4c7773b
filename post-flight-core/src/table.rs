use std::io::{Read, Write};

use csv::{ReaderBuilder, WriterBuilder};

use crate::{error::PipelineError, report::SkipReason};

/// A CSV file held in memory.
///
/// Fields are kept as the strings they were read as, so columns that a
/// transformation does not touch are written back unchanged. Records may be
/// shorter or longer than the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    header: Vec<String>,
    records: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, header: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            header,
            records,
        }
    }

    pub fn read_from<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, PipelineError> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let header = reader.headers()?.iter().map(String::from).collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(String::from).collect());
        }

        Ok(Self::new(name, header, records))
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), PipelineError> {
        let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);
        writer.write_record(&self.header)?;
        for record in self.records.iter() {
            writer.write_record(record)?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ensure_not_empty(&self) -> Result<(), PipelineError> {
        if self.is_empty() {
            return Err(PipelineError::EmptyInput {
                input: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Index of the first column called `field`.
    pub fn column(&self, field: &str) -> Result<usize, PipelineError> {
        self.header
            .iter()
            .position(|name| name == field)
            .ok_or_else(|| PipelineError::RequiredFieldMissing {
                input: self.name.clone(),
                field: field.into(),
            })
    }

    pub fn field(&self, row: usize, column: usize) -> Option<&str> {
        self.records
            .get(row)
            .and_then(|record| record.get(column))
            .map(String::as_str)
    }

    /// Parses a numeric field, trimming surrounding whitespace.
    pub fn parse_f64(&self, row: usize, column: usize) -> Result<f64, SkipReason> {
        let value = self
            .field(row, column)
            .ok_or_else(|| SkipReason::MissingField {
                column: self.header[column].clone(),
            })?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| SkipReason::InvalidNumber {
                column: self.header[column].clone(),
                value: value.into(),
            })
    }

    /// Overwrites a field, padding the record with empty fields if it is
    /// shorter than `column`.
    pub fn set_field(&mut self, row: usize, column: usize, value: impl Into<String>) {
        let record = &mut self.records[row];
        if record.len() <= column {
            record.resize(column + 1, String::new());
        }
        record[column] = value.into();
    }

    /// Appends a column to the header and returns its index. Existing records
    /// are left as they are until a value is set.
    pub fn push_column(&mut self, field: impl Into<String>) -> usize {
        self.header.push(field.into());
        self.header.len() - 1
    }

    /// Index of `field`, appending it to the header when it is not there yet.
    pub fn column_or_push(&mut self, field: &str) -> usize {
        match self.header.iter().position(|name| name == field) {
            Some(column) => column,
            None => self.push_column(field),
        }
    }

    /// A table with the same header and only the records at `rows`, in the
    /// given order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            header: self.header.clone(),
            records: rows.iter().map(|&row| self.records[row].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FLIGHT_LOG: &str = "Timestamp,Latitude,Longitude,Altitude\n\
        1000,27.9,-80.7,12.5\n\
        2000,27.91,-80.71\n";

    #[test]
    fn read_ragged_records() {
        let table = Table::read_from("flight.csv", FLIGHT_LOG.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("Altitude").unwrap(), 3);
        assert_eq!(table.field(0, 3), Some("12.5"));
        assert_eq!(table.field(1, 3), None);
        assert_eq!(
            table.parse_f64(1, 3),
            Err(SkipReason::MissingField {
                column: "Altitude".into()
            })
        );
    }

    #[test]
    fn missing_column_names_the_input() {
        let table = Table::read_from("flight.csv", FLIGHT_LOG.as_bytes()).unwrap();
        let error = table.column("RSSI").unwrap_err();
        assert_eq!(error.to_string(), "flight.csv has no \"RSSI\" column");
    }

    #[test]
    fn write_keeps_untouched_fields() {
        let mut table = Table::read_from("flight.csv", FLIGHT_LOG.as_bytes()).unwrap();
        let distance = table.push_column("Distance");
        table.set_field(1, distance, "15.00");

        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Timestamp,Latitude,Longitude,Altitude,Distance\n\
             1000,27.9,-80.7,12.5\n\
             2000,27.91,-80.71,,15.00\n"
        );
    }

    #[test]
    fn header_only_is_empty_input() {
        let table = Table::read_from("gps.csv", "TRACKER Lat,TRACKER Lon\n".as_bytes()).unwrap();
        assert!(matches!(
            table.ensure_not_empty(),
            Err(PipelineError::EmptyInput { .. })
        ));
    }
}
