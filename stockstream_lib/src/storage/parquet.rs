//! Parquet encoding of observation batches.
//!
//! Written files carry the columns symbol, date, open, high, low, close,
//! volume and adjusted_close (snappy-compressed). Decoding is lenient: it
//! records which columns the file actually has so batch validation can report
//! missing ones, and widens numeric columns to `f64`.

use std::io::Cursor;

use chrono::NaiveDate;
use polars::prelude::*;

use super::error::StorageError;
use crate::model::{Observation, ObservationFrame, OhlcvRow};

/// Content type recorded on uploaded batches.
pub const PARQUET_CONTENT_TYPE: &str = "application/x-parquet";

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn codec_err(context: &str) -> impl Fn(PolarsError) -> StorageError + '_ {
    move |e| StorageError::Codec(format!("{context}: {e}"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetCodec;

impl ParquetCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode observations into an in-memory Parquet file.
    pub fn encode(&self, observations: &[Observation]) -> Result<Vec<u8>, StorageError> {
        let mut df = observations_to_dataframe(observations)?;
        let mut buf = Vec::new();
        ParquetWriter::new(&mut buf)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(codec_err("write parquet"))?;
        Ok(buf)
    }

    /// Decode a Parquet file into a frame, keeping whatever columns it has.
    pub fn decode(&self, bytes: &[u8]) -> Result<ObservationFrame, StorageError> {
        let df = ParquetReader::new(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(codec_err("read parquet"))?;
        dataframe_to_frame(&df)
    }
}

fn observations_to_dataframe(observations: &[Observation]) -> Result<DataFrame, StorageError> {
    let epoch = epoch();
    let symbols: Vec<&str> = observations.iter().map(|o| o.symbol.as_str()).collect();
    let dates: Vec<i32> = observations
        .iter()
        .map(|o| (o.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<f64> = observations.iter().map(|o| o.open).collect();
    let highs: Vec<f64> = observations.iter().map(|o| o.high).collect();
    let lows: Vec<f64> = observations.iter().map(|o| o.low).collect();
    let closes: Vec<f64> = observations.iter().map(|o| o.close).collect();
    let volumes: Vec<u64> = observations.iter().map(|o| o.volume).collect();
    let adjusted: Vec<f64> = observations.iter().map(|o| o.adjusted_close).collect();

    DataFrame::new(vec![
        Column::new("symbol".into(), symbols),
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(codec_err("date cast"))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new("adjusted_close".into(), adjusted),
    ])
    .map_err(codec_err("dataframe creation"))
}

fn float_values(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>, StorageError> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let cast = column
        .cast(&DataType::Float64)
        .map_err(codec_err(name))?;
    let values = cast.f64().map_err(codec_err(name))?;
    Ok(Some(values.into_iter().collect()))
}

fn string_values(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>, StorageError> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let cast = column.cast(&DataType::String).map_err(codec_err(name))?;
    let values = cast.str().map_err(codec_err(name))?;
    Ok(Some(
        values
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect(),
    ))
}

fn date_values(df: &DataFrame) -> Result<Option<Vec<Option<NaiveDate>>>, StorageError> {
    let Ok(column) = df.column("date") else {
        return Ok(None);
    };
    match column.dtype() {
        DataType::Date => {
            let epoch = epoch();
            let days = column.cast(&DataType::Int32).map_err(codec_err("date"))?;
            let days = days.i32().map_err(codec_err("date"))?;
            Ok(Some(
                days.into_iter()
                    .map(|d| d.map(|d| epoch + chrono::Duration::days(d as i64)))
                    .collect(),
            ))
        }
        DataType::String => {
            let values = column.str().map_err(codec_err("date"))?;
            Ok(Some(
                values
                    .into_iter()
                    .map(|v| v.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
                    .collect(),
            ))
        }
        other => Err(StorageError::Codec(format!(
            "date column has unsupported type {other}"
        ))),
    }
}

fn dataframe_to_frame(df: &DataFrame) -> Result<ObservationFrame, StorageError> {
    let height = df.height();
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let symbols = string_values(df, "symbol")?;
    let dates = date_values(df)?;
    let opens = float_values(df, "open")?;
    let highs = float_values(df, "high")?;
    let lows = float_values(df, "low")?;
    let closes = float_values(df, "close")?;
    let volumes = float_values(df, "volume")?;
    let adjusted = float_values(df, "adjusted_close")?;

    let at = |values: &Option<Vec<Option<f64>>>, i: usize| {
        values.as_ref().and_then(|v| v.get(i).copied().flatten())
    };

    let rows = (0..height)
        .map(|i| OhlcvRow {
            symbol: symbols
                .as_ref()
                .and_then(|v| v.get(i).cloned().flatten())
                .unwrap_or_default(),
            date: dates.as_ref().and_then(|v| v.get(i).copied().flatten()),
            open: at(&opens, i),
            high: at(&highs, i),
            low: at(&lows, i),
            close: at(&closes, i),
            volume: at(&volumes, i),
            adjusted_close: at(&adjusted, i),
        })
        .collect();

    Ok(ObservationFrame::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ALL_COLUMNS;

    fn obs(symbol: &str, day: u32, close: f64) -> Observation {
        Observation {
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, day).unwrap(),
            open: 50.0,
            high: 52.0,
            low: 49.0,
            close,
            volume: 1_234_567,
            adjusted_close: close - 0.5,
        }
    }

    fn write(df: &mut DataFrame) -> Vec<u8> {
        let mut buf = Vec::new();
        ParquetWriter::new(&mut buf).finish(df).unwrap();
        buf
    }

    #[test]
    fn encode_then_decode_preserves_rows() {
        let codec = ParquetCodec::new();
        let observations = vec![obs("BHP", 23, 51.0), obs("CBA", 24, 120.25)];

        let bytes = codec.encode(&observations).unwrap();
        let frame = codec.decode(&bytes).unwrap();

        assert_eq!(frame.len(), 2);
        for column in ALL_COLUMNS {
            assert!(frame.has_column(column), "{}", column);
        }
        let expected: Vec<OhlcvRow> = observations.iter().map(OhlcvRow::from).collect();
        assert_eq!(frame.rows(), expected.as_slice());
    }

    #[test]
    fn decode_reports_missing_columns() {
        let mut df = DataFrame::new(vec![
            Column::new("symbol".into(), vec!["BHP"]),
            Column::new("open".into(), vec![50.0]),
            Column::new("close".into(), vec![51.0]),
        ])
        .unwrap();

        let frame = ParquetCodec::new().decode(&write(&mut df)).unwrap();

        assert_eq!(frame.missing_columns(), vec!["date", "high", "low", "volume"]);
        assert_eq!(frame.rows()[0].open, Some(50.0));
        assert_eq!(frame.rows()[0].high, None);
    }

    #[test]
    fn decode_accepts_string_dates_and_integer_prices() {
        let mut df = DataFrame::new(vec![
            Column::new("symbol".into(), vec!["BHP"]),
            Column::new("date".into(), vec!["2024-12-24"]),
            Column::new("open".into(), vec![50i64]),
        ])
        .unwrap();

        let frame = ParquetCodec::new().decode(&write(&mut df)).unwrap();
        let row = &frame.rows()[0];

        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 12, 24));
        assert_eq!(row.open, Some(50.0));
    }

    #[test]
    fn decode_keeps_nulls_as_missing() {
        let mut df = DataFrame::new(vec![
            Column::new("symbol".into(), vec!["BHP"]),
            Column::new("close".into(), vec![None::<f64>]),
        ])
        .unwrap();

        let frame = ParquetCodec::new().decode(&write(&mut df)).unwrap();
        assert_eq!(frame.rows()[0].close, None);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = ParquetCodec::new().decode(b"not parquet").unwrap_err();
        assert!(matches!(err, StorageError::Codec(_)));
    }
}
