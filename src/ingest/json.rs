//! JSON record files as written by the collectors.
//!
//! Accepts a bare array of records or an object wrapping it under
//! `records` or `articles`.

use crate::error::Result;
use crate::models::RawRecord;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    List(Vec<RawRecord>),
    Wrapped {
        #[serde(alias = "articles")]
        records: Vec<RawRecord>,
    },
}

pub fn parse_records(text: &str) -> Result<Vec<RawRecord>> {
    let file: RecordFile = serde_json::from_str(text)?;
    Ok(match file {
        RecordFile::List(records) => records,
        RecordFile::Wrapped { records } => records,
    })
}
