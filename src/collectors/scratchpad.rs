//! Reader for the `w1_slave` attribute of DS18x20 style thermometers.
//!
//! The kernel performs a conversion on every read and reports the scratchpad
//! like this:
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```
//!
//! The first line ends with `YES` when the scratchpad CRC matched, `NO`
//! otherwise. The value line carries the temperature in millidegrees Celsius.
//! Some drivers put an extra raw dump between the two, so the value is taken
//! from the last non-empty line after the CRC line.

use crate::models::Reading;
use crate::utils::file::read_lines;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

pub const CRC_OK_MARKER: &str = "YES";

static MILLI_CELSIUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"t=\s*([+-]?\d+)").expect("valid temperature pattern"));

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("scratchpad of {device_id} not found")]
    NotFound {
        device_id: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read scratchpad of {device_id}: {source}")]
    Io {
        device_id: String,
        #[source]
        source: io::Error,
    },

    #[error("CRC check failed, SensorID: {device_id}")]
    CrcInvalid { device_id: String },

    #[error("no temperature in scratchpad of {device_id}: {line:?}")]
    Parse { device_id: String, line: String },
}

pub fn scratchpad_path(w1_root: &Path, device_id: &str) -> PathBuf {
    w1_root.join(device_id).join("w1_slave")
}

pub fn parse_scratchpad<S: AsRef<str>>(device_id: &str, lines: &[S]) -> Result<Reading, ReadError> {
    let crc_ok = lines
        .first()
        .and_then(|line| line.as_ref().split_whitespace().last())
        .is_some_and(|token| token == CRC_OK_MARKER);
    if !crc_ok {
        return Err(ReadError::CrcInvalid {
            device_id: device_id.to_string(),
        });
    }

    let value_line = lines
        .iter()
        .skip(1)
        .map(|line| line.as_ref())
        .filter(|line| !line.trim().is_empty())
        .last()
        .unwrap_or("");

    let parse_error = || ReadError::Parse {
        device_id: device_id.to_string(),
        line: value_line.to_string(),
    };

    let milli_celsius = MILLI_CELSIUS
        .captures(value_line)
        .and_then(|c| c[1].parse::<i32>().ok())
        .ok_or_else(parse_error)?;

    Ok(Reading {
        device_id: device_id.to_string(),
        milli_celsius,
    })
}

pub async fn read(w1_root: &Path, device_id: &str) -> Result<Reading, ReadError> {
    let lines = read_lines(&scratchpad_path(w1_root, device_id))
        .await
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ReadError::NotFound {
                device_id: device_id.to_string(),
                source,
            },
            _ => ReadError::Io {
                device_id: device_id.to_string(),
                source,
            },
        })?;
    parse_scratchpad(device_id, &lines)
}
