use crate::models::Bus;
use crate::utils::file::read_lines;
use std::io;
use std::path::{Path, PathBuf};

/// Written by the w1 core in place of an id when a master has no slaves.
pub const NOT_FOUND_MARKER: &str = "not found.";

pub fn slaves_path(w1_root: &Path, bus: Bus) -> PathBuf {
    w1_root
        .join(format!("w1_bus_master{}", bus))
        .join("w1_master_slaves")
}

/// Keeps the device ids of a `w1_master_slaves` listing in file order.
pub fn parse_slave_list<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty() && !line.contains(NOT_FOUND_MARKER))
        .map(|line| line.to_string())
        .collect()
}

/// Lists the slaves currently attached to `bus`. An unreadable listing is
/// returned as an error so the caller can log it and move on to the next bus.
pub async fn enumerate(w1_root: &Path, bus: Bus) -> io::Result<Vec<String>> {
    let lines = read_lines(&slaves_path(w1_root, bus)).await?;
    Ok(parse_slave_list(&lines))
}
