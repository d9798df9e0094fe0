//! Discovery of the 1-Wire bus masters present on this cycle.
//!
//! A DS2482 bridge shows up as an `i2c-N` adapter link under
//! `/sys/bus/i2c/devices`, so counting those links (minus the host's own
//! non-bridge adapters) gives the number of `w1_bus_master` entries. When the
//! kernel exposes the masters directly they can be listed from
//! `/sys/bus/w1/devices` instead.

use crate::config::{BusConfig, BusDiscovery};
use crate::models::Bus;
use log::{debug, warn};
use regex::Regex;
use std::io;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Instant;
use walkdir::WalkDir;

static BUS_MASTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^w1_bus_master(\d+)$").expect("valid bus master pattern"));

/// Returns the buses to visit, in ascending order.
pub fn discover(config: &BusConfig) -> Vec<Bus> {
    let start = Instant::now();
    let discovered = match config.discovery {
        BusDiscovery::I2c => count_i2c_adapters(&config.i2c_root)
            .map(|count| fixed(count.saturating_sub(config.i2c_offset) as Bus)),
        BusDiscovery::W1 => scan_bus_masters(&config.w1_root),
        BusDiscovery::Fixed => Ok(fixed(config.fallback_count)),
    };

    let buses = discovered.unwrap_or_else(|e| {
        warn!(
            "Bus discovery ({:?}) failed: {}, falling back to {} buses",
            config.discovery, e, config.fallback_count
        );
        fixed(config.fallback_count)
    });
    debug!("discover took: {} ms, buses: {:?}", start.elapsed().as_millis(), buses);
    buses
}

fn fixed(count: Bus) -> Vec<Bus> {
    (1..=count).collect()
}

/// Counts symlinked entries whose name contains `i2c`.
pub fn count_i2c_adapters(root: &Path) -> io::Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        let is_adapter = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.contains("i2c"));
        if entry.path_is_symlink() && is_adapter {
            count += 1;
        }
    }
    Ok(count)
}

pub fn scan_bus_masters(root: &Path) -> io::Result<Vec<Bus>> {
    let mut buses = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some(bus) = BUS_MASTER
            .captures(name)
            .and_then(|c| c[1].parse::<Bus>().ok())
        {
            buses.push(bus);
        }
    }
    buses.sort_unstable();
    buses.dedup();
    Ok(buses)
}
