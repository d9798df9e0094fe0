use crate::client::volkszaehler::{UploadError, VzClient};
use crate::collectors::{bus, scratchpad, slaves};
use crate::config::AppConfig;
use crate::models::SensorRecord;
use log::{debug, error, info, warn};
use std::time::Instant;
use tokio::sync::watch;

/// Counters for one pass over every bus.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub buses: usize,
    pub sensors: usize,
    pub readings: usize,
    /// Uploads answered with a 2xx status.
    pub uploads: usize,
    /// Uploads the server answered with any other status.
    pub rejected: usize,
    pub unmapped: usize,
    pub read_failures: usize,
    pub upload_failures: usize,
}

pub struct Poller {
    config: AppConfig,
    client: VzClient,
}

impl Poller {
    pub fn new(config: AppConfig) -> Result<Self, UploadError> {
        let client = VzClient::new(&config.server)?;
        Ok(Self { config, client })
    }

    /// Enumerates every bus found this cycle and pairs each slave with its destination.
    /// A bus whose listing cannot be read is logged and skipped.
    pub async fn scan(&self) -> Vec<SensorRecord> {
        self.scan_buses().await.1
    }

    async fn scan_buses(&self) -> (usize, Vec<SensorRecord>) {
        let w1_root = &self.config.bus.w1_root;
        let buses = bus::discover(&self.config.bus);
        let mut records = Vec::new();

        for &bus in &buses {
            match slaves::enumerate(w1_root, bus).await {
                Ok(ids) => {
                    records.extend(ids.into_iter().map(|device_id| SensorRecord {
                        bus,
                        destination: self.config.destination_for(&device_id).map(str::to_string),
                        device_id,
                    }));
                }
                Err(e) => {
                    warn!(
                        "Bus {}: {}: {}",
                        bus,
                        slaves::slaves_path(w1_root, bus).display(),
                        e
                    );
                }
            }
        }
        (buses.len(), records)
    }

    /// Logs every sensor currently attached together with its upload target.
    pub async fn log_inventory(&self) {
        let records = self.scan().await;
        if records.is_empty() {
            warn!("No 1-Wire sensors found");
        }
        for record in &records {
            info!(
                "{} (bus: {}) (uuid: {})",
                record.device_id,
                record.bus,
                record.destination.as_deref().unwrap_or("none")
            );
        }
    }

    pub async fn poll_once(&self) -> CycleSummary {
        let start = Instant::now();
        let (buses, records) = self.scan_buses().await;
        let mut summary = CycleSummary {
            buses,
            sensors: records.len(),
            ..Default::default()
        };

        for record in &records {
            let reading = match scratchpad::read(&self.config.bus.w1_root, &record.device_id).await {
                Ok(reading) => reading,
                Err(e) => {
                    warn!("Bus {}: {}", record.bus, e);
                    summary.read_failures += 1;
                    continue;
                }
            };
            summary.readings += 1;

            let Some(uuid) = record.destination.as_deref() else {
                info!(
                    "{} (bus: {}): {:.2} °C, no uuid configured, not uploading",
                    record.device_id,
                    record.bus,
                    reading.celsius()
                );
                summary.unmapped += 1;
                continue;
            };

            debug!("{} (bus: {}): {:.2} °C", record.device_id, record.bus, reading.celsius());
            match self.client.upload(uuid, reading.celsius()).await {
                Ok(status) if status.is_success() => summary.uploads += 1,
                Ok(_) => summary.rejected += 1,
                Err(e) => {
                    error!("{} -> {}: {}", record.device_id, uuid, e);
                    summary.upload_failures += 1;
                }
            }
        }

        debug!("poll_once took: {} ms, {:?}", start.elapsed().as_millis(), summary);
        summary
    }

    /// Polls until `shutdown` turns true or its sender goes away.
    /// A pending read, upload or sleep is abandoned as soon as shutdown is requested.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.config.polling.interval();
        loop {
            tokio::select! {
                _ = stopped(&mut shutdown) => break,
                _ = self.poll_once() => {}
            }
            tokio::select! {
                _ = stopped(&mut shutdown) => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        info!("Polling stopped");
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
