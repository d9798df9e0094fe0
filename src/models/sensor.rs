/// Index of a 1-Wire bus master, as in `w1_bus_master<N>`.
pub type Bus = u32;

/// A slave seen on one bus during one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorRecord {
    pub bus: Bus,
    pub device_id: String,
    pub destination: Option<String>,
}

/// A CRC-checked temperature conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub device_id: String,
    pub milli_celsius: i32,
}

impl Reading {
    pub fn celsius(&self) -> f64 {
        f64::from(self.milli_celsius) / 1000.0
    }
}
