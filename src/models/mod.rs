pub(crate) mod sensor;

pub use sensor::{Bus, Reading, SensorRecord};
