use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub device: DeviceConfig,
    /// Pause after each message is drained, in milliseconds
    #[serde(default)]
    pub message_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Serial device, e.g. the RFCOMM node `/dev/cu.Pixoo-Max`
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_baud_rate() -> u32 {
    115200
}
