use tracing::{error, info};

use crate::config::RadioConfig;
use crate::util;

/// Simulated radio link. Transmission is a log line.
#[derive(Debug)]
pub struct Radio {
    online: bool,
    preview_len: usize,
    sent: u64,
}

impl Radio {
    pub fn new(config: &RadioConfig) -> Self {
        if config.enabled {
            info!("Radio transmitter initialized for communication.");
        } else {
            error!("Radio transmitter unavailable.");
        }
        Self {
            online: config.enabled,
            preview_len: config.preview_len,
            sent: 0,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Number of successful transmissions since startup.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Sends `payload`, or the pending flight log when `None`. Returns false if the transmitter is down.
    pub fn transmit(&mut self, payload: Option<&str>) -> bool {
        if !self.online {
            error!("Radio transmitter failed.");
            return false;
        }
        match payload {
            Some(data) if !data.is_empty() => info!(
                "Transmitting data over radio: {}...",
                util::preview(data, self.preview_len)
            ),
            _ => info!("Transmitting flight data over radio..."),
        }
        self.sent += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_radio_does_not_send() {
        let mut radio = Radio::new(&RadioConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(!radio.transmit(Some("payload")));
        assert_eq!(radio.sent(), 0);
    }

    #[test]
    fn test_online_radio_counts_transmissions() {
        let mut radio = Radio::new(&RadioConfig::default());
        assert!(radio.transmit(None));
        assert!(radio.transmit(Some(&"x".repeat(200))));
        assert_eq!(radio.sent(), 2);
    }
}
