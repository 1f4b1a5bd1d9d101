use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::drone::state::FlightRecord;

/// One line of the flight-log file.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlightLogEntry {
    pub drone_id: String,
    pub written_at: DateTime<Utc>,
    pub records: Vec<FlightRecord>,
}

/// Local file that holds flight data until it has been transmitted.
#[derive(Debug, Clone)]
pub struct FlightLog {
    path: PathBuf,
    purged: u64,
}

impl FlightLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            purged: 0,
        }
    }

    /// Number of stored logs removed after transmission.
    pub fn purged(&self) -> u64 {
        self.purged
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, drone_id: &str, records: &[FlightRecord]) -> Result<()> {
        let entry = FlightLogEntry {
            drone_id: drone_id.to_string(),
            written_at: Utc::now(),
            records: records.to_vec(),
        };
        let line = serde_json::to_string(&entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open flight log {}", self.path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write flight log {}", self.path.display()))?;
        debug!("Appended {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn read_entries(&self) -> Result<Vec<FlightLogEntry>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read flight log {}", self.path.display()))?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).context("Malformed flight log entry"))
            .collect()
    }

    pub fn delete(&mut self) -> Result<()> {
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to delete flight log {}", self.path.display()))?;
        self.purged += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drone::state::{DroneState, FlightEvent};
    use tempfile::tempdir;

    #[test]
    fn test_append_then_delete() -> Result<()> {
        let dir = tempdir()?;
        let mut log = FlightLog::new(dir.path().join("flight_data.txt"));

        let mut state = DroneState::default();
        state.record(FlightEvent::Takeoff);
        state.record(FlightEvent::Landing);

        log.append("MARS-TEST", &state.flight_data)?;
        log.append("MARS-TEST", &[])?;

        let entries = log.read_entries()?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].drone_id, "MARS-TEST");
        assert_eq!(entries[0].records.len(), 2);
        assert_eq!(entries[0].records[1].event, FlightEvent::Landing);
        assert!(entries[1].records.is_empty());

        log.delete()?;
        assert!(!log.path().exists());
        assert_eq!(log.purged(), 1);
        Ok(())
    }

    #[test]
    fn test_delete_missing_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let mut log = FlightLog::new(dir.path().join("missing.txt"));
        assert!(log.delete().is_err());
        assert_eq!(log.purged(), 0);
        Ok(())
    }
}
