use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightEvent {
    Takeoff,
    PeriodicCheck,
    Landing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRecord {
    pub timestamp: DateTime<Utc>,
    pub event: FlightEvent,
    pub altitude: f32,
    pub battery: f32,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize)]
pub struct DroneState {
    // Flight
    pub altitude: f32,
    pub position: Position,
    pub home_position: Position,
    pub is_flying: bool,
    pub flight_start_time: Option<DateTime<Utc>>,

    // Power
    pub battery: f32,
    pub is_charging: bool,

    // Environment
    pub temperature: f32,
    pub wind_speed: f32,
    pub heater_on: bool,

    // Systems
    pub communication_online: bool,
    pub autonomous_mode: bool,

    pub flight_data: Vec<FlightRecord>,
}

impl Default for DroneState {
    fn default() -> Self {
        Self {
            altitude: 0.0,
            position: Position::default(),
            home_position: Position::default(),
            is_flying: false,
            flight_start_time: None,
            battery: 100.0,
            is_charging: false,
            temperature: 0.0,
            wind_speed: 0.0,
            heater_on: false,
            communication_online: true,
            autonomous_mode: true,
            flight_data: Vec::new(),
        }
    }
}

impl DroneState {
    /// Fresh state with temperature and wind speed drawn from the Martian surface ranges.
    pub fn with_random_sensors() -> Self {
        Self {
            temperature: rand::random_range(-80..=20) as f32,
            wind_speed: rand::random_range(0..=30) as f32,
            ..Default::default()
        }
    }

    pub fn set_battery(&mut self, level: f32) {
        self.battery = level.clamp(0.0, 100.0);
    }

    pub fn record(&mut self, event: FlightEvent) {
        self.flight_data.push(FlightRecord {
            timestamp: Utc::now(),
            event,
            altitude: self.altitude,
            battery: self.battery,
            position: self.position,
        });
    }

    pub fn return_home(&mut self) {
        self.position = self.home_position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_sensors_in_range() {
        for _ in 0..50 {
            let state = DroneState::with_random_sensors();
            assert!((-80.0..=20.0).contains(&state.temperature));
            assert!((0.0..=30.0).contains(&state.wind_speed));
            assert!(!state.is_flying);
            assert_eq!(state.battery, 100.0);
        }
    }

    #[test]
    fn test_battery_is_clamped() {
        let mut state = DroneState::default();
        state.set_battery(140.0);
        assert_eq!(state.battery, 100.0);
        state.set_battery(-3.0);
        assert_eq!(state.battery, 0.0);
    }

    #[test]
    fn test_record_captures_current_values() {
        let mut state = DroneState {
            altitude: 4.0,
            position: Position::new(1.5, -2.0),
            ..Default::default()
        };
        state.record(FlightEvent::Takeoff);

        let record = &state.flight_data[0];
        assert_eq!(record.event, FlightEvent::Takeoff);
        assert_eq!(record.altitude, 4.0);
        assert_eq!(record.position, Position::new(1.5, -2.0));
    }
}
