pub mod periodic;
pub mod state;


use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::camera::{self, Camera, SimulatedCamera};
use crate::command::Command;
use crate::config::DroneConfig;
use crate::flight_log::FlightLog;
use crate::radio::Radio;
use periodic::PeriodicChecks;
use state::{DroneState, FlightEvent};

/// Everything the controller guards with its lock: the state plus the hardware it drives.
#[derive(Debug)]
pub(crate) struct Drone {
    config: DroneConfig,
    state: DroneState,
    camera: Option<Box<dyn Camera>>,
    radio: Radio,
    flight_log: FlightLog,
    periodic: Option<PeriodicChecks>,
}

impl Drone {
    fn pre_flight_check(&self) -> bool {
        info!("Running pre-flight check...");
        let flight = &self.config.flight;
        if self.state.battery < flight.min_battery_level {
            error!("Battery too low for flight! ({:.0}%)", self.state.battery);
            return false;
        }
        info!("Battery OK ({:.0}%)", self.state.battery);

        if self.camera.is_some() {
            info!("Camera OK");
        } else {
            warn!("Camera failure");
        }
        if self.radio.is_online() {
            info!("Communication OK");
        } else {
            warn!("Communication failure");
        }
        if self.state.wind_speed > flight.wind_threshold {
            warn!(
                "Wind speed {:.0} m/s above threshold {:.0} m/s",
                self.state.wind_speed, flight.wind_threshold
            );
        }
        info!("All systems normal. Ready for takeoff!");
        true
    }

    fn regulate_temperature(&mut self) {
        self.state.heater_on = self.state.temperature < self.config.flight.min_temperature;
        if self.state.heater_on {
            info!("Heater activated ({:.0}°C).", self.state.temperature);
        } else {
            info!("Heater deactivated.");
        }
    }

    /// Takeoff without the periodic task; the controller schedules that.
    fn takeoff(&mut self, target_altitude: f32) -> Result<()> {
        if self.state.is_flying {
            bail!("Takeoff aborted: drone already flying");
        }
        if target_altitude.is_nan() || target_altitude <= 0.0 {
            bail!("Takeoff aborted: invalid target altitude {}", target_altitude);
        }
        if !self.pre_flight_check() {
            bail!("Takeoff aborted: pre-flight check failed");
        }

        let flight = &self.config.flight;
        self.state.altitude = target_altitude.min(flight.max_height);
        self.state.is_flying = true;
        self.state.flight_start_time = Some(Utc::now());
        info!("Drone taking off to {} meters.", self.state.altitude);
        info!("Propeller speed set to {} RPM.", flight.propeller_speed);
        self.regulate_temperature();
        self.state.record(FlightEvent::Takeoff);
        Ok(())
    }

    async fn periodic_checks(&mut self) -> Result<()> {
        info!("Performing in-flight pre-checks...");
        self.state.record(FlightEvent::PeriodicCheck);
        self.pre_flight_check();
        self.monitor_battery().await?;
        self.check_communication().await
    }

    async fn find_safe_landing_spot(&self) -> bool {
        info!("AI-based terrain analysis in progress...");
        sleep(self.config.timing.units(self.config.timing.terrain_analysis)).await;
        true
    }

    async fn land(&mut self) -> Result<()> {
        if !self.state.is_flying {
            bail!("Drone is already on the ground");
        }

        if self.find_safe_landing_spot().await {
            info!("Hovering before landing...");
            sleep(self.config.timing.units(self.config.timing.landing_hover)).await;
            info!("Safe spot found. Landing...");
        } else {
            warn!("No safe landing spot! Returning to home position...");
            self.state.return_home();
        }

        self.state.altitude = 0.0;
        self.state.is_flying = false;
        if let Some(periodic) = self.periodic.take() {
            periodic.stop();
        }
        self.state.record(FlightEvent::Landing);

        let flight_time = self
            .state
            .flight_start_time
            .take()
            .map(|start| (Utc::now() - start).num_milliseconds() as f64 / 1000.0)
            .unwrap_or_default();
        info!(
            "Drone landed successfully. Flight time: {:.2} seconds.",
            flight_time
        );

        self.save_flight_data().await;
        Ok(())
    }

    async fn charge_battery(&mut self) -> Result<()> {
        if self.state.is_flying {
            bail!("Cannot charge while flying");
        }

        info!("Charging...");
        self.state.is_charging = true;
        let step = self.config.timing.units(self.config.timing.charge_step);
        while self.state.battery < 100.0 {
            sleep(step).await;
            let level = self.state.battery + self.config.flight.solar_charging_rate;
            self.state.set_battery(level);
        }
        self.state.is_charging = false;
        info!("Battery fully charged!");
        Ok(())
    }

    async fn monitor_battery(&mut self) -> Result<()> {
        if self.state.battery >= self.config.flight.critical_battery_level {
            info!("Battery at safe level.");
            return Ok(());
        }
        if !self.state.is_flying {
            warn!("Battery critical ({:.0}%) while grounded.", self.state.battery);
            return Ok(());
        }

        warn!("Battery critical! Searching for safe landing...");
        if !self.find_safe_landing_spot().await {
            warn!("No safe landing spot! Returning to home position...");
            self.state.return_home();
        }
        self.land().await
    }

    async fn check_communication(&mut self) -> Result<()> {
        if self.state.communication_online || !self.state.is_flying {
            return Ok(());
        }
        warn!("Communication lost! Returning to home position...");
        self.state.return_home();
        self.land().await
    }

    async fn save_flight_data(&mut self) {
        match self
            .flight_log
            .append(&self.config.general.drone_id, &self.state.flight_data)
        {
            Ok(()) => info!("Flight data stored temporarily."),
            Err(e) => error!("Failed to store flight data: {:#}", e),
        }
        if self.transmit_data(None).await {
            self.state.flight_data.clear();
        }
    }

    /// Sends `data` (or the flight log) over the radio, then purges the flight-log file.
    async fn transmit_data(&mut self, data: Option<&str>) -> bool {
        let sent = self.radio.transmit(data);
        sleep(self.config.timing.units(self.config.timing.transmit)).await;
        match self.flight_log.delete() {
            Ok(()) => info!("Flight data transmitted and deleted."),
            Err(e) => error!("Error deleting flight data file: {:#}", e),
        }
        sent
    }

    async fn capture_and_transmit_image(&mut self) -> Result<()> {
        let quality = self.config.camera.jpeg_quality;
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| anyhow!("No camera available"))?;
        let frame = camera
            .capture_frame()
            .map_err(|e| anyhow!("Failed to capture image: {:#}", e))?;
        let payload = camera::encode_for_transmission(&frame, quality)?;

        if self.transmit_data(Some(&payload)).await {
            info!("Image transmitted successfully. Deleting temporary data.");
        }
        self.state.flight_data.clear();
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(periodic) = self.periodic.take() {
            periodic.stop();
        }
        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }
        info!(
            "Drone system shutting down. {} transmissions sent, {} flight logs purged.",
            self.radio.sent(),
            self.flight_log.purged()
        );
    }
}

/// Cloneable handle to the drone. Every operation runs under one lock, shared
/// with the in-flight periodic checks.
#[derive(Debug, Clone)]
pub struct DroneController {
    drone: Arc<Mutex<Drone>>,
}

impl DroneController {
    /// Builds a drone with randomized sensors and opens the configured camera.
    pub fn new(config: DroneConfig) -> Self {
        let camera: Option<Box<dyn Camera>> = match SimulatedCamera::open(&config.camera) {
            Ok(camera) => {
                info!("Camera initialized successfully.");
                Some(Box::new(camera))
            }
            Err(e) => {
                error!("Camera failed to initialize: {:#}", e);
                None
            }
        };
        Self::with_camera(config, camera)
    }

    pub fn with_camera(config: DroneConfig, camera: Option<Box<dyn Camera>>) -> Self {
        Self::with_state(config, DroneState::with_random_sensors(), camera)
    }

    pub fn with_state(
        config: DroneConfig,
        state: DroneState,
        camera: Option<Box<dyn Camera>>,
    ) -> Self {
        info!(
            "Lidar sensor set at {}m above ground.",
            config.flight.lidar_height
        );
        let radio = Radio::new(&config.radio);
        let flight_log = FlightLog::new(&config.storage.flight_data_file);
        Self {
            drone: Arc::new(Mutex::new(Drone {
                config,
                state,
                camera,
                radio,
                flight_log,
                periodic: None,
            })),
        }
    }

    pub async fn snapshot(&self) -> DroneState {
        self.drone.lock().await.state.clone()
    }

    pub async fn set_battery(&self, level: f32) {
        self.drone.lock().await.state.set_battery(level);
    }

    pub async fn set_communication_online(&self, online: bool) {
        self.drone.lock().await.state.communication_online = online;
    }

    /// Whether the in-flight check task is scheduled and still running.
    #[cfg(test)]
    pub(crate) async fn periodic_checks_running(&self) -> bool {
        self.drone
            .lock()
            .await
            .periodic
            .as_ref()
            .is_some_and(|periodic| !periodic.is_finished())
    }

    pub async fn pre_flight_check(&self) -> bool {
        self.drone.lock().await.pre_flight_check()
    }

    pub async fn regulate_temperature(&self) {
        self.drone.lock().await.regulate_temperature();
    }

    /// Takes off to `target_altitude` (default from config, capped at the max height)
    /// and schedules the periodic checks.
    pub async fn takeoff(&self, target_altitude: Option<f32>) -> Result<()> {
        let mut drone = self.drone.lock().await;
        let target = target_altitude.unwrap_or(drone.config.flight.default_altitude);
        drone.takeoff(target)?;

        let timing = &drone.config.timing;
        let interval = timing.units(timing.periodic_check_interval);
        if let Some(stale) = drone.periodic.take() {
            stale.stop();
        }
        drone.periodic = Some(PeriodicChecks::start(self.drone.clone(), interval));
        Ok(())
    }

    /// Runs one round of in-flight checks immediately.
    pub async fn periodic_checks(&self) -> Result<()> {
        self.drone.lock().await.periodic_checks().await
    }

    pub async fn find_safe_landing_spot(&self) -> bool {
        self.drone.lock().await.find_safe_landing_spot().await
    }

    pub async fn land(&self) -> Result<()> {
        self.drone.lock().await.land().await
    }

    pub async fn charge_battery(&self) -> Result<()> {
        self.drone.lock().await.charge_battery().await
    }

    pub async fn monitor_battery(&self) -> Result<()> {
        self.drone.lock().await.monitor_battery().await
    }

    pub async fn check_communication(&self) -> Result<()> {
        self.drone.lock().await.check_communication().await
    }

    pub async fn save_flight_data(&self) {
        self.drone.lock().await.save_flight_data().await
    }

    pub async fn transmit_data(&self, data: Option<&str>) -> bool {
        self.drone.lock().await.transmit_data(data).await
    }

    pub async fn capture_and_transmit_image(&self) -> Result<()> {
        self.drone.lock().await.capture_and_transmit_image().await
    }

    pub async fn shutdown(&self) {
        self.drone.lock().await.shutdown();
    }

    pub async fn handle_command(&self, command: Command) -> Result<()> {
        match command {
            Command::Takeoff(altitude) => self.takeoff(altitude).await,
            Command::Land => self.land().await,
            Command::Charge => self.charge_battery().await,
            Command::Capture => self.capture_and_transmit_image().await,
            Command::Shutdown => {
                self.shutdown().await;
                Ok(())
            }
        }
    }
}
