use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::Drone;

/// Handle to the in-flight safety check task.
///
/// The task wakes every `interval`, takes the drone lock and re-runs the
/// pre-flight, battery and communication checks. It exits when stopped, when
/// the handle is dropped, or once it finds the drone grounded.
#[derive(Debug)]
pub struct PeriodicChecks {
    shutdown: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl PeriodicChecks {
    pub(crate) fn start(drone: Arc<Mutex<Drone>>, interval: Duration) -> Self {
        let (shutdown, rx) = broadcast::channel(1);
        let handle = tokio::spawn(Self::run(drone, interval, rx));
        info!("Periodic checks scheduled every {:?}", interval);
        Self { shutdown, handle }
    }

    async fn run(drone: Arc<Mutex<Drone>>, interval: Duration, mut rx: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                _ = rx.recv() => {
                    debug!("Periodic checks stopped");
                    break;
                }
                _ = sleep(interval) => {}
            }

            let mut drone = drone.lock().await;
            if !drone.state.is_flying {
                debug!("Drone grounded, periodic checks finished");
                break;
            }
            if let Err(e) = drone.periodic_checks().await {
                error!("Error during periodic checks: {:#}", e);
            }
        }
    }

    pub fn stop(self) {
        // The task may already be gone, in which case there is no receiver.
        let _ = self.shutdown.send(());
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
