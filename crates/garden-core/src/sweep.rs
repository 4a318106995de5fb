//! Periodic catch-up of every stored garden.
//!
//! Gardens are caught up lazily whenever they are touched, so the sweep is
//! not required for correctness. It keeps stored state fresh for readers
//! that bypass the service and surfaces wither events without a player
//! having to open the garden.

use std::future::Future;
use std::time::Duration;

use garden_sim::EnvironmentSource;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::clock::Clock;
use crate::players::PlayerRegistry;
use crate::service::GardenService;
use crate::store::GardenStore;

/// Run [`GardenService::catch_up_all`] every `interval` until `shutdown`
/// resolves. The first sweep runs immediately.
///
/// Returns the number of sweeps performed.
pub async fn run_sweep<S, P, E, C, F>(
    service: &GardenService<S, P, E>,
    clock: &C,
    interval: Duration,
    shutdown: F,
) -> u64
where
    S: GardenStore,
    P: PlayerRegistry,
    E: EnvironmentSource,
    C: Clock + ?Sized,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut sweeps: u64 = 0;
    info!(interval_secs = interval.as_secs(), "Sweep starting");

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                let now = clock.now();
                match service.catch_up_all(now) {
                    Ok(report) => info!(
                        gardens = report.gardens,
                        updated = report.updated,
                        failed = report.failed,
                        newly_withered = report.newly_withered,
                        newly_harvestable = report.newly_harvestable,
                        "Sweep complete"
                    ),
                    Err(e) => error!(error = %e, "Sweep failed"),
                }
                sweeps = sweeps.saturating_add(1);
            }
        }
    }

    info!(sweeps, "Sweep stopped");
    sweeps
}
