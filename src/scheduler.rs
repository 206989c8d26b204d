//! Sequential driving loop over the configured pools.
//!
//! One logical worker: pools are sampled one at a time in configured
//! order, then the loop suspends for the sampling interval before the
//! next round. A pool's failure is logged and never aborts the round.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::PoolSettings;
use crate::recorder::Recorder;

pub struct Scheduler {
    recorder: Recorder,
    pools: Vec<PoolSettings>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(recorder: Recorder, pools: Vec<PoolSettings>, interval_secs: u64) -> Self {
        Self {
            recorder,
            pools,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Run rounds forever, until the cancellation token fires.
    ///
    /// The inter-round suspension is cancellable; a cycle in flight runs
    /// to completion before cancellation is observed.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        if self.pools.is_empty() {
            warn!("No pools configured, nothing to sample");
        }

        loop {
            for pool in &self.pools {
                if cancellation_token.is_cancelled() {
                    info!("Scheduler received cancellation signal");
                    return Ok(());
                }

                match self.recorder.run_cycle(pool, Utc::now().timestamp()).await {
                    Ok(snapshot) => {
                        info!(
                            "Recorded snapshot pool={} timestamp={}",
                            pool.name, snapshot.timestamp
                        );
                    },
                    Err(e) => {
                        error!("Sampling cycle failed for pool {}: {e}", pool.name);
                    },
                }
            }

            info!(
                "Round complete, sleeping seconds={}",
                self.interval.as_secs()
            );

            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Scheduler received cancellation signal");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
