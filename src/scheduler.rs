//! Background sweep that deletes expired token rows.
//!
//! The sweep is housekeeping only: an expired token is already rejected at
//! verification time, so a delayed or missed run never extends a token's
//! usable life.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info};

use crate::config::SchedulerConfig;
use crate::db::Store;

pub struct TokenSweeper {
    store: Store,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl TokenSweeper {
    #[must_use]
    pub fn new(store: Store, config: SchedulerConfig) -> Self {
        Self {
            store,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Token sweeper is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting token sweeper");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let store = self.store.clone();
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let store = store.clone();
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                sweep(&store).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Token sweeper running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.sweep_interval_minutes;

        info!("Token sweeper running every {} minutes", interval_mins);

        let mut sweep_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));

        // The first tick fires immediately; skip it so startup is quiet.
        sweep_interval.tick().await;

        loop {
            sweep_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            sweep(&self.store).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping token sweeper...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn run_once(&self) {
        sweep(&self.store).await;
    }
}

async fn sweep(store: &Store) {
    match store.delete_expired_tokens(chrono::Utc::now()).await {
        Ok(0) => {}
        Ok(deleted) => debug!("Deleted {} expired token(s)", deleted),
        Err(e) => error!("Token sweep failed: {}", e),
    }
}
