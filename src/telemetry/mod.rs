//! Simulated connection telemetry
//!
//! Produces synthetic download/upload rates on a fixed-period timer, with an
//! occasional short-lived `Unstable` link flag. Nothing here probes a real
//! network and nothing here feeds the scoring engine.

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::pending;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

use crate::errors::{AssessError, Result};

/// Link quality flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkQuality {
    Stable,
    Unstable,
}

impl fmt::Display for LinkQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkQuality::Stable => write!(f, "Connected"),
            LinkQuality::Unstable => write!(f, "Unstable"),
        }
    }
}

/// One synthetic snapshot of connection metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Mbps
    pub download_rate: u32,
    /// Mbps
    pub upload_rate: u32,
    pub link_quality: LinkQuality,
    pub taken_at: DateTime<Utc>,
}

impl TelemetrySample {
    /// Draw fresh rates from the configured ranges
    pub fn draw<R: Rng>(rng: &mut R, config: &SimulatorConfig, link_quality: LinkQuality) -> Self {
        Self {
            download_rate: rng.gen_range(config.download_range.clone()),
            upload_rate: rng.gen_range(config.upload_range.clone()),
            link_quality,
            taken_at: Utc::now(),
        }
    }
}

/// Timing and range settings for the simulator
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub tick_interval: Duration,
    /// Chance per tick of flagging the link as unstable
    pub unstable_probability: f64,
    pub unstable_duration: Duration,
    pub download_range: RangeInclusive<u32>,
    pub upload_range: RangeInclusive<u32>,
    /// Fixed RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            unstable_probability: 0.05,
            unstable_duration: Duration::from_secs(3),
            download_range: 20..=99,
            upload_range: 10..=39,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(AssessError::ConfigError(
                "telemetry tick interval must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.unstable_probability) {
            return Err(AssessError::ConfigError(format!(
                "unstable_probability must be between 0.0 and 1.0, got {}",
                self.unstable_probability
            )));
        }
        for (name, range) in [("download", &self.download_range), ("upload", &self.upload_range)] {
            if range.is_empty() || *range.start() == 0 {
                return Err(AssessError::ConfigError(format!(
                    "{} range must be non-empty and positive, got {}..={}",
                    name,
                    range.start(),
                    range.end()
                )));
            }
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Counters kept across ticks
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub ticks: u64,
    pub unstable_events: u64,
}

type Callback = Arc<dyn Fn(&TelemetrySample) + Send + Sync>;

struct Shared {
    current: Mutex<TelemetrySample>,
    stats: Mutex<TelemetryStats>,
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn publish(&self, sample: TelemetrySample) {
        *lock(&self.current) = sample.clone();

        // Callbacks run outside the lock so they may (un)subscribe
        let callbacks: Vec<Callback> = lock(&self.subscribers)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(&sample);
        }
    }
}

/// Handle returned by [`TelemetrySimulator::subscribe`]
///
/// Dropping the handle unsubscribes.
pub struct TelemetrySubscription {
    id: u64,
    shared: Weak<Shared>,
}

impl TelemetrySubscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for TelemetrySubscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.subscribers).retain(|(id, _)| *id != self.id);
        }
    }
}

/// Periodic generator of synthetic telemetry samples
///
/// Runs on its own tokio task, independent of assessment state. The task is
/// aborted on [`stop`](Self::stop) and when the simulator is dropped.
pub struct TelemetrySimulator {
    config: SimulatorConfig,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl TelemetrySimulator {
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        config.validate()?;

        let initial = TelemetrySample::draw(&mut config.rng(), &config, LinkQuality::Stable);
        let shared = Arc::new(Shared {
            current: Mutex::new(initial),
            stats: Mutex::new(TelemetryStats::default()),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        });

        Ok(Self {
            config,
            shared,
            task: None,
        })
    }

    /// Start ticking; a second call while running is a no-op
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let rng = config.rng();
        self.task = Some(tokio::spawn(run_ticks(shared, config, rng)));
        info!("Telemetry simulator started ({:?} interval)", self.config.tick_interval);
    }

    /// Stop ticking; the last sample stays readable
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Telemetry simulator stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Register a callback invoked with every new sample
    pub fn subscribe<F>(&self, callback: F) -> TelemetrySubscription
    where
        F: Fn(&TelemetrySample) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.shared.subscribers).push((id, Arc::new(callback)));
        TelemetrySubscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.subscribers).len()
    }

    /// Most recent sample
    pub fn current(&self) -> TelemetrySample {
        lock(&self.shared.current).clone()
    }

    pub fn stats(&self) -> TelemetryStats {
        lock(&self.shared.stats).clone()
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }
}

impl Drop for TelemetrySimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_ticks(shared: Arc<Shared>, config: SimulatorConfig, mut rng: StdRng) {
    let period = config.tick_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut revert_at: Option<Instant> = None;

    loop {
        let revert = async move {
            match revert_at {
                Some(at) => sleep_until(at).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            _ = ticker.tick() => {
                let flip = rng.gen_bool(config.unstable_probability);
                let quality = if flip {
                    revert_at = Some(Instant::now() + config.unstable_duration);
                    LinkQuality::Unstable
                } else {
                    lock(&shared.current).link_quality
                };

                {
                    let mut stats = lock(&shared.stats);
                    stats.ticks += 1;
                    if flip {
                        stats.unstable_events += 1;
                    }
                }
                if flip {
                    debug!("Link flagged unstable for {:?}", config.unstable_duration);
                }

                let sample = TelemetrySample::draw(&mut rng, &config, quality);
                shared.publish(sample);
            }
            _ = revert => {
                revert_at = None;
                let mut sample = lock(&shared.current).clone();
                sample.link_quality = LinkQuality::Stable;
                sample.taken_at = Utc::now();
                debug!("Link back to stable");
                shared.publish(sample);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn fast_config() -> SimulatorConfig {
        SimulatorConfig {
            tick_interval: Duration::from_secs(5),
            unstable_probability: 0.0,
            unstable_duration: Duration::from_secs(3),
            seed: Some(7),
            ..SimulatorConfig::default()
        }
    }

    #[test]
    fn test_draw_within_ranges() {
        let config = SimulatorConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let sample = TelemetrySample::draw(&mut rng, &config, LinkQuality::Stable);
            assert!((20..=99).contains(&sample.download_rate));
            assert!((10..=39).contains(&sample.upload_rate));
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(SimulatorConfig::default().validate().is_ok());

        let mut config = SimulatorConfig::default();
        config.tick_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.unstable_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.upload_range = 0..=10;
        assert!(config.validate().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_notify_subscribers() {
        let mut sim = TelemetrySimulator::new(fast_config()).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let _sub = sim.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        sim.start();
        tokio::time::sleep(Duration::from_millis(11_000)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(sim.stats().ticks, 2);
        assert_eq!(sim.current().link_quality, LinkQuality::Stable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_on_drop() {
        let mut sim = TelemetrySimulator::new(fast_config()).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sub = sim.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(sim.subscriber_count(), 1);

        sim.start();
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        sub.unsubscribe();
        assert_eq!(sim.subscriber_count(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unstable_reverts_after_duration() {
        let mut config = fast_config();
        config.unstable_probability = 1.0;
        let mut sim = TelemetrySimulator::new(config).unwrap();
        sim.start();

        // First tick at 5s flags the link until 8s
        tokio::time::sleep(Duration::from_millis(7_000)).await;
        assert_eq!(sim.current().link_quality, LinkQuality::Unstable);

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(sim.current().link_quality, LinkQuality::Stable);
        assert_eq!(sim.stats().unstable_events, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let mut sim = TelemetrySimulator::new(fast_config()).unwrap();
        sim.start();
        assert!(sim.is_running());

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        sim.stop();
        assert!(!sim.is_running());

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(sim.stats().ticks, 1);
    }
}
