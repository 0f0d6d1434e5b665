//! # Scheduler configuration.
//!
//! Provides [`SchedulerConfig`], the centralized settings for one scheduler instance.
//!
//! ## Sentinel values
//! - `job_timeout = 0s` → no run budget (the sweeper never times jobs out)
//! - `job_retention = 0s` → terminal jobs stay until evicted for capacity or removed
//! - `sweep_interval = 0s` → derived from the timeout/retention bounds
//!
//! ## Overrides
//! [`SchedulerConfig::from_env`] (or [`SchedulerConfig::from_lookup`] with any
//! key/value source) starts from the defaults and applies:
//!
//! | Key                         | Field                | Unit    |
//! |-----------------------------|----------------------|---------|
//! | `ASYNC_SERVICE_PATH`        | `async_service_path` | path    |
//! | `ASYNC_CACHE_SIZE`          | `max_cache_size`     | jobs    |
//! | `ASYNC_QUEUE_SIZE`          | `max_queue_size`     | jobs    |
//! | `ASYNC_POOL_SIZE`           | `thread_pool_size`   | workers |
//! | `ASYNC_JOB_TIMEOUT_SECS`    | `job_timeout`        | seconds |
//! | `ASYNC_JOB_RETENTION_SECS`  | `job_retention`      | seconds |
//! | `ASYNC_SWEEP_INTERVAL_MS`   | `sweep_interval`     | millis  |
//! | `ASYNC_GRACE_SECS`          | `grace`              | seconds |

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Lower clamp for a derived sweep interval.
const MIN_SWEEP: Duration = Duration::from_millis(10);
/// Upper clamp for a derived sweep interval (also used when nothing needs sweeping).
const MAX_SWEEP: Duration = Duration::from_secs(1);

/// Configuration for one scheduler instance.
///
/// ## Notes
/// All fields are public. Prefer the accessors over reading sentinel fields directly.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Route prefix under which a transport exposes job status/results.
    pub async_service_path: String,

    /// Resident job count above which terminal jobs are evicted on insert.
    pub max_cache_size: usize,

    /// Admission queue depth (jobs accepted but not yet picked up by a worker).
    ///
    /// Clamped to a minimum of 1.
    pub max_queue_size: usize,

    /// Number of workers executing invocations concurrently.
    ///
    /// Clamped to a minimum of 1.
    pub thread_pool_size: usize,

    /// Per-job run budget, measured from the moment a worker starts it.
    pub job_timeout: Duration,

    /// How long a terminal job stays resident after completion.
    pub job_retention: Duration,

    /// Sweeper cadence (`0s` = derive).
    pub sweep_interval: Duration,

    /// Maximum time `stop()` waits for workers and the sweeper to exit.
    pub grace: Duration,
}

impl SchedulerConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the known keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(path) = lookup("ASYNC_SERVICE_PATH") {
            cfg.async_service_path = path;
        }
        if let Some(v) = parse_key(&lookup, "ASYNC_CACHE_SIZE")? {
            cfg.max_cache_size = v;
        }
        if let Some(v) = parse_key(&lookup, "ASYNC_QUEUE_SIZE")? {
            cfg.max_queue_size = v;
        }
        if let Some(v) = parse_key(&lookup, "ASYNC_POOL_SIZE")? {
            cfg.thread_pool_size = v;
        }
        if let Some(v) = parse_key(&lookup, "ASYNC_JOB_TIMEOUT_SECS")? {
            cfg.job_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse_key(&lookup, "ASYNC_JOB_RETENTION_SECS")? {
            cfg.job_retention = Duration::from_secs(v);
        }
        if let Some(v) = parse_key(&lookup, "ASYNC_SWEEP_INTERVAL_MS")? {
            cfg.sweep_interval = Duration::from_millis(v);
        }
        if let Some(v) = parse_key(&lookup, "ASYNC_GRACE_SECS")? {
            cfg.grace = Duration::from_secs(v);
        }
        Ok(cfg)
    }

    /// Returns the run budget as an `Option` (`None` = no timeout).
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        (self.job_timeout > Duration::ZERO).then_some(self.job_timeout)
    }

    /// Returns the retention window as an `Option` (`None` = keep until evicted).
    #[inline]
    pub fn retention(&self) -> Option<Duration> {
        (self.job_retention > Duration::ZERO).then_some(self.job_retention)
    }

    /// Admission queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity(&self) -> usize {
        self.max_queue_size.max(1)
    }

    /// Worker count clamped to a minimum of 1.
    #[inline]
    pub fn workers(&self) -> usize {
        self.thread_pool_size.max(1)
    }

    /// Effective sweeper cadence.
    ///
    /// An explicit `sweep_interval` wins. Otherwise a quarter of the smallest
    /// enabled bound (timeout or retention), clamped to 10ms..1s.
    pub fn sweep_every(&self) -> Duration {
        if self.sweep_interval > Duration::ZERO {
            return self.sweep_interval;
        }
        match [self.timeout(), self.retention()].into_iter().flatten().min() {
            Some(bound) => (bound / 4).clamp(MIN_SWEEP, MAX_SWEEP),
            None => MAX_SWEEP,
        }
    }
}

impl Default for SchedulerConfig {
    /// Default configuration:
    ///
    /// - `async_service_path = "/async"`
    /// - `max_cache_size = 512`
    /// - `max_queue_size = 100`
    /// - `thread_pool_size = 10`
    /// - `job_timeout = 60min`
    /// - `job_retention = 0s` (no expiry)
    /// - `sweep_interval = 0s` (derived)
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            async_service_path: "/async".to_string(),
            max_cache_size: 512,
            max_queue_size: 100,
            thread_pool_size: 10,
            job_timeout: Duration::from_secs(60 * 60),
            job_retention: Duration::ZERO,
            sweep_interval: Duration::ZERO,
            grace: Duration::from_secs(30),
        }
    }
}

fn parse_key<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.async_service_path, "/async");
        assert_eq!(cfg.max_cache_size, 512);
        assert_eq!(cfg.queue_capacity(), 100);
        assert_eq!(cfg.workers(), 10);
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(3600)));
        assert_eq!(cfg.retention(), None);
        assert_eq!(cfg.sweep_every(), Duration::from_secs(1));
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let cfg = SchedulerConfig {
            max_queue_size: 0,
            thread_pool_size: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.queue_capacity(), 1);
        assert_eq!(cfg.workers(), 1);
    }

    #[test]
    fn sweep_interval_derivation() {
        let mut cfg = SchedulerConfig {
            job_timeout: Duration::from_secs(1),
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.sweep_every(), Duration::from_millis(250));

        cfg.job_retention = Duration::from_millis(200);
        assert_eq!(cfg.sweep_every(), Duration::from_millis(50));

        cfg.job_timeout = Duration::from_millis(8);
        assert_eq!(cfg.sweep_every(), MIN_SWEEP);

        cfg.job_timeout = Duration::ZERO;
        cfg.job_retention = Duration::ZERO;
        assert_eq!(cfg.sweep_every(), MAX_SWEEP);

        cfg.sweep_interval = Duration::from_millis(3);
        assert_eq!(cfg.sweep_every(), Duration::from_millis(3));
    }

    #[test]
    fn lookup_overrides_known_keys() {
        let cfg = SchedulerConfig::from_lookup(lookup_from(&[
            ("ASYNC_SERVICE_PATH", "/jobs"),
            ("ASYNC_CACHE_SIZE", "16"),
            ("ASYNC_QUEUE_SIZE", " 4 "),
            ("ASYNC_POOL_SIZE", "2"),
            ("ASYNC_JOB_TIMEOUT_SECS", "0"),
            ("ASYNC_JOB_RETENTION_SECS", "90"),
            ("ASYNC_SWEEP_INTERVAL_MS", "20"),
            ("ASYNC_GRACE_SECS", "5"),
        ]))
        .expect("valid overrides");

        assert_eq!(cfg.async_service_path, "/jobs");
        assert_eq!(cfg.max_cache_size, 16);
        assert_eq!(cfg.max_queue_size, 4);
        assert_eq!(cfg.thread_pool_size, 2);
        assert_eq!(cfg.timeout(), None);
        assert_eq!(cfg.retention(), Some(Duration::from_secs(90)));
        assert_eq!(cfg.sweep_every(), Duration::from_millis(20));
        assert_eq!(cfg.grace, Duration::from_secs(5));
    }

    #[test]
    fn malformed_value_is_reported_with_its_key() {
        let err = SchedulerConfig::from_lookup(lookup_from(&[("ASYNC_POOL_SIZE", "many")]))
            .expect_err("not a number");
        match err {
            ConfigError::Invalid { key, value, .. } => {
                assert_eq!(key, "ASYNC_POOL_SIZE");
                assert_eq!(value, "many");
            }
        }
    }
}
