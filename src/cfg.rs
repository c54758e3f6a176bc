use crate::{history::Error, time::Resolution};

#[cfg(feature = "serde")]
use serde::Deserialize;

fn default_update_rate_hz() -> u32 {
    60
}

fn default_history_seconds() -> f64 {
    10.0
}

/// History configuration, describing the sensor that feeds it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Sensor update rate, in Hz
    #[cfg_attr(feature = "serde", serde(default = "default_update_rate_hz"))]
    pub update_rate_hz: u32,
    /// Time span to retain, in seconds
    #[cfg_attr(feature = "serde", serde(default = "default_history_seconds"))]
    pub history_seconds: f64,
    /// Sensor clock tick resolution
    #[cfg_attr(feature = "serde", serde(default))]
    pub resolution: Resolution,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_rate_hz: default_update_rate_hz(),
            history_seconds: default_history_seconds(),
            resolution: Resolution::default(),
        }
    }
}

impl Config {
    /// Returns a copy of self with given sensor update rate
    pub fn with_update_rate(&self, update_rate_hz: u32) -> Self {
        let mut s = self.clone();
        s.update_rate_hz = update_rate_hz;
        s
    }
    /// Returns a copy of self retaining given time span
    pub fn with_history_seconds(&self, history_seconds: f64) -> Self {
        let mut s = self.clone();
        s.history_seconds = history_seconds;
        s
    }
    /// Returns a copy of self with given tick resolution
    pub fn with_resolution(&self, resolution: Resolution) -> Self {
        let mut s = self.clone();
        s.resolution = resolution;
        s
    }
    /// Number of samples needed to cover the configured time span.
    /// The history may retain less than that: see [crate::prelude::MAX_CAPACITY].
    pub fn capacity(&self) -> Result<usize, Error> {
        if self.update_rate_hz == 0 {
            return Err(Error::NullUpdateRate);
        }
        if !self.history_seconds.is_finite() || self.history_seconds <= 0.0 {
            return Err(Error::InvalidHistoryLength(self.history_seconds));
        }
        let samples = (f64::from(self.update_rate_hz) * self.history_seconds).ceil();
        Ok(samples as usize)
    }
}

#[cfg(test)]
mod test {
    use super::Config;
    use crate::{history::Error, time::Resolution};

    #[test]
    fn default_capacity() {
        let cfg = Config::default();
        assert_eq!(cfg.resolution, Resolution::Millisecond);
        assert_eq!(cfg.capacity(), Ok(600));
    }

    #[test]
    fn capacity() {
        let cfg = Config::default()
            .with_update_rate(200)
            .with_history_seconds(0.5);
        assert_eq!(cfg.capacity(), Ok(100));

        let cfg = cfg.with_update_rate(50).with_history_seconds(0.01);
        assert_eq!(cfg.capacity(), Ok(1));

        let cfg = cfg.with_resolution(Resolution::Microsecond);
        assert_eq!(cfg.resolution, Resolution::Microsecond);
    }

    #[test]
    fn invalid() {
        let cfg = Config::default().with_update_rate(0);
        assert_eq!(cfg.capacity(), Err(Error::NullUpdateRate));

        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let cfg = Config::default().with_history_seconds(secs);
            assert!(
                matches!(cfg.capacity(), Err(Error::InvalidHistoryLength(_))),
                "{} should be rejected",
                secs
            );
        }
    }

    #[test]
    #[cfg(feature = "serde")]
    fn deserialize() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "update_rate_hz": 100,
                "resolution": "Microsecond"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.update_rate_hz, 100);
        assert_eq!(cfg.history_seconds, 10.0);
        assert_eq!(cfg.resolution, Resolution::Microsecond);

        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
    }
}
