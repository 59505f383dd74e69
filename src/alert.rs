use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::SettingsError;

pub const DEFAULT_MIN_DISTANCE: f64 = 50.0;
pub const DEFAULT_MAX_DISTANCE: f64 = 70.0;
pub const DEFAULT_SPEECH_INTERVAL: Duration = Duration::from_secs(5);

/// Inclusive distance range, in centimeters, that triggers an alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertWindow {
    min_distance: f64,
    max_distance: f64,
}

impl Default for AlertWindow {
    fn default() -> Self {
        Self {
            min_distance: DEFAULT_MIN_DISTANCE,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

impl AlertWindow {
    pub fn new(min_distance: f64, max_distance: f64) -> Result<Self, SettingsError> {
        if min_distance >= max_distance {
            return Err(SettingsError::MinNotBelowMax);
        }
        Ok(Self {
            min_distance,
            max_distance,
        })
    }

    /// Parses raw form values. Both must be integers.
    pub fn parse(min_distance: &str, max_distance: &str) -> Result<Self, SettingsError> {
        let min_distance = parse_distance(min_distance)?;
        let max_distance = parse_distance(max_distance)?;
        Self::new(min_distance as f64, max_distance as f64)
    }

    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn contains(&self, distance: f64) -> bool {
        self.min_distance <= distance && distance <= self.max_distance
    }
}

fn parse_distance(raw: &str) -> Result<i64, SettingsError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| SettingsError::InvalidDistanceValue)
}

/// Gates alerts so a sustained in-range face is announced at most once per
/// `speech_interval`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    speech_interval: Duration,
    last_fired: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SPEECH_INTERVAL)
    }
}

impl Debouncer {
    pub fn new(speech_interval: Duration) -> Self {
        Self {
            speech_interval,
            last_fired: None,
        }
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }

    pub fn is_cooling_down(&self, now: Instant) -> bool {
        match self.last_fired {
            Some(last_fired) => now.saturating_duration_since(last_fired) <= self.speech_interval,
            None => false,
        }
    }

    /// Returns true when an alert should fire for `distance` at `now` and
    /// records the firing.
    pub fn evaluate(&mut self, distance: f64, window: &AlertWindow, now: Instant) -> bool {
        if !window.contains(distance) || self.is_cooling_down(now) {
            return false;
        }
        self.last_fired = Some(now);
        true
    }
}
