//! Event filters
//!
//! A filter is a predicate over a fully enriched event. The logger admits
//! an event only when every filter accepts it, evaluated in registration
//! order and stopping at the first rejection.

use super::event::LogEvent;
use super::level::Level;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Predicate = dyn Fn(&LogEvent) -> bool + Send + Sync;

#[derive(Clone)]
pub struct Filter {
    predicate: Arc<Predicate>,
}

impl Filter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&LogEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Accept events at or above `minimum`
    pub fn min_level(minimum: Level) -> Self {
        Self::new(move |event| event.level.is_at_least(minimum))
    }

    /// Accept events carrying a property with this name
    pub fn property_present(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |event| event.properties.contains(&name))
    }

    /// Reject events carrying a property with this name
    pub fn property_absent(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |event| !event.properties.contains(&name))
    }

    /// Keep roughly `rate` of events; errors and fatals are always kept
    pub fn sampled(rate: f64) -> Self {
        Self::sampling(SamplingConfig::new(rate))
    }

    pub fn sampling(config: SamplingConfig) -> Self {
        Self::new(move |event| config.should_sample(event.level, event.source.as_deref()))
    }

    /// Whether the event passes
    #[inline]
    pub fn accepts(&self, event: &LogEvent) -> bool {
        (self.predicate)(event)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

/// Random sampling settings
///
/// `rate` is the fraction of events kept, between 0.0 and 1.0 (NaN keeps
/// everything). Levels in
/// `always_sample` bypass sampling; a source label can carry its own rate.
#[derive(Debug, Clone)]
pub struct SamplingConfig {
    pub rate: f64,
    pub always_sample: Vec<Level>,
    pub source_rates: HashMap<String, f64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            always_sample: vec![Level::Error, Level::Fatal],
            source_rates: HashMap::new(),
        }
    }
}

impl SamplingConfig {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: normalize_rate(rate),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_always_sample(mut self, levels: Vec<Level>) -> Self {
        self.always_sample = levels;
        self
    }

    #[must_use]
    pub fn with_source_rate(mut self, source: impl Into<String>, rate: f64) -> Self {
        self.source_rates.insert(source.into(), normalize_rate(rate));
        self
    }

    pub fn should_sample(&self, level: Level, source: Option<&str>) -> bool {
        if self.always_sample.contains(&level) {
            return true;
        }

        let rate = normalize_rate(
            source
                .and_then(|s| self.source_rates.get(s).copied())
                .unwrap_or(self.rate),
        );

        if rate >= 1.0 {
            return true;
        }
        if rate <= 0.0 {
            return false;
        }

        rand::thread_rng().gen::<f64>() < rate
    }
}

/// Clamp to [0, 1]; NaN keeps every event
fn normalize_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        1.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::property::Properties;

    fn event(level: Level) -> LogEvent {
        LogEvent::new(level, "m", "m", Properties::new())
    }

    #[test]
    fn test_min_level() {
        let filter = Filter::min_level(Level::Warning);
        assert!(!filter.accepts(&event(Level::Information)));
        assert!(filter.accepts(&event(Level::Warning)));
        assert!(filter.accepts(&event(Level::Fatal)));
    }

    #[test]
    fn test_property_present_and_absent() {
        let with = event(Level::Information).with_property("user", "a");
        let without = event(Level::Information);

        assert!(Filter::property_present("user").accepts(&with));
        assert!(!Filter::property_present("user").accepts(&without));
        assert!(Filter::property_absent("user").accepts(&without));
    }

    #[test]
    fn test_sampling_extremes() {
        let none = Filter::sampled(0.0);
        let all = Filter::sampled(1.0);
        for _ in 0..100 {
            assert!(!none.accepts(&event(Level::Information)));
            assert!(all.accepts(&event(Level::Debug)));
        }
    }

    #[test]
    fn test_sampling_keeps_errors() {
        let none = Filter::sampled(0.0);
        assert!(none.accepts(&event(Level::Error)));
        assert!(none.accepts(&event(Level::Fatal)));
    }

    #[test]
    fn test_sampling_rate_is_approximate() {
        let half = Filter::sampled(0.5);
        let kept = (0..10_000)
            .filter(|_| half.accepts(&event(Level::Information)))
            .count();
        assert!((4_000..6_000).contains(&kept), "kept {}", kept);
    }

    #[test]
    fn test_source_rate_overrides_default() {
        let config = SamplingConfig::new(1.0).with_source_rate("noisy", 0.0);
        assert!(!config.should_sample(Level::Information, Some("noisy")));
        assert!(config.should_sample(Level::Information, Some("quiet")));
        assert!(config.should_sample(Level::Information, None));
    }

    #[test]
    fn test_rate_is_clamped() {
        assert_eq!(SamplingConfig::new(4.0).rate, 1.0);
        assert_eq!(SamplingConfig::new(-1.0).rate, 0.0);
    }

    #[test]
    fn test_nan_rate_keeps_everything() {
        assert_eq!(SamplingConfig::new(f64::NAN).rate, 1.0);
        let config = SamplingConfig::new(0.0).with_source_rate("odd", f64::NAN);
        assert!(config.should_sample(Level::Debug, Some("odd")));

        let raw = SamplingConfig {
            rate: f64::NAN,
            ..Default::default()
        };
        assert!(raw.should_sample(Level::Information, None));
        assert!(Filter::sampled(f64::NAN).accepts(&event(Level::Verbose)));
    }
}
