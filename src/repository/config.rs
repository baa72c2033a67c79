//! Tunables for [`crate::WeatherRepository`].

use bon::Builder;
use chrono::Duration;

/// Aggregates updated longer ago than this are left out of the data point count.
pub const DEFAULT_FRESHNESS_WINDOW_MS: i64 = 86_400_000;

/// Query radii above this are counted in the last histogram bucket.
pub const DEFAULT_MAX_TRACKED_RADIUS: u32 = 1000;

/// Settings for a [`crate::WeatherRepository`].
///
/// # Examples
///
/// ```
/// use airport_weather::RepositoryConfig;
/// use chrono::Duration;
///
/// let config = RepositoryConfig::builder()
///     .freshness_window(Duration::hours(1))
///     .build();
/// assert_eq!(config.max_tracked_radius(), 1000);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct RepositoryConfig {
    #[builder(default = Duration::milliseconds(DEFAULT_FRESHNESS_WINDOW_MS))]
    freshness_window: Duration,
    #[builder(default = DEFAULT_MAX_TRACKED_RADIUS)]
    max_tracked_radius: u32,
}

impl RepositoryConfig {
    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    pub fn max_tracked_radius(&self) -> u32 {
        self.max_tracked_radius
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
