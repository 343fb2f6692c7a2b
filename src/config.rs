use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

pub const DEFAULT_TARGET: &str = "http://[::1]:10000";
pub const DEFAULT_FEATURES_PATH: &str = "data/route_guide_db.json";

/// Environment variable overriding [`ClientConfig::target`].
pub const TARGET_ENV: &str = "ROUTE_GUIDE_TARGET";
/// Environment variable overriding [`ClientConfig::features_path`].
pub const FEATURES_PATH_ENV: &str = "ROUTE_GUIDE_DB";

/// Configuration for [`GuideClient`](crate::GuideClient) and the
/// `route_user` binary.
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// Server URI.
    #[builder(default = DEFAULT_TARGET.to_string(), into)]
    pub target: String,

    /// Feature database the route points are picked from.
    #[builder(default = PathBuf::from(DEFAULT_FEATURES_PATH), into)]
    pub features_path: PathBuf,

    /// Points sent per RecordRoute exchange.
    #[builder(default = 10)]
    pub record_route_points: usize,

    /// Lower bound of the pause between two RecordRoute points.
    #[builder(default = Duration::from_millis(500))]
    pub min_travel_delay: Duration,

    /// Upper bound of the pause between two RecordRoute points.
    #[builder(default = Duration::from_millis(1500))]
    pub max_travel_delay: Duration,

    /// How long RecordRoute waits for the server after the last point.
    #[builder(default = Duration::from_secs(60))]
    pub record_route_timeout: Duration,

    /// How long the caller waits for RouteChat to finish.
    #[builder(default = Duration::from_secs(60))]
    pub route_chat_timeout: Duration,

    /// Abort the call when a wait times out, rather than leaving it open on
    /// the server.
    #[builder(default = true)]
    pub cancel_on_timeout: bool,
}

impl ClientConfig {
    /// Defaults, with `target` and `features_path` taken from the environment
    /// when set.
    pub fn from_env() -> Self {
        let target = std::env::var(TARGET_ENV).unwrap_or_else(|_| DEFAULT_TARGET.to_string());
        let features_path =
            std::env::var(FEATURES_PATH_ENV).unwrap_or_else(|_| DEFAULT_FEATURES_PATH.to_string());

        ClientConfig::builder()
            .target(target)
            .features_path(features_path)
            .build()
    }

    /// The travel delay bounds in milliseconds, lowest first.
    pub(crate) fn travel_delay_millis(&self) -> (u64, u64) {
        let min = self.min_travel_delay.as_millis() as u64;
        let max = self.max_travel_delay.as_millis() as u64;
        if min <= max {
            (min, max)
        } else {
            (max, min)
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();

        assert_eq!(config.target, DEFAULT_TARGET);
        assert_eq!(config.features_path, PathBuf::from(DEFAULT_FEATURES_PATH));
        assert_eq!(config.record_route_points, 10);
        assert_eq!(config.travel_delay_millis(), (500, 1500));
        assert_eq!(config.record_route_timeout, Duration::from_secs(60));
        assert!(config.cancel_on_timeout);
    }

    #[test]
    fn builder_overrides_and_normalises_delay() {
        let config = ClientConfig::builder()
            .target("http://127.0.0.1:50051")
            .record_route_points(3)
            .min_travel_delay(Duration::from_millis(40))
            .max_travel_delay(Duration::from_millis(10))
            .cancel_on_timeout(false)
            .build();

        assert_eq!(config.target, "http://127.0.0.1:50051");
        assert_eq!(config.record_route_points, 3);
        assert_eq!(config.travel_delay_millis(), (10, 40));
        assert!(!config.cancel_on_timeout);
    }
}
