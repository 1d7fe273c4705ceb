use chrono::Weekday;
use chrono_tz::Tz;
use config::{Config, ConfigError};
use serde::Deserialize;

pub mod domain;
pub mod infrastructure;

use crate::domain::core::{PeakWindow, PricingEngine, TimeNormalizer};
use crate::domain::reserve::BookingPolicy;

/// アプリケーション設定
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct YoyakuConfig {
    pub timezone: String,
    pub pricing: Pricing,
    pub booking: Booking,
    pub logger: Logger,
}

impl YoyakuConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("yoyaku.toml"))
            .add_source(config::Environment::with_prefix("YOYAKU").separator("_"))
            .build()?
            .try_deserialize::<YoyakuConfig>()
    }

    /// 設定から時刻正規化器を構築する
    pub fn time_normalizer(&self) -> Result<TimeNormalizer, ConfigError> {
        let timezone = self.timezone.parse::<Tz>().map_err(ConfigError::Message)?;
        let weekdays = self
            .pricing
            .peak_weekdays
            .iter()
            .map(|day| {
                day.parse::<Weekday>()
                    .map_err(|_| ConfigError::Message(format!("unknown weekday: {}", day)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TimeNormalizer::new(
            timezone,
            self.pricing.peak_windows.clone(),
            weekdays,
        ))
    }

    /// 設定から料金計算エンジンを構築する
    pub fn pricing_engine(&self) -> Result<PricingEngine, ConfigError> {
        Ok(PricingEngine::new(
            self.time_normalizer()?,
            self.pricing.peak_multiplier,
        ))
    }

    /// 設定から予約ポリシーを構築する
    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy {
            max_booking_hours: self.booking.max_booking_hours,
            min_cancellation_hours: self.booking.min_cancellation_hours,
        }
    }
}

impl Default for YoyakuConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".to_owned(),
            pricing: Pricing::default(),
            booking: Booking::default(),
            logger: Logger::default(),
        }
    }
}

/// 料金設定
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub peak_windows: Vec<PeakWindow>,
    pub peak_weekdays: Vec<String>,
    pub peak_multiplier: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            peak_windows: vec![PeakWindow::new(10, 13), PeakWindow::new(16, 19)],
            peak_weekdays: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                .iter()
                .map(|day| day.to_string())
                .collect(),
            peak_multiplier: 1.5,
        }
    }
}

/// 予約設定
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Booking {
    pub max_booking_hours: i64,
    pub min_cancellation_hours: i64,
}

impl Default for Booking {
    fn default() -> Self {
        Self {
            max_booking_hours: 12,
            min_cancellation_hours: 2,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Logger {
    pub level: Level,
}

impl Logger {
    /// ロガーを初期化する
    pub fn init(&self) {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::from(&self.level))
            .init();
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = YoyakuConfig::default();
        assert_eq!(config.timezone, "Asia/Kolkata");
        assert_eq!(config.pricing.peak_multiplier, 1.5);
        assert_eq!(config.pricing.peak_windows.len(), 2);
        assert_eq!(config.booking.max_booking_hours, 12);
        assert_eq!(config.booking.min_cancellation_hours, 2);
    }

    #[test]
    fn test_time_normalizer_from_config() {
        let config = YoyakuConfig::default();
        let normalizer = config.time_normalizer().unwrap();
        assert_eq!(normalizer.timezone(), chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn test_time_normalizer_rejects_unknown_timezone() {
        let config = YoyakuConfig {
            timezone: "Mars/Olympus_Mons".to_owned(),
            ..YoyakuConfig::default()
        };
        assert!(config.time_normalizer().is_err());
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(tracing::Level::from(&Level::DEBUG), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(&Level::ERROR), tracing::Level::ERROR);
    }
}
