use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
    Weekday,
};
use chrono_tz::Tz;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// ピーク時間帯
///
/// 現地時刻の半開区間 [start_hour, end_hour)。開始時は含み、終了時は含まない。
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl PeakWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    fn contains_hour(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }
}

/// 固定タイムゾーンの壁時計時刻とUTC時刻を相互変換し、
/// ピーク時間帯の判定を行う
#[derive(Clone, Debug)]
pub struct TimeNormalizer {
    timezone: Tz,
    peak_windows: Vec<PeakWindow>,
    peak_weekdays: Vec<Weekday>,
}

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

impl TimeNormalizer {
    pub fn new(timezone: Tz, peak_windows: Vec<PeakWindow>, peak_weekdays: Vec<Weekday>) -> Self {
        Self {
            timezone,
            peak_windows,
            peak_weekdays,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// 壁時計時刻の文字列をUTC時刻へ変換する
    ///
    /// 日付のみの文字列はその日の0時として解釈する。
    pub fn parse_local(&self, text: &str) -> Result<DateTime<Utc>, TimeError> {
        let naive = Self::parse_naive(text)?;
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(instant) => Ok(instant.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => Err(TimeError::NonexistentLocalTime),
        }
    }

    /// UTC時刻を壁時計時刻へ変換する
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.timezone)
    }

    /// ピーク時間帯かどうかを判定する
    ///
    /// 対象曜日以外は常にfalse。対象曜日では現地の時がいずれかの
    /// ピーク時間帯に入っていればtrue。
    pub fn is_peak(&self, instant: DateTime<Utc>) -> bool {
        let local = self.to_local(instant);
        if !self.peak_weekdays.contains(&local.weekday()) {
            return false;
        }
        let hour = local.hour();
        self.peak_windows
            .iter()
            .any(|window| window.contains_hour(hour))
    }

    /// 指定時刻の厳密に後にある、次の現地正時を返す
    ///
    /// UTCと現地時刻のオフセットが30分単位のゾーン (+05:30など) でも
    /// 現地の正時に合うよう、現地の分・秒をUTC軸上で差し引いて求める。
    pub fn next_hour_boundary(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let local = self.to_local(instant);
        let into_hour = Duration::minutes(i64::from(local.minute()))
            + Duration::seconds(i64::from(local.second()))
            + Duration::nanoseconds(i64::from(local.nanosecond()));
        instant + Duration::hours(1) - into_hour
    }

    fn parse_naive(text: &str) -> Result<NaiveDateTime, TimeError> {
        for format in LOCAL_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(naive);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(naive);
            }
        }
        Err(TimeError::Unparsable)
    }
}

/// 2つの時刻の差を実数の時間数で返す
pub fn hours_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    ((b - a).num_milliseconds() as f64 / 3_600_000.0).abs()
}

/// 時刻エラー
#[derive(Error, Display, Debug, PartialEq, Eq)]
pub enum TimeError {
    #[display(fmt = "Invalid date format. Use ISO 8601 format")]
    Unparsable,
    #[display(fmt = "Local time does not exist in the configured timezone")]
    NonexistentLocalTime,
}
