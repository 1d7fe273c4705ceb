use std::ops::Range;

use chrono::{DateTime, Utc};

use super::{hours_between, TimeNormalizer};

/// 料金計算エンジン
///
/// 予約区間を現地正時で区切ったセグメントに分割し、セグメント開始時点の
/// ピーク判定で時間単価を決めて積算する。単価が変わるのは正時境界のみ
/// なので、各セグメント内の単価は一定になる。
#[derive(Clone, Debug)]
pub struct PricingEngine {
    normalizer: TimeNormalizer,
    peak_multiplier: f64,
}

impl PricingEngine {
    pub fn new(normalizer: TimeNormalizer, peak_multiplier: f64) -> Self {
        Self {
            normalizer,
            peak_multiplier,
        }
    }

    pub fn normalizer(&self) -> &TimeNormalizer {
        &self.normalizer
    }

    pub fn peak_multiplier(&self) -> f64 {
        self.peak_multiplier
    }

    /// 区間の料金を計算する
    ///
    /// 積算は実数のまま行い、最後に通貨単位へ四捨五入する。
    /// 空区間は0。
    pub fn price(&self, time: &Range<DateTime<Utc>>, base_hourly_rate: f64) -> i64 {
        let mut total = 0.0;
        let mut current = time.start;
        while current < time.end {
            let boundary = self.normalizer.next_hour_boundary(current);
            let segment_end = if boundary < time.end {
                boundary
            } else {
                time.end
            };
            let rate = if self.normalizer.is_peak(current) {
                base_hourly_rate * self.peak_multiplier
            } else {
                base_hourly_rate
            };
            total += rate * hours_between(current, segment_end);
            current = segment_end;
        }
        total.round() as i64
    }
}
