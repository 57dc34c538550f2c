use chrono::{DateTime, Local, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::quantity::{cost::Cost, rate::KilowattHourRate};

/// Canonical pricing rules, rebuilt whenever the pricing configuration changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
#[must_use]
pub struct TariffProfile {
    #[builder(default)]
    pub contract: Contract,

    /// Base pair, also the fallback for any missing peak or off-peak sub-rate.
    pub base: RatePair,

    /// Monthly subscription fee.
    #[builder(default)]
    pub subscription: FeePair,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Contract {
    /// Single rate around the clock.
    #[default]
    Flat,

    /// Dual rate, peak within the window and off-peak outside of it.
    PeakOffPeak { window: PeakWindow, peak: SubRates, off_peak: SubRates },
}

/// Time-of-day window, start inclusive and end exclusive.
///
/// A window whose start is not before its end wraps around midnight.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PeakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl PeakWindow {
    #[must_use]
    pub fn contains(self, time: NaiveTime) -> bool {
        if self.start < self.end {
            (self.start <= time) && (time < self.end)
        } else {
            (time >= self.start) || (time < self.end)
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatePair {
    /// Excluding taxes.
    pub ht: KilowattHourRate,

    /// Including taxes.
    pub ttc: KilowattHourRate,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubRates {
    pub ht: Option<KilowattHourRate>,
    pub ttc: Option<KilowattHourRate>,
}

impl SubRates {
    fn or(self, fallback: RatePair) -> RatePair {
        RatePair { ht: self.ht.unwrap_or(fallback.ht), ttc: self.ttc.unwrap_or(fallback.ttc) }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeePair {
    pub ht: Cost,
    pub ttc: Cost,
}

impl TariffProfile {
    /// Whether the peak rate applies at the instant.
    ///
    /// Flat contracts always answer `true` so that the rate lookup stays uniform.
    #[must_use]
    pub fn is_peak(&self, at: DateTime<Local>) -> bool {
        match &self.contract {
            Contract::Flat => true,
            Contract::PeakOffPeak { window, .. } => window.contains(at.time()),
        }
    }

    pub fn rate_for(&self, is_peak: bool) -> RatePair {
        match &self.contract {
            Contract::Flat => self.base,
            Contract::PeakOffPeak { peak, .. } if is_peak => peak.or(self.base),
            Contract::PeakOffPeak { off_peak, .. } => off_peak.or(self.base),
        }
    }

    pub fn rate_at(&self, at: DateTime<Local>) -> RatePair {
        self.rate_for(self.is_peak(at))
    }

    /// Sorted-key representation used for request fingerprints.
    pub fn canonical(&self) -> serde_json::Value {
        // Serializing plain data into a `Value` cannot fail.
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_time(time(hour, minute))
            .and_local_timezone(Local)
            .unwrap()
    }

    fn base() -> RatePair {
        RatePair { ht: KilowattHourRate::from(0.20), ttc: KilowattHourRate::from(0.25) }
    }

    fn peak_off_peak(start: NaiveTime, end: NaiveTime) -> TariffProfile {
        TariffProfile::builder()
            .base(base())
            .contract(Contract::PeakOffPeak {
                window: PeakWindow { start, end },
                peak: SubRates {
                    ht: Some(KilowattHourRate::from(0.30)),
                    ttc: Some(KilowattHourRate::from(0.36)),
                },
                off_peak: SubRates { ht: Some(KilowattHourRate::from(0.15)), ttc: None },
            })
            .build()
    }

    #[test]
    fn test_is_peak_day_window() {
        let profile = peak_off_peak(time(6, 0), time(22, 0));
        assert!(profile.is_peak(at(7, 0)));
        assert!(!profile.is_peak(at(23, 0)));
        assert!(!profile.is_peak(at(5, 59)));
        assert!(profile.is_peak(at(6, 0)));
        assert!(!profile.is_peak(at(22, 0)));
    }

    #[test]
    fn test_is_peak_wraps_around_midnight() {
        let profile = peak_off_peak(time(22, 0), time(6, 0));
        assert!(profile.is_peak(at(23, 0)));
        assert!(profile.is_peak(at(0, 30)));
        assert!(!profile.is_peak(at(12, 0)));
        assert!(!profile.is_peak(at(6, 0)));
    }

    #[test]
    fn test_flat_is_always_peak() {
        let profile = TariffProfile::builder().base(base()).build();
        assert!(profile.is_peak(at(3, 0)));
        assert_eq!(profile.rate_for(false), base());
    }

    #[test]
    fn test_rate_for_falls_back_to_base() {
        let profile = peak_off_peak(time(6, 0), time(22, 0));
        assert_eq!(profile.rate_for(true).ht, KilowattHourRate::from(0.30));
        let off_peak = profile.rate_for(false);
        assert_eq!(off_peak.ht, KilowattHourRate::from(0.15));
        assert_eq!(off_peak.ttc, KilowattHourRate::from(0.25));
    }

    #[test]
    fn test_canonical_is_stable() {
        let profile = peak_off_peak(time(22, 0), time(6, 0));
        assert_eq!(profile.canonical(), profile.clone().canonical());
        assert_eq!(profile.canonical()["contract"]["mode"], "peak_off_peak");
    }
}
