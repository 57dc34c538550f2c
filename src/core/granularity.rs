use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Reporting period of a metrics request.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[display("hourly")]
    Hourly,

    #[display("daily")]
    Daily,

    #[display("weekly")]
    Weekly,

    #[display("monthly")]
    Monthly,

    #[display("yearly")]
    Yearly,
}

impl Granularity {
    /// How long a computed result for this period stays fresh: finer periods go stale sooner.
    #[must_use]
    pub const fn cache_ttl(self) -> Duration {
        match self {
            Self::Hourly => Duration::from_secs(60),
            Self::Daily => Duration::from_secs(300),
            Self::Weekly => Duration::from_secs(600),
            Self::Monthly => Duration::from_secs(1800),
            Self::Yearly => Duration::from_secs(3600),
        }
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => bail!("unknown period `{name}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_ttl() {
        assert_eq!(Granularity::Hourly.cache_ttl().as_secs(), 60);
        assert_eq!(Granularity::Daily.cache_ttl().as_secs(), 300);
        assert_eq!(Granularity::Weekly.cache_ttl().as_secs(), 600);
        assert_eq!(Granularity::Monthly.cache_ttl().as_secs(), 1800);
        assert_eq!(Granularity::Yearly.cache_ttl().as_secs(), 3600);
    }

    #[test]
    fn test_from_str() -> Result {
        assert_eq!("Monthly".parse::<Granularity>()?, Granularity::Monthly);
        assert!("fortnightly".parse::<Granularity>().is_err());
        Ok(())
    }

    #[test]
    fn test_serde_names() -> Result {
        assert_eq!(serde_json::to_string(&Granularity::Weekly)?, r#""weekly""#);
        assert_eq!(serde_json::from_str::<Granularity>(r#""yearly""#)?, Granularity::Yearly);
        Ok(())
    }
}
