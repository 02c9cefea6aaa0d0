use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling interval tag for quote bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplingInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[default]
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    Hourly,
    #[serde(rename = "1d")]
    Daily,
}

impl SamplingInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingInterval::OneMinute => "1m",
            SamplingInterval::FiveMinutes => "5m",
            SamplingInterval::FifteenMinutes => "15m",
            SamplingInterval::ThirtyMinutes => "30m",
            SamplingInterval::Hourly => "60m",
            SamplingInterval::Daily => "1d",
        }
    }

    /// Length of one bar. A bar stamped `t` is complete at `t + duration()`.
    pub fn duration(&self) -> chrono::Duration {
        match self {
            SamplingInterval::OneMinute => chrono::Duration::minutes(1),
            SamplingInterval::FiveMinutes => chrono::Duration::minutes(5),
            SamplingInterval::FifteenMinutes => chrono::Duration::minutes(15),
            SamplingInterval::ThirtyMinutes => chrono::Duration::minutes(30),
            SamplingInterval::Hourly => chrono::Duration::hours(1),
            SamplingInterval::Daily => chrono::Duration::days(1),
        }
    }

    /// Look-back range to request so the latest few bars are always covered.
    pub fn provider_range(&self) -> &'static str {
        match self {
            SamplingInterval::OneMinute | SamplingInterval::FiveMinutes => "1d",
            SamplingInterval::FifteenMinutes | SamplingInterval::ThirtyMinutes => "5d",
            SamplingInterval::Hourly => "1mo",
            SamplingInterval::Daily => "3mo",
        }
    }
}

impl fmt::Display for SamplingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" => Ok(SamplingInterval::OneMinute),
            "5m" => Ok(SamplingInterval::FiveMinutes),
            "15m" => Ok(SamplingInterval::FifteenMinutes),
            "30m" => Ok(SamplingInterval::ThirtyMinutes),
            "60m" | "1h" => Ok(SamplingInterval::Hourly),
            "1d" => Ok(SamplingInterval::Daily),
            _ => Err(format!(
                "Invalid interval: '{s}'. Use 1m, 5m, 15m, 30m, 60m or 1d"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("1h".parse::<SamplingInterval>().unwrap(), SamplingInterval::Hourly);
        assert_eq!("15M".parse::<SamplingInterval>().unwrap(), SamplingInterval::FifteenMinutes);
        assert!("2w".parse::<SamplingInterval>().is_err());
    }

    #[test]
    fn test_bar_duration() {
        assert_eq!(SamplingInterval::FifteenMinutes.duration().num_minutes(), 15);
        assert_eq!(SamplingInterval::Daily.duration().num_hours(), 24);
    }

    #[test]
    fn test_serde_uses_tag() {
        let json = serde_json::to_string(&SamplingInterval::Daily).unwrap();
        assert_eq!(json, "\"1d\"");
    }
}
