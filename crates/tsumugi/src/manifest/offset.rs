use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::{str::FromStr, sync::LazyLock};

use crate::{EntryId, TsumugiError, TsumugiResult};

// HH:MM:SS or HH:MM:SS.mmm, as used by VAST durations and VMAP time offsets
static CLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([0-5]?\d):([0-5]?\d(?:\.\d+)?)$").unwrap());

static PERCENTAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)%$").unwrap());

static POSITION_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#(\d+)$").unwrap());

/// Parses a `HH:MM:SS[.mmm]` clock value into seconds.
pub fn parse_clock(input: &str) -> TsumugiResult<f64> {
    let invalid = || TsumugiError::InvalidTimeOffset(input.to_string());
    let caps = CLOCK_REGEX.captures(input.trim()).ok_or_else(invalid)?;

    let hours: f64 = caps[1].parse().map_err(|_| invalid())?;
    let minutes: f64 = caps[2].parse().map_err(|_| invalid())?;
    let seconds: f64 = caps[3].parse().map_err(|_| invalid())?;
    Ok((hours * 60. + minutes) * 60. + seconds)
}

/// Position of an ad break, relative to the content.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub enum TimeOffset {
    Start,
    End,
    /// Seconds into the content
    Clock(f64),
    /// Percentage of the total content duration
    Percentage(f64),
    /// `#N`: appended as a pod after the playlist entry with id N.
    ///
    /// VMAP defines `#N` as the ordinal of a position in the content. Here N names an entry of
    /// the playlist instead, so a break can follow any scheduled entry, including another break.
    Position(EntryId),
}

impl FromStr for TimeOffset {
    type Err = TsumugiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "start" => return Ok(Self::Start),
            "end" => return Ok(Self::End),
            _ => {}
        }

        if let Some(caps) = PERCENTAGE_REGEX.captures(s) {
            let percentage: f64 = caps[1]
                .parse()
                .map_err(|_| TsumugiError::InvalidTimeOffset(s.to_string()))?;
            return Ok(Self::Percentage(percentage));
        }
        if let Some(caps) = POSITION_REGEX.captures(s) {
            let id: u64 = caps[1]
                .parse()
                .map_err(|_| TsumugiError::InvalidTimeOffset(s.to_string()))?;
            return Ok(Self::Position(EntryId(id)));
        }
        parse_clock(s).map(Self::Clock)
    }
}

impl TryFrom<String> for TimeOffset {
    type Error = TsumugiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Accepts either seconds or a `HH:MM:SS[.mmm]` string.
pub(crate) fn deserialize_clock<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Clock {
        Seconds(f64),
        Text(String),
    }

    match Clock::deserialize(deserializer)? {
        Clock::Seconds(seconds) => Ok(seconds),
        Clock::Text(text) => parse_clock(&text).map_err(serde::de::Error::custom),
    }
}

pub(crate) fn deserialize_optional_clock<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_clock")] f64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(v)| v))
}
