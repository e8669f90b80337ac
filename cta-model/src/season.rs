use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Meteorological season, derived from the calendar month alone.
///
/// Ordering follows the calendar year starting in winter, which is also the
/// order season groups are listed in exported bounds.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// All seasons, in calendar order.
    pub const ALL: [Season; 4] = [
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Autumn,
    ];

    /// Map a calendar month (1-12) to its season.
    /// - winter: December, January, February
    /// - spring: March, April, May
    /// - summer: June, July, August
    /// - autumn: September, October, November
    pub fn of_month(month: u32) -> Option<Season> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Autumn),
            _ => None,
        }
    }

    /// Season of a timestamp.
    pub fn of(timestamp: &NaiveDateTime) -> Season {
        Season::of_date(&timestamp.date())
    }

    /// Season of a calendar date.
    pub fn of_date(date: &NaiveDate) -> Season {
        // a valid date always has a month in 1..=12
        Season::of_month(date.month()).unwrap_or(Season::Winter)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a season name is not recognized.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseSeasonError(pub String);

impl fmt::Display for ParseSeasonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown season '{}' (expected winter, spring, summer, autumn or fall)",
            self.0
        )
    }
}

impl std::error::Error for ParseSeasonError {}

impl FromStr for Season {
    type Err = ParseSeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" | "fall" => Ok(Season::Autumn),
            _ => Err(ParseSeasonError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Season;
    use chrono::NaiveDate;

    #[test]
    fn test_every_month_maps_to_exactly_one_season() {
        let expected = [
            (1, Season::Winter),
            (2, Season::Winter),
            (3, Season::Spring),
            (4, Season::Spring),
            (5, Season::Spring),
            (6, Season::Summer),
            (7, Season::Summer),
            (8, Season::Summer),
            (9, Season::Autumn),
            (10, Season::Autumn),
            (11, Season::Autumn),
            (12, Season::Winter),
        ];
        for (month, season) in expected {
            assert_eq!(Season::of_month(month), Some(season), "month {month}");
        }
        assert_eq!(Season::of_month(0), None);
        assert_eq!(Season::of_month(13), None);
    }

    #[test]
    fn test_season_depends_on_month_only() {
        for year in [1999, 2020, 2024] {
            for month in 1..=12 {
                let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
                let last = NaiveDate::from_ymd_opt(year, month, 28).unwrap();
                let season = Season::of_date(&first);
                assert_eq!(season, Season::of_date(&last));
                assert_eq!(Some(season), Season::of_month(month));
                assert!(Season::ALL.contains(&season));
            }
        }
    }

    #[test]
    fn test_of_timestamp_ignores_time_of_day() {
        let late = NaiveDate::from_ymd_opt(2023, 2, 28)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(Season::of(&late), Season::Winter);
        let leap = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(Season::of(&leap), Season::Winter);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Winter".parse::<Season>().unwrap(), Season::Winter);
        assert_eq!(" fall ".parse::<Season>().unwrap(), Season::Autumn);
        assert_eq!("AUTUMN".parse::<Season>().unwrap(), Season::Autumn);
        assert!("monsoon".parse::<Season>().is_err());
        assert_eq!(Season::Summer.to_string(), "summer");
    }
}
