//! Weekly recurrence: a time of day on a set of weekdays

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

const DAY_CODES: [(&str, Weekday); 7] = [
    ("MON", Weekday::Mon),
    ("TUE", Weekday::Tue),
    ("WED", Weekday::Wed),
    ("THU", Weekday::Thu),
    ("FRI", Weekday::Fri),
    ("SAT", Weekday::Sat),
    ("SUN", Weekday::Sun),
];

/// Set of weekdays, stored as a bit mask (Monday = bit 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DaySet(u8);

impl DaySet {
    /// Empty set
    pub const fn empty() -> Self {
        DaySet(0)
    }

    /// Every day of the week
    pub const fn all() -> Self {
        DaySet(0b111_1111)
    }

    /// Add a day
    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    /// Check membership
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Whether no day is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Days in Monday-first order
    pub fn days(&self) -> Vec<Weekday> {
        DAY_CODES
            .iter()
            .map(|(_, day)| *day)
            .filter(|day| self.contains(*day))
            .collect()
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = DaySet::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl std::fmt::Display for DaySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<&str> = DAY_CODES
            .iter()
            .filter(|(_, day)| self.contains(*day))
            .map(|(code, _)| *code)
            .collect();
        write!(f, "{}", codes.join(","))
    }
}

impl std::str::FromStr for DaySet {
    type Err = String;

    /// Parse a comma-separated list such as `MON,WED,FRI`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = DaySet::empty();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let upper = part.to_uppercase();
            let day = DAY_CODES
                .iter()
                .find(|(code, _)| upper.starts_with(code))
                .map(|(_, day)| *day)
                .ok_or_else(|| format!("Invalid weekday: {}", part))?;
            set.insert(day);
        }
        Ok(set)
    }
}

impl Serialize for DaySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            DAY_CODES
                .iter()
                .filter(|(_, day)| self.contains(*day))
                .map(|(code, _)| *code),
        )
    }
}

impl<'de> Deserialize<'de> for DaySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let codes = Vec::<String>::deserialize(deserializer)?;
        codes.join(",").parse().map_err(serde::de::Error::custom)
    }
}

/// A recurring weekly firing time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Time of day the job fires
    pub time: NaiveTime,
    /// Days of the week the job fires on
    pub days: DaySet,
}

impl Schedule {
    /// Create a schedule
    pub fn new(time: NaiveTime, days: DaySet) -> Self {
        Self { time, days }
    }

    /// Parse a time of day as `HH:MM` or `HH:MM:SS`
    pub fn parse_time(value: &str) -> Result<NaiveTime, String> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
            .map_err(|_| format!("Invalid time of day: {}", value))
    }

    /// Whether the schedule can ever fire
    pub fn is_active(&self) -> bool {
        !self.days.is_empty()
    }

    /// First firing strictly after `after`, `None` if no day is selected
    pub fn next_fire_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        if self.days.is_empty() {
            return None;
        }
        (0..=7).find_map(|offset| {
            let date = after.date() + Duration::days(offset);
            let candidate = date.and_time(self.time);
            (self.days.contains(date.weekday()) && candidate > after).then_some(candidate)
        })
    }
}
