//! Calendar arithmetic and display labels for tracked periods.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

const ARABIC: [&str; 12] = [
    "يناير", "فبراير", "مارس", "أبريل", "مايو", "يونيو", "يوليو", "أغسطس", "سبتمبر", "أكتوبر",
    "نوفمبر", "ديسمبر",
];

const ENGLISH: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonthNaming {
    #[default]
    Arabic,
    English,
}

impl MonthNaming {
    /// Name for a 1-based month number.
    pub fn month_name(self, month: u32) -> &'static str {
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            MonthNaming::Arabic => ARABIC[idx],
            MonthNaming::English => ENGLISH[idx],
        }
    }
}

impl FromStr for MonthNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arabic" | "ar" => Ok(MonthNaming::Arabic),
            "english" | "en" => Ok(MonthNaming::English),
            other => Err(format!("unknown month naming '{other}'")),
        }
    }
}

impl fmt::Display for MonthNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MonthNaming::Arabic => "arabic",
            MonthNaming::English => "english",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// `سبتمبر 2026`
    pub fn full_label(self, naming: MonthNaming) -> String {
        format!("{} {}", naming.month_name(self.month), self.year)
    }

    /// `سبتمبر 26`
    pub fn short_label(self, naming: MonthNaming) -> String {
        format!("{} {:02}", naming.month_name(self.month), self.year.rem_euclid(100))
    }
}

/// Every month of `today`'s year before the current one, most recent first.
pub fn months_since_january(today: NaiveDate) -> Vec<YearMonth> {
    let year = today.year();
    (1..today.month())
        .rev()
        .map(|month| YearMonth { year, month })
        .collect()
}
