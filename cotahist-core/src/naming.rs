//! Artifact naming: converted-file names and period classification.
//!
//! The exchange names its files `COTAHIST_A{YYYY}.ZIP` (annual),
//! `COTAHIST_M{MM}{YYYY}.ZIP` (monthly) and `COTAHIST_D{DD}{MM}{YYYY}.ZIP`
//! (daily). [`classify`] parses a name into an [`Artifact`] once; everything
//! downstream works with the structured [`Period`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token replaced when deriving a converted name.
pub const SOURCE_TOKEN: &str = "zip";

/// Extension of converted artifacts.
pub const CONVERTED_EXTENSION: &str = "parquet";

const PREFIX: &str = "COTAHIST_";

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Replace every case-insensitive occurrence of `zip` with `parquet`.
///
/// Names without the token come back unchanged, so the function is
/// idempotent on already-converted names.
pub fn to_converted_name(name: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `name`.
    let lowered = name.to_ascii_lowercase();
    let mut out = String::with_capacity(name.len() + 4);
    let mut cursor = 0;
    while let Some(found) = lowered[cursor..].find(SOURCE_TOKEN) {
        let at = cursor + found;
        out.push_str(&name[cursor..at]);
        out.push_str(CONVERTED_EXTENSION);
        cursor = at + SOURCE_TOKEN.len();
    }
    out.push_str(&name[cursor..]);
    out
}

/// Whether a local name is a source archive (`.zip`, any case).
pub fn is_source_archive(name: &str) -> bool {
    name.len() > 4
        && name
            .get(name.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".zip"))
}

/// Period granularity of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Annual,
    Monthly,
    Daily,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Annual => write!(f, "annual"),
            Granularity::Monthly => write!(f, "monthly"),
            Granularity::Daily => write!(f, "daily"),
        }
    }
}

/// The calendar period an artifact covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "granularity", rename_all = "lowercase")]
pub enum Period {
    Annual { year: i32 },
    Monthly { year: i32, month: u32 },
    Daily { year: i32, month: u32, day: u32 },
}

impl Period {
    pub fn granularity(&self) -> Granularity {
        match self {
            Period::Annual { .. } => Granularity::Annual,
            Period::Monthly { .. } => Granularity::Monthly,
            Period::Daily { .. } => Granularity::Daily,
        }
    }

    pub fn year(&self) -> i32 {
        match *self {
            Period::Annual { year } | Period::Monthly { year, .. } | Period::Daily { year, .. } => {
                year
            }
        }
    }

    pub fn month(&self) -> Option<u32> {
        match *self {
            Period::Annual { .. } => None,
            Period::Monthly { month, .. } | Period::Daily { month, .. } => Some(month),
        }
    }

    /// Same calendar year as `date`.
    pub fn in_year_of(&self, date: NaiveDate) -> bool {
        self.year() == date.year()
    }

    /// Same calendar month and year as `date`.
    pub fn in_month_of(&self, date: NaiveDate) -> bool {
        self.in_year_of(date) && self.month() == Some(date.month())
    }

    /// Sortable key: `2000`, `2023-01`, `2026-10-01`.
    pub fn period_key(&self) -> String {
        match *self {
            Period::Annual { year } => format!("{year:04}"),
            Period::Monthly { year, month } => format!("{year:04}-{month:02}"),
            Period::Daily { year, month, day } => format!("{year:04}-{month:02}-{day:02}"),
        }
    }

    /// Label the exchange shows for the file: `2000`, `Jan/2023`, `01/10/2026`.
    pub fn label(&self) -> String {
        match *self {
            Period::Annual { year } => format!("{year}"),
            Period::Monthly { year, month } => {
                let index = month.checked_sub(1).map(|m| m as usize);
                match index.and_then(|i| MONTH_ABBREVIATIONS.get(i)) {
                    Some(abbreviation) => format!("{abbreviation}/{year}"),
                    None => format!("{month:02}/{year}"),
                }
            }
            Period::Daily { year, month, day } => format!("{day:02}/{month:02}/{year}"),
        }
    }

    /// Canonical source file name for this period.
    pub fn source_name(&self) -> String {
        match *self {
            Period::Annual { year } => format!("{PREFIX}A{year:04}.ZIP"),
            Period::Monthly { year, month } => format!("{PREFIX}M{month:02}{year:04}.ZIP"),
            Period::Daily { year, month, day } => {
                format!("{PREFIX}D{day:02}{month:02}{year:04}.ZIP")
            }
        }
    }
}

/// A named artifact with its parsed period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub period: Period,
}

impl Artifact {
    pub fn granularity(&self) -> Granularity {
        self.period.granularity()
    }
}

/// Parse an artifact name. Case-insensitive; the digits must be followed by
/// the end of the name or a `.`-extension. Returns `None` for anything else.
pub fn classify(name: &str) -> Option<Artifact> {
    let period = parse_period(name)?;
    Some(Artifact {
        name: name.to_string(),
        period,
    })
}

fn parse_period(name: &str) -> Option<Period> {
    let prefix = name.get(..PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let mut rest = name[PREFIX.len()..].chars();
    let marker = rest.next()?.to_ascii_uppercase();
    let tail = rest.as_str();

    let digit_count = tail.bytes().take_while(u8::is_ascii_digit).count();
    let digits = &tail[..digit_count];
    let after = &tail[digit_count..];
    if !(after.is_empty() || after.starts_with('.')) {
        return None;
    }

    let number = |range: std::ops::Range<usize>| digits[range].parse::<u32>().ok();

    match (marker, digit_count) {
        ('A', 4) => Some(Period::Annual {
            year: number(0..4)? as i32,
        }),
        ('M', 6) => {
            let month = number(0..2)?;
            valid_month(month).then_some(Period::Monthly {
                year: number(2..6)? as i32,
                month,
            })
        }
        ('D', 8) => {
            let day = number(0..2)?;
            let month = number(2..4)?;
            (valid_month(month) && (1..=31).contains(&day)).then_some(Period::Daily {
                year: number(4..8)? as i32,
                month,
                day,
            })
        }
        _ => None,
    }
}

fn valid_month(month: u32) -> bool {
    (1..=12).contains(&month)
}
