use chrono::{Datelike, NaiveDate, Utc};

/// Oldest year accepted for a bare `yyyy` fragment.
pub const MIN_BARE_YEAR: i32 = 1900;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    DayMonthYear,
    MonthDayYear,
    YearMonthDay,
    IsoYearMonthDay,
}

impl DateFormat {
    /// Tried in this order; the first format that parses wins.
    pub const PRIORITY: [DateFormat; 4] = [
        DateFormat::DayMonthYear,
        DateFormat::MonthDayYear,
        DateFormat::YearMonthDay,
        DateFormat::IsoYearMonthDay,
    ];

    fn separator(self) -> char {
        match self {
            DateFormat::IsoYearMonthDay => '-',
            _ => '/',
        }
    }

    fn parse(self, fragment: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = fragment.split(self.separator()).collect();
        let [first, second, third] = parts.as_slice() else {
            return None;
        };

        let (year, month, day) = match self {
            DateFormat::DayMonthYear => (third, second, first),
            DateFormat::MonthDayYear => (third, first, second),
            DateFormat::YearMonthDay | DateFormat::IsoYearMonthDay => (first, second, third),
        };

        let year = digits(year, 4..=4).filter(|year| *year >= 1)?;
        let month = digits(month, 1..=2)?;
        let day = digits(day, 1..=2)?;
        NaiveDate::from_ymd_opt(year as i32, month, day)
    }
}

fn digits(part: &str, width: std::ops::RangeInclusive<usize>) -> Option<u32> {
    if !width.contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Turns date fragments into calendar dates, rejecting years after `current_year`.
#[derive(Debug, Clone, Copy)]
pub struct DateParser {
    current_year: i32,
}

impl DateParser {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn for_date(today: NaiveDate) -> Self {
        Self::new(today.year())
    }

    pub fn today() -> Self {
        Self::for_date(Utc::now().date_naive())
    }

    pub fn parse(&self, fragment: &str) -> Option<NaiveDate> {
        if let Some(date) = DateFormat::PRIORITY
            .iter()
            .find_map(|format| format.parse(fragment))
        {
            return (date.year() <= self.current_year).then_some(date);
        }

        let year = digits(fragment, 4..=4)? as i32;
        if (MIN_BARE_YEAR..=self.current_year).contains(&year) {
            NaiveDate::from_ymd_opt(year, 1, 1)
        } else {
            None
        }
    }
}
