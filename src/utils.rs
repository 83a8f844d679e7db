// Utility functions
use chrono::{Datelike, Month, NaiveDate, Weekday};

/// Upper-case English weekday name, e.g. `FRIDAY`.
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// English weekday name as written in messages, e.g. `Friday`.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Upper-case English month name of the given date, e.g. `NOVEMBER`.
pub fn month_label(date: NaiveDate) -> String {
    Month::try_from(date.month() as u8)
        .map(|m| m.name().to_uppercase())
        .unwrap_or_default()
}
