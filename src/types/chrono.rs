//! Date and time parameters (chrono crate).
//!
//! Values are sent as ISO 8601 text, which the engine casts on its side.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use super::{Param, ToParam};

impl ToParam for NaiveDate {
    fn to_param(&self) -> Param {
        Param::Text(self.format("%Y-%m-%d").to_string())
    }
}

impl ToParam for NaiveTime {
    fn to_param(&self) -> Param {
        Param::Text(self.format("%H:%M:%S%.f").to_string())
    }
}

impl ToParam for NaiveDateTime {
    fn to_param(&self) -> Param {
        Param::Text(self.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

impl<Tz: TimeZone> ToParam for DateTime<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    fn to_param(&self) -> Param {
        Param::Text(self.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
    }
}
