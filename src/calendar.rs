//! Calendar breakdown of event timestamps
//!
//! Event times arrive as epoch milliseconds. They are turned into a
//! wall-clock `start_time` (UTC, no zone attached) and broken down into the
//! integer columns of the time dimension, all as engine expressions.

/// Epoch milliseconds to a wall-clock timestamp
pub fn start_time_sql(ts: &str) -> String {
    format!("epoch_ms({ts})")
}

/// One derived calendar column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarField {
    Hour,
    Day,
    /// ISO-8601 week of year
    Week,
    Month,
    Year,
    /// 1 = Sunday through 7 = Saturday
    Weekday,
}

impl CalendarField {
    /// Every field in time-table column order
    pub const ALL: [CalendarField; 6] = [
        Self::Hour,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Year,
        Self::Weekday,
    ];

    /// Output column name
    pub fn name(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Weekday => "weekday",
        }
    }

    /// INTEGER expression for this field of a timestamp expression
    pub fn sql(self, start_time: &str) -> String {
        let expr = match self {
            Self::Hour => format!("hour({start_time})"),
            Self::Day => format!("dayofmonth({start_time})"),
            Self::Week => format!("weekofyear({start_time})"),
            Self::Month => format!("month({start_time})"),
            Self::Year => format!("year({start_time})"),
            // dayofweek counts from Sunday = 0
            Self::Weekday => format!("dayofweek({start_time}) + 1"),
        };
        format!("CAST({expr} AS INTEGER)")
    }
}
