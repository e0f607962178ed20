use chrono::{Datelike, NaiveDate, Weekday};

/// Number of weekdays in `[start, end)`, negative when `end` precedes
/// `start`. Exchange holidays are not modelled.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return -business_days_between(end, start);
    }
    let days = (end - start).num_days();
    let mut count = (days / 7) * 5;
    let mut weekday = start.weekday();
    for _ in 0..days % 7 {
        if is_weekday(weekday) {
            count += 1;
        }
        weekday = weekday.succ();
    }
    count
}

fn is_weekday(day: Weekday) -> bool {
    !matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Standard monthly expirations fall on the third Friday.
pub fn is_third_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri && (15..=21).contains(&date.day())
}

/// Time to expiry in business-day years. Same-day and already-past
/// expirations are floored to one business day.
pub fn years_to_expiry(as_of: NaiveDate, expiration: NaiveDate, business_days_per_year: f64) -> f64 {
    business_days_between(as_of, expiration).max(1) as f64 / business_days_per_year
}
