//! US equity regular session clock.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;

/// True when `t` falls within 09:30–16:00 New York time on a weekday.
///
/// Exchange holidays are not modelled.
pub fn is_regular_session(t: DateTime<Utc>) -> bool {
    let local = t.with_timezone(&New_York);
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let open = NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default();
    let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default();
    let now = local.time();
    now >= open && now <= close
}
