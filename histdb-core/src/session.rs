//! Trading-session time normalization.
//!
//! The exchange publishes daily data against civil wall-clock times in
//! America/New_York: the open at 09:30 and the close at 16:00. Everything
//! stored downstream is a UTC instant, so the same calendar date maps to a
//! different UTC offset depending on whether the exchange is on EST or EDT.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use thiserror::Error;

/// Exchange time zone all session times are defined in.
pub const EXCHANGE_TZ: Tz = New_York;

/// A trading-day event with a fixed local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Session {
    /// 09:30:00 exchange-local.
    Open,
    /// 16:00:00 exchange-local.
    Close,
}

impl Session {
    /// Exchange-local wall-clock time of this session.
    pub fn local_time(self) -> NaiveTime {
        match self {
            Session::Open => NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            Session::Close => NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        }
    }
}

/// Errors from resolving a session's civil time on a specific date.
///
/// US DST transitions happen at 02:00 local, so 09:30 and 16:00 can never
/// actually be ambiguous or skipped; these variants fire only if the zone
/// data is broken, and the run fails loudly rather than picking an offset.
#[derive(Debug, Error)]
pub enum SessionTimeError {
    #[error("local time {time} on {date} is ambiguous in {zone}")]
    Ambiguous {
        date: NaiveDate,
        time: NaiveTime,
        zone: Tz,
    },

    #[error("local time {time} on {date} does not exist in {zone}")]
    Nonexistent {
        date: NaiveDate,
        time: NaiveTime,
        zone: Tz,
    },
}

/// Resolves a calendar date plus a session into an absolute UTC instant,
/// honoring the exchange zone's DST rules for that date.
pub fn session_instant(date: NaiveDate, session: Session) -> Result<DateTime<Utc>, SessionTimeError> {
    let time = session.local_time();
    match EXCHANGE_TZ.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, _) => Err(SessionTimeError::Ambiguous {
            date,
            time,
            zone: EXCHANGE_TZ,
        }),
        LocalResult::None => Err(SessionTimeError::Nonexistent {
            date,
            time,
            zone: EXCHANGE_TZ,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn open_maps_to_1430_utc_in_winter() {
        // EST is UTC-5: 09:30 local -> 14:30 UTC.
        let instant = session_instant(date(2024, 1, 2), Session::Open).unwrap();
        assert_eq!(instant.hour(), 14);
        assert_eq!(instant.minute(), 30);
    }

    #[test]
    fn close_maps_to_2000_utc_in_summer() {
        // EDT is UTC-4: 16:00 local -> 20:00 UTC.
        let instant = session_instant(date(2024, 7, 1), Session::Close).unwrap();
        assert_eq!(instant.hour(), 20);
        assert_eq!(instant.minute(), 0);
    }

    #[test]
    fn offset_shifts_one_hour_across_spring_forward() {
        // 2024 spring-forward was Sunday 2024-03-10.
        let before = session_instant(date(2024, 3, 8), Session::Open).unwrap();
        let after = session_instant(date(2024, 3, 11), Session::Open).unwrap();
        assert_eq!(before.hour(), 14);
        assert_eq!(after.hour(), 13);
    }

    #[test]
    fn offset_shifts_one_hour_across_fall_back() {
        // 2024 fall-back was Sunday 2024-11-03.
        let before = session_instant(date(2024, 11, 1), Session::Close).unwrap();
        let after = session_instant(date(2024, 11, 4), Session::Close).unwrap();
        assert_eq!(before.hour(), 20);
        assert_eq!(after.hour(), 21);
    }

    #[test]
    fn open_and_close_are_six_and_a_half_hours_apart() {
        for d in [date(2024, 1, 2), date(2024, 3, 11), date(2024, 7, 1)] {
            let open = session_instant(d, Session::Open).unwrap();
            let close = session_instant(d, Session::Close).unwrap();
            assert_eq!(close - open, chrono::Duration::minutes(390));
        }
    }
}
