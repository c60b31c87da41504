use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::Error;
use crate::Result;

/// A timestamp representable by OpenPGP.
///
/// OpenPGP timestamps are 32-bit unsigned seconds since the Unix
/// epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u32);

// An offset, in seconds, applied to the wall clock.  Used only for
// testing and replaying recorded sessions; see
// `Timestamp::set_faked_system_time`.
static CLOCK_OFFSET: AtomicI64 = AtomicI64::new(0);

impl From<Timestamp> for u32 {
    fn from(t: Timestamp) -> Self {
        t.0
    }
}

impl From<u32> for Timestamp {
    fn from(t: u32) -> Self {
        Timestamp(t)
    }
}

impl TryFrom<SystemTime> for Timestamp {
    type Error = anyhow::Error;

    fn try_from(t: SystemTime) -> Result<Self> {
        match t.duration_since(UNIX_EPOCH) {
            Ok(d) if d.as_secs() <= u32::MAX as u64 =>
                Ok(Timestamp(d.as_secs() as u32)),
            _ => Err(Error::InvalidArgument(
                format!("Time exceeds u32 epoch: {:?}", t)).into()),
        }
    }
}

impl From<Timestamp> for SystemTime {
    fn from(t: Timestamp) -> Self {
        UNIX_EPOCH + std::time::Duration::new(t.0 as u64, 0)
    }
}

impl Timestamp {
    /// Returns the current time, respecting a configured fake system
    /// time.
    pub fn now() -> Timestamp {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let t = wall + CLOCK_OFFSET.load(Ordering::Relaxed);
        Timestamp(t.clamp(0, u32::MAX as i64) as u32)
    }

    /// Fakes the system time.
    ///
    /// All subsequent calls to [`Timestamp::now`] in this process
    /// return `t` plus the real time elapsed since this call.  `None`
    /// restores the wall clock.  This is a process-wide testing and
    /// replay facility, never to be enabled in normal operation.
    pub fn set_faked_system_time(t: Option<Timestamp>) {
        match t {
            None => CLOCK_OFFSET.store(0, Ordering::Relaxed),
            Some(t) => {
                let wall = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                CLOCK_OFFSET.store(t.0 as i64 - wall, Ordering::Relaxed);
            },
        }
    }

    /// Adds a duration to this timestamp, saturating at the end of
    /// the epoch.
    pub fn saturating_add(&self, d: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(d.0))
    }

    /// Returns the time elapsed from `earlier` to `self`, or `None`
    /// if `earlier` is later than `self`.
    pub fn duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Civil date from days since the epoch, using the usual
        // proleptic Gregorian day-count arithmetic.
        let secs = self.0 as i64;
        let days = secs.div_euclid(86400) + 719468;
        let secs_of_day = secs.rem_euclid(86400);
        let era = days.div_euclid(146097);
        let doe = days.rem_euclid(146097);
        let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
        let y = yoe + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let d = doy - (153 * mp + 2) / 5 + 1;
        let m = if mp < 10 { mp + 3 } else { mp - 9 };
        let y = if m <= 2 { y + 1 } else { y };

        write!(f, "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
               y, m, d,
               secs_of_day / 3600, (secs_of_day / 60) % 60, secs_of_day % 60)
    }
}

/// A duration representable by OpenPGP.
///
/// Used for key and signature validity periods, which are stored as
/// 32-bit seconds relative to the creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(u32);

impl From<Duration> for u32 {
    fn from(d: Duration) -> Self {
        d.0
    }
}

impl From<u32> for Duration {
    fn from(d: u32) -> Self {
        Duration(d)
    }
}

impl Duration {
    /// Returns a duration of `n` seconds.
    pub fn seconds(n: u32) -> Duration {
        Duration(n)
    }

    /// Returns a duration of `n` days.
    pub fn days(n: u32) -> Result<Duration> {
        n.checked_mul(24 * 60 * 60)
            .map(Duration)
            .ok_or_else(|| Error::InvalidArgument(
                format!("Duration exceeds u32 seconds: {} days", n)).into())
    }

    /// Returns a duration of `n` weeks.
    pub fn weeks(n: u32) -> Result<Duration> {
        n.checked_mul(7 * 24 * 60 * 60)
            .map(Duration)
            .ok_or_else(|| Error::InvalidArgument(
                format!("Duration exceeds u32 seconds: {} weeks", n)).into())
    }

    /// Returns a duration of `n` 30-day months.
    pub fn months(n: u32) -> Result<Duration> {
        n.checked_mul(30 * 24 * 60 * 60)
            .map(Duration)
            .ok_or_else(|| Error::InvalidArgument(
                format!("Duration exceeds u32 seconds: {} months", n)).into())
    }

    /// Returns a duration of `n` 365-day years.
    pub fn years(n: u32) -> Result<Duration> {
        n.checked_mul(365 * 24 * 60 * 60)
            .map(Duration)
            .ok_or_else(|| Error::InvalidArgument(
                format!("Duration exceeds u32 seconds: {} years", n)).into())
    }

    /// Returns the duration in seconds.
    pub fn as_secs(&self) -> u64 {
        self.0 as u64
    }
}
