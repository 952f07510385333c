use std::time::Duration;

/// Per-lock tuning. Built by the caller from whatever config layer it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSettings {
    pub device_id: String,
    pub poll_interval: Duration,
    /// `None` disables auto-lock.
    pub auto_lock_delay: Option<Duration>,
}

impl LockSettings {
    pub fn new(device_id: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            device_id: device_id.into(),
            poll_interval,
            auto_lock_delay: None,
        }
    }

    /// `0` disables auto-lock.
    pub fn with_auto_lock_minutes(mut self, minutes: u32) -> Self {
        self.auto_lock_delay = if minutes == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(minutes) * 60))
        };
        self
    }

    /// A session that has not converged after two polls is abandoned.
    pub fn watchdog_timeout(&self) -> Duration {
        self.poll_interval * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchdog_is_two_poll_intervals() {
        let s = LockSettings::new("front-door", Duration::from_millis(5_000));
        assert_eq!(s.watchdog_timeout(), Duration::from_millis(10_000));
    }

    #[test]
    fn zero_minutes_disables_auto_lock() {
        let s = LockSettings::new("front-door", Duration::from_secs(5)).with_auto_lock_minutes(0);
        assert_eq!(s.auto_lock_delay, None);
    }

    #[test]
    fn minutes_convert_to_seconds() {
        let s = LockSettings::new("front-door", Duration::from_secs(5)).with_auto_lock_minutes(3);
        assert_eq!(s.auto_lock_delay, Some(Duration::from_secs(180)));
    }
}
