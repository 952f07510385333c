use bolt_schemas::{BatteryStatus, SensorReading, READING_KIND_BATTERY};

/// At or below this percentage the battery is reported as low.
pub const LOW_BATTERY_THRESHOLD_PERCENT: u8 = 20;

/// A battery reading was present but could not be mapped to a percentage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedReading {
    pub kind: String,
    pub value: String,
    pub reason: &'static str,
}

impl std::fmt::Display for MalformedReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "malformed {} reading value={:?}: {}",
            self.kind, self.value, self.reason
        )
    }
}

impl std::error::Error for MalformedReading {}

/// Map the first `"battery"` reading onto a [`BatteryStatus`].
///
/// - `Ok(None)`: no battery reading; the exposed battery state must not change.
/// - `Err(_)`: the value is not an integer in `0..=100`.
pub fn map_battery(readings: &[SensorReading]) -> Result<Option<BatteryStatus>, MalformedReading> {
    let Some(reading) = readings.iter().find(|r| r.is_kind(READING_KIND_BATTERY)) else {
        return Ok(None);
    };

    let malformed = |reason| MalformedReading {
        kind: reading.kind.clone(),
        value: reading.value.clone(),
        reason,
    };

    let raw: i64 = reading
        .value
        .trim()
        .parse()
        .map_err(|_| malformed("not an integer"))?;
    let percent = u8::try_from(raw)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| malformed("outside 0..=100"))?;

    Ok(Some(BatteryStatus {
        percent,
        low: percent <= LOW_BATTERY_THRESHOLD_PERCENT,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn battery(value: &str) -> Vec<SensorReading> {
        vec![SensorReading::new("battery", value, Utc::now())]
    }

    #[test]
    fn absent_reading_produces_nothing() {
        let readings = vec![SensorReading::new("lock", "locked", Utc::now())];
        assert_eq!(map_battery(&readings), Ok(None));
    }

    #[test]
    fn threshold_is_inclusive() {
        let at = map_battery(&battery("20")).unwrap().unwrap();
        assert!(at.low);
        let above = map_battery(&battery("21")).unwrap().unwrap();
        assert!(!above.low);
        assert_eq!(above.percent, 21);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let b = map_battery(&battery(" 87\n")).unwrap().unwrap();
        assert_eq!(b.percent, 87);
    }

    #[test]
    fn non_numeric_is_malformed() {
        let err = map_battery(&battery("full")).unwrap_err();
        assert_eq!(err.reason, "not an integer");
        assert_eq!(err.value, "full");
    }

    #[test]
    fn out_of_range_is_malformed() {
        assert!(map_battery(&battery("101")).is_err());
        assert!(map_battery(&battery("-1")).is_err());
        assert!(map_battery(&battery("55.5")).is_err());
    }
}
