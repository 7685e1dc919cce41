use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Time, UtcOffset};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2026, time::Month::March, 14).unwrap();
        let time = Time::from_hms(9, 30, 0).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2026-03-14T09:30:00Z");
    }

    #[test]
    fn to_primitive_utc_normalizes_offset() {
        let date = Date::from_calendar_date(2026, time::Month::March, 14).unwrap();
        let time = Time::from_hms(12, 0, 0).unwrap();
        let offset = UtcOffset::from_hms(3, 0, 0).unwrap();
        let value = PrimitiveDateTime::new(date, time).assume_offset(offset);
        let normalized = to_primitive_utc(value);
        assert_eq!(normalized.hour(), 9);
        assert_eq!(normalized.day(), 14);
    }
}
