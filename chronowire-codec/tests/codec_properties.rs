//! Property tests for the text temporal codec.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use chronowire_codec::TextTemporalCodec;
use chronowire_core::{PgType, TemporalCodec, TemporalKind, Zone};
use proptest::prelude::*;

// Local strategies: chronowire-test-utils depends on this crate.
fn arb_fixed_zone() -> impl Strategy<Value = Zone> {
    (-14 * 60..=14 * 60i32).prop_filter_map("offset in range", |minutes| {
        Zone::from_offset_seconds(minutes * 60).ok()
    })
}

fn arb_zone() -> impl Strategy<Value = Zone> {
    prop_oneof![
        arb_fixed_zone(),
        prop::sample::select(vec![
            Tz::Europe__Berlin,
            Tz::America__New_York,
            Tz::Asia__Kathmandu,
            Tz::Australia__Lord_Howe,
        ])
        .prop_map(Zone::Named),
    ]
}

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (-2_208_988_800i64..4_102_444_800i64, 0u32..1_000_000).prop_filter_map(
        "representable instant",
        |(secs, micros)| DateTime::from_timestamp(secs, micros * 1_000),
    )
}

proptest! {
    #[test]
    fn prop_timestamptz_text_pins_instant(
        instant in arb_instant(),
        writer in arb_zone(),
        reader in arb_zone(),
    ) {
        let codec = TextTemporalCodec::new();
        let param = codec.encode(TemporalKind::Timestamp, &instant, &writer).unwrap();
        let bytes = param.bytes.unwrap();
        let decoded = codec
            .decode(TemporalKind::Timestamp, PgType::TimestampTz, &bytes, &reader)
            .unwrap();
        prop_assert_eq!(decoded, instant);
    }

    #[test]
    fn prop_date_decodes_to_local_midnight(instant in arb_instant(), zone in arb_fixed_zone()) {
        let codec = TextTemporalCodec::new();
        let param = codec.encode(TemporalKind::Date, &instant, &zone).unwrap();
        prop_assert_eq!(param.pg_type, PgType::Date);

        let decoded = codec
            .decode(TemporalKind::Date, PgType::Date, &param.bytes.unwrap(), &zone)
            .unwrap();
        let local = zone.to_local(&decoded).unwrap();
        prop_assert_eq!(local.date(), zone.to_local(&instant).unwrap().date());
        prop_assert_eq!(local.time(), NaiveTime::MIN);
    }

    #[test]
    fn prop_time_keeps_wall_clock(instant in arb_instant(), zone in arb_fixed_zone()) {
        let codec = TextTemporalCodec::new();
        let param = codec.encode(TemporalKind::Time, &instant, &zone).unwrap();
        let decoded = codec
            .decode(TemporalKind::Time, PgType::Time, &param.bytes.unwrap(), &zone)
            .unwrap();
        let local = zone.to_local(&decoded).unwrap();
        prop_assert_eq!(local.time(), zone.to_local(&instant).unwrap().time());
        prop_assert_eq!(local.date(), NaiveDate::default());
    }

    #[test]
    fn prop_encoding_depends_only_on_inputs(instant in arb_instant(), zone in arb_zone()) {
        let first = TextTemporalCodec::new().encode(TemporalKind::Timestamp, &instant, &zone);
        let second = TextTemporalCodec::new().encode(TemporalKind::Timestamp, &instant, &zone);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_plain_timestamp_column_reads_in_zone() {
    let codec = TextTemporalCodec::new();
    let bytes = b"2016-01-31 03:00:00";
    let east = codec
        .decode(
            TemporalKind::Timestamp,
            PgType::Timestamp,
            bytes,
            &Zone::parse("GMT+8:00").unwrap(),
        )
        .unwrap();
    let west = codec
        .decode(
            TemporalKind::Timestamp,
            PgType::Timestamp,
            bytes,
            &Zone::parse("GMT-2:00").unwrap(),
        )
        .unwrap();
    assert_eq!((west - east).num_hours(), 10);
}
