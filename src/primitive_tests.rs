// src/primitive_tests.rs
#[cfg(test)]
mod tests {
    use crate::descriptor::PrimitiveKind;
    use crate::primitives::*;
    use crate::{SerializationError, TimeSpan, Value};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uuid::Uuid;

    fn is_malformed<T: std::fmt::Debug>(result: Result<T, SerializationError>) -> bool {
        matches!(result, Err(SerializationError::MalformedValue { .. }))
    }

    #[test]
    fn test_boolean_words_match_in_any_case() {
        for (text, expected) in [
            ("True", true),
            ("true", true),
            ("TRUE", true),
            ("tRuE", true),
            ("False", false),
            ("false", false),
            ("FALSE", false),
        ] {
            assert_eq!(decode_boolean(text).unwrap(), expected, "{text}");
        }
    }

    #[test]
    fn test_boolean_digits_use_the_strict_parser() {
        assert!(decode_boolean("1").unwrap());
        assert!(!decode_boolean("0").unwrap());
        assert!(decode_boolean(" 1\n").unwrap());
        assert!(decode_boolean("\ttrue ").unwrap());

        for text in ["yes", "2", "", "on", " TRUE "] {
            assert!(is_malformed(decode_boolean(text)), "{text:?} should be rejected");
        }
    }

    #[test]
    fn test_boolean_encodes_lowercase() {
        assert_eq!(encode_boolean(true), "true");
        assert_eq!(encode_boolean(false), "false");
    }

    #[test]
    fn test_char_single_character_or_code_point() {
        assert_eq!(decode_char("A").unwrap(), 'A');
        assert_eq!(decode_char("65").unwrap(), 'A');
        assert_eq!(encode_char('A'), "65");

        // One character is never read as a digit code point
        assert_eq!(decode_char("7").unwrap(), '7');
        assert_eq!(decode_char("é").unwrap(), 'é');
        assert_eq!(decode_char("233").unwrap(), 'é');
    }

    #[test]
    fn test_char_rejects_bad_code_points() {
        assert!(is_malformed(decode_char("AB")));
        assert!(is_malformed(decode_char("")));
        assert!(is_malformed(decode_char("-1")));
        assert!(is_malformed(decode_char("55296"))); // lone surrogate
    }

    #[test]
    fn test_duration_round_trip() {
        let span = TimeSpan::from_ticks(12345);
        assert_eq!(encode_duration(span), "12345");
        assert_eq!(decode_duration(&encode_duration(span)).unwrap(), span);
        assert!(is_malformed(decode_duration("1.5")));
    }

    #[test]
    fn test_null_marker_ignores_text() {
        for text in ["", "anything", "<DBNull />", "\0"] {
            assert_eq!(decode_null_marker(text), Value::DbNull);
        }
    }

    #[test]
    fn test_date_time_is_utc_with_trimmed_fraction() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(encode_date_time(&whole).unwrap(), "2024-03-09T14:05:00Z");

        let fractional = whole + chrono::TimeDelta::nanoseconds(123_400_000);
        assert_eq!(encode_date_time(&fractional).unwrap(), "2024-03-09T14:05:00.1234Z");
        assert_eq!(decode_date_time("2024-03-09T14:05:00.1234Z").unwrap(), fractional);
    }

    #[test]
    fn test_date_time_decode_normalizes_to_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(decode_date_time("2024-03-09T14:00:00+02:00").unwrap(), expected);
        assert_eq!(decode_date_time("2024-03-09T12:00:00").unwrap(), expected);
        assert_eq!(
            decode_date_time("2024-03-09").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()
        );
        assert!(is_malformed(decode_date_time("09/03/2024")));
    }

    #[test]
    fn test_date_time_years_stay_four_digits() {
        let first = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(encode_date_time(&first).unwrap(), "0001-01-01T00:00:00Z");
        assert_eq!(encode_date_time(&last).unwrap(), "9999-12-31T23:59:59Z");
        assert_eq!(decode_date_time("0001-01-01T00:00:00Z").unwrap(), first);
        assert_eq!(decode_date_time("9999-12-31T23:59:59Z").unwrap(), last);

        for year in [0, -1, 10000, 262142] {
            let value = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
            assert!(is_malformed(encode_date_time(&value)), "year {year}");
        }
        assert!(is_malformed(decode_date_time("0000-01-01T00:00:00Z")));
        assert!(is_malformed(decode_date_time("0001-01-01T00:30:00+01:00")));
    }

    #[test]
    fn test_guid_forms() {
        let guid = Uuid::from_str("6f9619ff-8b86-d011-b42d-00cf4fc964ff").unwrap();
        assert_eq!(encode_guid(&guid), "6f9619ff-8b86-d011-b42d-00cf4fc964ff");

        for text in [
            "6F9619FF-8B86-D011-B42D-00CF4FC964FF",
            "6f9619ff8b86d011b42d00cf4fc964ff",
            "{6f9619ff-8b86-d011-b42d-00cf4fc964ff}",
        ] {
            assert_eq!(decode_guid(text).unwrap(), guid, "{text}");
        }
        assert!(is_malformed(decode_guid("not-a-guid")));
    }

    #[test]
    fn test_numbers_are_culture_invariant() {
        assert_eq!(encode_double(1.5), "1.5");
        assert_eq!(encode_double(-0.25), "-0.25");
        assert_eq!(encode_double(f64::INFINITY), "Infinity");
        assert_eq!(encode_double(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(encode_double(f64::NAN), "NaN");
        assert_eq!(decode_double("-Infinity").unwrap(), f64::NEG_INFINITY);
        assert!(decode_double("NaN").unwrap().is_nan());
        assert_eq!(decode_double("1E+300").unwrap(), 1e300);

        // A comma is never a decimal separator
        assert!(is_malformed(decode_double("1,5")));
        assert!(is_malformed(decode_decimal("1,5")));
        assert_eq!(decode_decimal("1.50").unwrap(), Decimal::new(150, 2));

        assert_eq!(decode_integer::<i32>(" +42 ", "System.Int32").unwrap(), 42);
        assert!(is_malformed(decode_integer::<u8>("256", "System.Byte")));
        assert!(is_malformed(decode_integer::<i16>("12abc", "System.Int16")));
    }

    #[test]
    fn test_integer_values_convert_between_widths() {
        assert_eq!(encode_primitive(PrimitiveKind::Int64, &Value::Int16(-7)).unwrap(), "-7");
        assert_eq!(encode_primitive(PrimitiveKind::Byte, &Value::Int32(200)).unwrap(), "200");
        assert_eq!(encode_primitive(PrimitiveKind::Decimal, &Value::Int32(3)).unwrap(), "3");
        assert!(is_malformed(encode_primitive(PrimitiveKind::Byte, &Value::Int32(-1))));
    }

    #[test]
    fn test_wrong_value_kind_is_a_mismatch() {
        let result = encode_primitive(PrimitiveKind::Boolean, &Value::from("true"));
        assert_eq!(
            result,
            Err(SerializationError::TypeMismatch {
                expected: "System.Boolean",
                found: "string",
            })
        );
        assert!(matches!(
            encode_primitive(PrimitiveKind::Int32, &Value::Double(1.0)),
            Err(SerializationError::TypeMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_int64_round_trips(v in any::<i64>()) {
            let text = encode_primitive(PrimitiveKind::Int64, &Value::Int64(v)).unwrap();
            let decoded = decode_primitive(PrimitiveKind::Int64, &text).unwrap();
            prop_assert_eq!(decoded, Value::Int64(v));
        }

        #[test]
        fn prop_finite_doubles_round_trip(
            v in any::<f64>().prop_filter("finite", |v| v.is_finite())
        ) {
            prop_assert_eq!(decode_double(&encode_double(v)).unwrap(), v);
        }

        // Code points 0 to 9 encode as a single digit, which reads back as that digit
        #[test]
        fn prop_chars_round_trip(
            c in any::<char>().prop_filter("multi-digit", |c| u32::from(*c) >= 10)
        ) {
            prop_assert_eq!(decode_char(&encode_char(c)).unwrap(), c);
        }

        #[test]
        fn prop_ticks_round_trip(ticks in any::<i64>()) {
            let span = TimeSpan::from_ticks(ticks);
            prop_assert_eq!(decode_duration(&encode_duration(span)).unwrap(), span);
        }

        #[test]
        fn prop_guids_round_trip(bytes in any::<[u8; 16]>()) {
            let guid = Uuid::from_bytes(bytes);
            prop_assert_eq!(decode_guid(&encode_guid(&guid)).unwrap(), guid);
        }
    }
}
