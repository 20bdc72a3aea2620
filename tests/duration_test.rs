use chrono::NaiveTime;
use repertoire::repertoire::duration::{
    self, Duration, DurationError, DurationInput, display_hhmm,
};
use repertoire::repertoire::form::RepertoireForm;
use serde_json::json;

fn normalize_text(text: &str) -> Result<Option<Duration>, DurationError> {
    duration::normalize(Some(DurationInput::from(text)))
}

#[test]
fn test_seconds_truncate_to_whole_minutes() {
    for secs in [0_i64, 1, 59, 60, 61, 119, 120, 5399, 5400, 5401, 86_399, 360_000] {
        let normalized = duration::normalize(Some(DurationInput::Seconds(secs)))
            .unwrap()
            .unwrap();
        assert_eq!(
            i64::from(normalized.as_seconds()),
            60 * (secs / 60),
            "seconds input {}",
            secs
        );
    }
}

#[test]
fn test_no_input_is_no_duration() {
    assert_eq!(duration::normalize(None).unwrap(), None);
    assert_eq!(normalize_text("").unwrap(), None);
    assert_eq!(normalize_text("   ").unwrap(), None);
    assert_eq!(DurationInput::from_json(&json!(null)).unwrap(), None);
}

#[test]
fn test_normalization_is_idempotent() {
    let inputs = [
        DurationInput::from("1:30"),
        DurationInput::from("01:30:45"),
        DurationInput::Seconds(5401),
        DurationInput::from(std::time::Duration::from_secs(7299)),
    ];

    for input in inputs {
        let once = input.normalize().unwrap().unwrap();
        let twice = DurationInput::from(once).normalize().unwrap().unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_display_reparse_round_trip() {
    for hours in [0_u32, 1, 9, 10, 23, 99] {
        for minutes in [0_u32, 1, 30, 59] {
            let duration = Duration::from_hours_minutes(hours, minutes).unwrap();
            let reparsed = normalize_text(&duration.to_string()).unwrap();
            assert_eq!(reparsed, Some(duration), "{}:{:02}", hours, minutes);
        }
    }
}

#[test]
fn test_edit_round_trip_past_99_hours() {
    for hours in [99_u32, 100, 250, 1193] {
        for minutes in [0_u32, 1, 59] {
            let duration = Duration::from_hours_minutes(hours, minutes).unwrap();
            let draft = RepertoireForm {
                name: "Shoah".to_string(),
                date: "1985-04-30".to_string(),
                rating: "5".to_string(),
                review: "Long.".to_string(),
                current_duration: Some(duration),
                duration: duration.to_string(),
                ..Default::default()
            }
            .validate(None)
            .unwrap();
            assert_eq!(draft.duration, Some(duration), "{}", duration);
        }
    }

    // Typed text keeps the one or two digit hour rule
    assert!(normalize_text("100:00").is_err());
}

#[test]
fn test_documented_examples() {
    assert_eq!(normalize_text("1:30").unwrap().unwrap().as_seconds(), 5400);
    assert_eq!(normalize_text("01:30:45").unwrap().unwrap().as_seconds(), 5400);

    let twelve = normalize_text("12:05").unwrap().unwrap();
    assert_eq!((twelve.hours(), twelve.minutes()), (12, 5));

    let zero = normalize_text("0:00").unwrap();
    assert_eq!(zero, Some(Duration::ZERO));
    assert_ne!(zero, None);

    let err = normalize_text("1:5").unwrap_err();
    assert_eq!(err.input(), "1:5");
    assert!(err.to_string().contains("HH:MM or HH:MM:SS"));

    assert_eq!(Duration::from_seconds(90 * 60).to_string(), "1:30");
}

#[test]
fn test_strings_never_fall_back_to_seconds() {
    for text in ["90", "5400", "1:30:5", "123:00", "1:30:45:00", "a:bc", "-1:30"] {
        assert!(normalize_text(text).is_err(), "{:?} should be rejected", text);
    }
}

#[test]
fn test_time_of_day_ignores_seconds() {
    let time = NaiveTime::from_hms_opt(2, 15, 59).unwrap();
    let duration = duration::normalize(Some(time.into())).unwrap().unwrap();
    assert_eq!(duration.as_seconds(), 2 * 3600 + 15 * 60);
}

#[test]
fn test_json_shapes() {
    let from = |value| {
        DurationInput::from_json(&value).and_then(duration::normalize)
    };

    assert_eq!(from(json!("1:30")).unwrap(), Some(Duration::from_seconds(5400)));
    assert_eq!(from(json!(5401)).unwrap(), Some(Duration::from_seconds(5400)));
    assert_eq!(from(json!(5401.9)).unwrap(), Some(Duration::from_seconds(5400)));
    assert_eq!(
        from(json!({"hour": 1, "minute": 5, "second": 30})).unwrap(),
        Some(Duration::from_seconds(3900))
    );

    assert!(from(json!(-60)).is_err());
    assert!(from(json!(true)).is_err());
    assert!(from(json!([1, 30])).is_err());
    assert!(from(json!({"minutes": 5})).is_err());
}

#[test]
fn test_serde_uses_seconds() {
    let duration = Duration::from_seconds(5400);
    assert_eq!(serde_json::to_value(duration).unwrap(), json!(5400));

    let parsed: Duration = serde_json::from_value(json!(5430)).unwrap();
    assert_eq!(parsed.as_seconds(), 5400);
}

#[test]
fn test_display_never_fails() {
    assert_eq!(display_hhmm("01:30:45"), "1:30");
    assert_eq!(display_hhmm("12:05"), "12:05");
    assert_eq!(display_hhmm("5400"), "1:30");
    assert_eq!(display_hhmm("not a duration"), "not a duration");
    assert_eq!(display_hhmm(""), "");
}
