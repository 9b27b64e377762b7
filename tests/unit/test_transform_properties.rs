use chrono::{TimeZone, Utc};
use firemigrate::core::classifier::{classify_field, classify_value, resolve_collection, PathOnlyReferences};
use firemigrate::core::placement::{PlacementRouter, RouteOutcome};
use firemigrate::core::record::{project_record, SourceRecord};
use firemigrate::core::types::ErrorCategory;
use firemigrate::core::value::{SourceValue, TargetValue};

#[test]
fn numbers_come_back_unchanged() {
    let cases = vec![
        (SourceValue::Int(0), TargetValue::Integer(0)),
        (SourceValue::Int(-17), TargetValue::Integer(-17)),
        (SourceValue::Double(2.5), TargetValue::Double(2.5)),
        (SourceValue::Bool(true), TargetValue::Boolean(true)),
        (SourceValue::text("42"), TargetValue::from("42")),
        (SourceValue::text(" 3.14 "), TargetValue::from(" 3.14 ")),
        (SourceValue::text("1e3"), TargetValue::from("1e3")),
    ];
    for (input, expected) in cases {
        assert_eq!(
            classify_value(&input, "weight", &PathOnlyReferences).unwrap(),
            expected,
            "{input:?}"
        );
    }
}

#[test]
fn timestamp_strings_parse_with_and_without_fraction() {
    let fractional = classify_value(
        &SourceValue::text("2021-05-01 10:00:00.250"),
        "dateModified",
        &PathOnlyReferences,
    )
    .unwrap();
    let expected = Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap()
        + chrono::Duration::milliseconds(250);
    assert_eq!(fractional, TargetValue::Timestamp(expected));

    let whole = classify_value(
        &SourceValue::text("2019-12-31 23:59:59"),
        "dateAdded",
        &PathOnlyReferences,
    )
    .unwrap();
    assert_eq!(
        whole,
        TargetValue::Timestamp(Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap())
    );
}

#[test]
fn timestamp_lookalikes_that_fail_to_parse_are_fatal() {
    for text in ["2021-13-01 10:00:00", "2021-02-30 10:00:00.000", "2021-05-01 10:00:00.123abc"] {
        let err = classify_value(&SourceValue::text(text), "dateAdded", &PathOnlyReferences)
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::TimestampError, "{text}");
    }
}

#[test]
fn near_timestamps_stay_strings() {
    for text in ["2021-05-01", "2021-05-01T10:00:00Z", "2021-05-01 10:00:00 UTC"] {
        assert_eq!(
            classify_value(&SourceValue::text(text), "dateAdded", &PathOnlyReferences).unwrap(),
            TargetValue::from(text),
        );
    }
}

#[test]
fn list_conversion_maps_the_scalar_converter() {
    let items = vec![
        SourceValue::object_id("t1"),
        SourceValue::Int(3),
        SourceValue::text("2020-01-01 00:00:00"),
        SourceValue::text("plain"),
    ];
    let mapped: Vec<TargetValue> = items
        .iter()
        .map(|item| classify_value(item, "tags", &PathOnlyReferences).unwrap())
        .collect();
    assert_eq!(
        classify_field(&SourceValue::Array(items), "tags", &PathOnlyReferences).unwrap(),
        TargetValue::Array(mapped)
    );
}

#[test]
fn references_follow_field_name_precedence() {
    let cases = [
        ("addedUser", "users"),
        ("gameUser", "users"),
        ("duration", "gamemetadatas"),
        ("playerCount", "gamemetadatas"),
        ("playerCountMax", "playerCountMax"),
        ("tags", "tags"),
        ("gametag", "tags"),
        ("game", "games"),
        ("team", "team"),
    ];
    for (field, collection) in cases {
        assert_eq!(resolve_collection(field), collection, "{field}");
        let value = classify_value(&SourceValue::object_id("abc"), field, &PathOnlyReferences).unwrap();
        assert_eq!(
            value.as_reference().map(ToString::to_string),
            Some(format!("{collection}/abc"))
        );
    }
}

#[test]
fn is_deleted_iff_date_deleted_present() {
    let base = SourceRecord::new().with("_id", SourceValue::object_id("x1"));
    let cases = vec![
        (base.clone(), false),
        (base.clone().with("dateDeleted", SourceValue::Null), false),
        (base.clone().with("dateDeleted", SourceValue::text("2020-01-01 00:00:00")), true),
        (
            base.with("dateDeleted", SourceValue::DateTime(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())),
            true,
        ),
    ];
    for (record, deleted) in cases {
        let target = project_record(&record, &[], &PathOnlyReferences).unwrap();
        assert_eq!(target.get("isDeleted"), Some(&TargetValue::Boolean(deleted)));
    }
}

#[test]
fn special_collections_land_one_level_under_their_parent() {
    let mut router = PlacementRouter::default();
    router
        .route("names", "n1", &SourceRecord::new().with("game", SourceValue::object_id("g1")))
        .unwrap();

    let cases = [
        ("names", "game", "g2", "games/g2/names/r1"),
        ("namevotes", "name", "n1", "games/g1/namevotes/r1"),
        ("invites", "team", "t1", "teams/t1/invites/r1"),
        ("histories", "user", "u1", "users/u1/histories/r1"),
    ];
    for (collection, field, parent, expected) in cases {
        let record = SourceRecord::new().with(field, SourceValue::object_id(parent));
        match router.route(collection, "r1", &record).unwrap() {
            RouteOutcome::Placed(placement) => {
                assert_eq!(placement.path.to_string(), expected);
                let projected = project_record(&record, placement.suppressed, &PathOnlyReferences).unwrap();
                assert!(!projected.contains(field), "{collection} keeps {field}");
            }
            RouteOutcome::Skipped { reason } => panic!("{collection} skipped: {reason}"),
        }
    }
}

#[test]
fn converted_lists_never_hold_lists() {
    let nested = SourceValue::Array(vec![
        SourceValue::Array(vec![SourceValue::object_id("t1")]),
        SourceValue::Array(vec![]),
        SourceValue::text("plain"),
    ]);
    let TargetValue::Array(items) = classify_field(&nested, "tags", &PathOnlyReferences).unwrap() else {
        panic!("top-level list should stay a list");
    };
    assert!(items.iter().all(|item| !matches!(item, TargetValue::Array(_))));
    assert_eq!(items[0], TargetValue::from("[t1]"));
    assert_eq!(items[1], TargetValue::from("[]"));
}
