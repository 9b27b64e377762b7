//! REST wire format of the Firestore store against a mock server.

use chrono::{TimeZone, Utc};
use firemigrate::core::path::DocumentPath;
use firemigrate::core::record::TargetRecord;
use firemigrate::core::value::TargetValue;
use firemigrate::target::firestore::codec::ResourceNames;
use firemigrate::target::{CollectionQuery, DocumentStore, FirestoreStore, OrderBy};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCUMENTS: &str = "/v1/projects/demo/databases/(default)/documents";

fn store_for(server: &MockServer) -> FirestoreStore {
    FirestoreStore::unauthenticated(
        format!("{}/v1", server.uri()),
        ResourceNames::new("demo", "(default)"),
    )
}

#[tokio::test]
async fn set_patches_the_whole_document() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS}/games/g1/names/abc123")))
        .and(body_json(json!({
            "fields": {
                "weight": { "integerValue": "5" },
                "dateModified": { "timestampValue": "2021-05-01T10:00:00Z" },
                "addedUser": {
                    "referenceValue": "projects/demo/databases/(default)/documents/users/u1"
                },
                "isDeleted": { "booleanValue": false }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut record = TargetRecord::new();
    record.insert("weight", TargetValue::Integer(5));
    record.insert(
        "dateModified",
        TargetValue::Timestamp(Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap()),
    );
    record.insert(
        "addedUser",
        TargetValue::Reference(DocumentPath::parse("users/u1").unwrap()),
    );
    record.insert("isDeleted", TargetValue::Boolean(false));

    let store = store_for(&server);
    store
        .set(&DocumentPath::parse("games/g1/names/abc123").unwrap(), &record)
        .await
        .unwrap();
}

#[tokio::test]
async fn update_sends_a_field_mask_and_requires_existence() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCUMENTS}/games/g1")))
        .and(query_param("updateMask.fieldPaths", "slug"))
        .and(query_param("currentDocument.exists", "true"))
        .and(body_json(json!({
            "fields": { "slug": { "stringValue": "freeze-tag" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = TargetRecord::new();
    fields.insert("slug", TargetValue::from("freeze-tag"));

    let store = store_for(&server);
    store
        .update(&DocumentPath::parse("games/g1").unwrap(), &fields)
        .await
        .unwrap();
}

#[tokio::test]
async fn list_runs_a_filtered_ordered_query_under_the_parent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}/games/g1:runQuery")))
        .and(body_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "names" }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "isDeleted" },
                        "op": "EQUAL",
                        "value": { "booleanValue": false }
                    }
                },
                "orderBy": [
                    { "field": { "fieldPath": "weight" }, "direction": "DESCENDING" },
                    { "field": { "fieldPath": "dateAdded" }, "direction": "DESCENDING" }
                ],
                "limit": 1
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "document": {
                    "name": "projects/demo/databases/(default)/documents/games/g1/names/abc123",
                    "fields": {
                        "name": { "stringValue": "Freeze Tag" },
                        "weight": { "integerValue": "5" }
                    },
                    "createTime": "2021-05-01T10:00:00Z",
                    "updateTime": "2021-05-01T10:00:00Z"
                },
                "readTime": "2021-05-01T10:00:01Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = CollectionQuery::all("games/g1/names")
        .where_equal("isDeleted", TargetValue::Boolean(false))
        .order_by(OrderBy::descending("weight"))
        .order_by(OrderBy::descending("dateAdded"))
        .limit(1);
    let store = store_for(&server);
    let documents = store.list(&query).await.unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].path.to_string(), "games/g1/names/abc123");
    assert_eq!(documents[0].record.get("name"), Some(&TargetValue::from("Freeze Tag")));
    assert_eq!(documents[0].record.get("weight"), Some(&TargetValue::Integer(5)));
}

#[tokio::test]
async fn empty_top_level_listing_skips_read_time_entries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCUMENTS}:runQuery")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "readTime": "2021-05-01T10:00:01Z" }])),
        )
        .mount(&server)
        .await;

    let store = store_for(&server);
    let documents = store.list(&CollectionQuery::all("games")).await.unwrap();
    assert!(documents.is_empty());
}

#[tokio::test]
async fn error_statuses_become_target_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(404).set_body_string("NOT_FOUND"))
        .mount(&server)
        .await;

    let mut fields = TargetRecord::new();
    fields.insert("name", TargetValue::from("Statues"));

    let store = store_for(&server);
    let err = store
        .update(&DocumentPath::parse("games/missing").unwrap(), &fields)
        .await
        .unwrap_err();

    assert_eq!(err.code, "FIRESTORE-002");
    assert!(err.message.contains("404"), "{}", err.message);
    assert_eq!(
        err.context.get("context").map(String::as_str),
        Some("update games/missing")
    );
}
