//! Integration tests for the authenticated tracking endpoints

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use common::{local, TestApp};
use serde_json::{json, Value};
use wellness_tracker_backend::store::paths;

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

fn reminder_instants(summary: &Value) -> Vec<DateTime<Utc>> {
    summary["reminderTimes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| serde_json::from_value(r["time"].clone()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_tracking_requires_auth() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));

    let (status, _) = app
        .request("POST", "/api/v1/me/water/intake", None, Some(&json!({ "action": "add" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request("GET", "/api/v1/me/water", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_intake_add_and_remove() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");

    let (status, body) = app
        .request("POST", "/api/v1/me/water/intake", Some(&token), Some(&json!({ "action": "add" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let summary = parse(&body);
    assert_eq!(summary["waterIntake"], summary["glassSize"]);
    assert!(summary["nextWaterReminderTime"].is_string());

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/me/water/intake",
            Some(&token),
            Some(&json!({ "action": "remove", "amountMl": 1000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["waterIntake"], 0);

    let water = app.doc(&paths::water("u1")).await.unwrap();
    assert_eq!(water["waterIntake"], 0);
    assert_eq!(water["serverRecalculated"], true);
}

#[tokio::test]
async fn test_intake_amount_is_validated() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");

    let (status, body) = app
        .request(
            "POST",
            "/api/v1/me/water/intake",
            Some(&token),
            Some(&json!({ "action": "add", "amountMl": 9000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_custom_interval_schedule_follows_window() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");

    let (status, body) = app
        .request(
            "PUT",
            "/api/v1/me/notification-window",
            Some(&token),
            Some(&json!({ "start": "08:00", "end": "22:00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({ "start": "08:00", "end": "22:00" }));

    let (status, body) = app
        .request(
            "PUT",
            "/api/v1/me/water/settings",
            Some(&token),
            Some(&json!({ "waterNotificationOption": "custom", "customIntervalHours": 2.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let summary = parse(&body);
    let expected: Vec<DateTime<Utc>> = [11, 13, 15, 17, 19, 21]
        .into_iter()
        .map(|h| local(2024, 7, 1, h, 0))
        .collect();
    assert_eq!(reminder_instants(&summary), expected);
    assert_eq!(summary["waterNotificationOption"], "custom");
}

#[tokio::test]
async fn test_disabling_reminders_clears_schedule() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");

    app.request("POST", "/api/v1/me/water/intake", Some(&token), Some(&json!({ "action": "add" })))
        .await;
    let (status, body) = app
        .request(
            "PUT",
            "/api/v1/me/water/settings",
            Some(&token),
            Some(&json!({ "waterNotificationOption": "none" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let summary = parse(&body);
    assert!(summary["nextWaterReminderTime"].is_null());
    assert_eq!(summary["reminderTimes"], json!([]));
}

#[tokio::test]
async fn test_settings_and_window_are_validated() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");

    let (status, _) = app
        .request("PUT", "/api/v1/me/water/settings", Some(&token), Some(&json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "PUT",
            "/api/v1/me/water/settings",
            Some(&token),
            Some(&json!({ "glassSize": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "PUT",
            "/api/v1/me/notification-window",
            Some(&token),
            Some(&json!({ "start": "25:00", "end": "22:00" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_activity_level_is_stored_on_user() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");

    let (status, _) = app
        .request(
            "PUT",
            "/api/v1/me/water/settings",
            Some(&token),
            Some(&json!({ "activityLevel": "very_active" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let user = app.doc(&paths::user("u1")).await.unwrap();
    assert_eq!(user["activityLevel"], "very_active");
}

#[tokio::test]
async fn test_consume_supplement_until_suppressed() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");
    app.seed_user("u1", json!({})).await;
    app.seed(
        &paths::supplement("u1", "mg"),
        json!({
            "name": "Magnesium",
            "quantity": 10,
            "dailyUsage": 2,
            "notificationSchedule": ["12:00", "20:00"]
        }),
    )
    .await;

    let (status, body) = app
        .request("POST", "/api/v1/me/supplements/mg/consume", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let status_body = parse(&body);
    assert_eq!(status_body["quantity"], 9);
    assert_eq!(status_body["consumedToday"], 1);
    let next: DateTime<Utc> =
        serde_json::from_value(status_body["nextSupplementReminderTime"].clone()).unwrap();
    assert_eq!(next, local(2024, 7, 1, 12, 0));

    let (_, body) = app
        .request("POST", "/api/v1/me/supplements/mg/consume", Some(&token), None)
        .await;
    let status_body = parse(&body);
    assert_eq!(status_body["consumedToday"], 2);
    assert!(status_body["nextSupplementReminderTime"].is_null());

    let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let stats = app.doc(&paths::supplement_stats("u1", day)).await.unwrap();
    assert_eq!(stats, json!({ "Magnesium": 2 }));
}

#[tokio::test]
async fn test_consume_unknown_supplement_is_not_found() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");

    let (status, body) = app
        .request("POST", "/api/v1/me/supplements/missing/consume", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse(&body)["success"], false);
}

#[tokio::test]
async fn test_water_summary_defaults_without_document() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");

    let (status, body) = app.request("GET", "/api/v1/me/water", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = parse(&body);
    assert_eq!(summary["waterIntake"], 0);
    assert_eq!(summary["dailyWaterTarget"], 2000);
    assert_eq!(summary["progressPercent"], 0.0);
}

#[tokio::test]
async fn test_register_device_adds_token_once() {
    let app = TestApp::at(local(2024, 7, 1, 9, 0));
    let token = app.token_for("u1");
    let device = common::device_token();

    for _ in 0..2 {
        let (status, body) = app
            .request("POST", "/api/v1/me/devices", Some(&token), Some(&json!({ "token": device })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&body)["tokenCount"], 1);
    }

    let user = app.doc(&paths::user("u1")).await.unwrap();
    assert_eq!(user["fcmTokens"], json!([device]));

    let (status, _) = app
        .request("POST", "/api/v1/me/devices", Some(&token), Some(&json!({ "token": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
