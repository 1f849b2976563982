use crate::fixtures::test_app::TestApp;
use serde_json::Value;

async fn report(app: &TestApp, token: &str, meeting_id: &str, query: &str) -> Value {
    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/attendance{}", meeting_id, query),
            token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.unwrap()
}

fn participant<'a>(json: &'a Value, name: &str) -> &'a Value {
    json["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == name)
        .unwrap_or_else(|| panic!("Participant {name} missing"))
}

#[tokio::test]
async fn threshold_report_classifies_roster() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("arep").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Lecture").await;
    app.import_standard_roster(&instructor.access_token, &meeting.id)
        .await;

    let json = report(&app, &instructor.access_token, &meeting.id, "").await;
    assert_eq!(json["success"], true);
    assert_eq!(json["threshold"], 85);

    let ada = participant(&json, "Ada Lovelace");
    assert_eq!(ada["totalSessionDuration"], 52);
    assert_eq!(ada["attendancePercentage"], 87);
    assert_eq!(ada["attendanceStatus"], "Present");
    assert_eq!(ada["isActive"], false);

    let bob = participant(&json, "Bob Babbage");
    assert_eq!(bob["totalSessionDuration"], 40);
    assert_eq!(bob["attendancePercentage"], 67);
    assert_eq!(bob["attendanceStatus"], "Absent");

    let carol = participant(&json, "Carol Ghost");
    assert_eq!(carol["totalSessionDuration"], 0);
    assert_eq!(carol["attendanceStatus"], "Absent");

    let stats = &json["statistics"];
    assert_eq!(stats["present"], 1);
    assert_eq!(stats["absent"], 2);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["averagePercentage"], 51);
}

#[tokio::test]
async fn threshold_override_changes_classification() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("aover").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Lecture").await;
    app.import_standard_roster(&instructor.access_token, &meeting.id)
        .await;

    // Bob's 67% crosses a 60% bar
    let json = report(&app, &instructor.access_token, &meeting.id, "?threshold=60").await;
    let bob = participant(&json, "Bob Babbage");
    assert_eq!(bob["attendanceStatus"], "Present");
    assert_eq!(json["statistics"]["present"], 2);

    // Exactly at the boundary is Present
    let json = report(&app, &instructor.access_token, &meeting.id, "?threshold=67").await;
    let bob = participant(&json, "Bob Babbage");
    assert_eq!(bob["attendanceStatus"], "Present");
}

#[tokio::test]
async fn banded_strategy_uses_percentage_bands() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("aband").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Lecture").await;
    app.import_standard_roster(&instructor.access_token, &meeting.id)
        .await;

    let json = report(
        &app,
        &instructor.access_token,
        &meeting.id,
        "?strategy=banded",
    )
    .await;

    assert_eq!(participant(&json, "Ada Lovelace")["attendanceStatus"], "Partial");
    assert_eq!(participant(&json, "Bob Babbage")["attendanceStatus"], "Late");
    assert_eq!(participant(&json, "Carol Ghost")["attendanceStatus"], "Absent");

    let stats = &json["statistics"];
    assert_eq!(stats["partial"], 1);
    assert_eq!(stats["late"], 1);
    assert_eq!(stats["absent"], 1);

    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/attendance?strategy=bogus", meeting.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn enriched_report_carries_authentication_stats() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("aenr").await;
    let student = app.seed_student("aenr").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Lecture").await;
    app.import_standard_roster(&instructor.access_token, &meeting.id)
        .await;

    // One authenticated join alongside the three imported anonymous entries
    app.auth_post(
        &format!("/api/meeting/{}/join", meeting.id),
        &student.access_token,
    )
    .send()
    .await
    .unwrap();

    let json = report(
        &app,
        &instructor.access_token,
        &meeting.id,
        "?enriched=true",
    )
    .await;

    let auth_stats = &json["authenticationStats"];
    assert_eq!(auth_stats["authenticated"], 1);
    assert_eq!(auth_stats["anonymous"], 3);
    assert_eq!(auth_stats["total"], 4);
    assert_eq!(auth_stats["authenticationRate"], 25);

    let linked = json["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["authenticatedUser"].is_object())
        .expect("Linked participant missing");
    assert_eq!(
        linked["authenticatedUser"]["username"],
        student.username.as_str()
    );
    assert_eq!(linked["attendanceStatus"], "In Progress");
}

#[tokio::test]
async fn live_endpoint_reports_active_participants() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("alive").await;
    let student = app.seed_student("alive").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Live").await;

    app.auth_post(
        &format!("/api/meeting/{}/start", meeting.id),
        &instructor.access_token,
    )
    .send()
    .await
    .unwrap();
    app.auth_post(
        &format!("/api/meeting/{}/join", meeting.id),
        &student.access_token,
    )
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/live", meeting.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["statistics"]["inProgress"], 1);
    assert_eq!(json["statistics"]["total"], 1);

    let p = &json["participants"][0];
    assert_eq!(p["isActive"], true);
    assert_eq!(p["attendanceStatus"], "In Progress");
}

#[tokio::test]
async fn webhook_roster_renders_wire_shape() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("awire").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Wire").await;
    app.import_standard_roster(&instructor.access_token, &meeting.id)
        .await;

    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/webhook-roster", meeting.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();

    // One row per session: Ada 1, Bob 2, Carol 0
    let rows = json["participants"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r["user_name"].is_string()));
    assert!(rows.iter().all(|r| r["join_time"].is_string()));
}

#[tokio::test]
async fn import_tolerates_malformed_entries() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("amal").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Messy").await;

    let payload = serde_json::json!({
        "participants": [
            { "user_name": "Snake Case", "join_time": "2025-03-10 10:00:00", "leave_time": "2025-03-10 10:30:00" },
            { "name": "Bad Dates", "joinTime": "not-a-date", "leaveTime": "also-bad" },
        ]
    });
    let resp = app
        .auth_post(
            &format!("/api/meeting/{}/roster/import?source=webhook", meeting.id),
            &instructor.access_token,
        )
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["imported"], 2);

    let json = report(&app, &instructor.access_token, &meeting.id, "").await;
    let snake = participant(&json, "Snake Case");
    assert_eq!(snake["totalSessionDuration"], 30);
    assert_eq!(snake["attendancePercentage"], 50);

    // Unparseable timestamps degrade to zero minutes, not an error
    let bad = participant(&json, "Bad Dates");
    assert_eq!(bad["totalSessionDuration"], 0);
    assert_eq!(bad["attendanceStatus"], "Absent");
}
