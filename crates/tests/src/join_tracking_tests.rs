use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn join_and_leave_are_logged() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("jt").await;
    let student = app.seed_student("jt").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Logged").await;

    app.auth_post(
        &format!("/api/meeting/{}/join", meeting.id),
        &student.access_token,
    )
    .send()
    .await
    .unwrap();
    app.auth_post(
        &format!("/api/meeting/{}/leave", meeting.id),
        &student.access_token,
    )
    .send()
    .await
    .unwrap();

    let resp = app
        .auth_get("/api/join-tracking", &student.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    // Newest first
    assert_eq!(items[0]["action"], "left");
    assert_eq!(items[1]["action"], "joined");
    assert_eq!(items[1]["meeting_code"], meeting.meeting_code.as_str());
}

#[tokio::test]
async fn manual_entries_and_clear() {
    let app = TestApp::spawn().await;
    let student = app.seed_student("jtman").await;

    let resp = app
        .auth_post("/api/join-tracking", &student.access_token)
        .json(&serde_json::json!({
            "meeting_code": "000-unknown",
            "device_type": "qr-scanner",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["tracked"], true);

    let resp = app
        .auth_get("/api/join-tracking", &student.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["items"][0]["action"], "manual");

    let resp = app
        .auth_delete("/api/join-tracking", &student.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["deleted"], 1);

    let resp = app
        .auth_get("/api/join-tracking", &student.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert!(json["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn history_is_per_user() {
    let app = TestApp::spawn().await;
    let a = app.seed_student("jtaa").await;
    let b = app.seed_student("jtbb").await;

    app.auth_post("/api/join-tracking", &a.access_token)
        .json(&serde_json::json!({ "meeting_code": "a-code" }))
        .send()
        .await
        .unwrap();

    let resp = app
        .auth_get("/api/join-tracking", &b.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert!(json["items"].as_array().unwrap().is_empty());
}
