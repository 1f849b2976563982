use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn create_meeting() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("mcreate").await;

    let resp = app
        .auth_post("/api/meeting", &instructor.access_token)
        .json(&serde_json::json!({
            "topic": "Distributed Systems Lecture",
            "duration": 60,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["topic"], "Distributed Systems Lecture");
    assert_eq!(json["status"], "Scheduled");
    assert_eq!(json["attendance_threshold"], 85);
    assert!(json["meeting_code"].as_str().unwrap().len() > 0);
    assert_eq!(json["participant_count"], 0);
}

#[tokio::test]
async fn students_cannot_create_meetings() {
    let app = TestApp::spawn().await;
    let student = app.seed_student("mrole").await;

    let resp = app
        .auth_post("/api/meeting", &student.access_token)
        .json(&serde_json::json!({ "topic": "Rogue Meeting" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn meeting_lifecycle_start_join_leave_end() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("mlife").await;
    let student = app.seed_student("mlife").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Sprint Planning").await;

    // Start
    let resp = app
        .auth_post(
            &format!("/api/meeting/{}/start", meeting.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["started"], true);

    let resp = app
        .auth_get(&format!("/api/meeting/{}", meeting.id), &instructor.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "InProgress");

    // Student joins
    let resp = app
        .auth_post(
            &format!("/api/meeting/{}/join", meeting.id),
            &student.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["joined"], true);

    // Roster has one entry with an open session
    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/participants", meeting.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let parts: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0]["has_open_session"], true);

    // Joining again does not open a second session
    app.auth_post(
        &format!("/api/meeting/{}/join", meeting.id),
        &student.access_token,
    )
    .send()
    .await
    .unwrap();
    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/participants", meeting.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let parts: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0]["session_count"], 1);

    // Leave closes the session
    let resp = app
        .auth_post(
            &format!("/api/meeting/{}/leave", meeting.id),
            &student.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["left"], true);

    // Rejoin opens a second session
    app.auth_post(
        &format!("/api/meeting/{}/join", meeting.id),
        &student.access_token,
    )
    .send()
    .await
    .unwrap();
    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/participants", meeting.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let parts: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(parts[0]["session_count"], 2);

    // End closes open sessions and flips status
    let resp = app
        .auth_post(
            &format!("/api/meeting/{}/end", meeting.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get(&format!("/api/meeting/{}", meeting.id), &instructor.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "Ended");

    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/participants", meeting.id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let parts: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(parts[0]["has_open_session"], false);
}

#[tokio::test]
async fn student_cannot_start_someone_elses_meeting() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("mperm").await;
    let student = app.seed_student("mperm").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Guarded").await;

    let resp = app
        .auth_post(
            &format!("/api/meeting/{}/start", meeting.id),
            &student.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn list_meetings() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("mlist").await;

    for topic in &["Standup", "Retro"] {
        app.auth_post("/api/meeting", &instructor.access_token)
            .json(&serde_json::json!({ "topic": topic }))
            .send()
            .await
            .unwrap();
    }

    let resp = app
        .auth_get("/api/meeting", &instructor.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 2);
}
