use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn url_validation_handshake() {
    let app = TestApp::spawn().await;

    let resp = app
        .send_webhook(&serde_json::json!({
            "event": "endpoint.url_validation",
            "payload": { "plainToken": "abc123" },
        }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["plainToken"], "abc123");
    assert_eq!(json["encryptedToken"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn unsigned_webhook_is_rejected() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/webhooks/zoom"))
        .json(&serde_json::json!({ "event": "meeting.started" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = app
        .client
        .post(app.url("/api/webhooks/zoom"))
        .header("x-zm-request-timestamp", "1741600800")
        .header("x-zm-signature", "v0=deadbeef")
        .json(&serde_json::json!({ "event": "meeting.started" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn participant_events_build_sessions() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("whk").await;

    // Join event for a meeting the API has never seen
    let resp = app
        .send_webhook(&serde_json::json!({
            "event": "meeting.participant_joined",
            "payload": {
                "object": {
                    "id": "987654321",
                    "participant": {
                        "user_name": "Zoom Guest",
                        "email": "guest@example.test",
                        "join_time": "2025-03-10T10:00:00Z",
                    }
                }
            }
        }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    // The meeting was registered on first contact
    let resp = app
        .auth_get("/api/meeting", &instructor.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["total"], 1);
    let meeting_id = json["items"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(json["items"][0]["meeting_code"], "987654321");

    // Open session: guest shows up as in progress
    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/live", meeting_id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["statistics"]["inProgress"], 1);
    assert_eq!(json["participants"][0]["name"], "Zoom Guest");

    // Leave event closes the session
    let resp = app
        .send_webhook(&serde_json::json!({
            "event": "meeting.participant_left",
            "payload": {
                "object": {
                    "id": "987654321",
                    "participant": {
                        "user_name": "Zoom Guest",
                        "leave_time": "2025-03-10T10:52:00Z",
                    }
                }
            }
        }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get(
            &format!("/api/meeting/{}/participants", meeting_id),
            &instructor.access_token,
        )
        .send()
        .await
        .unwrap();
    let parts: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0]["has_open_session"], false);
}

#[tokio::test]
async fn meeting_lifecycle_via_webhooks() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("whklife").await;

    let resp = app
        .send_webhook(&serde_json::json!({
            "event": "meeting.started",
            "payload": { "object": { "id": "111222333", "topic": "Webhook Meeting" } },
        }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get("/api/meeting", &instructor.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["items"][0]["topic"], "Webhook Meeting");
    assert_eq!(json["items"][0]["status"], "InProgress");

    let resp = app
        .send_webhook(&serde_json::json!({
            "event": "meeting.ended",
            "payload": { "object": { "id": "111222333" } },
        }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get("/api/meeting", &instructor.access_token)
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["items"][0]["status"], "Ended");

    // Duplicate delivery of the ended event is harmless
    let resp = app
        .send_webhook(&serde_json::json!({
            "event": "meeting.ended",
            "payload": { "object": { "id": "111222333" } },
        }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn unknown_events_are_acknowledged() {
    let app = TestApp::spawn().await;

    let resp = app
        .send_webhook(&serde_json::json!({
            "event": "recording.completed",
            "payload": {},
        }))
        .await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["received"], true);
}
