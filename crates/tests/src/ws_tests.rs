use crate::fixtures::test_app::TestApp;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn connect(app: &TestApp, token: &str) -> WsStream {
    let (stream, _) = connect_async(app.ws_url(token))
        .await
        .expect("WS connect failed");
    stream
}

/// Reads messages until one of the wanted type arrives.
async fn next_of_type(stream: &mut WsStream, wanted: &str) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(msg) = stream.next().await {
            let msg = msg.expect("WS read failed");
            let Ok(text) = msg.into_text() else { continue };
            if text.is_empty() {
                continue;
            }
            let json: Value = serde_json::from_str(text.as_str()).expect("Invalid WS JSON");
            if json["type"] == wanted {
                return json;
            }
        }
        panic!("WS stream ended before {wanted}");
    })
    .await
    .unwrap_or_else(|_| panic!("Timed out waiting for {wanted}"))
}

async fn send_json(stream: &mut WsStream, value: &Value) {
    stream
        .send(Message::text(serde_json::to_string(value).unwrap()))
        .await
        .expect("WS send failed");
}

#[tokio::test]
async fn rejects_bad_token() {
    let app = TestApp::spawn().await;
    let result = connect_async(app.ws_url("not-a-jwt")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn subscribe_receives_initial_then_updates() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("wsa").await;
    let student = app.seed_student("wsa").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Watched").await;

    app.auth_post(
        &format!("/api/meeting/{}/start", meeting.id),
        &instructor.access_token,
    )
    .send()
    .await
    .unwrap();

    let mut stream = connect(&app, &instructor.access_token).await;
    let connected = next_of_type(&mut stream, "connected").await;
    assert_eq!(connected["user_id"].as_str().unwrap(), instructor.id);

    send_json(
        &mut stream,
        &serde_json::json!({
            "type": "attendance:subscribe",
            "data": { "meeting_id": meeting.id },
        }),
    )
    .await;

    let initial = next_of_type(&mut stream, "attendance:initial").await;
    let initial_seq = initial["data"]["seq"].as_u64().unwrap();
    assert!(initial["data"]["participants"].as_array().unwrap().is_empty());
    assert_eq!(initial["data"]["threshold"], 85);

    // A join triggers a participant event and a recomputed snapshot
    app.auth_post(
        &format!("/api/meeting/{}/join", meeting.id),
        &student.access_token,
    )
    .send()
    .await
    .unwrap();

    let joined = next_of_type(&mut stream, "participant:joined").await;
    assert_eq!(joined["data"]["meeting_id"].as_str().unwrap(), meeting.id);

    let update = next_of_type(&mut stream, "attendance:update").await;
    let update_seq = update["data"]["seq"].as_u64().unwrap();
    assert!(update_seq > initial_seq, "seq must advance");
    assert_eq!(update["data"]["statistics"]["inProgress"], 1);
    assert_eq!(
        update["data"]["participants"][0]["attendanceStatus"],
        "In Progress"
    );

    // A leave advances the stream again
    app.auth_post(
        &format!("/api/meeting/{}/leave", meeting.id),
        &student.access_token,
    )
    .send()
    .await
    .unwrap();

    let left = next_of_type(&mut stream, "participant:left").await;
    assert_eq!(left["data"]["meeting_id"].as_str().unwrap(), meeting.id);

    let update2 = next_of_type(&mut stream, "attendance:update").await;
    assert!(update2["data"]["seq"].as_u64().unwrap() > update_seq);
    assert_eq!(update2["data"]["statistics"]["inProgress"], 0);
}

#[tokio::test]
async fn subscribe_unknown_meeting_errors() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("wse").await;

    let mut stream = connect(&app, &instructor.access_token).await;
    next_of_type(&mut stream, "connected").await;

    send_json(
        &mut stream,
        &serde_json::json!({
            "type": "attendance:subscribe",
            "data": { "meeting_id": "ffffffffffffffffffffffff" },
        }),
    )
    .await;
    let error = next_of_type(&mut stream, "attendance:error").await;
    assert_eq!(error["data"]["message"], "Meeting not found");

    send_json(
        &mut stream,
        &serde_json::json!({
            "type": "attendance:subscribe",
            "data": { "meeting_id": "nonsense" },
        }),
    )
    .await;
    let error = next_of_type(&mut stream, "attendance:error").await;
    assert_eq!(error["data"]["message"], "Invalid meeting_id");
}

#[tokio::test]
async fn subscriber_threshold_override_applies() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("wso").await;
    let meeting = app.seed_meeting(&instructor.access_token, "Override").await;
    app.import_standard_roster(&instructor.access_token, &meeting.id)
        .await;

    let mut stream = connect(&app, &instructor.access_token).await;
    next_of_type(&mut stream, "connected").await;

    send_json(
        &mut stream,
        &serde_json::json!({
            "type": "attendance:subscribe",
            "data": { "meeting_id": meeting.id, "threshold": 60 },
        }),
    )
    .await;

    let initial = next_of_type(&mut stream, "attendance:initial").await;
    assert_eq!(initial["data"]["threshold"], 60);
    // Ada (87%) and Bob (67%) both clear the lowered bar
    assert_eq!(initial["data"]["statistics"]["present"], 2);
}

#[tokio::test]
async fn ping_pong() {
    let app = TestApp::spawn().await;
    let instructor = app.seed_instructor("wsp").await;

    let mut stream = connect(&app, &instructor.access_token).await;
    next_of_type(&mut stream, "connected").await;

    send_json(&mut stream, &serde_json::json!({ "type": "ping" })).await;
    next_of_type(&mut stream, "pong").await;
}
