mod support;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn create_stage(base_url: &str) -> String {
    let stage_id = format!("ws-{}", uuid::Uuid::new_v4());
    let res = reqwest::Client::new()
        .post(format!("{base_url}/stages"))
        .json(&json!({ "stage_id": stage_id }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    stage_id
}

async fn connect(stage_id: &str) -> Socket {
    let ws_url = format!("{}/ws?stage_id={stage_id}", support::server().ws_url);
    let (socket, _response) = connect_async(ws_url).await.expect("websocket connect");
    socket
}

async fn join(socket: &mut Socket, display_name: &str) {
    let msg = json!({ "type": "Join", "data": { "display_name": display_name } });
    socket
        .send(Message::text(msg.to_string()))
        .await
        .expect("send join");
}

// Next JSON message from the server, skipping control frames.
async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, socket.next())
            .await
            .expect("server should answer in time")
            .expect("stream should stay open")
            .expect("frame should be valid");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("server sends json");
        }
    }
}

async fn report_hazard(base_url: &str, stage_id: &str) {
    let res = reqwest::Client::new()
        .post(format!("{base_url}/stages/{stage_id}/collisions"))
        .json(&json!({ "kind": "Hazard" }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::ACCEPTED);
}

// Skips stage states until `expected` arrives.
async fn wait_for_state(socket: &mut Socket, expected: &str) {
    loop {
        let msg = next_of_type(socket, "StageState").await;
        if msg["data"] == expected {
            return;
        }
    }
}

async fn next_of_type(socket: &mut Socket, kind: &str) -> Value {
    loop {
        let msg = next_json(socket).await;
        if msg["type"] == kind {
            return msg;
        }
    }
}

#[tokio::test]
async fn test_first_client_pilots_and_second_spectates() {
    let base_url = &support::server().http_url;
    let stage_id = create_stage(base_url).await;

    let mut pilot = connect(&stage_id).await;
    join(&mut pilot, "Ace").await;
    let identity = next_json(&mut pilot).await;
    assert_eq!(identity["type"], "Identity");
    assert_eq!(identity["data"]["role"], "Pilot");

    let state = next_json(&mut pilot).await;
    assert_eq!(state["type"], "StageState");

    let mut spectator = connect(&stage_id).await;
    join(&mut spectator, "Watcher").await;
    let identity = next_json(&mut spectator).await;
    assert_eq!(identity["data"]["role"], "Spectator");

    let update = next_of_type(&mut spectator, "WorldUpdate").await;
    assert!(update["data"]["tick"].as_u64().is_some());
    assert!(update["data"]["pawn"]["x"].is_number());
}

#[tokio::test]
async fn test_pilot_slot_frees_up_after_disconnect() {
    let base_url = &support::server().http_url;
    let stage_id = create_stage(base_url).await;

    let mut first = connect(&stage_id).await;
    join(&mut first, "First").await;
    assert_eq!(next_json(&mut first).await["data"]["role"], "Pilot");
    first.close(None).await.expect("close first client");
    drop(first);

    // The server releases the controls asynchronously after the close.
    let mut role = Value::Null;
    for _ in 0..20 {
        let mut next = connect(&stage_id).await;
        join(&mut next, "Second").await;
        role = next_json(&mut next).await["data"]["role"].clone();
        if role == "Pilot" {
            break;
        }
        let _ = next.close(None).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(role, "Pilot");
}

#[tokio::test]
async fn test_unknown_stage_rejects_upgrade() {
    let ws_url = format!(
        "{}/ws?stage_id=nope-{}",
        support::server().ws_url,
        uuid::Uuid::new_v4()
    );

    let err = connect_async(ws_url).await.expect_err("upgrade should fail");
    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status().as_u16(), 404);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_join_first_message_is_a_policy_close() {
    let base_url = &support::server().http_url;
    let stage_id = create_stage(base_url).await;

    let mut socket = connect(&stage_id).await;
    socket
        .send(Message::text(json!({ "type": "FirePressed" }).to_string()))
        .await
        .expect("send");

    let frame = loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, socket.next())
            .await
            .expect("server should answer in time");
        match msg {
            Some(Ok(Message::Close(frame))) => break frame,
            Some(Ok(_)) => continue,
            other => panic!("expected close frame, got {other:?}"),
        }
    };
    let frame = frame.expect("close frame carries a reason");
    assert_eq!(frame.code, CloseCode::Policy);
    assert_eq!(frame.reason.as_str(), "join required");
}

#[tokio::test]
async fn test_removed_stage_tells_clients_it_exited() {
    let base_url = &support::server().http_url;
    let stage_id = create_stage(base_url).await;

    let mut socket = connect(&stage_id).await;
    join(&mut socket, "Ace").await;
    assert_eq!(next_json(&mut socket).await["type"], "Identity");

    let res = reqwest::Client::new()
        .delete(format!("{base_url}/stages/{stage_id}"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::NO_CONTENT);

    wait_for_state(&mut socket, "Exited").await;
}

#[tokio::test]
async fn test_stage_plays_through_to_exit() {
    let base_url = &support::server().http_url;
    let stage_id = create_stage(base_url).await;

    let mut pilot = connect(&stage_id).await;
    join(&mut pilot, "Ace").await;
    assert_eq!(next_json(&mut pilot).await["data"]["role"], "Pilot");
    wait_for_state(&mut pilot, "Playing").await;

    // Every hazard but the last costs a life and restarts the approach.
    for _ in 1..support::INITIAL_LIVES {
        report_hazard(base_url, &stage_id).await;
        wait_for_state(&mut pilot, "Preparing").await;
        wait_for_state(&mut pilot, "Playing").await;
    }

    report_hazard(base_url, &stage_id).await;
    wait_for_state(&mut pilot, "GameOver").await;
    wait_for_state(&mut pilot, "Exited").await;

    // The server closes the socket once the stage has exited.
    loop {
        match tokio::time::timeout(RECV_TIMEOUT, pilot.next())
            .await
            .expect("server should close in time")
        {
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
            Some(Ok(_)) => continue,
        }
    }
}
