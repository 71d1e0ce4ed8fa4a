//! Runs the full client stack against an in-process relay.

use std::time::Duration;

use coderoom::config::{Config, SessionConfig, TransportConfig};
use coderoom::{Language, MembershipState, SessionView, connect};
use frames::{Encoding, Frame, Status};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn relay() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind relay");
    let addr = listener.local_addr().expect("relay addr");
    (listener, format!("ws://{addr}"))
}

fn config(url: String, encoding: Encoding) -> Config {
    Config {
        session: SessionConfig::default(),
        transport: TransportConfig {
            relay_url: url,
            encoding,
            reconnect_min: Duration::from_millis(50),
            reconnect_max: Duration::from_millis(200),
        },
    }
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (tcp, _) = tokio::time::timeout(WAIT, listener.accept()).await.expect("client connect").expect("accept");
    tokio_tungstenite::accept_async(tcp).await.expect("ws handshake")
}

async fn next_frame(ws: &mut WebSocketStream<TcpStream>) -> Frame {
    loop {
        let message = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("frame in time")
            .expect("stream open")
            .expect("ws message");
        match message {
            Message::Text(text) => return frames::decode_json(text.as_str()).expect("json frame"),
            Message::Binary(bytes) => return frames::decode_binary(&bytes).expect("binary frame"),
            _ => {}
        }
    }
}

fn relay_frame(event: &str, data: Value) -> Frame {
    Frame {
        id: uuid::Uuid::new_v4().to_string(),
        parent_id: None,
        ts: 0,
        room_id: Some("r1".into()),
        from: Some("relay".into()),
        event: event.into(),
        status: Status::Request,
        data,
    }
}

async fn send_json(ws: &mut WebSocketStream<TcpStream>, frame: &Frame) {
    let text = frames::encode_json(frame).expect("encode");
    ws.send(Message::Text(text.into())).await.expect("relay send");
}

async fn send_binary(ws: &mut WebSocketStream<TcpStream>, frame: &Frame) {
    ws.send(Message::Binary(frames::encode_binary(frame).into())).await.expect("relay send");
}

async fn wait_view(
    rx: &mut tokio::sync::watch::Receiver<SessionView>,
    check: impl FnMut(&SessionView) -> bool,
) -> SessionView {
    tokio::time::timeout(WAIT, rx.wait_for(check))
        .await
        .expect("view in time")
        .expect("runtime alive")
        .clone()
}

#[tokio::test]
async fn json_relay_round_trip() {
    init_tracing();
    let (listener, url) = relay().await;
    let handle = connect(config(url, Encoding::Json));
    let mut views = handle.subscribe();

    handle.join("r1", "ada").await.expect("join");
    let mut ws = accept(&listener).await;

    let join = next_frame(&mut ws).await;
    assert_eq!(join.event, "join");
    assert_eq!(join.status, Status::Request);
    assert_eq!(join.data, json!({ "roomId": "r1", "username": "ada" }));

    send_json(&mut ws, &relay_frame("userJoined", json!(["ada", "grace"]))).await;
    send_json(&mut ws, &relay_frame("codeUpdate", json!("print('hi')"))).await;
    send_json(&mut ws, &relay_frame("languageUpdate", json!("python"))).await;
    send_json(&mut ws, &relay_frame("somethingElse", json!({}))).await;
    send_json(&mut ws, &relay_frame("userTyping", json!("grace"))).await;

    let view = wait_view(&mut views, |v| !v.typing.is_empty()).await;
    assert_eq!(view.state, MembershipState::Joined);
    assert_eq!(view.members, vec!["ada".to_owned(), "grace".to_owned()]);
    assert_eq!(view.content, "print('hi')");
    assert_eq!(view.language, Language::Python);
    assert_eq!(view.typing, "grace... is Typing");

    handle.edit("print('bye')").await.expect("edit");
    let change = next_frame(&mut ws).await;
    assert_eq!(change.event, "codeChange");
    assert_eq!(change.data, json!({ "roomId": "r1", "code": "print('bye')" }));
    let typing = next_frame(&mut ws).await;
    assert_eq!(typing.event, "typing");

    handle.shutdown();
    let leave = next_frame(&mut ws).await;
    assert_eq!(leave.event, "leaveRoom");
}

#[tokio::test]
async fn binary_relay_run_round_trip() {
    init_tracing();
    let (listener, url) = relay().await;
    let handle = connect(config(url, Encoding::Binary));
    let mut views = handle.subscribe();

    handle.join("r1", "ada").await.expect("join");
    let mut ws = accept(&listener).await;
    assert_eq!(next_frame(&mut ws).await.event, "join");

    let request_id = handle.run().await.expect("run");
    let compile = next_frame(&mut ws).await;
    assert_eq!(compile.event, "compileCode");
    assert_eq!(compile.id, request_id.to_string());
    assert_eq!(
        compile.data,
        json!({ "code": "// start code here", "roomId": "r1", "language": "javascript", "version": "*" })
    );

    let mut error = relay_frame("codeResponse", json!({ "message": "backend down" }));
    error.status = Status::Error;
    send_binary(&mut ws, &error).await;

    let mut response = relay_frame("codeResponse", json!({ "run": { "output": "ok\n" } }));
    response.parent_id = Some(compile.id.clone());
    send_binary(&mut ws, &response).await;

    let view = wait_view(&mut views, |v| !v.output.is_empty()).await;
    assert_eq!(view.output, "ok\n");

    handle.leave().await.expect("leave");
    assert_eq!(next_frame(&mut ws).await.event, "leaveRoom");
    let view = wait_view(&mut views, |v| v.state == MembershipState::Left).await;
    assert_eq!(view.content, "// start code here");
    assert_eq!(view.output, "");
}

#[tokio::test]
async fn reconnect_replays_join_on_new_socket() {
    init_tracing();
    let (listener, url) = relay().await;
    let handle = connect(config(url, Encoding::Json));

    handle.join("r1", "ada").await.expect("join");
    let mut first = accept(&listener).await;
    assert_eq!(next_frame(&mut first).await.event, "join");
    drop(first);

    let mut second = accept(&listener).await;
    let rejoin = next_frame(&mut second).await;
    assert_eq!(rejoin.event, "join");
    assert_eq!(rejoin.data, json!({ "roomId": "r1", "username": "ada" }));
    assert_eq!(handle.view().state, MembershipState::Joined);

    handle.edit("x").await.expect("edit");
    assert_eq!(next_frame(&mut second).await.event, "codeChange");
    assert_eq!(next_frame(&mut second).await.event, "typing");

    handle.leave().await.expect("leave");
    assert_eq!(next_frame(&mut second).await.event, "leaveRoom");
    drop(second);

    // After leaving, a reconnect carries no join.
    let mut third = accept(&listener).await;
    handle.join("r2", "ada").await.expect("join r2");
    let join = next_frame(&mut third).await;
    assert_eq!(join.event, "join");
    assert_eq!(join.data["roomId"], "r2");
}
