//! End-to-end tests: real WebSocket clients against a running server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use standoff::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port. Returns its address and a handle to
/// its session for white-box checks.
async fn start_server() -> (String, SessionHandle) {
    start_server_with(SessionConfig::default()).await
}

async fn start_server_with(config: SessionConfig) -> (String, SessionHandle) {
    let server = StandoffServerBuilder::new()
        .bind("127.0.0.1:0")
        .session_config(config)
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let session = server.session();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, session)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, msg: &ClientMessage) {
    let bytes = serde_json::to_vec(msg).expect("encode");
    ws.send(Message::Binary(bytes.into())).await.expect("send");
}

async fn recv(ws: &mut ClientWs) -> ServerMessage {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a message")
        .expect("stream ended")
        .expect("websocket error");
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

/// Reads messages until one matches, discarding the rest.
async fn recv_until(
    ws: &mut ClientWs,
    matches: impl Fn(&ServerMessage) -> bool,
) -> ServerMessage {
    loop {
        let msg = recv(ws).await;
        if matches(&msg) {
            return msg;
        }
    }
}

/// Joins and returns the rejection, if any.
async fn join(ws: &mut ClientWs, name: &str) -> Option<JoinRejection> {
    send(ws, &ClientMessage::Join { name: name.into() }).await;
    match recv_until(ws, |m| matches!(m, ServerMessage::JoinResult { .. }))
        .await
    {
        ServerMessage::JoinResult { error } => error,
        _ => unreachable!(),
    }
}

async fn start_game(ws: &mut ClientWs) -> bool {
    send(ws, &ClientMessage::StartGame).await;
    match recv_until(ws, |m| {
        matches!(m, ServerMessage::StartGameResult { .. })
    })
    .await
    {
        ServerMessage::StartGameResult { started } => started,
        _ => unreachable!(),
    }
}

async fn wait_for_game_start(ws: &mut ClientWs) {
    recv_until(ws, |m| {
        matches!(
            m,
            ServerMessage::Notification(Notification::GameStarted { .. })
        )
    })
    .await;
}

async fn take_action(
    ws: &mut ClientWs,
    action: ActionKind,
    target: Option<&str>,
) {
    send(
        ws,
        &ClientMessage::TakeAction {
            action,
            target: target.map(PlayerName::from),
        },
    )
    .await;
}

async fn error_code(ws: &mut ClientWs) -> u16 {
    match recv_until(ws, |m| matches!(m, ServerMessage::Error { .. })).await
    {
        ServerMessage::Error { code, .. } => code,
        _ => unreachable!(),
    }
}

/// Connects, joins, and starts a game with every named player.
async fn started_game(addr: &str, names: &[&str]) -> Vec<ClientWs> {
    let mut clients = Vec::new();
    for name in names {
        let mut ws = connect(addr).await;
        assert_eq!(join(&mut ws, name).await, None);
        clients.push(ws);
    }
    assert!(start_game(&mut clients[0]).await);
    // The starter's GameStarted came ahead of its StartGameResult.
    for ws in clients.iter_mut().skip(1) {
        wait_for_game_start(ws).await;
    }
    clients
}

/// Plays one round in which `shooter` kills `victim` outright.
/// Needs a server started with one health.
async fn eliminate(shooter: &mut ClientWs, victim: &mut ClientWs, name: &str) {
    take_action(shooter, ActionKind::Shoot, Some(name)).await;
    take_action(victim, ActionKind::Reload, None).await;
    let result = recv_until(victim, |m| {
        matches!(
            m,
            ServerMessage::Notification(Notification::RoundResult { .. })
        )
    })
    .await;
    assert!(matches!(
        result,
        ServerMessage::Notification(Notification::RoundResult {
            standing: Standing::Eliminated,
            ..
        })
    ));
}

fn one_health() -> SessionConfig {
    SessionConfig {
        starting_health: 1,
        ..SessionConfig::default()
    }
}

async fn wait_for_pending(session: &SessionHandle, count: usize) {
    for _ in 0..200 {
        if session.info().await.expect("session").pending == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session never reached {count} pending actions");
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_join_announces_player_list() {
    let (addr, _session) = start_server().await;
    let mut a = connect(&addr).await;
    assert_eq!(join(&mut a, "bond").await, None);

    let mut b = connect(&addr).await;
    assert_eq!(join(&mut b, "jaws").await, None);

    let msg = recv(&mut a).await;
    assert_eq!(
        msg,
        ServerMessage::Notification(Notification::PlayerListChanged {
            names: vec!["bond".into(), "jaws".into()],
        })
    );
}

#[tokio::test]
async fn test_join_name_in_use() {
    let (addr, _session) = start_server().await;
    let mut a = connect(&addr).await;
    assert_eq!(join(&mut a, "bond").await, None);

    let mut b = connect(&addr).await;
    assert_eq!(join(&mut b, "bond").await, Some(JoinRejection::NameInUse));
}

#[tokio::test]
async fn test_join_invalid_name() {
    let (addr, _session) = start_server().await;
    let mut a = connect(&addr).await;
    assert_eq!(join(&mut a, "   ").await, Some(JoinRejection::InvalidName));
}

#[tokio::test]
async fn test_join_during_game() {
    let (addr, _session) = start_server().await;
    let _clients = started_game(&addr, &["bond", "jaws"]).await;

    let mut late = connect(&addr).await;
    assert_eq!(
        join(&mut late, "oddjob").await,
        Some(JoinRejection::GameInProgress)
    );
}

#[tokio::test]
async fn test_second_join_on_same_connection() {
    let (addr, _session) = start_server().await;
    let mut a = connect(&addr).await;
    assert_eq!(join(&mut a, "bond").await, None);

    send(&mut a, &ClientMessage::Join { name: "other".into() }).await;
    assert_eq!(error_code(&mut a).await, 409);
}

#[tokio::test]
async fn test_start_game_with_one_player() {
    let (addr, _session) = start_server().await;
    let mut a = connect(&addr).await;
    join(&mut a, "bond").await;
    assert!(!start_game(&mut a).await);
}

// =========================================================================
// Requests that are refused
// =========================================================================

#[tokio::test]
async fn test_undecodable_frame() {
    let (addr, _session) = start_server().await;
    let mut a = connect(&addr).await;
    a.send(Message::text("not json".to_string()))
        .await
        .expect("send");
    assert_eq!(error_code(&mut a).await, 400);
}

#[tokio::test]
async fn test_action_before_join() {
    let (addr, _session) = start_server().await;
    let mut a = connect(&addr).await;
    take_action(&mut a, ActionKind::Block, None).await;
    assert_eq!(error_code(&mut a).await, 403);
}

#[tokio::test]
async fn test_leave_before_join() {
    let (addr, session) = start_server().await;
    let mut a = connect(&addr).await;
    send(&mut a, &ClientMessage::Leave { died: false }).await;
    assert_eq!(error_code(&mut a).await, 403);
    assert!(session.info().await.unwrap().players.is_empty());
}

#[tokio::test]
async fn test_invalid_action_is_reported() {
    let (addr, session) = start_server().await;
    let mut clients = started_game(&addr, &["bond", "jaws"]).await;

    take_action(&mut clients[0], ActionKind::Shoot, Some("bond")).await;
    assert_eq!(error_code(&mut clients[0]).await, 422);

    take_action(&mut clients[0], ActionKind::Shoot, None).await;
    assert_eq!(error_code(&mut clients[0]).await, 422);

    assert_eq!(session.info().await.unwrap().pending, 0);
}

// =========================================================================
// Rounds
// =========================================================================

#[tokio::test]
async fn test_full_round_over_the_wire() {
    let (addr, _session) = start_server().await;
    let mut clients = started_game(&addr, &["bond", "jaws"]).await;

    take_action(&mut clients[0], ActionKind::Shoot, Some("jaws")).await;
    take_action(&mut clients[1], ActionKind::Reload, None).await;

    let is_result = |m: &ServerMessage| {
        matches!(
            m,
            ServerMessage::Notification(Notification::RoundResult { .. })
        )
    };

    let for_jaws = recv_until(&mut clients[1], is_result).await;
    assert_eq!(
        for_jaws,
        ServerMessage::Notification(Notification::RoundResult {
            narration: vec![
                "You reloaded.".into(),
                "bond's shot hit you!".into(),
            ],
            health_lost: 1,
            health: 2,
            ammo: 2,
            standing: Standing::Alive,
        })
    );

    let for_bond = recv_until(&mut clients[0], is_result).await;
    match for_bond {
        ServerMessage::Notification(Notification::RoundResult {
            narration,
            health_lost,
            ammo,
            ..
        }) => {
            assert_eq!(narration[0], "Your shot hit jaws!");
            assert_eq!(health_lost, 0);
            assert_eq!(ammo, 0);
        }
        other => panic!("expected RoundResult, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_mid_round_resets() {
    let (addr, session) = start_server().await;
    let mut clients =
        started_game(&addr, &["bond", "jaws", "oddjob"]).await;

    take_action(&mut clients[0], ActionKind::Shoot, Some("jaws")).await;
    wait_for_pending(&session, 1).await;

    let mut oddjob = clients.pop().expect("three clients");
    oddjob.close(None).await.expect("close");

    let reset = recv_until(&mut clients[0], |m| {
        matches!(
            m,
            ServerMessage::Notification(Notification::RoundReset { .. })
        )
    })
    .await;
    assert_eq!(
        reset,
        ServerMessage::Notification(Notification::RoundReset { ammo: 1 })
    );

    let info = session.info().await.unwrap();
    assert_eq!(info.state, SessionState::InProgress);
    assert_eq!(info.players.len(), 2);
    assert_eq!(info.pending, 0);
}

#[tokio::test]
async fn test_leave_leaves_last_player_standing() {
    let (addr, session) = start_server().await;
    let mut clients = started_game(&addr, &["bond", "jaws"]).await;

    send(&mut clients[1], &ClientMessage::Leave { died: false }).await;

    let result = recv_until(&mut clients[0], |m| {
        matches!(
            m,
            ServerMessage::Notification(Notification::RoundResult { .. })
        )
    })
    .await;
    assert!(matches!(
        result,
        ServerMessage::Notification(Notification::RoundResult {
            standing: Standing::LastStanding,
            ..
        })
    ));

    let info = session.info().await.unwrap();
    assert_eq!(info.state, SessionState::Lobby);
    assert_eq!(info.players.len(), 1);
}

// =========================================================================
// Eliminated connections
// =========================================================================

#[tokio::test]
async fn test_eliminated_player_can_rejoin() {
    let (addr, session) = start_server_with(one_health()).await;
    let mut clients = started_game(&addr, &["bond", "jaws"]).await;
    let (bond, jaws) = clients.split_at_mut(1);
    eliminate(&mut bond[0], &mut jaws[0], "jaws").await;

    assert_eq!(join(&mut jaws[0], "jaws").await, None);

    let info = session.info().await.unwrap();
    assert_eq!(info.state, SessionState::Lobby);
    assert_eq!(info.players.len(), 2);
}

#[tokio::test]
async fn test_stale_connection_does_not_evict_new_holder() {
    let (addr, session) = start_server_with(one_health()).await;
    let mut clients = started_game(&addr, &["bond", "jaws"]).await;
    let mut old_jaws = clients.pop().expect("two clients");
    let mut bond = clients.pop().expect("two clients");
    eliminate(&mut bond, &mut old_jaws, "jaws").await;

    let mut new_jaws = connect(&addr).await;
    assert_eq!(join(&mut new_jaws, "jaws").await, None);
    assert!(start_game(&mut bond).await);
    wait_for_game_start(&mut new_jaws).await;

    // The old socket no longer speaks for jaws.
    take_action(&mut old_jaws, ActionKind::Block, None).await;
    assert_eq!(error_code(&mut old_jaws).await, 403);
    assert_eq!(session.info().await.unwrap().pending, 0);

    old_jaws.close(None).await.expect("close");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let info = session.info().await.unwrap();
    assert_eq!(info.state, SessionState::InProgress);
    let names: Vec<&str> =
        info.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["bond", "jaws"]);

    take_action(&mut bond, ActionKind::Block, None).await;
    take_action(&mut new_jaws, ActionKind::Block, None).await;
    let result = recv_until(&mut new_jaws, |m| {
        matches!(
            m,
            ServerMessage::Notification(Notification::RoundResult { .. })
        )
    })
    .await;
    assert!(matches!(
        result,
        ServerMessage::Notification(Notification::RoundResult {
            standing: Standing::Alive,
            ..
        })
    ));
}
