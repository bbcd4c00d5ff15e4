mod support;

use chess_rooms::types::{RoomKey, Seat};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use support::*;

#[tokio::test]
async fn third_joiner_is_told_and_closed() {
    let (state, addr) = start_server().await;
    let (mut white, mut black) = start_game(&state, addr, "r1").await;

    let mut third = connect(addr, "r1").await;
    let err = recv_json(&mut third).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["message"], "Room is full");

    let frame = recv_close(&mut third).await.expect("close frame");
    assert_eq!(frame.code, CloseCode::Policy);
    assert_eq!(frame.reason.as_str(), "Room is full");

    assert_silent(&mut white).await;
    assert_silent(&mut black).await;

    let snap = state.registry().lookup(&RoomKey::new("r1")).unwrap();
    assert!(snap.occupant(Seat::First).is_some());
    assert!(snap.occupant(Seat::Second).is_some());

    send_move(&mut white, "e2e4").await;
    assert_eq!(recv_json(&mut black).await["move"], "e2e4");
}

#[tokio::test]
async fn unknown_paths_fail_the_upgrade() {
    use tokio_tungstenite::tungstenite::Error;

    let (state, addr) = start_server().await;
    for path in ["/", "/ws/", "/ws/a/b", "/lobby/r1"] {
        let err = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
            .await
            .expect_err("upgrade should be refused");
        match err {
            Error::Http(resp) => assert_eq!(resp.status(), 404),
            other => panic!("unexpected error for {path}: {other:?}"),
        }
    }
    assert_eq!(state.registry().room_count(), 0);
}
