use presence_core::{ServerMessage, SessionId};
use presence_server::RelayConfig;

use crate::integration::{init_tracing, start_test_server};
use crate::utils::WsTestClient;

async fn welcome(client: &mut WsTestClient) -> SessionId {
    match client
        .recv_until(|m| matches!(m, ServerMessage::Welcome { .. }))
        .await
        .expect("welcome")
    {
        ServerMessage::Welcome { session_id } => session_id,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_socket_close_announces_departure() {
    init_tracing();

    let (addr, _shutdown) = start_test_server(RelayConfig::default()).await;
    let mut alice = WsTestClient::connect(addr).await.unwrap();
    let _alice_id = welcome(&mut alice).await;

    let mut bob = WsTestClient::connect(addr).await.unwrap();
    let bob_id = welcome(&mut bob).await;

    alice
        .recv_until(|m| matches!(m, ServerMessage::Joined { id } if *id == bob_id))
        .await
        .expect("joined");

    bob.close().await.unwrap();

    alice
        .recv_until(|m| matches!(m, ServerMessage::Departed { id } if *id == bob_id))
        .await
        .expect("departed");
    assert_eq!(
        alice.recv().await.unwrap(),
        ServerMessage::LiveCount { count: 1 }
    );
}

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() {
    init_tracing();

    let (addr, _shutdown) = start_test_server(RelayConfig::default()).await;
    let mut alice = WsTestClient::connect(addr).await.unwrap();
    let alice_id = welcome(&mut alice).await;

    alice.send_raw("not json at all").await.unwrap();
    alice.send_raw(r#"{"op":"Teleport","d":{}}"#).await.unwrap();
    alice
        .send_raw(r#"{"op":"Transform","d":{"position":"garbage","rotation":[1,"x",3]}}"#)
        .await
        .unwrap();

    match alice
        .recv_until(|m| matches!(m, ServerMessage::Transform { .. }))
        .await
        .unwrap()
    {
        ServerMessage::Transform {
            id,
            position,
            rotation,
            ..
        } => {
            assert_eq!(id, alice_id);
            assert_eq!((position.x, position.y, position.z), (0.0, 0.0, 0.0));
            assert_eq!((rotation.x, rotation.y, rotation.z), (1.0, 0.0, 3.0));
        }
        _ => unreachable!(),
    }
}
