use presence_core::{ClientMessage, ServerMessage, SessionId, Transform, Vec3};
use presence_server::RelayConfig;

use crate::integration::{init_tracing, start_test_server};
use crate::utils::WsTestClient;

async fn join(client: &mut WsTestClient) -> SessionId {
    match client.recv().await.unwrap() {
        ServerMessage::IceConfig { ice_servers } => assert!(!ice_servers.is_empty()),
        other => panic!("expected IceConfig first, got {:?}", other),
    }
    match client.recv().await.unwrap() {
        ServerMessage::Welcome { session_id } => session_id,
        other => panic!("expected Welcome, got {:?}", other),
    }
}

/// alice and bob both receive alice's transform; bob and alice both receive
/// bob's, each tagged with its sender's id.
#[tokio::test]
async fn test_two_clients_see_each_others_transforms() {
    init_tracing();

    let (addr, _shutdown) = start_test_server(RelayConfig::default()).await;
    let mut alice = WsTestClient::connect(addr).await.unwrap();
    let alice_id = join(&mut alice).await;
    let mut bob = WsTestClient::connect(addr).await.unwrap();
    let bob_id = join(&mut bob).await;

    let alice_pose = Transform::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
    let bob_pose = Transform::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 1.5, 0.0));

    alice
        .send(&ClientMessage::Transform(alice_pose.clone()))
        .await
        .unwrap();
    bob.send(&ClientMessage::Transform(bob_pose.clone()))
        .await
        .unwrap();

    for client in [&mut alice, &mut bob] {
        let from_alice = client
            .recv_until(|m| matches!(m, ServerMessage::Transform { id, .. } if *id == alice_id))
            .await
            .unwrap();
        assert_eq!(
            from_alice,
            ServerMessage::transform(alice_id.clone(), alice_pose.clone())
        );
    }
    for client in [&mut alice, &mut bob] {
        let from_bob = client
            .recv_until(|m| matches!(m, ServerMessage::Transform { id, .. } if *id == bob_id))
            .await
            .unwrap();
        assert_eq!(
            from_bob,
            ServerMessage::transform(bob_id.clone(), bob_pose.clone())
        );
    }
}

#[tokio::test]
async fn test_offer_travels_over_socket_to_target_only() {
    init_tracing();

    let (addr, _shutdown) = start_test_server(RelayConfig::default()).await;
    let mut alice = WsTestClient::connect(addr).await.unwrap();
    let alice_id = join(&mut alice).await;
    let mut bob = WsTestClient::connect(addr).await.unwrap();
    let bob_id = join(&mut bob).await;

    alice
        .send(&ClientMessage::Offer {
            to: bob_id.clone(),
            sdp: "v=0".to_owned(),
        })
        .await
        .unwrap();

    let offer = bob
        .recv_until(|m| matches!(m, ServerMessage::Offer { .. }))
        .await
        .unwrap();
    assert_eq!(
        offer,
        ServerMessage::Offer {
            from: alice_id,
            sdp: "v=0".to_owned(),
        }
    );
}
