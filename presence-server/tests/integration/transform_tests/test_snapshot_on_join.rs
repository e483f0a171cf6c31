use presence_core::{ServerMessage, Transform, Vec3};
use presence_server::RelayConfig;

use crate::integration::{create_test_relay, create_test_relay_with, init_tracing};
use crate::utils::{MockSession, is_transform_from};

#[tokio::test]
async fn test_late_joiner_gets_snapshot_when_enabled() {
    init_tracing();

    let relay = create_test_relay_with(RelayConfig {
        snapshot_on_join: true,
        ..RelayConfig::default()
    });
    let mut alice = MockSession::join(&relay).await.unwrap();

    let pose = Transform::new(Vec3::new(4.0, 0.0, -2.0), Vec3::ZERO);
    relay.transform(alice.id.clone(), pose.clone()).await.unwrap();
    let alice_id = alice.id.clone();
    alice
        .recv_until(|m| is_transform_from(m, &alice_id))
        .await
        .unwrap();

    let mut bob = MockSession::join(&relay).await.unwrap();

    assert_eq!(
        bob.recv().await.unwrap(),
        ServerMessage::transform(alice.id.clone(), pose)
    );
    assert_eq!(bob.recv().await.unwrap(), ServerMessage::LiveCount { count: 2 });
}

#[tokio::test]
async fn test_no_snapshot_by_default() {
    init_tracing();

    let relay = create_test_relay();
    let mut alice = MockSession::join(&relay).await.unwrap();
    relay
        .transform(alice.id.clone(), Transform::default())
        .await
        .unwrap();
    let alice_id = alice.id.clone();
    alice
        .recv_until(|m| is_transform_from(m, &alice_id))
        .await
        .unwrap();

    let mut bob = MockSession::join(&relay).await.unwrap();

    assert!(
        !bob.settle()
            .await
            .iter()
            .any(|m| is_transform_from(m, &alice.id))
    );
}
