use presence_core::ServerMessage;
use presence_core::utils::default_ice_servers;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::MockSession;

#[tokio::test]
async fn test_newcomer_gets_ice_config_then_welcome() {
    init_tracing();

    let relay = create_test_relay();
    let mut alice = MockSession::connect(&relay).await.expect("connect");

    assert_eq!(
        alice.recv().await.unwrap(),
        ServerMessage::IceConfig {
            ice_servers: default_ice_servers()
        }
    );
    assert_eq!(
        alice.recv().await.unwrap(),
        ServerMessage::Welcome {
            session_id: alice.id.clone()
        }
    );
    assert_eq!(alice.recv().await.unwrap(), ServerMessage::LiveCount { count: 1 });
}

#[tokio::test]
async fn test_existing_sessions_see_joined_but_newcomer_does_not() {
    init_tracing();

    let relay = create_test_relay();
    let mut alice = MockSession::join(&relay).await.expect("alice joins");
    alice.drain();

    let mut bob = MockSession::join(&relay).await.expect("bob joins");

    assert_eq!(
        alice.drain(),
        vec![
            ServerMessage::Joined { id: bob.id.clone() },
            ServerMessage::LiveCount { count: 2 },
        ]
    );

    let bob_frames = bob.drain();
    assert_eq!(bob_frames, vec![ServerMessage::LiveCount { count: 2 }]);
    assert!(
        !bob_frames
            .iter()
            .any(|m| matches!(m, ServerMessage::Joined { .. })),
        "newcomer must not be told about its own join"
    );
}

#[tokio::test]
async fn test_session_ids_are_unique() {
    init_tracing();

    let relay = create_test_relay();
    let mut ids = Vec::new();
    for _ in 0..8 {
        ids.push(MockSession::join(&relay).await.expect("join").id);
    }

    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}
