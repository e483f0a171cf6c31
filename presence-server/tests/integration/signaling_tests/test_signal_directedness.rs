use presence_core::{SessionId, SignalPayload};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::MockSession;

fn offer() -> SignalPayload {
    SignalPayload::Offer {
        sdp: "v=0".to_owned(),
    }
}

#[tokio::test]
async fn test_bystanders_never_see_directed_signals() {
    init_tracing();

    let relay = create_test_relay();
    let mut alice = MockSession::join(&relay).await.unwrap();
    let mut bob = MockSession::join(&relay).await.unwrap();
    let mut carol = MockSession::join(&relay).await.unwrap();
    alice.drain();
    bob.drain();
    carol.drain();

    relay
        .signal(alice.id.clone(), bob.id.clone(), offer())
        .await
        .unwrap();

    assert_eq!(bob.settle().await.len(), 1);
    assert!(alice.settle().await.is_empty());
    assert!(carol.settle().await.is_empty());
}

#[tokio::test]
async fn test_signal_to_departed_session_is_dropped() {
    init_tracing();

    let relay = create_test_relay();
    let mut alice = MockSession::join(&relay).await.unwrap();
    let bob = MockSession::join(&relay).await.unwrap();
    relay.disconnect(bob.id.clone()).await.unwrap();
    alice.settle().await;

    relay
        .signal(alice.id.clone(), bob.id.clone(), offer())
        .await
        .unwrap();
    relay
        .signal(alice.id.clone(), SessionId::from("nobody"), offer())
        .await
        .unwrap();

    assert!(alice.settle().await.is_empty());
    assert_eq!(relay.live_count(), 1);
}

#[tokio::test]
async fn test_signal_from_unregistered_sender_is_dropped() {
    init_tracing();

    let relay = create_test_relay();
    let mut alice = MockSession::join(&relay).await.unwrap();
    alice.drain();

    relay
        .signal(SessionId::from("ghost"), alice.id.clone(), offer())
        .await
        .unwrap();

    assert!(alice.settle().await.is_empty());
}
