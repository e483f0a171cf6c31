use presence_core::ServerMessage;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::MockSession;

#[tokio::test]
async fn test_live_count_follows_joins_and_departures() {
    init_tracing();

    let relay = create_test_relay();
    let mut alice = MockSession::join(&relay).await.unwrap();
    let bob = MockSession::join(&relay).await.unwrap();
    let carol = MockSession::join(&relay).await.unwrap();
    assert_eq!(relay.live_count(), 3);

    relay.disconnect(bob.id.clone()).await.unwrap();
    relay.disconnect(carol.id.clone()).await.unwrap();

    let counts: Vec<usize> = alice
        .settle()
        .await
        .into_iter()
        .filter_map(|m| match m {
            ServerMessage::LiveCount { count } => Some(count),
            _ => None,
        })
        .collect();

    assert_eq!(counts, vec![1, 2, 3, 2, 1]);
    assert_eq!(relay.live_count(), 1);
}
