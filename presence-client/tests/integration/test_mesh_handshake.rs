use presence_core::SdpKind;
use presence_core::mesh::{CloseReason, LinkState, MeshEvent, initiates};
use std::sync::Arc;

use crate::integration::{TestPeer, init_tracing, start_relay};
use crate::utils::{MockTransportFactory, TransportCall};

fn connected_to(remote: &presence_core::SessionId) -> impl FnMut(&MeshEvent) -> bool + '_ {
    move |e| {
        matches!(e, MeshEvent::PeerStateChanged { remote: r, state: LinkState::Connected } if r == remote)
    }
}

#[tokio::test]
async fn test_two_clients_negotiate_a_link() {
    init_tracing();

    let (addr, _relay) = start_relay().await;
    let alice_factory = MockTransportFactory::new();
    let bob_factory = MockTransportFactory::new();

    let mut alice = TestPeer::start(addr, Arc::new(alice_factory.clone())).await;
    let mut bob = TestPeer::start(addr, Arc::new(bob_factory.clone())).await;

    let bob_id = bob.id.clone();
    let alice_id = alice.id.clone();
    alice.wait_for(connected_to(&bob_id)).await;
    bob.wait_for(connected_to(&alice_id)).await;

    let (initiator, responder) = if initiates(&alice.id, &bob.id) {
        ((&alice_factory, &alice.id), (&bob_factory, &bob.id))
    } else {
        ((&bob_factory, &bob.id), (&alice_factory, &alice.id))
    };

    // The offerer's candidate was gathered before its offer went out but
    // only reached the responder behind it.
    assert_eq!(
        responder.0.wait_for_calls(initiator.1, 4).await,
        vec![
            TransportCall::Open,
            TransportCall::SetRemote(SdpKind::Offer),
            TransportCall::CreateAnswer,
            TransportCall::AddCandidate("candidate:offerer".to_owned()),
        ]
    );
    assert_eq!(
        initiator.0.wait_for_calls(responder.1, 4).await,
        vec![
            TransportCall::Open,
            TransportCall::CreateOffer,
            TransportCall::SetRemote(SdpKind::Answer),
            TransportCall::AddCandidate("candidate:answerer".to_owned()),
        ]
    );

    alice.stop().await.unwrap();
    bob.stop().await.unwrap();
}

#[tokio::test]
async fn test_remote_avatar_and_tracks_are_reported() {
    init_tracing();

    let (addr, _relay) = start_relay().await;
    let mut alice = TestPeer::start(addr, Arc::new(MockTransportFactory::new())).await;
    let mut bob = TestPeer::start(addr, Arc::new(MockTransportFactory::new())).await;

    let mut pose = presence_core::Transform::default();
    pose.position.x = 7.0;
    bob.pose.send_replace(pose);

    let bob_id = bob.id.clone();
    alice
        .wait_for(|e| {
            matches!(e, MeshEvent::AvatarUpdated { id, transform } if *id == bob_id && transform.position.x == 7.0)
        })
        .await;

    // Only the responder applies a remote offer, which is when the mock
    // reports an incoming track.
    let (responder, initiator_id) = if initiates(&alice.id, &bob.id) {
        (&mut bob, alice.id.clone())
    } else {
        (&mut alice, bob_id.clone())
    };
    responder
        .wait_for(|e| matches!(e, MeshEvent::TrackReceived { remote, .. } if *remote == initiator_id))
        .await;

    alice.stop().await.unwrap();
    bob.stop().await.unwrap();
}

#[tokio::test]
async fn test_receive_only_client_still_connects() {
    init_tracing();

    let (addr, _relay) = start_relay().await;
    let mut alice = TestPeer::start(addr, Arc::new(MockTransportFactory::receive_only())).await;
    let mut bob = TestPeer::start(addr, Arc::new(MockTransportFactory::new())).await;

    alice
        .wait_for(|e| matches!(e, MeshEvent::MediaUnavailable { .. }))
        .await;

    let bob_id = bob.id.clone();
    let alice_id = alice.id.clone();
    alice.wait_for(connected_to(&bob_id)).await;
    bob.wait_for(connected_to(&alice_id)).await;

    alice.stop().await.unwrap();
    bob.stop().await.unwrap();
}

#[tokio::test]
async fn test_failed_answer_closes_only_that_link() {
    init_tracing();

    let (addr, _relay) = start_relay().await;
    let mut alice = TestPeer::start(addr, Arc::new(MockTransportFactory::failing_answers())).await;
    let mut bob = TestPeer::start(addr, Arc::new(MockTransportFactory::failing_answers())).await;

    let (responder, initiator_id) = if initiates(&alice.id, &bob.id) {
        (&mut bob, alice.id.clone())
    } else {
        (&mut alice, bob.id.clone())
    };

    responder
        .wait_for(|e| {
            matches!(
                e,
                MeshEvent::PeerClosed { remote, reason: CloseReason::Failed } if *remote == initiator_id
            )
        })
        .await;

    alice.stop().await.unwrap();
    bob.stop().await.unwrap();
}
