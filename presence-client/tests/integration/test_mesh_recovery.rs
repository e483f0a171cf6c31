use futures::{SinkExt, StreamExt};
use presence_client::ClientConfig;
use presence_core::mesh::{CloseReason, MeshEvent};
use presence_core::{ClientMessage, ServerMessage, SessionId, Transform};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::integration::{EVENT_TIMEOUT_MS, TestPeer, init_tracing, test_config};
use crate::utils::{MockTransportFactory, TransportCall};

/// A stand-in relay for a single client. It welcomes the client as `local`
/// and keeps broadcasting `remote`'s avatar until the test injects that
/// avatar's departure.
struct ScriptedRelay {
    addr: SocketAddr,
    inject: mpsc::UnboundedSender<ServerMessage>,
    received: mpsc::UnboundedReceiver<ClientMessage>,
}

impl ScriptedRelay {
    async fn start(local: &str, remote: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (inject, mut inject_rx) = mpsc::unbounded_channel::<ServerMessage>();
        let (received_tx, received) = mpsc::unbounded_channel();
        let local = SessionId::from(local);
        let remote = SessionId::from(remote);

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let welcome = ServerMessage::Welcome { session_id: local };
            ws.send(Message::Text(welcome.encode().unwrap().into()))
                .await
                .unwrap();

            let mut remote_present = true;
            let mut ticker = tokio::time::interval(Duration::from_millis(50));
            loop {
                let outgoing = tokio::select! {
                    frame = ws.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Ok(msg) = ClientMessage::decode(text.as_str()) {
                                let _ = received_tx.send(msg);
                            }
                            continue;
                        }
                        Some(Ok(_)) => continue,
                        _ => break,
                    },
                    Some(msg) = inject_rx.recv() => {
                        if matches!(&msg, ServerMessage::Departed { id } if *id == remote) {
                            remote_present = false;
                        }
                        msg
                    }
                    _ = ticker.tick() => {
                        if !remote_present {
                            continue;
                        }
                        ServerMessage::transform(remote.clone(), Transform::default())
                    }
                };
                if ws
                    .send(Message::Text(outgoing.encode().unwrap().into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        Self {
            addr,
            inject,
            received,
        }
    }

    fn inject(&self, msg: ServerMessage) {
        self.inject.send(msg).expect("relay task gone");
    }

    async fn next_offer(&mut self) -> SessionId {
        let deadline = Duration::from_millis(EVENT_TIMEOUT_MS);
        tokio::time::timeout(deadline, async {
            loop {
                match self.received.recv().await.expect("relay task gone") {
                    ClientMessage::Offer { to, .. } => return to,
                    _ => continue,
                }
            }
        })
        .await
        .expect("Timeout waiting for an offer")
    }
}

#[tokio::test]
async fn test_unanswered_offer_times_out_and_is_retried() {
    init_tracing();

    let mut relay = ScriptedRelay::start("a", "b").await;
    let factory = MockTransportFactory::new();
    let config = ClientConfig {
        handshake_timeout: Duration::from_millis(200),
        ..test_config(relay.addr)
    };
    let mut client = TestPeer::start_with(config, Arc::new(factory.clone())).await;
    let b = SessionId::from("b");

    // b never answers.
    assert_eq!(relay.next_offer().await, b);
    client
        .wait_for(|e| {
            matches!(
                e,
                MeshEvent::PeerClosed { remote, reason: CloseReason::TimedOut } if *remote == b
            )
        })
        .await;
    assert_eq!(relay.next_offer().await, b);

    let calls = factory.wait_for_calls(&b, 5).await;
    let offers = calls
        .iter()
        .filter(|call| **call == TransportCall::CreateOffer)
        .count();
    assert!(offers >= 2, "expected a second offer, got {:?}", calls);
    assert!(calls.contains(&TransportCall::Close));

    client.stop().await.unwrap();
}

#[tokio::test]
async fn test_departure_interrupts_a_stuck_handshake() {
    init_tracing();

    let relay = ScriptedRelay::start("b", "a").await;
    let factory = MockTransportFactory::stalling_answers();
    let mut client = TestPeer::start(relay.addr, Arc::new(factory.clone())).await;
    let a = SessionId::from("a");

    relay.inject(ServerMessage::Offer {
        from: a.clone(),
        sdp: "offer-from-a".to_owned(),
    });
    let calls = factory.wait_for_call(&a, TransportCall::CreateAnswer).await;
    assert_eq!(calls.last(), Some(&TransportCall::CreateAnswer));

    relay.inject(ServerMessage::Departed { id: a.clone() });
    client
        .wait_for(|e| {
            matches!(
                e,
                MeshEvent::PeerClosed { remote, reason: CloseReason::Departed } if *remote == a
            )
        })
        .await;

    // The answer is still pending, yet the transport is released.
    let calls = factory.wait_for_call(&a, TransportCall::Close).await;
    assert_eq!(calls.last(), Some(&TransportCall::Close));

    client.stop().await.unwrap();
}
