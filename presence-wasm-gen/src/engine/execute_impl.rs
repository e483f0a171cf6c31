use futures::channel::mpsc;
use presence_core::SessionId;
use presence_core::mesh::MeshAction;
use presence_core::utils::default_ice_servers;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::engine::{Deadline, EngineInner, PeerSignal, PeerSlot, PresenceEngine};
use crate::error::EngineError;
use crate::logger::Logger;

impl PresenceEngine {
    /// Runs negotiator output in order. Borrows of `inner` never span a call
    /// into JS or into another engine entry point.
    pub(crate) fn execute(inner: &Rc<RefCell<EngineInner>>, actions: Vec<MeshAction>) {
        for action in actions {
            match action {
                MeshAction::Send(msg) => match msg.encode() {
                    Ok(json) => Self::send_text(inner, &json),
                    Err(e) => Logger::warn(&format!("Failed to encode frame: {}", e)),
                },

                MeshAction::Notify(event) => Self::dispatch_event(inner, &event),

                MeshAction::OpenPeer { remote } => {
                    let (tx, rx) = mpsc::unbounded();
                    let (generation, ice_servers, timeout_ms) = {
                        let mut guard = inner.borrow_mut();
                        let generation = guard.next_generation;
                        guard.next_generation += 1;
                        let ice_servers = guard
                            .session
                            .ice_servers()
                            .map(<[_]>::to_vec)
                            .unwrap_or_else(default_ice_servers);
                        (generation, ice_servers, guard.handshake_timeout_ms)
                    };

                    let deadline = match Self::arm_deadline(inner, &remote, generation, timeout_ms)
                    {
                        Ok(deadline) => Some(deadline),
                        Err(e) => {
                            Logger::warn(&format!("No handshake deadline for {}: {}", remote, e));
                            None
                        }
                    };
                    Self::spawn_peer_worker(inner, remote.clone(), generation, ice_servers, rx);
                    let slot = PeerSlot {
                        generation,
                        tx,
                        pc: None,
                        _deadline: deadline,
                    };
                    slot.push(MeshAction::OpenPeer {
                        remote: remote.clone(),
                    });

                    // Replaced slots close their connection on drop, after
                    // the borrow is released.
                    let old = inner.borrow_mut().peers.insert(remote, slot);
                    drop(old);
                }

                MeshAction::ClosePeer { remote } => {
                    let slot = inner.borrow_mut().peers.remove(&remote);
                    drop(slot);
                }

                action => {
                    let Some(remote) = action.remote().cloned() else {
                        continue;
                    };
                    let guard = inner.borrow();
                    match guard.peers.get(&remote) {
                        Some(slot) => {
                            slot.push(action);
                        }
                        None => Logger::debug(&format!("No peer worker for {}", remote)),
                    }
                }
            }
        }
    }

    /// Reports a handshake timeout for this worker generation after
    /// `timeout_ms`. The report is deferred to a task because handling it
    /// drops the slot that owns this callback.
    fn arm_deadline(
        inner: &Rc<RefCell<EngineInner>>,
        remote: &SessionId,
        generation: u64,
        timeout_ms: u32,
    ) -> Result<Deadline, EngineError> {
        let window = web_sys::window().ok_or(EngineError::Missing("no window"))?;

        let callback = {
            let inner = inner.clone();
            let remote = remote.clone();
            Closure::<dyn FnMut()>::wrap(Box::new(move || {
                let inner = inner.clone();
                let remote = remote.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    Self::on_peer_signal(&inner, &remote, generation, PeerSignal::HandshakeTimeout);
                });
            }))
        };

        let timeout = i32::try_from(timeout_ms).unwrap_or(i32::MAX);
        let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            timeout,
        )?;
        Ok(Deadline {
            handle,
            _callback: callback,
        })
    }

    pub(crate) fn send_text(inner: &Rc<RefCell<EngineInner>>, text: &str) {
        let guard = inner.borrow();
        let Some(ws) = guard.ws.as_ref().filter(|_| guard.connected) else {
            Logger::debug("Relay socket not open, dropping frame");
            return;
        };
        if let Err(e) = ws.send_with_str(text) {
            Logger::error("Failed to send relay frame", &e);
        }
    }
}
