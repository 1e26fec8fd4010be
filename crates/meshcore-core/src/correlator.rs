//! Request/response correlation.
//!
//! The protocol is strictly request/response with the device as server, so
//! the correlator keeps exactly one pending single-reply slot. Push codes
//! bypass the slot; the two tagged push codes (trace data, binary response)
//! are matched against registered tag waiters so concurrent long-running
//! operations cannot steal each other's results.
//!
//! Locking: both maps use `std::sync::Mutex` held only for map access,
//! never across an await point.

use std::{
    collections::HashMap,
    sync::Mutex,
};

use meshcore_proto::{Frame, ResponseCode};
use tokio::sync::oneshot;

/// Key of a tagged push waiter: (response code byte, tag).
pub(crate) type TagKey = (u8, u32);

/// Where a routed frame went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Routed {
    /// Completed the pending single-reply request.
    Pending,
    /// Delivered to a registered tag waiter.
    Tagged,
    /// Nobody claimed it; publish to event subscribers only.
    Unclaimed,
}

#[derive(Debug, Default)]
pub(crate) struct Correlator {
    slot: Mutex<Option<oneshot::Sender<Frame>>>,
    tagged: Mutex<HashMap<TagKey, oneshot::Sender<Frame>>>,
}

impl Correlator {
    /// Claim the pending slot for a new request.
    ///
    /// The caller serialises claims through the transport's command lock;
    /// a stale sender left by a timed-out caller is simply replaced.
    pub(crate) fn claim(&self) -> oneshot::Receiver<Frame> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(tx);
        }
        rx
    }

    /// Release the pending slot (timeout, cancellation, or send failure).
    pub(crate) fn release(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }

    /// Register a waiter for a tagged push code.
    pub(crate) fn register_tag(&self, key: TagKey) -> oneshot::Receiver<Frame> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut tagged) = self.tagged.lock() {
            tagged.insert(key, tx);
        }
        rx
    }

    /// Drop a tag waiter (its operation completed or was abandoned).
    pub(crate) fn unregister_tag(&self, key: TagKey) {
        if let Ok(mut tagged) = self.tagged.lock() {
            tagged.remove(&key);
        }
    }

    /// Drop every tag waiter; their receivers resolve with an error.
    /// Called when the link goes down.
    pub(crate) fn clear_tags(&self) {
        if let Ok(mut tagged) = self.tagged.lock() {
            tagged.clear();
        }
    }

    /// Route an inbound frame.
    ///
    /// Push codes never touch the pending slot: a tagged push goes to its
    /// waiter when one is registered, otherwise to subscribers. Any other
    /// frame completes the pending request if one exists — regardless of
    /// its code; the command surface decides whether the reply is
    /// acceptable.
    pub(crate) fn route(&self, frame: Frame) -> Routed {
        let Some(code) = frame.code().map(ResponseCode::from_u8) else {
            return Routed::Unclaimed;
        };

        if code.is_push() {
            if let Some(tag) = tag_of(code, frame.body()) {
                let waiter = self
                    .tagged
                    .lock()
                    .ok()
                    .and_then(|mut tagged| tagged.remove(&(code.to_u8(), tag)));
                if let Some(tx) = waiter {
                    if tx.send(frame).is_ok() {
                        return Routed::Tagged;
                    }
                    // Waiter gave up between registration and delivery.
                    return Routed::Unclaimed;
                }
            }
            return Routed::Unclaimed;
        }

        let pending = self.slot.lock().ok().and_then(|mut slot| slot.take());
        match pending {
            Some(tx) => {
                if tx.send(frame).is_ok() {
                    Routed::Pending
                } else {
                    Routed::Unclaimed
                }
            },
            None => Routed::Unclaimed,
        }
    }
}

/// Extract the correlation tag of a tagged push body.
///
/// Both tagged layouts carry `[reserved][tag u32 LE]` at the head.
fn tag_of(code: ResponseCode, body: &[u8]) -> Option<u32> {
    match code {
        ResponseCode::PushTraceData | ResponseCode::PushBinaryResponse => {
            let bytes = body.get(1..5)?;
            Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        },
        _ => None,
    }
}
