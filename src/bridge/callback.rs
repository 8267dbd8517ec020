//! Callback correlation.
//!
//! The host cannot receive return values from the surface. Instead every
//! result-owing command carries a caller-chosen token, and the result comes
//! back later as a single named event whose payload starts with that token.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::{BridgeError, BridgeResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallbackToken(pub i64);

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One outbound event: `payload` is `[token, ...result]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BridgeEvent {
    pub name: String,
    pub payload: Vec<Value>,
}

impl BridgeEvent {
    pub fn token(&self) -> Option<CallbackToken> {
        self.payload.first().and_then(Value::as_i64).map(CallbackToken)
    }

    /// Result fields following the token.
    pub fn result(&self) -> &[Value] {
        self.payload.get(1..).unwrap_or(&[])
    }
}

pub type EventReceiver = UnboundedReceiver<BridgeEvent>;

/// Live tokens, each tagged with the generation of the registration that
/// reserved it.
#[derive(Default)]
struct PendingSet {
    live: HashMap<CallbackToken, u64>,
    next_generation: u64,
}

impl PendingSet {
    /// Remove `token` if it is live and, when `generation` is given, still
    /// belongs to that registration.
    fn take(&mut self, token: CallbackToken, generation: Option<u64>) -> bool {
        match (self.live.get(&token), generation) {
            (Some(&live), Some(expected)) if live != expected => false,
            (Some(_), _) => {
                self.live.remove(&token);
                true
            }
            (None, _) => false,
        }
    }
}

/// Tracks outstanding tokens and owns the sending half of the event channel.
/// Cloning shares the same pending set and channel.
#[derive(Clone)]
pub struct CallbackRegistry {
    pending: Arc<Mutex<PendingSet>>,
    sender: UnboundedSender<BridgeEvent>,
    event_name: Arc<str>,
}

impl CallbackRegistry {
    pub fn new(event_name: &str) -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let registry = Self {
            pending: Arc::new(Mutex::new(PendingSet::default())),
            sender,
            event_name: Arc::from(event_name),
        };
        (registry, receiver)
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Reserve `token` for a dispatched command. Tokens cannot be reused
    /// while a previous call under the same value is still outstanding.
    pub fn register(&self, token: CallbackToken) -> BridgeResult<PendingCallback> {
        let generation = {
            let mut pending = self.lock();
            if pending.live.contains_key(&token) {
                return Err(BridgeError::TokenInUse(token));
            }
            let generation = pending.next_generation;
            pending.next_generation += 1;
            pending.live.insert(token, generation);
            generation
        };
        log::trace!("[callback] token {token} pending (generation {generation})");
        Ok(PendingCallback {
            token,
            generation,
            registry: self.clone(),
            resolved: false,
        })
    }

    /// Emit `[token, ...payload]` for whichever call currently holds `token`
    /// and release it.
    pub fn resolve(&self, token: CallbackToken, payload: Vec<Value>) -> BridgeResult<()> {
        self.settle(token, None, payload)
    }

    pub fn is_pending(&self, token: CallbackToken) -> bool {
        self.lock().live.contains_key(&token)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().live.len()
    }

    fn settle(
        &self,
        token: CallbackToken,
        generation: Option<u64>,
        payload: Vec<Value>,
    ) -> BridgeResult<()> {
        if !self.lock().take(token, generation) {
            return Err(BridgeError::UnknownToken(token));
        }

        let mut event_payload = Vec::with_capacity(payload.len() + 1);
        event_payload.push(Value::from(token.0));
        event_payload.extend(payload);
        let event = BridgeEvent {
            name: self.event_name.to_string(),
            payload: event_payload,
        };

        log::debug!("[callback] resolving token {token}");
        self.sender.send(event).map_err(|_| {
            log::warn!("[callback] event channel closed, result for token {token} lost");
            BridgeError::EventChannelClosed(token)
        })
    }

    fn release(&self, token: CallbackToken, generation: u64) -> bool {
        self.lock().take(token, Some(generation))
    }

    fn lock(&self) -> MutexGuard<'_, PendingSet> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A reserved token that owes exactly one result. Resolving consumes it.
///
/// Dropping it unresolved (an interrupted animation whose completion never
/// runs) frees the token without emitting anything. Once the token has been
/// resolved elsewhere and handed to a newer call, this callback no longer
/// affects it.
pub struct PendingCallback {
    token: CallbackToken,
    generation: u64,
    registry: CallbackRegistry,
    resolved: bool,
}

impl PendingCallback {
    pub fn token(&self) -> CallbackToken {
        self.token
    }

    /// Fails with `UnknownToken` when the token was already resolved through
    /// [`CallbackRegistry::resolve`].
    pub fn resolve(mut self, payload: Vec<Value>) -> BridgeResult<()> {
        self.resolved = true;
        self.registry.settle(self.token, Some(self.generation), payload)
    }
}

impl Drop for PendingCallback {
    fn drop(&mut self) {
        if !self.resolved && self.registry.release(self.token, self.generation) {
            log::warn!(
                "[callback] token {} dropped without a result; caller will not be notified",
                self.token
            );
        }
    }
}

impl fmt::Debug for PendingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCallback")
            .field("token", &self.token)
            .field("generation", &self.generation)
            .field("resolved", &self.resolved)
            .finish()
    }
}
