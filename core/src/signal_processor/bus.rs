//! Signal fan-out to registered handlers and channel subscribers

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, TryLockError};

use super::handler::SignalHandler;
use super::signal::GameSignal;

/// Delivers each emitted signal to every handler, then every live channel.
///
/// Signals are queued and drained by whichever thread holds the handler list.
/// A handler may emit further signals; they are delivered after the current
/// one, on the same drain.
#[derive(Default)]
pub struct SignalBus {
    handlers: Mutex<Vec<Box<dyn SignalHandler + Send>>>,
    channels: Mutex<Vec<Sender<GameSignal>>>,
    pending: Mutex<VecDeque<GameSignal>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: Box<dyn SignalHandler + Send>) {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push(handler);
        }
    }

    /// Receive signals through a channel. Dropping the receiver unsubscribes.
    pub fn channel(&self) -> Receiver<GameSignal> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut channels) = self.channels.lock() {
            channels.push(tx);
        }
        rx
    }

    pub fn emit(&self, signal: GameSignal) {
        tracing::debug!(?signal, "Emitting signal");
        if let Ok(mut pending) = self.pending.lock() {
            pending.push_back(signal);
        }
        self.drain();
    }

    /// Deliver queued signals until the queue is empty. Returns straight away
    /// when another drain already holds the handlers; that drain picks up
    /// anything queued before it lets go.
    fn drain(&self) {
        loop {
            let mut handlers = match self.handlers.try_lock() {
                Ok(handlers) => handlers,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            while let Some(signal) = self.next_pending() {
                self.deliver(handlers.as_mut_slice(), &signal);
            }
            drop(handlers);

            // A signal queued between the last pop and the unlock
            if self.pending.lock().map(|p| p.is_empty()).unwrap_or(true) {
                return;
            }
        }
    }

    fn next_pending(&self) -> Option<GameSignal> {
        self.pending.lock().ok().and_then(|mut p| p.pop_front())
    }

    fn deliver(&self, handlers: &mut [Box<dyn SignalHandler + Send>], signal: &GameSignal) {
        for handler in handlers.iter_mut() {
            handler.handle_signal(signal);
        }
        if let Ok(mut channels) = self.channels.lock() {
            channels.retain(|tx| tx.send(signal.clone()).is_ok());
        }
    }

    pub fn emit_all(&self, signals: Vec<GameSignal>) {
        for signal in signals {
            self.emit(signal);
        }
    }
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.lock().map(|h| h.len()).unwrap_or(0);
        let channels = self.channels.lock().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("SignalBus")
            .field("handlers", &handlers)
            .field("channels", &channels)
            .finish()
    }
}
