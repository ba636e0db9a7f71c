//! State-Observer – Zustands-Events eines Frame-Cryptors
//!
//! Solange kein Konsument angehaengt ist, landen Events in einer FIFO.
//! Beim Anhaengen wird die FIFO genau einmal in Reihenfolge geleert,
//! danach gehen Events direkt an den Konsumenten. Nach `detach` wird
//! wieder gepuffert.
//!
//! Zustellung und Pufferung laufen unter einem Mutex, damit Events aus
//! parallelen Frames nicht ueberholt oder doppelt zugestellt werden.

use framecrypt_core::FrameCryptorEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Obergrenze der gepufferten Events pro Observer
pub const DEFAULT_MAX_BUFFERED_EVENTS: usize = 1024;

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Konsument fuer Zustands-Events
pub trait EventSink: Send {
    /// Stellt ein Event zu
    ///
    /// `false` heisst: der Konsument ist weg. Das Event wird dann gepuffert.
    fn deliver(&self, event: &FrameCryptorEvent) -> bool;
}

impl EventSink for mpsc::UnboundedSender<FrameCryptorEvent> {
    fn deliver(&self, event: &FrameCryptorEvent) -> bool {
        self.send(event.clone()).is_ok()
    }
}

// ---------------------------------------------------------------------------
// StateObserver
// ---------------------------------------------------------------------------

struct ObserverInner {
    queue: VecDeque<FrameCryptorEvent>,
    sink: Option<Box<dyn EventSink>>,
}

/// Event-Kanal eines Frame-Cryptors
pub struct StateObserver {
    /// Fuer Log-Zeilen
    label: String,
    inner: Mutex<ObserverInner>,
    attached: AtomicBool,
    max_buffered: usize,
}

impl StateObserver {
    pub fn neu(label: impl Into<String>, max_buffered: usize) -> Self {
        Self {
            label: label.into(),
            inner: Mutex::new(ObserverInner {
                queue: VecDeque::new(),
                sink: None,
            }),
            attached: AtomicBool::new(false),
            max_buffered,
        }
    }

    /// Stellt zu oder puffert
    pub fn notify(&self, event: FrameCryptorEvent) {
        let mut inner = self.inner.lock();

        if let Some(sink) = inner.sink.as_ref() {
            if sink.deliver(&event) {
                return;
            }
            tracing::debug!(observer = %self.label, "Event-Konsument nicht mehr erreichbar – puffere");
            inner.sink = None;
            self.attached.store(false, Ordering::SeqCst);
        }

        self.puffern(&mut inner, event);
    }

    /// Haengt einen Konsumenten an und leert den Puffer an ihn
    ///
    /// Gibt `false` zurueck wenn der Konsument schon beim Leeren nicht mehr
    /// erreichbar war. Nicht zugestellte Events bleiben dann im Puffer.
    pub fn attach(&self, sink: Box<dyn EventSink>) -> bool {
        let mut inner = self.inner.lock();

        let mut zugestellt = 0usize;
        while let Some(event) = inner.queue.pop_front() {
            if !sink.deliver(&event) {
                inner.queue.push_front(event);
                tracing::debug!(
                    observer = %self.label,
                    zugestellt,
                    verbleibend = inner.queue.len(),
                    "Konsument beim Anhaengen nicht erreichbar"
                );
                return false;
            }
            zugestellt += 1;
        }

        inner.sink = Some(sink);
        self.attached.store(true, Ordering::SeqCst);
        tracing::debug!(observer = %self.label, zugestellt, "Event-Konsument angehaengt");
        true
    }

    /// Haengt den Konsumenten ab; weitere Events werden gepuffert
    pub fn detach(&self) {
        let mut inner = self.inner.lock();
        if inner.sink.take().is_some() {
            tracing::debug!(observer = %self.label, "Event-Konsument abgehaengt");
        }
        self.attached.store(false, Ordering::SeqCst);
    }

    /// Haengt einen tokio-Channel an und gibt dessen Empfaenger zurueck
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<FrameCryptorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Der Empfaenger existiert noch, das Leeren kann nicht scheitern
        self.attach(Box::new(tx));
        rx
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn buffered_len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    fn puffern(&self, inner: &mut ObserverInner, event: FrameCryptorEvent) {
        if self.max_buffered == 0 {
            tracing::warn!(observer = %self.label, "Event-Puffer deaktiviert – Event verworfen");
            return;
        }
        if inner.queue.len() >= self.max_buffered {
            inner.queue.pop_front();
            tracing::warn!(
                observer = %self.label,
                max = self.max_buffered,
                "Event-Puffer voll – aeltestes Event verworfen"
            );
        }
        inner.queue.push_back(event);
    }
}

impl std::fmt::Debug for StateObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateObserver")
            .field("label", &self.label)
            .field("attached", &self.is_attached())
            .field("max_buffered", &self.max_buffered)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
