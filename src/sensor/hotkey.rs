//! Hotkey sensor: chord bindings mapped to activation actions.
//!
//! Backends either deliver chord presses from a subscription (preferred) or
//! poll key state on a bounded, jittered interval and detect rising edges.

use super::chord::Chord;
use super::{sleep_or_cancel, ERROR_BACKOFF};
use crate::error::SensorError;
use crate::types::{HotkeyAction, SensorEvent};
use async_trait::async_trait;
use rand::Rng;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default poll interval; human key presses last well over 100ms.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Upper bound of random jitter added to each poll.
pub const POLL_JITTER: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub chord: Chord,
    pub action: HotkeyAction,
}

impl HotkeyBinding {
    pub fn new(chord: Chord, action: HotkeyAction) -> Self {
        Self { chord, action }
    }
}

/// Source of chord presses.
#[async_trait]
pub trait HotkeyBackend: Send {
    fn register(&mut self, chord: &Chord) -> Result<(), SensorError>;

    fn unregister(&mut self, chord: &Chord) -> Result<(), SensorError>;

    /// Wait for the next press of a registered chord. `Ok(None)` means the
    /// backend has shut down.
    async fn next_chord(&mut self) -> Result<Option<Chord>, SensorError>;
}

/// Subscription backend fed by a channel of chord presses.
pub struct ChannelHotkeyBackend {
    presses: mpsc::Receiver<Chord>,
    registered: HashSet<Chord>,
}

impl ChannelHotkeyBackend {
    pub fn new(presses: mpsc::Receiver<Chord>) -> Self {
        Self {
            presses,
            registered: HashSet::new(),
        }
    }
}

#[async_trait]
impl HotkeyBackend for ChannelHotkeyBackend {
    fn register(&mut self, chord: &Chord) -> Result<(), SensorError> {
        self.registered.insert(chord.clone());
        Ok(())
    }

    fn unregister(&mut self, chord: &Chord) -> Result<(), SensorError> {
        self.registered.remove(chord);
        Ok(())
    }

    async fn next_chord(&mut self) -> Result<Option<Chord>, SensorError> {
        while let Some(chord) = self.presses.recv().await {
            if self.registered.contains(&chord) {
                return Ok(Some(chord));
            }
            debug!(chord = %chord, "Ignoring unregistered chord");
        }
        Ok(None)
    }
}

/// Snapshot of currently held keys, for polling backends.
pub trait KeyStateSource: Send {
    fn pressed_keys(&mut self) -> Result<BTreeSet<String>, SensorError>;
}

/// Polls a [`KeyStateSource`] and reports chords on their rising edge.
pub struct PollingHotkeyBackend<S> {
    source: S,
    registered: Vec<Chord>,
    held: HashSet<Chord>,
    pending: VecDeque<Chord>,
    interval: Duration,
    jitter: Duration,
}

impl<S: KeyStateSource> PollingHotkeyBackend<S> {
    pub fn new(source: S) -> Self {
        Self::with_interval(source, POLL_INTERVAL, POLL_JITTER)
    }

    pub fn with_interval(source: S, interval: Duration, jitter: Duration) -> Self {
        Self {
            source,
            registered: Vec::new(),
            held: HashSet::new(),
            pending: VecDeque::new(),
            // Never a busy loop.
            interval: interval.max(Duration::from_millis(1)),
            jitter,
        }
    }

    fn poll_once(&mut self) -> Result<(), SensorError> {
        let pressed = self.source.pressed_keys()?;
        let satisfied: HashSet<Chord> = self
            .registered
            .iter()
            .filter(|chord| chord.is_satisfied_by(&pressed))
            .cloned()
            .collect();

        for chord in &self.registered {
            if satisfied.contains(chord) && !self.held.contains(chord) {
                self.pending.push_back(chord.clone());
            }
        }
        self.held = satisfied;
        Ok(())
    }

    fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.interval;
        }
        self.interval + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

#[async_trait]
impl<S: KeyStateSource> HotkeyBackend for PollingHotkeyBackend<S> {
    fn register(&mut self, chord: &Chord) -> Result<(), SensorError> {
        if !self.registered.contains(chord) {
            self.registered.push(chord.clone());
        }
        Ok(())
    }

    fn unregister(&mut self, chord: &Chord) -> Result<(), SensorError> {
        self.registered.retain(|c| c != chord);
        self.held.remove(chord);
        Ok(())
    }

    async fn next_chord(&mut self) -> Result<Option<Chord>, SensorError> {
        loop {
            if let Some(chord) = self.pending.pop_front() {
                return Ok(Some(chord));
            }
            self.poll_once()?;
            if let Some(chord) = self.pending.pop_front() {
                return Ok(Some(chord));
            }
            tokio::time::sleep(self.next_delay()).await;
        }
    }
}

/// Emits `HotkeyPressed` for every bound chord press.
pub struct HotkeySensor {
    backend: Box<dyn HotkeyBackend>,
    bindings: Vec<HotkeyBinding>,
    events: mpsc::Sender<SensorEvent>,
}

impl HotkeySensor {
    pub fn new(
        backend: Box<dyn HotkeyBackend>,
        bindings: Vec<HotkeyBinding>,
        events: mpsc::Sender<SensorEvent>,
    ) -> Self {
        Self {
            backend,
            bindings,
            events,
        }
    }

    fn action_for(&self, chord: &Chord) -> Option<HotkeyAction> {
        self.bindings
            .iter()
            .find(|binding| &binding.chord == chord)
            .map(|binding| binding.action)
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        for binding in &self.bindings {
            match self.backend.register(&binding.chord) {
                Ok(()) => debug!(chord = %binding.chord, action = %binding.action, "Hotkey registered"),
                Err(err) => warn!(chord = %binding.chord, error = %err, "Hotkey registration failed"),
            }
        }
        info!(bindings = self.bindings.len(), "Hotkey sensor started");

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = self.backend.next_chord() => next,
            };

            match next {
                Ok(Some(chord)) => {
                    let Some(action) = self.action_for(&chord) else {
                        continue;
                    };
                    info!(chord = %chord, action = %action, "Hotkey pressed");
                    if self
                        .events
                        .send(SensorEvent::HotkeyPressed { action })
                        .await
                        .is_err()
                    {
                        info!("Sensor event channel closed");
                        break;
                    }
                }
                Ok(None) => {
                    info!("Hotkey backend closed");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "Hotkey backend error");
                    if !sleep_or_cancel(ERROR_BACKOFF, &cancel).await {
                        break;
                    }
                }
            }
        }

        for binding in &self.bindings {
            if let Err(err) = self.backend.unregister(&binding.chord) {
                warn!(chord = %binding.chord, error = %err, "Hotkey unregistration failed");
            }
        }
        info!("Hotkey sensor stopped");
    }
}
