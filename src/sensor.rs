//! Sensor adapters
//!
//! Each sensor is a long-running async loop with its own cadence. Loops stop
//! when their [`CancellationToken`] fires and never treat a capture failure as
//! fatal: they log it, back off briefly and try again.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod audio;
pub mod chord;
pub mod hotkey;
pub mod screen;

pub use audio::{AudioBuffer, AudioCapture, AudioSensor, AudioSettings, SpeechRecognizer};
pub use chord::Chord;
pub use hotkey::{
    ChannelHotkeyBackend, HotkeyBackend, HotkeyBinding, HotkeySensor, KeyStateSource,
    PollingHotkeyBackend,
};
pub use screen::{CommandTextExtractor, FileTextExtractor, ScreenSensor, TextExtractor};

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Capacity of the ordered sensor event channel.
pub const SENSOR_CHANNEL_CAPACITY: usize = 64;

/// Pause after a failed capture before the next attempt.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Sleep for `duration` unless cancelled first. Returns `false` on cancel.
pub(crate) async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
