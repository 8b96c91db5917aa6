//! Activation control
//!
//! A two-state machine (`Idle`, `Active`) that gates display and voice
//! command forwarding. [`machine`] holds the pure transition function;
//! [`controller`] is the single task that feeds it events in arrival order and
//! carries out its effects.

pub mod controller;
pub mod machine;

pub use controller::{ActivationController, ControllerChannels, VoiceRequest};
pub use machine::{welcome_batch, ActivationMachine, ActivationState, ControlInput, Effect};
