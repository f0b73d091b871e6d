//! Capture module: turns the recognizer's mailbox into spelling updates
//!
//! One listener thread per round polls the mailbox and drives a
//! `SpellingSession`, reporting back over a channel.

mod listener;

pub use listener::{
    AbortReason, CaptureConfig, CaptureContext, CaptureError, CaptureEvent, SpellingListener,
};
