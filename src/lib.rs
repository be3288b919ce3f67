//! Voice-driven coaching sessions.
//!
//! A user is walked through a scripted conversation while their speech is
//! transcribed and an emotion label is sampled.  Every few seconds the
//! accumulated transcript and emotion are sent to an advisory backend and
//! the returned guidance is appended to a running log.
//!
//! Speech recognition, speech synthesis and emotion classification are
//! external; this crate orchestrates their inputs and outputs.

pub mod advice;
pub mod capture;
pub mod config;
pub mod emotion;
pub mod script;
pub mod session;
pub mod transcript;
pub mod voice;
