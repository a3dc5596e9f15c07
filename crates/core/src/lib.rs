//! Core library for Cadence, a beat-indexed scene scheduler.
//!
//! A [`SceneManager`] owns named [`Scene`]s, a global beat clock and a list of
//! one-shot [`Event`]s. Each scene runs its own beat clock and asks its
//! [`Generator`]s, once per frame, whether their [`BeatPredicate`] holds; the
//! generators then hand draw and clear requests to whatever rendering
//! backend their callbacks capture. Nothing in this crate owns a clock or a
//! drawing surface: a host loop calls [`SceneManager::request_next`] once per
//! displayed frame.

pub mod config;
pub mod data;
pub mod error;
pub mod event;
pub mod generator;
pub mod predicate;
pub mod scene;
pub mod timeline;

/// Discrete tick of the animation clock.
pub type Beat = i64;

pub use config::HostConfig;
pub use data::{DataStore, Value};
pub use error::{Result, TimelineError};
pub use event::{Event, EventAction};
pub use generator::{Activation, Generator, GeneratorCtx, SceneBinding};
pub use predicate::BeatPredicate;
pub use scene::Scene;
pub use timeline::SceneManager;
