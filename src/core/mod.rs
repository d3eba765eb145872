//! # Core Playback Logic
//!
//! This module contains the carousel's business logic.
//! It knows nothing about any specific UI technology or runtime.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Sequence (slides)    │
//!                    │  • Engine (state)       │
//!                    │  • Controller (glue)    │
//!                    │                         │
//!                    │  No awaits. No UI.      │
//!                    └───────────┬─────────────┘
//!                                │ CarouselEvent
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │  Headless  │      │   Native   │      │    Web     │
//!     │   player   │      │  widgets   │      │    DOM     │
//!     │  (tokio)   │      │  (host)    │      │  (host)    │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`slide`]: `Slide` and the non-empty `Sequence`
//! - [`progress`]: per-slide timed progress counters
//! - [`engine`]: the playback state machine
//! - [`controller`]: input interpretation and output events
//! - [`config`]: settings and their override hierarchy

pub mod config;
pub mod controller;
pub mod engine;
pub mod progress;
pub mod slide;
