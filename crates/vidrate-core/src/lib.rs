//! vidrate-core: session state machine, playlists and ratings log.
//!
//! This crate defines the session model and the controller that walks a
//! tester through a training playlist and a real playlist, plus the
//! file-backed loader, ratings sink and state store it runs against.

pub mod config;
pub mod controller;
pub mod error;
pub mod mock;
pub mod model;
pub mod playlist;
pub mod rating;
pub mod runner;
pub mod sink;
pub mod store;
pub mod traits;

pub use controller::{ControllerOptions, Effect, Event, Notice, SessionController, SessionState};
pub use error::{SessionError, SessionResult};
pub use runner::SessionRunner;
