//! Navquill - editor navigation and access history engine.
//!
//! Tracks, replays, and persists a user's editor navigation history for
//! an embedding editor frontend: back/forward navigation with selection
//! awareness, cycling through recently used editors, reopening closed
//! editors, jumping to the last edit location, and a deduplicated,
//! bounded, persisted global access history.
//!
//! The engine renders nothing and registers no keybindings. The
//! embedder implements the collaborator traits in [`host`] and
//! [`store`], pumps its events into
//! [`HistoryService::process`](service::HistoryService::process) once
//! per scheduling turn, and calls the exposed operations from its own
//! command layer.
//!
//! # Modules
//!
//! - `model`: resources, editor references, selections
//! - `host`: collaborator traits and event types
//! - `matcher`: identity matching across representations
//! - `service`: the history stacks and the [`HistoryService`] facade
//! - `store`: history persistence
//! - `config`: engine limits

pub mod config;
pub mod host;
pub mod matcher;
pub mod model;
pub mod service;
pub mod store;

pub use config::EngineConfig;
pub use service::HistoryService;
