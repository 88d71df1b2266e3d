//! # Charcore - per-player character runtime
//!
//! Charcore holds everything a persistent multiplayer world server needs to
//! know about one logged-in player character: its stored sheet, worn
//! equipment, derived combat stats, spell casting, item trades and the quests
//! bound to it.
//!
//! ## Features
//!
//! - **Row codec**: lenient text encodings for inventory, paperdoll, spellbook and quest columns, including older quest-save shapes.
//! - **Equipment rules**: wearability, gender, attribute requirements and two-handed/shield exclusion.
//! - **Stat engine**: derived pools and combat stats driven by configurable infix formulas.
//! - **Spell casting**: timed cast state machine on Tokio timers with stale-timer detection.
//! - **Trading**: escrowed offers, agreement flags and an all-or-nothing exchange.
//! - **Quests**: pluggable quest engine seam with a JSON-seeded default catalog.
//! - **Persistence**: Sled-backed rows, serialised async saves and save-on-drop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use charcore::character::{CharacterRegistry, LogSession, World};
//! use charcore::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let world = Arc::new(World::from_config(&config)?);
//!     let registry = CharacterRegistry::new(world);
//!
//!     let handle = registry.load("alice", Arc::new(LogSession))?;
//!     handle.lock()?.login();
//!     registry.logout(handle.id()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`character`] - Character aggregate, rules engines and persistence
//! - [`config`] - Configuration loading and defaults
//! - [`logutil`] - Log-safe previews of persisted blobs

pub mod character;
pub mod config;
pub mod logutil;
