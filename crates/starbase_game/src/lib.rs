//! # Starbase Game
//!
//! A 2D space game simulation on top of [`starbase_engine`]: ships steered by
//! pilot input, gravity between bodies, bullets with a limited lifetime and a
//! per-frame draw list for an external renderer.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod components;
pub mod config;
pub mod game;
pub mod systems;

pub use config::GameConfig;
pub use game::{Game, GameError};
