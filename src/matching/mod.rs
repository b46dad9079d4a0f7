//! Matching & settlement core (spec §4.5, §9).

mod book;
mod engine;
mod types;

pub use engine::MatchingEngine;
