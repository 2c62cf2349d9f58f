//! Streakbot - daily study-streak poll, leaderboard and motivation for a group chat

pub mod commands;
pub mod config;
pub mod cycle;
pub mod error;
pub mod messenger;
pub mod pacing;
pub mod polls;
pub mod quote;
pub mod rank;
pub mod retry;
pub mod store;
pub mod streak;
pub mod tally;
pub mod telemetry;
pub mod template;
