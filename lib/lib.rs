/// The live-match orchestrator.
pub mod arbiter;
/// The board game data model.
pub mod board;
/// Per-side countdown clocks.
pub mod clock;
/// The per-match state machine.
pub mod game;
/// Actors and observers taking part in a match.
pub mod play;
/// The pluggable game-specific rule oracle.
pub mod rules;
/// Runtime configuration.
pub mod setup;
