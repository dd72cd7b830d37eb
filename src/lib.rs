//! Story Engine — scene navigation and playback state for visual novels.
//!
//! Owns the mutable playback state of an interactive-fiction player (current
//! scene, text cursor, history, transition and timer lifecycle) and drives it
//! from a deterministic scheduler, so that stale timers can never overwrite a
//! newer navigation. Rendering and particle effects are external sinks.

pub mod core;
pub mod schema;
