pub mod engine;
pub mod input;
pub mod minigame;
pub mod particles;
pub mod render;
pub mod scheduler;
pub mod state;
