//! Platform implementations of the engine's seams

pub mod change_count;
pub mod clipboard;
pub mod clock;
pub mod feedback;
