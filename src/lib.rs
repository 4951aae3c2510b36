pub mod cli;
pub mod color;
pub mod kitty;
pub mod pipeline;
pub mod preview;
pub mod theme;
