//! Helper functions shared by the renderer and the commands

mod date;
mod html;

pub use date::*;
pub use html::*;
