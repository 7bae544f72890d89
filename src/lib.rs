//! convertd - watch a directory tree, convert finished audio files and
//! carry their tags over.

pub mod config;
pub mod convert;
pub mod daemon;
pub mod display;
pub mod pipeline;
pub mod tags;
pub mod watcher;
