//! rawline: a terminal line-editing engine
//!
//! Keeps a multi-line text buffer and a raw-mode terminal in lockstep while
//! decoding keypresses from the input device.
//!
//! - `input` turns raw bytes into `Key`s on a background thread
//! - `buffer` is the logical text and cursor
//! - `terminal` emits the physical effects (ANSI or in-memory)
//! - `engine` applies every edit to both and checks they agree
//! - `keymap` and `session` dispatch keys to handlers

pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod keymap;
pub mod session;
pub mod terminal;


pub use buffer::{Cursor, Delta, LineBuffer};
pub use config::Config;
pub use engine::{Engine, WriteMode};
pub use error::{Error, Result};
pub use input::{Key, KeyDecoder};
pub use keymap::{Dispatch, Keymap};
pub use session::Session;
pub use terminal::{AnsiTerminal, MemoryTerminal, TerminalBackend};
