//! Terminal handling module
//!
//! Groups all terminal-related functionality:
//! - ANSI escape sequences
//! - The backend capability trait and its two implementations
//! - Scoped cbreak mode for the input device

pub mod ansi;
pub mod backend;
pub mod escape;
pub mod memory;
pub mod mode;

pub use ansi::AnsiTerminal;
pub use backend::TerminalBackend;
pub use memory::MemoryTerminal;
pub use mode::TerminalMode;
