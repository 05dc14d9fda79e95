//! Error types shared across the crate.
//!
//! Cursor desynchronization between the buffer and the terminal is not an
//! error variant: it is a programming defect and panics inside the engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors reported to callers of the library.
#[derive(Debug, Error)]
pub enum Error {
    /// A key name that the key table does not know about was bound or configured.
    #[error("unknown key name `{0}`")]
    UnknownKey(String),

    /// A handler was bound to, or the session switched to, a mode that was never added.
    #[error("mode `{0}` has not been added; add it before binding or activating it")]
    UnknownMode(String),

    /// A log level name that `log` does not recognise.
    #[error("unknown log level `{0}`; expected off, error, warn, info, debug or trace")]
    UnknownLogLevel(String),

    /// The key table does not cover an input byte it is required to accept.
    #[error("key table has no entry for input byte {0:#04x}")]
    IncompleteKeyTable(u8),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Text handed to the engine contains a character that does not take up
    /// exactly one terminal column.
    #[error("cannot write {0:?}: it does not take up exactly one terminal column")]
    Unprintable(char),

    /// The terminal could not be switched into cbreak mode.
    #[error("failed to enter cbreak mode: {0}")]
    TerminalSetup(#[source] io::Error),

    /// The terminal could not be restored to the mode it had before the decoder started.
    /// The caller's shell session is left in an unusable state when this happens.
    #[error("failed to restore the original terminal mode: {0}")]
    Teardown(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for errors raised while validating bindings or configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownKey(_)
                | Error::UnknownMode(_)
                | Error::UnknownLogLevel(_)
                | Error::IncompleteKeyTable(_)
                | Error::Config { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
