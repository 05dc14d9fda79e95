//! Scoped cbreak mode
//!
//! `TerminalMode::cbreak()` switches stdin to unbuffered, no-echo input and
//! remembers the previous settings. They come back on `release()` or, failing
//! that, when the guard is dropped (including during unwinding). A panic hook
//! can put them back earlier with `TerminalMode::restore_saved()`.

use std::io;
#[cfg(unix)]
use std::sync::{Mutex, MutexGuard, TryLockError};

use crossterm::tty::IsTty;
use log::{debug, error};

use crate::error::{Error, Result};

/// Settings saved by the live cbreak guard, reachable from a panic hook.
#[cfg(unix)]
static SAVED_MODE: Mutex<Option<(std::os::unix::io::RawFd, libc::termios)>> = Mutex::new(None);

#[cfg(unix)]
fn saved_mode() -> MutexGuard<'static, Option<(std::os::unix::io::RawFd, libc::termios)>> {
    SAVED_MODE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct TerminalMode {
    #[cfg(unix)]
    original: Option<(std::os::unix::io::RawFd, libc::termios)>,
    #[cfg(not(unix))]
    raw_enabled: bool,
}

impl TerminalMode {
    /// A guard that changed nothing and has nothing to restore.
    pub fn inactive() -> Self {
        Self {
            #[cfg(unix)]
            original: None,
            #[cfg(not(unix))]
            raw_enabled: false,
        }
    }

    /// Put stdin into cbreak mode: bytes arrive one at a time, unechoed, while
    /// signal keys keep working. If stdin is not a terminal nothing changes.
    pub fn cbreak() -> Result<Self> {
        if !io::stdin().is_tty() {
            debug!("stdin is not a tty; leaving input mode alone");
            return Ok(Self::inactive());
        }
        Self::enter_cbreak().map_err(Error::TerminalSetup)
    }

    /// Whether a previous mode is waiting to be restored.
    #[cfg(unix)]
    pub fn is_active(&self) -> bool {
        self.original.is_some()
    }

    #[cfg(not(unix))]
    pub fn is_active(&self) -> bool {
        self.raw_enabled
    }

    #[cfg(unix)]
    fn enter_cbreak() -> io::Result<Self> {
        use std::os::unix::io::AsRawFd;

        let fd = io::stdin().as_raw_fd();
        // SAFETY: termios is plain data and fd is a valid descriptor for the
        // lifetime of the process.
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            let original = termios;

            termios.c_lflag &= !(libc::ECHO | libc::ICANON);
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            *saved_mode() = Some((fd, original));
            debug!("stdin switched to cbreak mode");
            Ok(Self {
                original: Some((fd, original)),
            })
        }
    }

    #[cfg(not(unix))]
    fn enter_cbreak() -> io::Result<Self> {
        // No termios here; raw mode is the closest crossterm offers.
        crossterm::terminal::enable_raw_mode()?;
        debug!("raw mode enabled");
        Ok(Self { raw_enabled: true })
    }

    /// Restore the mode that was active before `cbreak()`. Idempotent.
    #[cfg(unix)]
    pub fn release(&mut self) -> Result<()> {
        if let Some((fd, original)) = self.original.take() {
            // SAFETY: restoring settings previously read from the same fd.
            if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &original) } != 0 {
                return Err(Error::Teardown(io::Error::last_os_error()));
            }
            *saved_mode() = None;
            debug!("terminal mode restored");
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn release(&mut self) -> Result<()> {
        if std::mem::take(&mut self.raw_enabled) {
            crossterm::terminal::disable_raw_mode().map_err(Error::Teardown)?;
            debug!("raw mode disabled");
        }
        Ok(())
    }
}

impl TerminalMode {
    /// Put back the settings saved by a live guard without going through it.
    /// Meant for panic hooks, which run before unwinding drops the guard.
    /// Does nothing when no guard is active; errors are ignored.
    #[cfg(unix)]
    pub fn restore_saved() {
        let saved = match SAVED_MODE.try_lock() {
            Ok(saved) => *saved,
            Err(TryLockError::Poisoned(poisoned)) => *poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        if let Some((fd, original)) = saved {
            // SAFETY: restoring settings previously read from the same fd.
            unsafe {
                libc::tcsetattr(fd, libc::TCSANOW, &original);
            }
        }
    }

    #[cfg(not(unix))]
    pub fn restore_saved() {
        let _ = crossterm::terminal::disable_raw_mode();
    }

    /// Whether some guard is holding settings to restore.
    #[cfg(unix)]
    pub fn has_saved() -> bool {
        saved_mode().is_some()
    }
}

impl Drop for TerminalMode {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            error!("{}", e);
        }
    }
}
