//! Interactive session
//!
//! Architecture:
//! - A `KeyDecoder` reads and decodes input on its own thread
//! - This loop is the only consumer: it pops keys and dispatches them
//!   through the `Keymap`, which edits through the `Engine`
//! - The loop ends on the exit key or when input closes, and the decoder is
//!   stopped so the terminal mode comes back

use std::time::Duration;

use log::{debug, info};

use crate::engine::Engine;
use crate::error::Result;
use crate::input::{Key, KeyDecoder};
use crate::keymap::{Dispatch, Keymap};
use crate::terminal::TerminalBackend;

/// Counters reported when a session ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub keys: usize,
    pub handled: usize,
    pub echoed: usize,
    pub ignored: usize,
}

pub struct Session<B: TerminalBackend + 'static> {
    decoder: KeyDecoder,
    engine: Engine<B>,
    keymap: Keymap<B>,
    exit_key: Key,
    poll_interval: Duration,
    stats: SessionStats,
}

impl<B: TerminalBackend + 'static> Session<B> {
    pub fn new(decoder: KeyDecoder, engine: Engine<B>, keymap: Keymap<B>, exit_key: Key) -> Self {
        Self {
            decoder,
            engine,
            keymap,
            exit_key,
            poll_interval: Duration::from_millis(50),
            stats: SessionStats::default(),
        }
    }

    /// How long each wait for a key lasts before the loop checks whether
    /// input has closed.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn engine(&self) -> &Engine<B> {
        &self.engine
    }

    pub fn keymap_mut(&mut self) -> &mut Keymap<B> {
        &mut self.keymap
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Dispatch keys until the exit key arrives or input closes, then stop
    /// the decoder. Errors from handlers end the session early; the decoder
    /// still restores the terminal when it is dropped.
    pub fn run(&mut self) -> Result<()> {
        info!("session started; exit key is {}", self.exit_key);
        while let Some(key) = self.next_key() {
            if key == self.exit_key {
                debug!("exit key pressed");
                break;
            }
            self.dispatch(key)?;
        }
        info!("session finished: {:?}", self.stats);
        self.decoder.stop()
    }

    fn next_key(&self) -> Option<Key> {
        loop {
            if let Some(key) = self.decoder.next_key_timeout(self.poll_interval) {
                return Some(key);
            }
            if !self.decoder.is_running() {
                return None;
            }
            // Closed is only flagged after the last key was queued.
            if self.decoder.input_closed() {
                return self.decoder.pop_or_none();
            }
        }
    }

    fn dispatch(&mut self, key: Key) -> Result<()> {
        self.stats.keys += 1;
        match self.keymap.handle(key, &mut self.engine)? {
            Dispatch::Handled => self.stats.handled += 1,
            Dispatch::Echoed => self.stats.echoed += 1,
            Dispatch::Ignored => self.stats.ignored += 1,
        }
        Ok(())
    }

    /// Stop the decoder and hand back the engine.
    pub fn finish(mut self) -> Result<Engine<B>> {
        self.decoder.stop()?;
        let Session { engine, .. } = self;
        Ok(engine)
    }
}
