//! Key decoder
//!
//! Turns raw input bytes into `Key`s. Most bytes map one to one through the
//! key table; the only multi-byte sequences are the arrows, `ESC [ A..D`.
//! An ESC that is not followed by a complete arrow sequence is reported as
//! `esc` and the bytes read past it are decoded again from scratch.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, trace, warn};

use super::keys::{Key, KeyTable};
use super::source::{ByteSource, ChannelSource, ReadOutcome};
use crate::error::Result;
use crate::terminal::escape::key as bytes;
use crate::terminal::TerminalMode;

/// How long to wait for the rest of an escape sequence.
pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(50);

/// How often an idle reader thread checks whether it should stop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EscapeState {
    Normal,
    SawEsc,
    SawEscBracket,
}

/// One step of decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    Key(Key),
    /// A byte the key table has no entry for. It is consumed and dropped.
    Unmapped(u8),
    /// No input arrived within the wait.
    Idle,
    /// The source is exhausted and nothing is pending.
    Closed,
}

/// The escape-sequence state machine, independent of threads.
pub struct EscapeDecoder {
    pending: VecDeque<u8>,
    escape_timeout: Option<Duration>,
}

impl EscapeDecoder {
    /// `escape_timeout` bounds the wait for bytes following an ESC;
    /// `None` waits for as long as it takes.
    pub fn new(escape_timeout: Option<Duration>) -> Self {
        Self {
            pending: VecDeque::new(),
            escape_timeout,
        }
    }

    /// Bytes that were read ahead and will be decoded before any new input.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Decode the next key. `wait` bounds how long to wait for the first
    /// byte; once an ESC has been seen the escape timeout applies instead.
    pub fn decode<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        wait: Option<Duration>,
    ) -> io::Result<Decoded> {
        let mut state = EscapeState::Normal;
        loop {
            match state {
                EscapeState::Normal => {
                    let byte = match self.next_byte(source, wait)? {
                        ReadOutcome::Byte(byte) => byte,
                        ReadOutcome::TimedOut => return Ok(Decoded::Idle),
                        ReadOutcome::Closed => return Ok(Decoded::Closed),
                    };
                    if byte == bytes::ESC {
                        state = EscapeState::SawEsc;
                        continue;
                    }
                    return Ok(match KeyTable::lookup(byte) {
                        Some(key) => Decoded::Key(key),
                        None => Decoded::Unmapped(byte),
                    });
                }
                EscapeState::SawEsc => {
                    match self.next_byte(source, self.escape_timeout)? {
                        ReadOutcome::Byte(bytes::BRACKET) => state = EscapeState::SawEscBracket,
                        ReadOutcome::Byte(byte) => self.push_back(&[byte]),
                        ReadOutcome::TimedOut | ReadOutcome::Closed => {}
                    }
                    if state == EscapeState::SawEsc {
                        return Ok(Decoded::Key(Key::Esc));
                    }
                }
                EscapeState::SawEscBracket => {
                    match self.next_byte(source, self.escape_timeout)? {
                        ReadOutcome::Byte(byte) => match KeyTable::direction(byte) {
                            Some(key) => return Ok(Decoded::Key(key)),
                            None => self.push_back(&[bytes::BRACKET, byte]),
                        },
                        ReadOutcome::TimedOut | ReadOutcome::Closed => {
                            self.push_back(&[bytes::BRACKET])
                        }
                    }
                    return Ok(Decoded::Key(Key::Esc));
                }
            }
        }
    }

    /// Pending bytes first, then the source.
    fn next_byte<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        timeout: Option<Duration>,
    ) -> io::Result<ReadOutcome> {
        match self.pending.pop_front() {
            Some(byte) => Ok(ReadOutcome::Byte(byte)),
            None => source.read_byte(timeout),
        }
    }

    /// Queue bytes to be read again, ahead of anything already pending.
    fn push_back(&mut self, seq: &[u8]) {
        for &byte in seq.iter().rev() {
            self.pending.push_front(byte);
        }
    }
}

/// Timing knobs for `KeyDecoder`.
#[derive(Clone, Copy, Debug)]
pub struct DecoderSettings {
    /// Wait for the rest of an escape sequence; `None` never gives up.
    pub escape_timeout: Option<Duration>,
    /// How long an idle read waits before the stop flag is checked again.
    pub poll_interval: Duration,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            escape_timeout: Some(DEFAULT_ESCAPE_TIMEOUT),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Default)]
struct Flags {
    running: AtomicBool,
    closed: AtomicBool,
}

/// Decodes keys on a background thread and queues them in arrival order.
///
/// Keys are consumed with `pop_or_none` or `next_key_timeout` from a single
/// consumer. Stopping (explicitly or on drop) ends the reader thread and
/// restores the terminal mode.
pub struct KeyDecoder {
    keys: Receiver<Key>,
    flags: Arc<Flags>,
    reader: Option<JoinHandle<()>>,
    mode: TerminalMode,
    settings: DecoderSettings,
}

impl KeyDecoder {
    /// Decode the process's stdin, switching it to cbreak mode first.
    pub fn stdin(settings: DecoderSettings) -> Result<Self> {
        KeyTable::validate()?;
        let mode = TerminalMode::cbreak()?;
        let source = ChannelSource::spawn(io::stdin())?;
        Self::start(source, settings, mode)
    }

    /// Decode an arbitrary byte source. The terminal mode is left alone.
    pub fn spawn<S: ByteSource + 'static>(source: S, settings: DecoderSettings) -> Result<Self> {
        KeyTable::validate()?;
        Self::start(source, settings, TerminalMode::inactive())
    }

    fn start<S: ByteSource + 'static>(
        source: S,
        settings: DecoderSettings,
        mode: TerminalMode,
    ) -> Result<Self> {
        let (tx, keys) = mpsc::channel();
        let flags = Arc::new(Flags::default());
        flags.running.store(true, Ordering::SeqCst);

        let thread_flags = Arc::clone(&flags);
        let reader = thread::Builder::new()
            .name("rawline-keys".to_string())
            .spawn(move || read_loop(source, settings, tx, thread_flags))?;

        debug!(
            "key decoder started (escape timeout: {:?}, poll: {:?})",
            settings.escape_timeout, settings.poll_interval
        );
        Ok(Self {
            keys,
            flags,
            reader: Some(reader),
            mode,
            settings,
        })
    }

    /// Oldest queued key, or `None` if nothing is queued or the decoder stopped.
    pub fn pop_or_none(&self) -> Option<Key> {
        if !self.is_running() {
            return None;
        }
        self.keys.try_recv().ok()
    }

    /// Like `pop_or_none`, waiting up to `timeout` for a key to arrive.
    pub fn next_key_timeout(&self, timeout: Duration) -> Option<Key> {
        if !self.is_running() {
            return None;
        }
        self.keys.recv_timeout(timeout).ok()
    }

    pub fn is_running(&self) -> bool {
        self.flags.running.load(Ordering::SeqCst)
    }

    /// Whether the input source reached its end. Keys decoded before that
    /// stay queued.
    pub fn input_closed(&self) -> bool {
        self.flags.closed.load(Ordering::SeqCst)
    }

    /// Stop decoding and restore the terminal mode. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        self.flags.running.store(false, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            self.join_reader(reader);
        }
        self.mode.release()
    }

    fn join_reader(&self, reader: JoinHandle<()>) {
        // A source that ignores timeouts can stay blocked in a read until its
        // next byte arrives, so only wait a bounded time before detaching it.
        let grace = self.settings.poll_interval * 5
            + self.settings.escape_timeout.unwrap_or(Duration::ZERO);
        let deadline = Instant::now() + grace;
        while !reader.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        if !reader.is_finished() {
            warn!("key reader still blocked on input; detaching it");
            return;
        }
        if reader.join().is_err() {
            error!("key reader thread panicked");
        }
    }
}

impl Drop for KeyDecoder {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("{}", e);
        }
    }
}

fn read_loop<S: ByteSource>(
    mut source: S,
    settings: DecoderSettings,
    tx: Sender<Key>,
    flags: Arc<Flags>,
) {
    let mut decoder = EscapeDecoder::new(settings.escape_timeout);
    while flags.running.load(Ordering::SeqCst) {
        match decoder.decode(&mut source, Some(settings.poll_interval)) {
            Ok(Decoded::Key(key)) => {
                trace!("key: {}", key);
                if tx.send(key).is_err() {
                    break;
                }
            }
            Ok(Decoded::Unmapped(byte)) => debug!("dropping unmapped input byte {:#04x}", byte),
            Ok(Decoded::Idle) => {}
            Ok(Decoded::Closed) => {
                debug!("input closed");
                flags.closed.store(true, Ordering::SeqCst);
                break;
            }
            Err(e) => {
                error!("reading input failed: {}", e);
                flags.closed.store(true, Ordering::SeqCst);
                break;
            }
        }
    }
    debug!("key reader exiting");
}
