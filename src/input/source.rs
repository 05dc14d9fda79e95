//! Byte sources for the key decoder

use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use log::{debug, trace};

/// Result of asking a source for one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Byte(u8),
    /// Nothing arrived within the timeout.
    TimedOut,
    /// The source is exhausted and will never produce another byte.
    Closed,
}

/// Where the decoder pulls raw input bytes from.
pub trait ByteSource: Send {
    /// Read one byte, waiting at most `timeout` (`None`: wait indefinitely).
    fn read_byte(&mut self, timeout: Option<Duration>) -> io::Result<ReadOutcome>;
}

/// Reads directly from a `Read`. Every read blocks until a byte or EOF
/// arrives; timeouts are not honoured.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read + Send> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read + Send> ByteSource for ReaderSource<R> {
    fn read_byte(&mut self, _timeout: Option<Duration>) -> io::Result<ReadOutcome> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(ReadOutcome::Closed),
                Ok(_) => return Ok(ReadOutcome::Byte(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Bytes delivered over a channel, so reads can time out.
pub struct ChannelSource {
    rx: Receiver<u8>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<u8>) -> Self {
        Self { rx }
    }

    /// Pump `reader` into a channel on a detached thread. The thread ends at
    /// EOF, on a read error, or on the first byte after this source is dropped.
    pub fn spawn<R: Read + Send + 'static>(reader: R) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("rawline-input".to_string())
            .spawn(move || pump(reader, tx))?;
        Ok(Self::new(rx))
    }
}

fn pump<R: Read>(mut reader: R, tx: mpsc::Sender<u8>) {
    let mut buf = [0u8; 64];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                trace!("read {} input bytes", n);
                for &byte in &buf[..n] {
                    if tx.send(byte).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("input pump stopped: {}", e);
                break;
            }
        }
    }
    debug!("input pump reached end of input");
}

impl ByteSource for ChannelSource {
    fn read_byte(&mut self, timeout: Option<Duration>) -> io::Result<ReadOutcome> {
        let outcome = match timeout {
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(byte) => ReadOutcome::Byte(byte),
                Err(RecvTimeoutError::Timeout) => ReadOutcome::TimedOut,
                Err(RecvTimeoutError::Disconnected) => ReadOutcome::Closed,
            },
            None => match self.rx.recv() {
                Ok(byte) => ReadOutcome::Byte(byte),
                Err(_) => ReadOutcome::Closed,
            },
        };
        Ok(outcome)
    }
}
