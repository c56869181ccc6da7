//! Message transports.
//!
//! A transport yields whole tagged messages. Timeouts surface as
//! `TimedOut`/`WouldBlock` errors so read loops can check cancellation;
//! a partially received message is kept and completed on the next call.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Bytes before the body: length (u16 BE, counting tag and body) and tag (u16 BE).
pub const FRAME_HEADER_LEN: usize = 4;

/// One tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub tag: u16,
    pub body: Vec<u8>,
}

/// A source of tagged messages.
pub trait Transport: Send {
    /// Blocks until a whole message arrives or the read deadline passes.
    fn recv(&mut self) -> io::Result<Message>;
}

/// Frames `body` for the wire: `len tag body` with `len = 2 + body.len()`.
///
/// # Errors
///
/// Returns `InvalidInput` if the body does not fit a u16 length.
pub fn encode_frame(tag: u16, body: &[u8]) -> io::Result<Vec<u8>> {
    let len = u16::try_from(body.len() + 2).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} byte body does not fit a frame", body.len()),
        )
    })?;
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&tag.to_be_bytes());
    out.extend_from_slice(body);
    Ok(out)
}

/// Splits one message off the front of `buf` if it is complete.
fn take_frame(buf: &mut Vec<u8>, max_body: usize) -> io::Result<Option<Message>> {
    if buf.len() < 2 {
        return Ok(None);
    }
    let len = usize::from(u16::from_be_bytes([buf[0], buf[1]]));
    if len < 2 || len - 2 > max_body {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("bad frame length {len}"),
        ));
    }
    if buf.len() < 2 + len {
        return Ok(None);
    }
    let tag = u16::from_be_bytes([buf[2], buf[3]]);
    let body = buf[FRAME_HEADER_LEN..2 + len].to_vec();
    buf.drain(..2 + len);
    Ok(Some(Message { tag, body }))
}

/// Length-prefixed messages over any byte stream.
#[derive(Debug)]
pub struct StreamTransport<R> {
    reader: R,
    pending: Vec<u8>,
    max_body: usize,
}

impl<R: Read + Send> StreamTransport<R> {
    pub fn new(reader: R, max_body: usize) -> Self {
        Self {
            reader,
            pending: Vec::new(),
            max_body,
        }
    }

    /// Bytes of a partially received message.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl<R: Read + Send> Transport for StreamTransport<R> {
    fn recv(&mut self) -> io::Result<Message> {
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(message) = take_frame(&mut self.pending, self.max_body)? {
                return Ok(message);
            }
            let read = self.reader.read(&mut chunk)?;
            if read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                ));
            }
            self.pending.extend_from_slice(&chunk[..read]);
        }
    }
}

/// TCP connection to a game server.
pub type TcpTransport = StreamTransport<TcpStream>;

impl StreamTransport<TcpStream> {
    /// Connects and sets the read deadline.
    ///
    /// # Errors
    ///
    /// Returns any connect or socket option error.
    pub fn connect(
        addr: impl ToSocketAddrs,
        read_timeout: Duration,
        max_body: usize,
    ) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream, read_timeout, max_body)
    }

    /// Wraps an accepted or connected stream.
    ///
    /// # Errors
    ///
    /// Returns any socket option error.
    pub fn from_stream(
        stream: TcpStream,
        read_timeout: Duration,
        max_body: usize,
    ) -> io::Result<Self> {
        stream.set_read_timeout(Some(read_timeout))?;
        if let Err(err) = stream.set_nodelay(true) {
            log::warn!("failed to set TCP_NODELAY: {err}");
        }
        Ok(Self::new(stream, max_body))
    }
}

/// Messages queued in memory, for tests and offline tools.
///
/// An empty queue reports `TimedOut`, like an idle socket.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    queue: VecDeque<io::Result<Message>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: u16, body: Vec<u8>) {
        self.queue.push_back(Ok(Message { tag, body }));
    }

    /// Queues an error to be returned in order.
    pub fn push_error(&mut self, kind: io::ErrorKind) {
        self.queue.push_back(Err(io::Error::from(kind)));
    }
}

impl Transport for MemoryTransport {
    fn recv(&mut self) -> io::Result<Message> {
        self.queue
            .pop_front()
            .unwrap_or_else(|| Err(io::Error::from(io::ErrorKind::TimedOut)))
    }
}
