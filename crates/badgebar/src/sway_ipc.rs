//! Just enough of the sway IPC protocol to follow the active keyboard layout.
//!
//! Every message is framed as `"i3-ipc"`, followed by the payload length and the message type
//! (both native-endian `u32`), followed by a JSON payload.

use std::{
    io::{ErrorKind, Read, Write},
    os::unix::net::UnixStream,
    path::{Path, PathBuf},
};

use serde::Deserialize;

const MAGIC: &[u8; 6] = b"i3-ipc";
const HEADER_LEN: usize = MAGIC.len() + 8;

pub const SUBSCRIBE: u32 = 2;
pub const GET_INPUTS: u32 = 100;
/// Events have the high bit of their type set.
pub const EVENT_INPUT: u32 = (1 << 31) | 0x15;

#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("SWAYSOCK is not set")]
    NoSocket,
    #[error("Error talking to sway: {0}")]
    Io(#[from] std::io::Error),
    #[error("Received a frame without the i3-ipc magic")]
    BadMagic,
    #[error("sway closed the IPC connection")]
    Closed,
    #[error("Malformed IPC payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sway rejected the event subscription")]
    SubscribeRejected,
}

pub type Result<T> = std::result::Result<T, IpcError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: u32,
    pub payload: Vec<u8>,
}

pub fn encode_frame(kind: u32, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    bytes.extend_from_slice(&kind.to_ne_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// Collects bytes read from a socket and cuts complete frames out of them.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// The next complete frame, or `None` if more bytes are needed.
    ///
    /// On a corrupt header everything buffered so far is dropped, as there is no way to find the
    /// start of the next frame again.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }
        if &self.buf[..MAGIC.len()] != MAGIC {
            self.buf.clear();
            return Err(IpcError::BadMagic);
        }
        let len = read_u32(&self.buf[MAGIC.len()..]) as usize;
        let kind = read_u32(&self.buf[MAGIC.len() + 4..]);
        if self.buf.len() < HEADER_LEN + len {
            return Ok(None);
        }
        let payload = self.buf[HEADER_LEN..HEADER_LEN + len].to_vec();
        self.buf.drain(..HEADER_LEN + len);
        Ok(Some(Frame { kind, payload }))
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[..4]);
    u32::from_ne_bytes(word)
}

pub fn socket_path() -> Result<PathBuf> {
    std::env::var_os("SWAYSOCK").map(PathBuf::from).ok_or(IpcError::NoSocket)
}

/// Send a message on a blocking stream and wait for its reply.
pub fn request(stream: &mut UnixStream, kind: u32, payload: &[u8]) -> Result<Frame> {
    stream.write_all(&encode_frame(kind, payload))?;
    let mut decoder = FrameDecoder::default();
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(frame) = decoder.next_frame()? {
            return Ok(frame);
        }
        match stream.read(&mut chunk)? {
            0 => return Err(IpcError::Closed),
            n => decoder.push(&chunk[..n]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub xkb_active_layout_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputEvent {
    pub change: String,
    pub input: Input,
}

#[derive(Debug, Deserialize)]
struct CommandReply {
    success: bool,
}

/// Layout of the first keyboard that has one.
pub fn keyboard_layout(inputs: &[Input]) -> Option<&str> {
    inputs.iter().filter(|input| input.kind == "keyboard").find_map(|input| input.xkb_active_layout_name.as_deref())
}

/// A subscription to sway's input events, read without ever blocking.
#[derive(Debug)]
pub struct InputEvents {
    stream: UnixStream,
    decoder: FrameDecoder,
    closed: bool,
}

impl InputEvents {
    pub fn subscribe(socket: &Path) -> Result<Self> {
        let mut stream = UnixStream::connect(socket)?;
        let reply = request(&mut stream, SUBSCRIBE, br#"["input"]"#)?;
        if !serde_json::from_slice::<CommandReply>(&reply.payload)?.success {
            return Err(IpcError::SubscribeRejected);
        }
        Self::from_stream(stream)
    }

    pub fn from_stream(stream: UnixStream) -> Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(InputEvents { stream, decoder: FrameDecoder::default(), closed: false })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read whatever is pending on the socket and return the input events in it.
    /// Malformed frames and payloads are logged and skipped.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        let mut chunk = [0u8; 4096];
        while !self.closed {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    log::warn!("{}", IpcError::Closed);
                    self.closed = true;
                }
                Ok(n) => self.decoder.push(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("{}", IpcError::Io(e));
                    self.closed = true;
                }
            }
        }

        let mut events = Vec::new();
        loop {
            match self.decoder.next_frame() {
                Ok(Some(frame)) if frame.kind == EVENT_INPUT => match serde_json::from_slice(&frame.payload) {
                    Ok(event) => events.push(event),
                    Err(e) => log::debug!("Dropping input event: {}", IpcError::Json(e)),
                },
                Ok(Some(frame)) => log::debug!("Ignoring IPC message of type {:#x}", frame.kind),
                Ok(None) => break,
                Err(e) => log::debug!("Dropping IPC data: {}", e),
            }
        }
        events
    }
}
