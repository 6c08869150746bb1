//! The message envelope.
//!
//! ```text
//! +------------+--------------+---------------+-------------+
//! | magic (4)  | command (12) | length (4 LE) | checksum (4)|
//! +------------+--------------+---------------+-------------+
//! | payload (length bytes)                            ...   |
//! +----------------------------------------------------------
//! ```
//!
//! The checksum is the first 4 bytes of `SHA256(SHA256(payload))`.

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::wire::constants::{COMMAND_SIZE, HEADER_SIZE, Network};
use crate::wire::decode::DecodeOptions;
use crate::wire::error::{Result, WireError};
use crate::wire::message::{Command, Message};

/// First 4 bytes of `SHA256(SHA256(payload))`.
pub fn checksum(payload: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(payload));
    [digest[0], digest[1], digest[2], digest[3]]
}

/// The fixed 24-byte header in front of every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub magic: [u8; 4],
    pub command: [u8; COMMAND_SIZE],
    pub length: u32,
    pub checksum: [u8; 4],
}

impl MessageHeader {
    pub fn for_payload(network: Network, command: Command, payload: &[u8]) -> Self {
        Self {
            magic: network.magic_bytes(),
            command: command.as_bytes(),
            length: payload.len() as u32,
            checksum: checksum(payload),
        }
    }

    /// Parses the first 24 bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(WireError::truncated("header", HEADER_SIZE - bytes.len()));
        }

        let mut header = Self {
            magic: [0; 4],
            command: [0; COMMAND_SIZE],
            length: LittleEndian::read_u32(&bytes[16..20]),
            checksum: [0; 4],
        };
        header.magic.copy_from_slice(&bytes[0..4]);
        header.command.copy_from_slice(&bytes[4..16]);
        header.checksum.copy_from_slice(&bytes[20..24]);
        Ok(header)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic);
        out[4..16].copy_from_slice(&self.command);
        LittleEndian::write_u32(&mut out[16..20], self.length);
        out[20..24].copy_from_slice(&self.checksum);
        out
    }

    pub fn network(&self) -> Option<Network> {
        Network::from_magic(self.magic)
    }

    /// The command with its zero padding trimmed.
    ///
    /// The name must be printable ASCII and every byte after the first NUL
    /// must also be NUL.
    pub fn command_name(&self) -> Result<&str> {
        let end = self
            .command
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(COMMAND_SIZE);
        let (name, padding) = self.command.split_at(end);

        if padding.iter().any(|&b| b != 0) {
            return Err(WireError::malformed(
                "header: non-zero byte in command padding",
            ));
        }
        if !name.iter().all(|b| (0x20..0x7F).contains(b)) {
            return Err(WireError::malformed("header: command is not printable ASCII"));
        }
        std::str::from_utf8(name).map_err(|e| WireError::malformed(format!("header: {e}")))
    }

    /// Resolves the command against the dispatch table.
    pub fn command(&self) -> Result<Command> {
        let name = self.command_name()?;
        Command::from_name(name).ok_or_else(|| WireError::UnknownCommand {
            command: name.to_string(),
            length: self.length,
        })
    }

    fn check_network(&self, network: Network) -> Result<()> {
        let expected = network.magic_bytes();
        if self.magic != expected {
            debug!(
                expected = %network,
                actual = ?self.network(),
                "rejecting frame for another network"
            );
            return Err(WireError::WrongNetwork {
                expected,
                actual: self.magic,
            });
        }
        Ok(())
    }

    fn check_length(&self, options: &DecodeOptions) -> Result<()> {
        if self.length > options.max_payload_size {
            return Err(WireError::malformed(format!(
                "header: payload length {} exceeds limit of {}",
                self.length, options.max_payload_size
            )));
        }
        Ok(())
    }
}

/// A frame whose header has been read but whose payload is not decoded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub header: MessageHeader,
    pub payload: Vec<u8>,
}

impl RawMessage {
    /// Verifies network and checksum, then decodes the payload with the
    /// codec registered for the header's command.
    pub fn into_message(self, network: Network, options: &DecodeOptions) -> Result<Message> {
        self.header.check_network(network)?;
        open(&self.header, &self.payload, options)
    }
}

fn open(header: &MessageHeader, payload: &[u8], options: &DecodeOptions) -> Result<Message> {
    let actual = checksum(payload);
    if actual != header.checksum {
        debug!(
            command = ?header.command_name().ok(),
            length = header.length,
            "checksum mismatch"
        );
        return Err(WireError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    let command = match header.command() {
        Ok(command) => command,
        Err(err @ WireError::UnknownCommand { .. }) => {
            debug!(%err, "skipping frame");
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    let message = Message::decode_payload(command, payload, options)?;
    trace!(command = command.name(), length = header.length, "decoded frame");
    Ok(message)
}

/// Frames `message` for `network`.
pub fn wrap(network: Network, message: &Message) -> Vec<u8> {
    let payload = message.encode_payload();
    let header = MessageHeader::for_payload(network, message.command(), &payload);
    trace!(
        command = message.command().name(),
        length = header.length,
        "encoded frame"
    );

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Decodes exactly one frame; `bytes` must hold nothing else.
pub fn unwrap(network: Network, bytes: &[u8]) -> Result<Message> {
    unwrap_with(network, bytes, &DecodeOptions::default())
}

pub fn unwrap_with(network: Network, bytes: &[u8], options: &DecodeOptions) -> Result<Message> {
    let (message, consumed) = decode_frame(network, bytes, options)?;
    if consumed != bytes.len() {
        return Err(WireError::malformed(format!(
            "{} byte(s) after frame",
            bytes.len() - consumed
        )));
    }
    Ok(message)
}

/// Decodes the frame at the start of `bytes` and returns it together with
/// the number of bytes it occupied, so a caller can walk a buffer holding
/// several frames.
///
/// On [`WireError::UnknownCommand`] the frame is still `HEADER_SIZE + length`
/// bytes long and can be skipped.
pub fn decode_frame(
    network: Network,
    bytes: &[u8],
    options: &DecodeOptions,
) -> Result<(Message, usize)> {
    let header = MessageHeader::parse(bytes)?;
    header.check_network(network)?;
    header.check_length(options)?;

    let end = HEADER_SIZE + header.length as usize;
    if bytes.len() < end {
        return Err(WireError::truncated("payload", end - bytes.len()));
    }

    let message = open(&header, &bytes[HEADER_SIZE..end], options)?;
    Ok((message, end))
}

/// Reads one frame from any [`Read`] source without decoding its payload.
///
/// The declared length is checked against `options.max_payload_size` before
/// the payload buffer is allocated.
pub fn read_raw_message<R: Read>(reader: &mut R, options: &DecodeOptions) -> Result<RawMessage> {
    let mut bytes = [0u8; HEADER_SIZE];
    reader.read_exact(&mut bytes)?;

    let header = MessageHeader::parse(&bytes)?;
    header.check_length(options)?;

    let mut payload = vec![0u8; header.length as usize];
    reader.read_exact(&mut payload)?;

    Ok(RawMessage { header, payload })
}

/// Reads and decodes one frame from any [`Read`] source.
///
/// The whole frame is consumed before the payload is decoded, so after a
/// recoverable [`WireError::UnknownCommand`] the stream is positioned at the
/// next frame.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use btc_wire::wire::{self, DecodeOptions, Message, Network};
///
/// let bytes = wire::wrap(Network::Mainnet, &Message::Verack);
/// let mut cursor = Cursor::new(bytes);
///
/// let msg = wire::read_message(&mut cursor, Network::Mainnet, &DecodeOptions::default()).unwrap();
/// assert_eq!(msg, Message::Verack);
/// ```
pub fn read_message<R: Read>(
    reader: &mut R,
    network: Network,
    options: &DecodeOptions,
) -> Result<Message> {
    read_raw_message(reader, options)?.into_message(network, options)
}

/// Writes a complete frame to the given writer.
///
/// # Example
///
/// ```
/// use btc_wire::wire::{self, Message, Network};
///
/// let mut buffer = Vec::new();
/// wire::send_message(&mut buffer, Network::Mainnet, &Message::Verack).unwrap();
///
/// assert_eq!(buffer.len(), 24);
/// ```
pub fn send_message<W: Write>(writer: &mut W, network: Network, message: &Message) -> Result<()> {
    let payload = message.encode_payload();

    writer.write_u32::<LittleEndian>(network.magic())?;
    writer.write_all(&message.command().as_bytes())?;
    writer.write_u32::<LittleEndian>(payload.len() as u32)?;
    writer.write_all(&checksum(&payload))?;
    writer.write_all(&payload)?;

    trace!(
        command = message.command().name(),
        length = payload.len(),
        "sent frame"
    );
    Ok(())
}
