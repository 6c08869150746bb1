//! Bitcoin P2P wire protocol primitives.
//!
//! This module provides the byte-exact codecs for Bitcoin P2P messages.
//!
//! It implements:
//! - Compact-size integers, fixed-width integers, strings and hashes
//!   ([`encode`], [`decode`])
//! - Structures shared across messages: network addresses, inventory
//!   vectors, block locators, block headers ([`structure`])
//! - One body codec per command ([`message`])
//! - The 24-byte message header, checksum validation and dispatch by
//!   command name ([`codec`])
//!
//! Protocol reference:
//! https://developer.bitcoin.org/reference/p2p_networking.html
pub mod codec;
pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod message;
pub mod structure;

pub use codec::{
    MessageHeader, RawMessage, checksum, decode_frame, read_message, read_raw_message,
    send_message, unwrap, unwrap_with, wrap,
};
pub use constants::{Network, PROTOCOL_VERSION};
pub use decode::{Decode, DecodeOptions, Reader};
pub use encode::Encode;
pub use error::{Result, WireError};
pub use message::{
    Alert, Command, FeeFilter, FilterAdd, GetBlocks, GetHeaders, MerkleBlock, Message, Ping, Pong,
    Reject, RejectCode, Version,
};
pub use structure::{
    AddrEntry, AddrV2Addr, AddrV2Entry, AlertDetail, Block, BlockHeader, BlockLocator, BloomFilter,
    BloomFlags, Hash256, InventoryType, InventoryVector, NetworkAddress, Services, Transaction,
};
