//! Payload serialization.
//!
//! Every structure and message body implements [`Encode`], appending its wire
//! form to a byte buffer. Encoding cannot fail: limits are enforced when a
//! message is built by [`crate::MessageFactory`] and when one is decoded.

use crate::wire::message::{
    Alert, FeeFilter, FilterAdd, GetBlocks, GetHeaders, MerkleBlock, Ping, Pong, Reject, Version,
};
use crate::wire::structure::{
    AddrEntry, AddrV2Entry, AlertDetail, Block, BlockHeader, BlockLocator, BloomFilter, Hash256,
    InventoryVector, NetworkAddress, Transaction,
};

/// Implemented by types with a byte-exact wire serialization.
pub trait Encode {
    fn encode_to(&self, out: &mut Vec<u8>);

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_to(&mut out);
        out
    }
}

/// Writes a CompactSize unsigned integer.
///
/// ```text
/// value <= 0xFC          1 byte
/// value <= 0xFFFF        0xFD + u16 LE
/// value <= 0xFFFF_FFFF   0xFE + u32 LE
/// otherwise              0xFF + u64 LE
/// ```
pub fn write_varint(value: u64, out: &mut Vec<u8>) {
    match value {
        0..=0xFC => out.push(value as u8),
        0xFD..=0xFFFF => {
            out.push(0xFD);
            out.extend(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xFFFF_FFFF => {
            out.push(0xFE);
            out.extend(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xFF);
            out.extend(&value.to_le_bytes());
        }
    }
}

/// Number of bytes [`write_varint`] emits for `value`.
pub const fn varint_len(value: u64) -> usize {
    match value {
        0..=0xFC => 1,
        0xFD..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

pub fn write_var_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    write_varint(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

pub fn write_var_str(s: &str, out: &mut Vec<u8>) {
    write_var_bytes(s.as_bytes(), out);
}

/// CompactSize count followed by each item.
pub fn write_list<T: Encode>(items: &[T], out: &mut Vec<u8>) {
    write_varint(items.len() as u64, out);
    for item in items {
        item.encode_to(out);
    }
}

/// The `headers` list: each 80-byte header is followed by a transaction
/// count that is always zero.
pub fn write_headers(headers: &[BlockHeader], out: &mut Vec<u8>) {
    write_varint(headers.len() as u64, out);
    for header in headers {
        header.encode_to(out);
        write_varint(0, out);
    }
}

impl Encode for Hash256 {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

impl Encode for NetworkAddress {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.services.bits().to_le_bytes());
        out.extend(&self.ip.octets());
        out.extend(&self.port.to_be_bytes());
    }
}

impl Encode for AddrEntry {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.timestamp.to_le_bytes());
        self.addr.encode_to(out);
    }
}

impl Encode for AddrV2Entry {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.timestamp.to_le_bytes());
        write_varint(self.services, out);
        out.push(self.addr.network_id());
        write_var_bytes(&self.addr.to_bytes(), out);
        out.extend(&self.port.to_be_bytes());
    }
}

impl Encode for InventoryVector {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.kind.to_le_bytes());
        self.hash.encode_to(out);
    }
}

impl Encode for BlockLocator {
    fn encode_to(&self, out: &mut Vec<u8>) {
        write_list(&self.hashes, out);
        self.hash_stop.encode_to(out);
    }
}

impl Encode for BlockHeader {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.version.to_le_bytes());
        self.prev_blockhash.encode_to(out);
        self.merkle_root.encode_to(out);
        out.extend(&self.time.to_le_bytes());
        out.extend(&self.bits.to_le_bytes());
        out.extend(&self.nonce.to_le_bytes());
    }
}

impl Encode for Transaction {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl Encode for Block {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.header.encode_to(out);
        write_varint(self.tx_count, out);
        out.extend_from_slice(&self.transactions);
    }
}

impl Encode for BloomFilter {
    fn encode_to(&self, out: &mut Vec<u8>) {
        write_var_bytes(&self.data, out);
        out.extend(&self.hash_funcs.to_le_bytes());
        out.extend(&self.tweak.to_le_bytes());
        out.push(self.flags as u8);
    }
}

impl Encode for AlertDetail {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.version.to_le_bytes());
        out.extend(&self.relay_until.to_le_bytes());
        out.extend(&self.expiration.to_le_bytes());
        out.extend(&self.id.to_le_bytes());
        out.extend(&self.cancel.to_le_bytes());
        write_varint(self.set_cancel.len() as u64, out);
        for id in &self.set_cancel {
            out.extend(&id.to_le_bytes());
        }
        out.extend(&self.min_ver.to_le_bytes());
        out.extend(&self.max_ver.to_le_bytes());
        write_varint(self.set_sub_ver.len() as u64, out);
        for sub_ver in &self.set_sub_ver {
            write_var_str(sub_ver, out);
        }
        out.extend(&self.priority.to_le_bytes());
        write_var_str(&self.comment, out);
        write_var_str(&self.status_bar, out);
        write_var_str(&self.reserved, out);
    }
}

impl Encode for Version {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.version.to_le_bytes());
        out.extend(&self.services.bits().to_le_bytes());
        out.extend(&self.timestamp.to_le_bytes());
        self.addr_recv.encode_to(out);
        self.addr_from.encode_to(out);
        out.extend(&self.nonce.to_le_bytes());
        write_var_str(&self.user_agent, out);
        out.extend(&self.start_height.to_le_bytes());
        if let Some(relay) = self.relay {
            out.push(relay as u8);
        }
    }
}

impl Encode for GetBlocks {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.version.to_le_bytes());
        self.locator.encode_to(out);
    }
}

impl Encode for GetHeaders {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.version.to_le_bytes());
        self.locator.encode_to(out);
    }
}

impl Encode for Ping {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.nonce.to_le_bytes());
    }
}

impl Encode for Pong {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.nonce.to_le_bytes());
    }
}

impl Encode for FeeFilter {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend(&self.fee_rate.to_le_bytes());
    }
}

impl Encode for Reject {
    fn encode_to(&self, out: &mut Vec<u8>) {
        write_var_str(&self.message, out);
        out.push(self.code.0);
        write_var_str(&self.reason, out);
        out.extend_from_slice(&self.data);
    }
}

impl Encode for FilterAdd {
    fn encode_to(&self, out: &mut Vec<u8>) {
        write_var_bytes(&self.data, out);
    }
}

impl Encode for MerkleBlock {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.header.encode_to(out);
        out.extend(&self.total_transactions.to_le_bytes());
        write_list(&self.hashes, out);
        write_var_bytes(&self.flags, out);
    }
}

impl Encode for Alert {
    fn encode_to(&self, out: &mut Vec<u8>) {
        write_var_bytes(self.signed_payload(), out);
        write_var_bytes(self.signature(), out);
    }
}
