//! Payload deserialization.
//!
//! Decoders read from a [`Reader`], a cursor over the payload slice. Every
//! read is bounds-checked: running out of bytes is
//! [`WireError::TruncatedInput`], anything structurally wrong is
//! [`WireError::MalformedPayload`]. List counts are checked against both the
//! protocol limit and the bytes left before anything is allocated.

use std::net::Ipv6Addr;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::wire::constants::{
    MAX_ADDR_ENTRIES, MAX_ADDRV2_ADDR_SIZE, MAX_BLOOM_FILTER_SIZE, MAX_BLOOM_HASH_FUNCS,
    MAX_FILTER_ADD_SIZE, MAX_HEADERS_ENTRIES, MAX_INV_ENTRIES, MAX_LOCATOR_HASHES,
    MAX_PAYLOAD_SIZE, MAX_REJECT_MESSAGE_LEN, MAX_REJECT_REASON_LEN, MAX_USER_AGENT_LEN,
};
use crate::wire::error::{Result, WireError};
use crate::wire::message::{
    Alert, FeeFilter, FilterAdd, GetBlocks, GetHeaders, MerkleBlock, Ping, Pong, Reject,
    RejectCode, Version,
};
use crate::wire::structure::{
    AddrEntry, AddrV2Addr, AddrV2Entry, AlertDetail, Block, BlockHeader, BlockLocator,
    BloomFilter, BloomFlags, Hash256, InventoryType, InventoryVector, NetworkAddress, Services,
    Transaction,
};

/// Knobs for decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Accept only the canonical encoding of each field. Compact sizes must
    /// use their shortest form (`FD 10 00` for 16 is refused), the version
    /// relay flag must be 0 or 1, and every `headers` entry must carry a zero
    /// transaction count. Decoded values then re-encode to the input bytes.
    pub strict: bool,
    /// Frames declaring a longer payload are refused before it is buffered.
    pub max_payload_size: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

/// Cursor over a payload.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    strict: bool,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_options(buf, &DecodeOptions::default())
    }

    pub fn with_options(buf: &'a [u8], options: &DecodeOptions) -> Self {
        Self {
            buf,
            pos: 0,
            strict: options.strict,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(WireError::truncated(context, n - remaining));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, context)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, context: &'static str) -> Result<u8> {
        Ok(self.take(1, context)?[0])
    }

    pub fn read_u16_be(&mut self, context: &'static str) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2, context)?))
    }

    pub fn read_i32(&mut self, context: &'static str) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4, context)?))
    }

    pub fn read_u32(&mut self, context: &'static str) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4, context)?))
    }

    pub fn read_i64(&mut self, context: &'static str) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8, context)?))
    }

    pub fn read_u64(&mut self, context: &'static str) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8, context)?))
    }

    pub fn read_hash(&mut self, context: &'static str) -> Result<Hash256> {
        Ok(Hash256(self.array(context)?))
    }

    /// Reads a CompactSize unsigned integer.
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64> {
        let (value, minimum) = match self.read_u8(context)? {
            0xFD => (
                u64::from(LittleEndian::read_u16(self.take(2, context)?)),
                0xFD,
            ),
            0xFE => (
                u64::from(LittleEndian::read_u32(self.take(4, context)?)),
                0x1_0000,
            ),
            0xFF => (
                LittleEndian::read_u64(self.take(8, context)?),
                0x1_0000_0000,
            ),
            n => return Ok(u64::from(n)),
        };
        if self.strict && value < minimum {
            return Err(WireError::malformed(format!(
                "{context}: non-canonical compact size {value}"
            )));
        }
        Ok(value)
    }

    /// Reads a list count and checks it against `max` and against the bytes
    /// left, given that every item takes at least `min_item_size` bytes.
    pub fn read_count(
        &mut self,
        context: &'static str,
        min_item_size: usize,
        max: usize,
    ) -> Result<usize> {
        let count = self.read_varint(context)?;
        if count > max as u64 {
            return Err(WireError::malformed(format!(
                "{context}: {count} entries exceeds limit of {max}"
            )));
        }
        let count = count as usize;
        let remaining = self.remaining();
        if count.saturating_mul(min_item_size) > remaining {
            return Err(WireError::malformed(format!(
                "{context}: {count} entries cannot fit in {remaining} remaining byte(s)"
            )));
        }
        Ok(count)
    }

    /// Reads a CompactSize length followed by that many bytes.
    pub fn read_var_bytes(&mut self, context: &'static str, max: usize) -> Result<&'a [u8]> {
        let len = self.read_varint(context)?;
        if len > max as u64 {
            return Err(WireError::malformed(format!(
                "{context}: length {len} exceeds limit of {max}"
            )));
        }
        let remaining = self.remaining() as u64;
        if len > remaining {
            return Err(WireError::truncated(context, (len - remaining) as usize));
        }
        self.take(len as usize, context)
    }

    pub fn read_var_str(&mut self, context: &'static str, max: usize) -> Result<String> {
        let bytes = self.read_var_bytes(context, max)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| WireError::malformed(format!("{context}: {e}")))
    }

    /// Consumes everything left.
    pub fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.buf[self.pos..];
        self.pos = self.buf.len();
        bytes
    }

    /// Fails when bytes remain after the value has been read.
    pub fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(WireError::malformed(format!(
                "{n} trailing byte(s) after payload"
            ))),
        }
    }
}

/// Implemented by types that can be parsed from their wire form.
pub trait Decode: Sized {
    fn decode_from(reader: &mut Reader<'_>) -> Result<Self>;

    /// Decodes a complete payload with the default options.
    fn decode(payload: &[u8]) -> Result<Self> {
        Self::decode_with(payload, &DecodeOptions::default())
    }

    /// Decodes a complete payload; trailing bytes are an error.
    fn decode_with(payload: &[u8], options: &DecodeOptions) -> Result<Self> {
        let mut reader = Reader::with_options(payload, options);
        let value = Self::decode_from(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

/// Payload check for commands that carry no body.
pub fn decode_empty(payload: &[u8], context: &'static str) -> Result<()> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(WireError::malformed(format!(
            "{context}: expected empty payload, got {} byte(s)",
            payload.len()
        )))
    }
}

impl Decode for Hash256 {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        r.read_hash("hash")
    }
}

impl Decode for NetworkAddress {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let services = Services::from(r.read_u64("net_addr: services")?);
        let ip = Ipv6Addr::from(r.array::<16>("net_addr: ip")?);
        let port = r.read_u16_be("net_addr: port")?;
        Ok(NetworkAddress { services, ip, port })
    }
}

impl Decode for AddrEntry {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let timestamp = r.read_u32("addr: timestamp")?;
        let addr = NetworkAddress::decode_from(r)?;
        Ok(AddrEntry { timestamp, addr })
    }
}

impl Decode for AddrV2Entry {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let timestamp = r.read_u32("addrv2: timestamp")?;
        let services = r.read_varint("addrv2: services")?;
        let network_id = r.read_u8("addrv2: network_id")?;
        let bytes = r.read_var_bytes("addrv2: addr", MAX_ADDRV2_ADDR_SIZE)?;
        let port = r.read_u16_be("addrv2: port")?;
        Ok(AddrV2Entry {
            timestamp,
            services,
            addr: AddrV2Addr::from_parts(network_id, bytes)?,
            port,
        })
    }
}

impl Decode for InventoryVector {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let kind = InventoryType::try_from(r.read_u32("inv: type")?)?;
        let hash = r.read_hash("inv: hash")?;
        Ok(InventoryVector { kind, hash })
    }
}

impl Decode for BlockLocator {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let count = r.read_count("locator: count", 32, MAX_LOCATOR_HASHES)?;
        let mut hashes = Vec::with_capacity(count);
        for _ in 0..count {
            hashes.push(r.read_hash("locator: hash")?);
        }
        let hash_stop = r.read_hash("locator: hash_stop")?;
        Ok(BlockLocator { hashes, hash_stop })
    }
}

impl Decode for BlockHeader {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        Ok(BlockHeader {
            version: r.read_i32("header: version")?,
            prev_blockhash: r.read_hash("header: prev_blockhash")?,
            merkle_root: r.read_hash("header: merkle_root")?,
            time: r.read_u32("header: time")?,
            bits: r.read_u32("header: bits")?,
            nonce: r.read_u32("header: nonce")?,
        })
    }
}

impl Decode for Transaction {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Transaction::from_bytes(r.rest().to_vec()))
    }
}

impl Decode for Block {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let header = BlockHeader::decode_from(r)?;
        let tx_count = r.read_varint("block: txn_count")?;
        if tx_count > r.remaining() as u64 {
            return Err(WireError::malformed(format!(
                "block: {tx_count} transactions cannot fit in {} remaining byte(s)",
                r.remaining()
            )));
        }
        Ok(Block {
            header,
            tx_count,
            transactions: r.rest().to_vec(),
        })
    }
}

impl Decode for BloomFilter {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let data = r
            .read_var_bytes("filterload: filter", MAX_BLOOM_FILTER_SIZE)?
            .to_vec();
        let hash_funcs = r.read_u32("filterload: nHashFuncs")?;
        if hash_funcs > MAX_BLOOM_HASH_FUNCS {
            return Err(WireError::malformed(format!(
                "filterload: {hash_funcs} hash functions exceeds limit of {MAX_BLOOM_HASH_FUNCS}"
            )));
        }
        let tweak = r.read_u32("filterload: nTweak")?;
        let flags = BloomFlags::try_from(r.read_u8("filterload: nFlags")?)?;
        Ok(BloomFilter {
            data,
            hash_funcs,
            tweak,
            flags,
        })
    }
}

impl Decode for AlertDetail {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let version = r.read_i32("alert: version")?;
        let relay_until = r.read_i64("alert: relay_until")?;
        let expiration = r.read_i64("alert: expiration")?;
        let id = r.read_i32("alert: id")?;
        let cancel = r.read_i32("alert: cancel")?;

        let count = r.read_count("alert: set_cancel", 4, usize::MAX)?;
        let mut set_cancel = Vec::with_capacity(count);
        for _ in 0..count {
            set_cancel.push(r.read_i32("alert: set_cancel")?);
        }

        let min_ver = r.read_i32("alert: min_ver")?;
        let max_ver = r.read_i32("alert: max_ver")?;

        let count = r.read_count("alert: set_sub_ver", 1, usize::MAX)?;
        let mut set_sub_ver = Vec::with_capacity(count);
        for _ in 0..count {
            set_sub_ver.push(r.read_var_str("alert: sub_ver", usize::MAX)?);
        }

        Ok(AlertDetail {
            version,
            relay_until,
            expiration,
            id,
            cancel,
            set_cancel,
            min_ver,
            max_ver,
            set_sub_ver,
            priority: r.read_i32("alert: priority")?,
            comment: r.read_var_str("alert: comment", usize::MAX)?,
            status_bar: r.read_var_str("alert: status_bar", usize::MAX)?,
            reserved: r.read_var_str("alert: reserved", usize::MAX)?,
        })
    }
}

impl Decode for Version {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let version = r.read_i32("version: version")?;
        let services = Services::from(r.read_u64("version: services")?);
        let timestamp = r.read_i64("version: timestamp")?;
        let addr_recv = NetworkAddress::decode_from(r)?;
        let addr_from = NetworkAddress::decode_from(r)?;
        let nonce = r.read_u64("version: nonce")?;
        let user_agent = r.read_var_str("version: user_agent", MAX_USER_AGENT_LEN)?;
        let start_height = r.read_i32("version: start_height")?;
        // Pre-70001 peers end the message here. Any non-zero byte reads as
        // true, so a permissive decode may re-encode 0x02 as 0x01.
        let relay = if r.is_empty() {
            None
        } else {
            match r.read_u8("version: relay")? {
                0 => Some(false),
                1 => Some(true),
                n if r.strict => {
                    return Err(WireError::malformed(format!(
                        "version: relay flag {n:#04x} is not 0 or 1"
                    )));
                }
                _ => Some(true),
            }
        };

        Ok(Version {
            version,
            services,
            timestamp,
            addr_recv,
            addr_from,
            nonce,
            user_agent,
            start_height,
            relay,
        })
    }
}

impl Decode for GetBlocks {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let version = r.read_i32("getblocks: version")?;
        Ok(GetBlocks::new(version, BlockLocator::decode_from(r)?))
    }
}

impl Decode for GetHeaders {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let version = r.read_i32("getheaders: version")?;
        Ok(GetHeaders::new(version, BlockLocator::decode_from(r)?))
    }
}

impl Decode for Ping {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Ping {
            nonce: r.read_u64("ping: nonce")?,
        })
    }
}

impl Decode for Pong {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Pong {
            nonce: r.read_u64("pong: nonce")?,
        })
    }
}

impl Decode for FeeFilter {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        Ok(FeeFilter {
            fee_rate: r.read_u64("feefilter: feerate")?,
        })
    }
}

impl Decode for Reject {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let message = r.read_var_str("reject: message", MAX_REJECT_MESSAGE_LEN)?;
        let code = RejectCode(r.read_u8("reject: ccode")?);
        let reason = r.read_var_str("reject: reason", MAX_REJECT_REASON_LEN)?;
        Ok(Reject {
            message,
            code,
            reason,
            data: r.rest().to_vec(),
        })
    }
}

impl Decode for FilterAdd {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        Ok(FilterAdd {
            data: r
                .read_var_bytes("filteradd: data", MAX_FILTER_ADD_SIZE)?
                .to_vec(),
        })
    }
}

impl Decode for MerkleBlock {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let header = BlockHeader::decode_from(r)?;
        let total_transactions = r.read_u32("merkleblock: total_transactions")?;

        let count = r.read_count("merkleblock: hashes", 32, usize::MAX)?;
        let mut hashes = Vec::with_capacity(count);
        for _ in 0..count {
            hashes.push(r.read_hash("merkleblock: hash")?);
        }

        let flags = r.read_var_bytes("merkleblock: flags", usize::MAX)?.to_vec();
        Ok(MerkleBlock {
            header,
            total_transactions,
            hashes,
            flags,
        })
    }
}

impl Decode for Alert {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let payload = r.read_var_bytes("alert: payload", usize::MAX)?;
        let signature = r.read_var_bytes("alert: signature", usize::MAX)?;

        // Newer alert versions may append fields; they stay in `payload`.
        let mut inner = Reader {
            buf: payload,
            pos: 0,
            strict: r.strict,
        };
        let detail = AlertDetail::decode_from(&mut inner)?;

        Ok(Alert::from_signed_parts(
            detail,
            payload.to_vec(),
            signature.to_vec(),
        ))
    }
}

impl Decode for Vec<AddrEntry> {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let count = r.read_count("addr: count", AddrEntry::WIRE_SIZE, MAX_ADDR_ENTRIES)?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(AddrEntry::decode_from(r)?);
        }
        Ok(entries)
    }
}

impl Decode for Vec<AddrV2Entry> {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let count = r.read_count("addrv2: count", AddrV2Entry::MIN_WIRE_SIZE, MAX_ADDR_ENTRIES)?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(AddrV2Entry::decode_from(r)?);
        }
        Ok(entries)
    }
}

impl Decode for Vec<InventoryVector> {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let count = r.read_count("inv: count", InventoryVector::WIRE_SIZE, MAX_INV_ENTRIES)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(InventoryVector::decode_from(r)?);
        }
        Ok(items)
    }
}

/// The `headers` list. The per-header transaction count is written as zero.
/// Peers are not held to that unless decoding is strict.
impl Decode for Vec<BlockHeader> {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self> {
        let count = r.read_count(
            "headers: count",
            BlockHeader::WIRE_SIZE + 1,
            MAX_HEADERS_ENTRIES,
        )?;
        let mut headers = Vec::with_capacity(count);
        for _ in 0..count {
            headers.push(BlockHeader::decode_from(r)?);
            let txn_count = r.read_varint("headers: txn_count")?;
            if r.strict && txn_count != 0 {
                return Err(WireError::malformed(format!(
                    "headers: entry {} has txn_count {txn_count}, expected 0",
                    headers.len() - 1
                )));
            }
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::encode::Encode;
    use std::net::{IpAddr, Ipv4Addr};

    /// Encodes a single net_addr field as used in version / addr payloads,
    /// with the IPv4 address in its `::ffff:a.b.c.d` mapped form.
    fn net_addr_bytes(services: u64, ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut b = vec![];
        b.extend_from_slice(&services.to_le_bytes());
        b.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF]);
        b.extend_from_slice(&ip);
        b.extend_from_slice(&port.to_be_bytes());
        b
    }

    /// Realistic version payload for protocol v70016 (/Satoshi:25.0.0/).
    /// services = NODE_NETWORK(1) | NODE_WITNESS(8) | NODE_NETWORK_LIMITED(1024) = 1033
    fn version_payload_v70016() -> Vec<u8> {
        let mut p = vec![];
        p.extend_from_slice(&70016i32.to_le_bytes());
        p.extend_from_slice(&1033u64.to_le_bytes());
        p.extend_from_slice(&1700000000i64.to_le_bytes());
        p.extend(net_addr_bytes(1033, [192, 168, 1, 1], 8333)); // addr_recv
        p.extend(net_addr_bytes(1033, [10, 0, 0, 1], 8333)); // addr_from
        p.extend_from_slice(&0x1234567890abcdefu64.to_le_bytes()); // nonce
        let ua = b"/Satoshi:25.0.0/";
        p.push(ua.len() as u8);
        p.extend_from_slice(ua);
        p.extend_from_slice(&820000i32.to_le_bytes()); // start_height
        p.push(1); // relay = true
        p
    }

    /// addr payload with 2 IPv4 entries.
    fn addr_payload_two_entries() -> Vec<u8> {
        let mut p = vec![];
        p.push(2);
        p.extend_from_slice(&1700000100u32.to_le_bytes());
        p.extend(net_addr_bytes(1, [1, 2, 3, 4], 8333));
        p.extend_from_slice(&1700000200u32.to_le_bytes());
        p.extend(net_addr_bytes(1, [5, 6, 7, 8], 8334));
        p
    }

    fn sample_header_bytes() -> [u8; 80] {
        let mut header = [0u8; 80];
        header[0..4].copy_from_slice(&1i32.to_le_bytes());
        header[4..36].copy_from_slice(&[0x11; 32]);
        header[36..68].copy_from_slice(&[0x22; 32]);
        header[68..72].copy_from_slice(&1234567890u32.to_le_bytes());
        header[72..76].copy_from_slice(&0x1d00ffffu32.to_le_bytes());
        header[76..80].copy_from_slice(&42u32.to_le_bytes());
        header
    }

    /// One addrv2 entry: timestamp, varint services, network id, var_bytes addr, port.
    fn addrv2_entry_bytes(network_id: u8, addr: &[u8], port: u16) -> Vec<u8> {
        let mut b = vec![];
        b.extend_from_slice(&1700000000u32.to_le_bytes());
        b.push(0x09); // services: NODE_NETWORK | NODE_WITNESS
        b.push(network_id);
        b.push(addr.len() as u8);
        b.extend_from_slice(addr);
        b.extend_from_slice(&port.to_be_bytes());
        b
    }

    #[test]
    fn decode_version_v70016() {
        let msg = Version::decode(&version_payload_v70016()).unwrap();

        assert_eq!(msg.version, 70016);
        assert!(msg.services.contains(Services::NODE_WITNESS));
        assert!(msg.services.contains(Services::NODE_NETWORK_LIMITED));
        assert_eq!(msg.timestamp, 1700000000);
        assert_eq!(msg.addr_recv.ip(), IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(msg.addr_from.port, 8333);
        assert_eq!(msg.nonce, 0x1234567890abcdef);
        assert_eq!(msg.user_agent, "/Satoshi:25.0.0/");
        assert_eq!(msg.start_height, 820000);
        assert_eq!(msg.relay, Some(true));
    }

    #[test]
    fn decode_version_without_relay_byte() {
        let mut payload = version_payload_v70016();
        payload.pop();

        let msg = Version::decode(&payload).unwrap();
        assert_eq!(msg.relay, None);
    }

    #[test]
    fn decode_version_rejects_trailing_bytes_after_relay() {
        let mut payload = version_payload_v70016();
        payload.push(0xAA);

        let err = Version::decode(&payload).unwrap_err();
        assert!(matches!(err, WireError::MalformedPayload(_)), "{err}");
    }

    #[test]
    fn decode_version_relay_byte_above_one() {
        let mut payload = version_payload_v70016();
        *payload.last_mut().unwrap() = 0x02;

        // Permissive: any non-zero byte is true, and re-encoding normalizes it.
        let msg = Version::decode(&payload).unwrap();
        assert_eq!(msg.relay, Some(true));
        assert_eq!(*msg.encode().last().unwrap(), 0x01);

        let err = Version::decode_with(&payload, &DecodeOptions::strict()).unwrap_err();
        assert!(err.to_string().contains("relay flag 0x02"), "{err}");
    }

    #[test]
    fn strict_version_re_encodes_to_input() {
        let payload = version_payload_v70016();
        let msg = Version::decode_with(&payload, &DecodeOptions::strict()).unwrap();
        assert_eq!(msg.encode(), payload);
    }

    #[test]
    fn decode_version_truncated_names_the_field() {
        let payload = version_payload_v70016();

        // Cut inside the nonce: 4 + 8 + 8 + 26 + 26 = 72, nonce ends at 80.
        let err = Version::decode(&payload[..77]).unwrap_err();
        match err {
            WireError::TruncatedInput { context, needed } => {
                assert_eq!(context, "version: nonce");
                assert_eq!(needed, 3);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn decode_version_rejects_long_user_agent() {
        let mut p = version_payload_v70016()[..80].to_vec();
        p.extend_from_slice(&[0xFD, 0x01, 0x01]); // 257
        p.extend(vec![b'a'; 257]);
        p.extend_from_slice(&0i32.to_le_bytes());

        assert!(matches!(
            Version::decode(&p),
            Err(WireError::MalformedPayload(_))
        ));
    }

    #[test]
    fn decode_addr_two_entries() {
        let entries = Vec::<AddrEntry>::decode(&addr_payload_two_entries()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp, 1700000100);
        assert_eq!(
            entries[0].addr.ip(),
            IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))
        );
        assert_eq!(entries[1].addr.port, 8334);
    }

    #[test]
    fn decode_addr_count_larger_than_payload_is_malformed() {
        let mut payload = addr_payload_two_entries();
        payload[0] = 5;

        let err = Vec::<AddrEntry>::decode(&payload).unwrap_err();
        assert!(matches!(err, WireError::MalformedPayload(_)), "{err}");
    }

    #[test]
    fn decode_addr_over_limit_is_malformed() {
        // 1001 entries, announced through a 3-byte compact size.
        let payload = [0xFD, 0xE9, 0x03];
        let err = Vec::<AddrEntry>::decode(&payload).unwrap_err();
        assert!(err.to_string().contains("exceeds limit"), "{err}");
    }

    #[test]
    fn decode_headers_single_entry() {
        let mut payload = vec![1];
        payload.extend(sample_header_bytes());
        payload.push(0);

        let headers = Vec::<BlockHeader>::decode(&payload).unwrap();
        assert_eq!(headers.len(), 1);

        let h = &headers[0];
        assert_eq!(h.version, 1);
        assert_eq!(h.prev_blockhash, Hash256([0x11; 32]));
        assert_eq!(h.merkle_root, Hash256([0x22; 32]));
        assert_eq!(h.time, 1234567890);
        assert_eq!(h.bits, 0x1d00ffff);
        assert_eq!(h.nonce, 42);
    }

    #[test]
    fn decode_headers_non_zero_txn_count() {
        let mut payload = vec![2];
        payload.extend(sample_header_bytes());
        payload.push(0);
        payload.extend(sample_header_bytes());
        payload.push(5);

        let headers = Vec::<BlockHeader>::decode(&payload).unwrap();
        assert_eq!(headers.len(), 2);

        let err = Vec::<BlockHeader>::decode_with(&payload, &DecodeOptions::strict()).unwrap_err();
        assert!(matches!(err, WireError::MalformedPayload(_)), "{err}");
        assert!(err.to_string().contains("entry 1 has txn_count 5"), "{err}");
    }

    #[test]
    fn decode_headers_missing_txn_count_is_rejected() {
        let mut payload = vec![1];
        payload.extend(sample_header_bytes());

        // The count check fails first: one header needs 81 bytes.
        let err = Vec::<BlockHeader>::decode(&payload).unwrap_err();
        assert!(matches!(err, WireError::MalformedPayload(_)), "{err}");
    }

    #[test]
    fn decode_headers_over_limit() {
        let payload = [0xFD, 0xD1, 0x07]; // 2001
        assert!(matches!(
            Vec::<BlockHeader>::decode(&payload),
            Err(WireError::MalformedPayload(_))
        ));
    }

    #[test]
    fn decode_addrv2_known_and_unknown_networks() {
        let mut payload = vec![3];
        payload.extend(addrv2_entry_bytes(0x01, &[8, 8, 4, 4], 8333));
        payload.extend(addrv2_entry_bytes(0x04, &[0xAB; 32], 9050));
        payload.extend(addrv2_entry_bytes(0x2A, &[1, 2, 3], 1));

        let entries = Vec::<AddrV2Entry>::decode(&payload).unwrap();
        assert_eq!(entries[0].addr, AddrV2Addr::IPv4(Ipv4Addr::new(8, 8, 4, 4)));
        assert_eq!(entries[0].services, 0x09);
        assert_eq!(entries[1].addr, AddrV2Addr::TorV3([0xAB; 32]));
        assert_eq!(entries[1].port, 9050);
        assert_eq!(
            entries[2].addr,
            AddrV2Addr::Unknown {
                network_id: 0x2A,
                bytes: vec![1, 2, 3]
            }
        );
        assert_eq!(Vec::<AddrV2Entry>::decode(&payload).unwrap(), entries);
    }

    #[test]
    fn decode_addrv2_rejects_wrong_fixed_length() {
        let mut payload = vec![1];
        payload.extend(addrv2_entry_bytes(0x01, &[1, 2, 3], 8333));

        let err = Vec::<AddrV2Entry>::decode(&payload).unwrap_err();
        assert!(err.to_string().contains("IPv4"), "{err}");
    }

    #[test]
    fn decode_addrv2_rejects_oversized_address() {
        let mut payload = vec![1];
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload.push(0);
        payload.push(0x2A);
        payload.extend_from_slice(&[0xFD, 0x01, 0x02]); // 513
        payload.extend(vec![0u8; 513 + 2]);

        assert!(matches!(
            Vec::<AddrV2Entry>::decode(&payload),
            Err(WireError::MalformedPayload(_))
        ));
    }

    #[test]
    fn truncated_compact_size_prefixes() {
        let cases: [&[u8]; 4] = [&[0xFD, 0x01], &[0xFE, 0, 0, 0], &[0xFF, 0, 0, 0, 0, 0, 0, 0], &[]];
        for bytes in cases {
            let err = Reader::new(bytes).read_varint("varint").unwrap_err();
            assert!(matches!(err, WireError::TruncatedInput { .. }), "{bytes:02x?}");
        }
    }

    #[test]
    fn compact_size_boundaries_decode() {
        for value in [0u64, 0xFC, 0xFD, 0xFFFF, 0x1_0000, 0xFFFF_FFFF, 0x1_0000_0000] {
            let mut bytes = vec![];
            crate::wire::encode::write_varint(value, &mut bytes);
            let mut r = Reader::with_options(&bytes, &DecodeOptions::strict());
            assert_eq!(r.read_varint("varint").unwrap(), value);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn non_canonical_compact_size_only_fails_in_strict_mode() {
        let bytes = [0xFD, 0x10, 0x00];

        assert_eq!(Reader::new(&bytes).read_varint("varint").unwrap(), 16);

        let err = Reader::with_options(&bytes, &DecodeOptions::strict())
            .read_varint("varint")
            .unwrap_err();
        assert!(matches!(err, WireError::MalformedPayload(_)));

        let wide = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0];
        assert!(
            Reader::with_options(&wide, &DecodeOptions::strict())
                .read_varint("varint")
                .is_err()
        );
    }

    #[test]
    fn decode_inv_rejects_unknown_type() {
        let mut payload = vec![1];
        payload.extend_from_slice(&7u32.to_le_bytes());
        payload.extend_from_slice(&[0u8; 32]);

        assert!(matches!(
            Vec::<InventoryVector>::decode(&payload),
            Err(WireError::MalformedPayload(_))
        ));
    }

    #[test]
    fn decode_getheaders_reads_stop_hash_after_locator() {
        let mut payload = vec![];
        payload.extend_from_slice(&70016i32.to_le_bytes());
        payload.push(2);
        payload.extend_from_slice(&[0x01; 32]);
        payload.extend_from_slice(&[0x02; 32]);
        payload.extend_from_slice(&[0x03; 32]);

        let msg = GetHeaders::decode(&payload).unwrap();
        assert_eq!(msg.version, 70016);
        assert_eq!(msg.hashes(), &[Hash256([0x01; 32]), Hash256([0x02; 32])]);
        assert_eq!(msg.hash_stop(), Hash256([0x03; 32]));
    }

    #[test]
    fn decode_getblocks_rejects_long_locator() {
        let mut payload = vec![];
        payload.extend_from_slice(&70016i32.to_le_bytes());
        payload.push(102);
        payload.extend(vec![0u8; 103 * 32]);

        assert!(matches!(
            GetBlocks::decode(&payload),
            Err(WireError::MalformedPayload(_))
        ));
    }

    #[test]
    fn decode_filterload_validates_limits_and_flags() {
        let filter = BloomFilter {
            data: vec![0xFF; 8],
            hash_funcs: 11,
            tweak: 0xDEADBEEF,
            flags: BloomFlags::All,
        };
        let mut payload = filter.encode();
        assert_eq!(BloomFilter::decode(&payload).unwrap(), filter);

        let last = payload.len() - 1;
        payload[last] = 3;
        assert!(BloomFilter::decode(&payload).is_err());

        let too_many = BloomFilter {
            hash_funcs: 51,
            ..filter
        };
        assert!(BloomFilter::decode(&too_many.encode()).is_err());
    }

    #[test]
    fn decode_filteradd_over_520_bytes() {
        let payload = FilterAdd {
            data: vec![0; 521],
        }
        .encode();
        assert!(matches!(
            FilterAdd::decode(&payload),
            Err(WireError::MalformedPayload(_))
        ));
    }

    #[test]
    fn decode_reject_without_extra_data() {
        let mut payload = vec![2];
        payload.extend_from_slice(b"tx");
        payload.push(0x10);
        payload.push(7);
        payload.extend_from_slice(b"invalid");

        let reject = Reject::decode(&payload).unwrap();
        assert_eq!(reject.message, "tx");
        assert_eq!(reject.code, RejectCode::INVALID);
        assert_eq!(reject.reason, "invalid");
        assert!(reject.data.is_empty());

        payload.extend_from_slice(&[0x55; 32]);
        assert_eq!(Reject::decode(&payload).unwrap().data, vec![0x55; 32]);
    }

    #[test]
    fn decode_block_keeps_raw_transactions() {
        let mut payload = sample_header_bytes().to_vec();
        payload.push(2);
        payload.extend_from_slice(&[0xAA; 120]);

        let block = Block::decode(&payload).unwrap();
        assert_eq!(block.tx_count, 2);
        assert_eq!(block.transactions.len(), 120);
        assert_eq!(block.encode(), payload);
        assert_eq!(block.serialized_size(), payload.len());
    }

    #[test]
    fn decode_alert_preserves_non_canonical_signed_bytes() {
        let detail = AlertDetail {
            version: 1,
            id: 1010,
            comment: "see bitcoin.org".into(),
            ..AlertDetail::default()
        };
        // Re-encode `set_cancel` with a wide compact size (FD 00 00 for 0).
        let canonical = detail.encode();
        let set_cancel_at = 4 + 8 + 8 + 4 + 4;
        let mut signed = canonical[..set_cancel_at].to_vec();
        signed.extend_from_slice(&[0xFD, 0x00, 0x00]);
        signed.extend_from_slice(&canonical[set_cancel_at + 1..]);

        let mut payload = vec![];
        crate::wire::encode::write_var_bytes(&signed, &mut payload);
        crate::wire::encode::write_var_bytes(&[0x30, 0x45, 0x02], &mut payload);

        let alert = Alert::decode(&payload).unwrap();
        assert_eq!(alert.detail(), &detail);
        assert_eq!(alert.signed_payload(), signed.as_slice());
        assert_eq!(alert.encode(), payload);
        assert_ne!(alert.signature_hash(), Hash256::double_sha256(&canonical));
    }

    #[test]
    fn decode_empty_rejects_payload() {
        assert!(decode_empty(&[], "verack").is_ok());
        let err = decode_empty(&[0, 1], "verack").unwrap_err();
        assert!(err.to_string().contains("verack"));
    }
}
