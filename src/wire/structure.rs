//! Compound structures reused across message bodies.
//!
//! Byte layouts live next to the other codecs in [`crate::wire::encode`] and
//! [`crate::wire::decode`]; this module only defines the values.

use std::fmt::{self, Debug, Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::wire::encode::{Encode, varint_len};
use crate::wire::error::{Result, WireError};

/// A 32-byte double-SHA256 value (block hash, txid, merkle root).
///
/// Stored in the little-endian byte order used on the wire. Block explorers
/// and RPC print the bytes reversed; [`Display`] and
/// [`Hash256::from_display_hex`] convert between the two, nothing else does.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    /// `SHA256(SHA256(data))`.
    ///
    /// This "double SHA256" construction is part of the original Bitcoin
    /// design and is used throughout the protocol for block identifiers,
    /// transaction identifiers, merkle tree nodes and message checksums.
    pub fn double_sha256(data: &[u8]) -> Self {
        let hash = Sha256::digest(Sha256::digest(data));

        let mut result = [0u8; 32];
        result.copy_from_slice(&hash);
        Hash256(result)
    }

    /// Parses the human-readable (big-endian) hex form.
    pub fn from_display_hex(s: &str) -> Result<Self> {
        let mut bytes = hex::decode(s.trim())
            .map_err(|e| WireError::malformed(format!("hash: invalid hex: {e}")))?;
        if bytes.len() != 32 {
            return Err(WireError::malformed(format!(
                "hash: expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        bytes.reverse();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Hash256(hash))
    }

    pub fn to_display_hex(&self) -> String {
        let mut bytes = self.0;
        bytes.reverse();
        hex::encode(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }
}

impl FromStr for Hash256 {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        Hash256::from_display_hex(s)
    }
}

impl Display for Hash256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_hex())
    }
}

impl Debug for Hash256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_display_hex())
    }
}

/// Service flags as defined by the Bitcoin P2P protocol.
///
/// This is a bitfield (`u64`) transmitted in the `version` message and in
/// every network address record. Each bit represents a capability supported
/// by the node.
///
/// Official reference:
/// https://developer.bitcoin.org/reference/p2p_networking.html#version
///
/// The flags are forward-compatible: unknown bits must be preserved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Services(u64);

impl Services {
    /// Creates a new `Services` from raw bits.
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bitfield value.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if all bits in `other` are set.
    pub const fn contains(self, other: Services) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns true if no bits are set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    // ---- Assigned Service Flags ----

    /// 0x00: Unnamed
    ///
    /// This node is not a full node.
    /// It may not be able to provide any data except for transactions it originates.
    pub const NONE: Services = Services(0x00);

    /// 0x01: NODE_NETWORK
    ///
    /// This is a full node and can be asked for full blocks.
    pub const NODE_NETWORK: Services = Services(0x01);

    /// 0x02: NODE_GETUTXO (BIP64). Not supported by maintained Bitcoin Core versions.
    pub const NODE_GETUTXO: Services = Services(0x02);

    /// 0x04: NODE_BLOOM
    ///
    /// Supports bloom-filtered connections (`filterload`, `filteradd`,
    /// `filterclear`, `merkleblock`). Defined in BIP111.
    pub const NODE_BLOOM: Services = Services(0x04);

    /// 0x08: NODE_WITNESS (BIP144).
    pub const NODE_WITNESS: Services = Services(0x08);

    /// 0x10: NODE_XTHIN. Not supported by maintained Bitcoin Core versions.
    pub const NODE_XTHIN: Services = Services(0x10);

    /// 0x40: NODE_COMPACT_FILTERS (BIP157).
    pub const NODE_COMPACT_FILTERS: Services = Services(0x40);

    /// 0x0400: NODE_NETWORK_LIMITED
    ///
    /// Same as NODE_NETWORK but guarantees at least the last 288 blocks
    /// (~2 days). Defined in BIP159.
    pub const NODE_NETWORK_LIMITED: Services = Services(0x0400);

    const NAMED: [(Services, &'static str); 7] = [
        (Self::NODE_NETWORK, "NODE_NETWORK"),
        (Self::NODE_GETUTXO, "NODE_GETUTXO"),
        (Self::NODE_BLOOM, "NODE_BLOOM"),
        (Self::NODE_WITNESS, "NODE_WITNESS"),
        (Self::NODE_XTHIN, "NODE_XTHIN"),
        (Self::NODE_COMPACT_FILTERS, "NODE_COMPACT_FILTERS"),
        (Self::NODE_NETWORK_LIMITED, "NODE_NETWORK_LIMITED"),
    ];

    pub fn names(self) -> Vec<&'static str> {
        if self.is_empty() {
            return vec!["NONE"];
        }

        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl From<u64> for Services {
    fn from(value: u64) -> Self {
        Services::new(value)
    }
}

impl std::ops::BitOr for Services {
    type Output = Services;

    fn bitor(self, rhs: Services) -> Services {
        Services(self.0 | rhs.0)
    }
}

impl Debug for Services {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Services(NONE)");
        }

        let names = self.names().join(" | ");

        write!(f, "Services({}) [0x{:016x}]", names, self.bits())
    }
}

/// A network address record as found in `version` and `addr` payloads.
///
/// ```text
/// uint64     services
/// char[16]   ip    (IPv4 as ::ffff:a.b.c.d)
/// uint16     port  (big-endian)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkAddress {
    pub services: Services,
    pub ip: Ipv6Addr,
    pub port: u16,
}

impl NetworkAddress {
    pub const WIRE_SIZE: usize = 26;

    pub fn new(services: Services, ip: IpAddr, port: u16) -> Self {
        let ip = match ip {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        Self { services, ip, port }
    }

    pub fn from_socket_addr(services: Services, addr: SocketAddr) -> Self {
        Self::new(services, addr.ip(), addr.port())
    }

    /// All-zero address, what nodes send when they do not know (or do not
    /// want to reveal) an address.
    pub const fn unroutable() -> Self {
        Self {
            services: Services::NONE,
            ip: Ipv6Addr::UNSPECIFIED,
            port: 0,
        }
    }

    /// The address with IPv4-mapped values unwrapped back to IPv4.
    pub fn ip(&self) -> IpAddr {
        match self.ip.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(self.ip),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip(), self.port)
    }
}

/// A timestamped network address, the element type of `addr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrEntry {
    pub timestamp: u32,
    pub addr: NetworkAddress,
}

impl AddrEntry {
    pub const WIRE_SIZE: usize = 4 + NetworkAddress::WIRE_SIZE;
}

/// Network-specific address payload from an `addrv2` message (BIP 155).
///
/// Each variant carries exactly the bytes defined by the BIP 155 registry:
///
/// | ID   | Variant      | Length  |
/// |------|--------------|---------|
/// | 0x01 | IPv4         | 4 B     |
/// | 0x02 | IPv6         | 16 B    |
/// | 0x03 | TorV2        | 10 B    | (deprecated, Tor v2 shut down Oct 2021)
/// | 0x04 | TorV3        | 32 B    |
/// | 0x05 | I2P          | 32 B    |
/// | 0x06 | CJDNS        | 16 B    |
/// | 0x07 | Yggdrasil    | 16 B    |
///
/// https://github.com/bitcoin/bips/blob/master/bip-0155.mediawiki
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddrV2Addr {
    IPv4(Ipv4Addr),
    IPv6(Ipv6Addr),
    TorV2([u8; 10]),
    TorV3([u8; 32]),
    I2P([u8; 32]),
    Cjdns(Ipv6Addr),
    Yggdrasil(Ipv6Addr),
    Unknown { network_id: u8, bytes: Vec<u8> },
}

impl AddrV2Addr {
    pub fn network_id(&self) -> u8 {
        match self {
            AddrV2Addr::IPv4(_) => 0x01,
            AddrV2Addr::IPv6(_) => 0x02,
            AddrV2Addr::TorV2(_) => 0x03,
            AddrV2Addr::TorV3(_) => 0x04,
            AddrV2Addr::I2P(_) => 0x05,
            AddrV2Addr::Cjdns(_) => 0x06,
            AddrV2Addr::Yggdrasil(_) => 0x07,
            AddrV2Addr::Unknown { network_id, .. } => *network_id,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            AddrV2Addr::IPv4(ip) => ip.octets().to_vec(),
            AddrV2Addr::IPv6(ip) | AddrV2Addr::Cjdns(ip) | AddrV2Addr::Yggdrasil(ip) => {
                ip.octets().to_vec()
            }
            AddrV2Addr::TorV2(b) => b.to_vec(),
            AddrV2Addr::TorV3(b) | AddrV2Addr::I2P(b) => b.to_vec(),
            AddrV2Addr::Unknown { bytes, .. } => bytes.clone(),
        }
    }

    /// Rebuilds the address from its network id and raw bytes, enforcing the
    /// fixed lengths of the known networks.
    pub fn from_parts(network_id: u8, bytes: &[u8]) -> Result<Self> {
        fn fixed<const N: usize>(bytes: &[u8], name: &str) -> Result<[u8; N]> {
            bytes
                .try_into()
                .map_err(|_| WireError::malformed(format!("addrv2: {name} must be {} bytes", N)))
        }

        Ok(match network_id {
            0x01 => AddrV2Addr::IPv4(Ipv4Addr::from(fixed::<4>(bytes, "IPv4")?)),
            0x02 => AddrV2Addr::IPv6(Ipv6Addr::from(fixed::<16>(bytes, "IPv6")?)),
            0x03 => AddrV2Addr::TorV2(fixed(bytes, "TorV2")?),
            0x04 => AddrV2Addr::TorV3(fixed(bytes, "TorV3")?),
            0x05 => AddrV2Addr::I2P(fixed(bytes, "I2P")?),
            0x06 => AddrV2Addr::Cjdns(Ipv6Addr::from(fixed::<16>(bytes, "CJDNS")?)),
            0x07 => AddrV2Addr::Yggdrasil(Ipv6Addr::from(fixed::<16>(bytes, "Yggdrasil")?)),
            id => AddrV2Addr::Unknown {
                network_id: id,
                bytes: bytes.to_vec(),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrV2Entry {
    pub timestamp: u32,
    /// Services encoded as a CompactSize (varint) on the wire, expanded to u64.
    pub services: u64,
    pub addr: AddrV2Addr,
    pub port: u16,
}

impl AddrV2Entry {
    /// timestamp + 1-byte services + network id + 1-byte length + port.
    pub const MIN_WIRE_SIZE: usize = 4 + 1 + 1 + 1 + 2;
}

/// Inventory object types used in `inv`, `getdata`, and `notfound` messages.
///
/// Defined by the Bitcoin P2P protocol:
/// https://developer.bitcoin.org/reference/p2p_networking.html#data-messages
///
/// These values are serialized as little-endian 32-bit unsigned integers.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryType {
    /// Error / undefined type.
    Error = 0,

    /// Transaction (legacy txid-based).
    Tx = 1,

    /// Full block.
    Block = 2,

    /// Filtered block (BIP37), answered with `merkleblock`.
    FilteredBlock = 3,

    /// Compact block (BIP152).
    CompactBlock = 4,

    /// Witness transaction (BIP144).
    WitnessTx = 0x40000001,

    /// Witness block (BIP144).
    WitnessBlock = 0x40000002,

    /// Witness filtered block (BIP144).
    WitnessFilteredBlock = 0x40000003,
}

impl InventoryType {
    /// Serialize the inventory type to little-endian bytes for wire usage.
    pub fn to_le_bytes(self) -> [u8; 4] {
        (self as u32).to_le_bytes()
    }
}

impl TryFrom<u32> for InventoryType {
    type Error = WireError;

    fn try_from(value: u32) -> Result<Self> {
        Ok(match value {
            0 => InventoryType::Error,
            1 => InventoryType::Tx,
            2 => InventoryType::Block,
            3 => InventoryType::FilteredBlock,
            4 => InventoryType::CompactBlock,
            0x40000001 => InventoryType::WitnessTx,
            0x40000002 => InventoryType::WitnessBlock,
            0x40000003 => InventoryType::WitnessFilteredBlock,
            other => {
                return Err(WireError::malformed(format!(
                    "inventory: unknown type 0x{other:08x}"
                )));
            }
        })
    }
}

/// A (type, hash) pair announcing or requesting one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InventoryVector {
    pub kind: InventoryType,
    pub hash: Hash256,
}

impl InventoryVector {
    pub const WIRE_SIZE: usize = 36;

    pub fn new(kind: InventoryType, hash: Hash256) -> Self {
        Self { kind, hash }
    }

    pub fn block(hash: Hash256) -> Self {
        Self::new(InventoryType::Block, hash)
    }

    pub fn tx(hash: Hash256) -> Self {
        Self::new(InventoryType::Tx, hash)
    }
}

/// Block locator carried by `getblocks` and `getheaders`.
///
/// ```text
/// varint  hash_count
/// hash[]  block_locator_hashes   (newest first)
/// hash    hash_stop              (zero = as many as allowed)
/// ```
///
/// Semantics:
/// The peer will:
/// 1. Find the first locator hash it recognizes in its active chain.
/// 2. Return headers/inventory *after* that block in forward order.
/// 3. Stop at the protocol limit or when reaching `hash_stop`.
///
/// Reference:
/// https://developer.bitcoin.org/reference/p2p_networking.html#getheaders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLocator {
    pub hashes: Vec<Hash256>,
    pub hash_stop: Hash256,
}

impl BlockLocator {
    pub fn new(hashes: Vec<Hash256>, hash_stop: Hash256) -> Self {
        Self { hashes, hash_stop }
    }

    /// Splits a combined `[locator.., stop]` sequence: the final element is
    /// the stop hash, everything before it is the locator.
    pub fn from_combined(mut combined: Vec<Hash256>) -> Result<Self> {
        let hash_stop = combined
            .pop()
            .ok_or_else(|| WireError::malformed("block locator: no stop hash supplied"))?;
        Ok(Self {
            hashes: combined,
            hash_stop,
        })
    }

    /// The inverse of [`BlockLocator::from_combined`].
    pub fn combined(&self) -> Vec<Hash256> {
        let mut all = self.hashes.clone();
        all.push(self.hash_stop);
        all
    }
}

/// A Bitcoin block header (exactly 80 bytes on the wire).
///
/// The header is transmitted inside `block`, `headers` and `merkleblock`
/// messages.
///
/// Layout (little-endian fields unless otherwise noted):
///
/// ```text
/// 4  bytes  version
/// 32 bytes  previous block hash
/// 32 bytes  merkle root
/// 4  bytes  timestamp (Unix epoch)
/// 4  bytes  nBits (compact target encoding)
/// 4  bytes  nonce
/// ```
///
/// Reference:
/// https://developer.bitcoin.org/reference/block_chain.html#block-headers
///
/// In `headers` messages, each header is followed by a CompactSize
/// transaction count (always zero). The transaction data is NOT included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_blockhash: Hash256,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub const WIRE_SIZE: usize = 80;

    /// Computes the block header hash (block ID): `SHA256(SHA256(header))`.
    ///
    /// The returned hash is in wire byte order; use its [`Display`] impl for
    /// the form shown by block explorers.
    pub fn hash(&self) -> Hash256 {
        Hash256::double_sha256(&self.encode())
    }
}

/// A serialized transaction, opaque to this layer.
///
/// Transaction parsing belongs to the chain layer; the `tx` message simply
/// carries the canonical serialization as its whole payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    raw: Vec<u8>,
}

impl Transaction {
    pub fn from_bytes(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.raw
    }

    /// Double SHA256 of the serialization as carried. For witness
    /// transactions this is the wtxid, not the txid.
    pub fn wire_hash(&self) -> Hash256 {
        Hash256::double_sha256(&self.raw)
    }
}

/// A block as carried by the `block` message.
///
/// ```text
/// block
///   block_header      (80 bytes)
///   txn_count         (CompactSize)
///   transactions[]    (raw serialized transactions)
/// ```
///
/// Only the header and transaction count are decoded; the transactions stay
/// as the raw bytes the peer sent so the block re-serializes unchanged.
///
/// Reference (serialized block format):
/// https://developer.bitcoin.org/reference/block_chain.html#serialized-blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub tx_count: u64,
    pub transactions: Vec<u8>,
}

impl Block {
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    /// Size of the `block` payload, excluding the 24-byte message header.
    pub fn serialized_size(&self) -> usize {
        BlockHeader::WIRE_SIZE + varint_len(self.tx_count) + self.transactions.len()
    }
}

/// `nFlags` of a BIP37 bloom filter: how matched outputs update the filter.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BloomFlags {
    #[default]
    None = 0,
    All = 1,
    PubkeyOnly = 2,
}

impl TryFrom<u8> for BloomFlags {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(BloomFlags::None),
            1 => Ok(BloomFlags::All),
            2 => Ok(BloomFlags::PubkeyOnly),
            other => Err(WireError::malformed(format!(
                "filterload: unknown bloom flags {other}"
            ))),
        }
    }
}

/// A serialized BIP37 bloom filter, the payload of `filterload`.
///
/// ```text
/// varint   filter length
/// uint8[]  filter bits
/// uint32   nHashFuncs
/// uint32   nTweak
/// uint8    nFlags
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    pub data: Vec<u8>,
    pub hash_funcs: u32,
    pub tweak: u32,
    pub flags: BloomFlags,
}

/// The signed body of a legacy `alert` message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlertDetail {
    pub version: i32,
    pub relay_until: i64,
    pub expiration: i64,
    pub id: i32,
    pub cancel: i32,
    pub set_cancel: Vec<i32>,
    pub min_ver: i32,
    pub max_ver: i32,
    pub set_sub_ver: Vec<String>,
    pub priority: i32,
    pub comment: String,
    pub status_bar: String,
    pub reserved: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_hash_displays_reversed() {
        let hash = Hash256(crate::wire::constants::GENESIS_BLOCK_HASH_MAINNET);
        assert_eq!(
            hash.to_string(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
        assert_eq!(Hash256::from_display_hex(&hash.to_string()).unwrap(), hash);
    }

    #[test]
    fn from_display_hex_rejects_wrong_length() {
        assert!(Hash256::from_display_hex("abcd").is_err());
        assert!(Hash256::from_display_hex("zz").is_err());
    }

    #[test]
    fn mainnet_genesis_header_hashes_to_genesis() {
        let header = BlockHeader {
            version: 1,
            prev_blockhash: Hash256::ZERO,
            merkle_root: "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
                .parse()
                .unwrap(),
            time: 1231006505,
            bits: 0x1d00ffff,
            nonce: 2083236893,
        };
        assert_eq!(
            header.hash(),
            Hash256(crate::wire::constants::GENESIS_BLOCK_HASH_MAINNET)
        );
    }

    #[test]
    fn services_debug_lists_known_flags() {
        let services = Services::NODE_NETWORK | Services::NODE_WITNESS;
        assert_eq!(services.bits(), 9);
        assert_eq!(services.names(), vec!["NODE_NETWORK", "NODE_WITNESS"]);
        assert_eq!(format!("{:?}", Services::NONE), "Services(NONE)");
    }

    #[test]
    fn network_address_maps_ipv4_into_ipv6() {
        let addr = NetworkAddress::new(
            Services::NODE_NETWORK,
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
            8333,
        );
        assert_eq!(
            addr.ip.octets(),
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 192, 168, 1, 1]
        );
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(addr.socket_addr().to_string(), "192.168.1.1:8333");
    }

    #[test]
    fn block_locator_splits_stop_hash_off_the_end() {
        let (h1, h2, h3) = (Hash256([1; 32]), Hash256([2; 32]), Hash256([3; 32]));

        let locator = BlockLocator::from_combined(vec![h1, h2, h3]).unwrap();
        assert_eq!(locator.hashes, vec![h1, h2]);
        assert_eq!(locator.hash_stop, h3);
        assert_eq!(locator.combined(), vec![h1, h2, h3]);

        let only_stop = BlockLocator::from_combined(vec![h3]).unwrap();
        assert!(only_stop.hashes.is_empty());
        assert_eq!(only_stop.hash_stop, h3);
    }

    #[test]
    fn block_locator_without_any_hash_is_malformed() {
        assert!(matches!(
            BlockLocator::from_combined(vec![]),
            Err(WireError::MalformedPayload(_))
        ));
    }

    #[test]
    fn inventory_type_rejects_unknown_values() {
        assert_eq!(InventoryType::try_from(2).unwrap(), InventoryType::Block);
        assert_eq!(
            InventoryType::try_from(0x40000001).unwrap(),
            InventoryType::WitnessTx
        );
        assert!(InventoryType::try_from(5).is_err());
    }

    #[test]
    fn addrv2_from_parts_enforces_known_lengths() {
        assert!(AddrV2Addr::from_parts(0x01, &[1, 2, 3, 4]).is_ok());
        assert!(AddrV2Addr::from_parts(0x01, &[1, 2, 3, 4, 5, 6]).is_err());
        assert!(AddrV2Addr::from_parts(0x04, &[0u8; 31]).is_err());
        assert!(matches!(
            AddrV2Addr::from_parts(0x42, &[0xDE, 0xAD]).unwrap(),
            AddrV2Addr::Unknown { network_id: 0x42, .. }
        ));
    }
}
