use crate::wire::decode::{Decode, DecodeOptions, decode_empty};
use crate::wire::encode::{Encode, write_headers, write_list};
use crate::wire::error::Result;
use crate::wire::structure::{
    AddrEntry, AddrV2Entry, AlertDetail, Block, BlockHeader, BlockLocator, BloomFilter, Hash256,
    InventoryVector, NetworkAddress, Services, Transaction,
};

/// Represents a decoded Bitcoin P2P message.
///
/// Each variant corresponds to a known Bitcoin protocol command and owns
/// exactly the fields of that command's payload.
///
/// See:
/// https://developer.bitcoin.org/reference/p2p_networking.html
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Control
    Version(Version),
    Verack,
    Addr(Vec<AddrEntry>),
    AddrV2(Vec<AddrV2Entry>),
    SendAddrV2,
    GetAddr,
    Ping(Ping),
    Pong(Pong),
    SendHeaders,
    FeeFilter(FeeFilter),
    Reject(Reject),
    Alert(Alert),
    // Data
    Inv(Vec<InventoryVector>),
    GetData(Vec<InventoryVector>),
    NotFound(Vec<InventoryVector>),
    GetBlocks(GetBlocks),
    GetHeaders(GetHeaders),
    Headers(Vec<BlockHeader>),
    Block(Block),
    Tx(Transaction),
    Mempool,
    MerkleBlock(MerkleBlock),
    // Bloom filter
    FilterLoad(BloomFilter),
    FilterAdd(FilterAdd),
    FilterClear,
}

impl Message {
    pub fn command(&self) -> Command {
        match self {
            Message::Version(_) => Command::Version,
            Message::Verack => Command::Verack,
            Message::Addr(_) => Command::Addr,
            Message::AddrV2(_) => Command::AddrV2,
            Message::SendAddrV2 => Command::SendAddrV2,
            Message::GetAddr => Command::GetAddr,
            Message::Ping(_) => Command::Ping,
            Message::Pong(_) => Command::Pong,
            Message::SendHeaders => Command::SendHeaders,
            Message::FeeFilter(_) => Command::FeeFilter,
            Message::Reject(_) => Command::Reject,
            Message::Alert(_) => Command::Alert,
            Message::Inv(_) => Command::Inv,
            Message::GetData(_) => Command::GetData,
            Message::NotFound(_) => Command::NotFound,
            Message::GetBlocks(_) => Command::GetBlocks,
            Message::GetHeaders(_) => Command::GetHeaders,
            Message::Headers(_) => Command::Headers,
            Message::Block(_) => Command::Block,
            Message::Tx(_) => Command::Tx,
            Message::Mempool => Command::Mempool,
            Message::MerkleBlock(_) => Command::MerkleBlock,
            Message::FilterLoad(_) => Command::FilterLoad,
            Message::FilterAdd(_) => Command::FilterAdd,
            Message::FilterClear => Command::FilterClear,
        }
    }

    /// Serializes the message body (everything after the 24-byte header).
    pub fn encode_payload(&self) -> Vec<u8> {
        self.encode()
    }

    /// Decodes a message body with the codec registered for `command`.
    pub fn decode_payload(
        command: Command,
        payload: &[u8],
        options: &DecodeOptions,
    ) -> Result<Message> {
        Ok(match command {
            Command::Version => Message::Version(Version::decode_with(payload, options)?),
            Command::Verack => {
                decode_empty(payload, "verack")?;
                Message::Verack
            }
            Command::Addr => Message::Addr(Vec::<AddrEntry>::decode_with(payload, options)?),
            Command::AddrV2 => {
                Message::AddrV2(Vec::<AddrV2Entry>::decode_with(payload, options)?)
            }
            Command::SendAddrV2 => {
                decode_empty(payload, "sendaddrv2")?;
                Message::SendAddrV2
            }
            Command::GetAddr => {
                decode_empty(payload, "getaddr")?;
                Message::GetAddr
            }
            Command::Ping => Message::Ping(Ping::decode_with(payload, options)?),
            Command::Pong => Message::Pong(Pong::decode_with(payload, options)?),
            Command::SendHeaders => {
                decode_empty(payload, "sendheaders")?;
                Message::SendHeaders
            }
            Command::FeeFilter => Message::FeeFilter(FeeFilter::decode_with(payload, options)?),
            Command::Reject => Message::Reject(Reject::decode_with(payload, options)?),
            Command::Alert => Message::Alert(Alert::decode_with(payload, options)?),
            Command::Inv => Message::Inv(Vec::<InventoryVector>::decode_with(payload, options)?),
            Command::GetData => {
                Message::GetData(Vec::<InventoryVector>::decode_with(payload, options)?)
            }
            Command::NotFound => {
                Message::NotFound(Vec::<InventoryVector>::decode_with(payload, options)?)
            }
            Command::GetBlocks => Message::GetBlocks(GetBlocks::decode_with(payload, options)?),
            Command::GetHeaders => {
                Message::GetHeaders(GetHeaders::decode_with(payload, options)?)
            }
            Command::Headers => {
                Message::Headers(Vec::<BlockHeader>::decode_with(payload, options)?)
            }
            Command::Block => Message::Block(Block::decode_with(payload, options)?),
            Command::Tx => Message::Tx(Transaction::decode_with(payload, options)?),
            Command::Mempool => {
                decode_empty(payload, "mempool")?;
                Message::Mempool
            }
            Command::MerkleBlock => {
                Message::MerkleBlock(MerkleBlock::decode_with(payload, options)?)
            }
            Command::FilterLoad => {
                Message::FilterLoad(BloomFilter::decode_with(payload, options)?)
            }
            Command::FilterAdd => Message::FilterAdd(FilterAdd::decode_with(payload, options)?),
            Command::FilterClear => {
                decode_empty(payload, "filterclear")?;
                Message::FilterClear
            }
        })
    }
}

impl Encode for Message {
    fn encode_to(&self, out: &mut Vec<u8>) {
        match self {
            Message::Verack
            | Message::SendAddrV2
            | Message::GetAddr
            | Message::SendHeaders
            | Message::Mempool
            | Message::FilterClear => {}
            Message::Version(v) => v.encode_to(out),
            Message::Addr(entries) => write_list(entries, out),
            Message::AddrV2(entries) => write_list(entries, out),
            Message::Ping(ping) => ping.encode_to(out),
            Message::Pong(pong) => pong.encode_to(out),
            Message::FeeFilter(filter) => filter.encode_to(out),
            Message::Reject(reject) => reject.encode_to(out),
            Message::Alert(alert) => alert.encode_to(out),
            Message::Inv(items) | Message::GetData(items) | Message::NotFound(items) => {
                write_list(items, out)
            }
            Message::GetBlocks(get) => get.encode_to(out),
            Message::GetHeaders(get) => get.encode_to(out),
            Message::Headers(headers) => write_headers(headers, out),
            Message::Block(block) => block.encode_to(out),
            Message::Tx(tx) => tx.encode_to(out),
            Message::MerkleBlock(block) => block.encode_to(out),
            Message::FilterLoad(filter) => filter.encode_to(out),
            Message::FilterAdd(add) => add.encode_to(out),
        }
    }
}

macro_rules! impl_from_body {
    ($($body:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$body> for Message {
                fn from(body: $body) -> Self {
                    Message::$variant(body)
                }
            }
        )*
    };
}

impl_from_body! {
    Version => Version,
    Ping => Ping,
    Pong => Pong,
    FeeFilter => FeeFilter,
    Reject => Reject,
    Alert => Alert,
    GetBlocks => GetBlocks,
    GetHeaders => GetHeaders,
    Block => Block,
    Transaction => Tx,
    MerkleBlock => MerkleBlock,
    BloomFilter => FilterLoad,
    FilterAdd => FilterAdd,
}

/// Every command this crate has a codec for.
///
/// The command name doubles as the wire identifier and as the dispatch key:
/// [`Command::from_name`] resolves the trimmed 12-byte header field against
/// this set, and [`Message::decode_payload`] routes to the body codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // Control
    Version,
    Verack,
    Addr,
    AddrV2,
    SendAddrV2,
    GetAddr,
    Ping,
    Pong,
    SendHeaders,
    FeeFilter,
    Reject,
    Alert,
    // Data
    Inv,
    GetData,
    NotFound,
    GetBlocks,
    GetHeaders,
    Headers,
    Block,
    Tx,
    Mempool,
    MerkleBlock,
    // Bloom filter
    FilterLoad,
    FilterAdd,
    FilterClear,
}

impl Command {
    pub const ALL: [Command; 25] = [
        Command::Version,
        Command::Verack,
        Command::Addr,
        Command::AddrV2,
        Command::SendAddrV2,
        Command::GetAddr,
        Command::Ping,
        Command::Pong,
        Command::SendHeaders,
        Command::FeeFilter,
        Command::Reject,
        Command::Alert,
        Command::Inv,
        Command::GetData,
        Command::NotFound,
        Command::GetBlocks,
        Command::GetHeaders,
        Command::Headers,
        Command::Block,
        Command::Tx,
        Command::Mempool,
        Command::MerkleBlock,
        Command::FilterLoad,
        Command::FilterAdd,
        Command::FilterClear,
    ];

    /// The ASCII command name as sent on the wire.
    pub const fn name(self) -> &'static str {
        match self {
            Command::Version => "version",
            Command::Verack => "verack",
            Command::Addr => "addr",
            Command::AddrV2 => "addrv2",
            Command::SendAddrV2 => "sendaddrv2",
            Command::GetAddr => "getaddr",
            Command::Ping => "ping",
            Command::Pong => "pong",
            Command::SendHeaders => "sendheaders",
            Command::FeeFilter => "feefilter",
            Command::Reject => "reject",
            Command::Alert => "alert",
            Command::Inv => "inv",
            Command::GetData => "getdata",
            Command::NotFound => "notfound",
            Command::GetBlocks => "getblocks",
            Command::GetHeaders => "getheaders",
            Command::Headers => "headers",
            Command::Block => "block",
            Command::Tx => "tx",
            Command::Mempool => "mempool",
            Command::MerkleBlock => "merkleblock",
            Command::FilterLoad => "filterload",
            Command::FilterAdd => "filteradd",
            Command::FilterClear => "filterclear",
        }
    }

    pub fn from_name(name: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|cmd| cmd.name() == name)
    }

    /// Returns the 12-byte command field as defined by the Bitcoin P2P protocol.
    ///
    /// The command string is ASCII and padded with zero bytes.
    pub fn as_bytes(&self) -> [u8; 12] {
        let name = self.name().as_bytes();

        let mut padded = [0u8; 12];
        padded[..name.len()].copy_from_slice(name);
        padded
    }
}

/// The `version` message, first message sent on a new connection.
///
/// ```text
/// int32    version
/// uint64   services
/// int64    timestamp
/// net_addr addr_recv
/// net_addr addr_from
/// uint64   nonce
/// var_str  user_agent
/// int32    start_height
/// bool     relay          (protocol >= 70001, may be absent)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub version: i32,
    pub services: Services,
    pub timestamp: i64,
    pub addr_recv: NetworkAddress,
    pub addr_from: NetworkAddress,
    pub nonce: u64,
    pub user_agent: String,
    pub start_height: i32,
    pub relay: Option<bool>,
}

/// `getblocks`: ask for an `inv` of the blocks following the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetBlocks {
    pub version: i32,
    pub locator: BlockLocator,
}

impl GetBlocks {
    pub fn new(version: i32, locator: BlockLocator) -> Self {
        Self { version, locator }
    }

    pub fn hashes(&self) -> &[Hash256] {
        &self.locator.hashes
    }

    pub fn hash_stop(&self) -> Hash256 {
        self.locator.hash_stop
    }
}

/// `getheaders`: ask for up to 2000 headers following the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetHeaders {
    pub version: i32,
    pub locator: BlockLocator,
}

impl GetHeaders {
    pub fn new(version: i32, locator: BlockLocator) -> Self {
        Self { version, locator }
    }

    pub fn hashes(&self) -> &[Hash256] {
        &self.locator.hashes
    }

    pub fn hash_stop(&self) -> Hash256 {
        self.locator.hash_stop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ping {
    pub nonce: u64,
}

/// Reply to a [`Ping`]; carries the same nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pong {
    pub nonce: u64,
}

/// `ccode` of a `reject` message (BIP61).
///
/// Unknown codes are preserved, like [`Services`] bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RejectCode(pub u8);

impl RejectCode {
    pub const MALFORMED: RejectCode = RejectCode(0x01);
    pub const INVALID: RejectCode = RejectCode(0x10);
    pub const OBSOLETE: RejectCode = RejectCode(0x11);
    pub const DUPLICATE: RejectCode = RejectCode(0x12);
    pub const NONSTANDARD: RejectCode = RejectCode(0x40);
    pub const DUST: RejectCode = RejectCode(0x41);
    pub const INSUFFICIENT_FEE: RejectCode = RejectCode(0x42);
    pub const CHECKPOINT: RejectCode = RejectCode(0x43);
}

/// `reject` (BIP61, removed from Bitcoin Core 0.20 but still seen on the wire).
///
/// `data` holds whatever follows the reason string; for rejected blocks and
/// transactions that is the 32-byte hash of the offending object. It is empty,
/// never absent, when the peer sent nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reject {
    pub message: String,
    pub code: RejectCode,
    pub reason: String,
    pub data: Vec<u8>,
}

/// `filteradd`: one data element to add to the loaded bloom filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterAdd {
    pub data: Vec<u8>,
}

/// `feefilter` (BIP133): minimum fee rate in satoshis per kilo-vbyte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeeFilter {
    pub fee_rate: u64,
}

/// `merkleblock` (BIP37): a block header plus the partial merkle tree
/// proving which transactions matched the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleBlock {
    pub header: BlockHeader,
    pub total_transactions: u32,
    pub hashes: Vec<Hash256>,
    pub flags: Vec<u8>,
}

/// The legacy signed `alert` message.
///
/// The signature covers the serialized [`AlertDetail`] exactly as the sender
/// produced it. A decoded alert keeps those bytes and re-emits them verbatim;
/// re-serializing the parsed detail could differ (non-canonical compact sizes,
/// trailing fields from newer versions) and would break verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    detail: AlertDetail,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl Alert {
    /// Builds an alert from a detail and a signature over its serialization.
    pub fn new(detail: AlertDetail, signature: Vec<u8>) -> Self {
        let payload = detail.encode();
        Self {
            detail,
            payload,
            signature,
        }
    }

    pub(crate) fn from_signed_parts(
        detail: AlertDetail,
        payload: Vec<u8>,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            detail,
            payload,
            signature,
        }
    }

    pub fn detail(&self) -> &AlertDetail {
        &self.detail
    }

    /// The exact bytes the signature was made over.
    pub fn signed_payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// `SHA256(SHA256(signed_payload))`, the digest the alert key signed.
    pub fn signature_hash(&self) -> Hash256 {
        Hash256::double_sha256(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn command_names_are_unique_and_fit_the_header() {
        let names: HashSet<_> = Command::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Command::ALL.len());
        assert!(Command::ALL.iter().all(|c| c.name().len() <= 12));
    }

    #[test]
    fn from_name_resolves_every_command() {
        for cmd in Command::ALL {
            assert_eq!(Command::from_name(cmd.name()), Some(cmd));
        }
        assert_eq!(Command::from_name("wtxidrelay"), None);
        assert_eq!(Command::from_name(""), None);
    }

    #[test]
    fn as_bytes_pads_with_zeros() {
        assert_eq!(&Command::Verack.as_bytes(), b"verack\0\0\0\0\0\0");
        assert_eq!(&Command::SendHeaders.as_bytes(), b"sendheaders\0");
    }

    #[test]
    fn empty_payload_commands_decode_from_empty_slice() {
        let options = DecodeOptions::default();
        for (cmd, expected) in [
            (Command::Verack, Message::Verack),
            (Command::GetAddr, Message::GetAddr),
            (Command::Mempool, Message::Mempool),
            (Command::FilterClear, Message::FilterClear),
            (Command::SendHeaders, Message::SendHeaders),
            (Command::SendAddrV2, Message::SendAddrV2),
        ] {
            let msg = Message::decode_payload(cmd, &[], &options).unwrap();
            assert_eq!(msg, expected);
            assert_eq!(msg.command(), cmd);
            assert!(msg.encode_payload().is_empty());
            assert!(Message::decode_payload(cmd, &[0], &options).is_err());
        }
    }

    #[test]
    fn ping_payload_is_the_nonce_only() {
        let msg = Message::Ping(Ping {
            nonce: 0x1122334455667788,
        });
        assert_eq!(
            msg.encode_payload(),
            vec![0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]
        );
    }

    #[test]
    fn alert_re_emits_the_signed_bytes() {
        let detail = AlertDetail {
            version: 1,
            comment: "upgrade".into(),
            ..AlertDetail::default()
        };
        let alert = Alert::new(detail.clone(), vec![0x30, 0x44]);
        assert_eq!(alert.signed_payload(), detail.encode().as_slice());
        assert_eq!(
            alert.signature_hash(),
            Hash256::double_sha256(&detail.encode())
        );
    }

    #[test]
    fn body_types_convert_into_message() {
        let msg: Message = Pong { nonce: 7 }.into();
        assert_eq!(msg.command(), Command::Pong);
        let msg: Message = FeeFilter { fee_rate: 1000 }.into();
        assert_eq!(msg.command(), Command::FeeFilter);
    }
}
