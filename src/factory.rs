//! Construction of well-formed messages.
//!
//! [`MessageFactory`] is bound to one [`Network`] and one [`RandomSource`].
//! It validates protocol limits up front, so anything it returns encodes to a
//! payload a conforming peer (and this crate's own decoder) accepts.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::random::RandomSource;
use crate::wire::constants::{
    MAX_ADDR_ENTRIES, MAX_BLOOM_FILTER_SIZE, MAX_BLOOM_HASH_FUNCS, MAX_FILTER_ADD_SIZE,
    MAX_HEADERS_ENTRIES, MAX_INV_ENTRIES, MAX_LOCATOR_HASHES, MAX_REJECT_MESSAGE_LEN,
    MAX_REJECT_REASON_LEN, MAX_USER_AGENT_LEN, RELAY_FIELD_MIN_VERSION,
};
use crate::wire::{
    AddrEntry, AddrV2Entry, Alert, AlertDetail, Block, BlockHeader, BlockLocator, BloomFilter,
    DecodeOptions, FeeFilter, FilterAdd, GetBlocks, GetHeaders, Hash256, InventoryVector,
    MerkleBlock, Message, Network, NetworkAddress, Ping, Pong, Reject, RejectCode, Result,
    Services, Transaction, Version, WireError, unwrap_with, wrap,
};

/// How often a nonce equal to the previous one is redrawn before the source
/// is considered broken.
const MAX_NONCE_DRAWS: usize = 8;

pub struct MessageFactory {
    network: Network,
    random: Arc<dyn RandomSource>,
    options: DecodeOptions,
    /// `None` until the first nonce is issued.
    last_nonce: Mutex<Option<u64>>,
}

impl MessageFactory {
    pub fn new(network: Network, random: Arc<dyn RandomSource>) -> Self {
        Self::with_options(network, random, DecodeOptions::default())
    }

    pub fn with_options(
        network: Network,
        random: Arc<dyn RandomSource>,
        options: DecodeOptions,
    ) -> Self {
        Self {
            network,
            random,
            options,
            last_nonce: Mutex::new(None),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    fn draw_nonce(&self) -> Result<u64> {
        let mut last = self.last_nonce.lock();
        for _ in 0..MAX_NONCE_DRAWS {
            let nonce = self.random.next_u64()?;
            if *last != Some(nonce) {
                *last = Some(nonce);
                trace!(nonce, "drew nonce");
                return Ok(nonce);
            }
        }
        Err(WireError::RandomSourceFailure(format!(
            "source repeated the previous nonce {MAX_NONCE_DRAWS} times"
        )))
    }

    /// Builds a `version` message with a fresh nonce.
    ///
    /// `relay` is only carried for protocol versions that define it (70001
    /// and later); older versions end the payload at `start_height`.
    #[allow(clippy::too_many_arguments)]
    pub fn version(
        &self,
        version: i32,
        services: Services,
        timestamp: i64,
        addr_recv: NetworkAddress,
        addr_from: NetworkAddress,
        user_agent: impl Into<String>,
        start_height: i32,
        relay: bool,
    ) -> Result<Version> {
        let user_agent = user_agent.into();
        if user_agent.len() > MAX_USER_AGENT_LEN {
            return Err(WireError::malformed(format!(
                "version: user agent of {} bytes exceeds limit of {MAX_USER_AGENT_LEN}",
                user_agent.len()
            )));
        }

        Ok(Version {
            version,
            services,
            timestamp,
            addr_recv,
            addr_from,
            nonce: self.draw_nonce()?,
            user_agent,
            start_height,
            relay: (version >= RELAY_FIELD_MIN_VERSION).then_some(relay),
        })
    }

    pub fn verack(&self) -> Message {
        Message::Verack
    }

    pub fn sendheaders(&self) -> Message {
        Message::SendHeaders
    }

    pub fn sendaddrv2(&self) -> Message {
        Message::SendAddrV2
    }

    pub fn getaddr(&self) -> Message {
        Message::GetAddr
    }

    pub fn mempool(&self) -> Message {
        Message::Mempool
    }

    pub fn filterclear(&self) -> Message {
        Message::FilterClear
    }

    pub fn addr(&self, entries: Vec<AddrEntry>) -> Result<Message> {
        check_len("addr", entries.len(), MAX_ADDR_ENTRIES)?;
        Ok(Message::Addr(entries))
    }

    pub fn addrv2(&self, entries: Vec<AddrV2Entry>) -> Result<Message> {
        check_len("addrv2", entries.len(), MAX_ADDR_ENTRIES)?;
        Ok(Message::AddrV2(entries))
    }

    pub fn inv(&self, items: Vec<InventoryVector>) -> Result<Message> {
        check_len("inv", items.len(), MAX_INV_ENTRIES)?;
        Ok(Message::Inv(items))
    }

    pub fn getdata(&self, items: Vec<InventoryVector>) -> Result<Message> {
        check_len("getdata", items.len(), MAX_INV_ENTRIES)?;
        Ok(Message::GetData(items))
    }

    pub fn notfound(&self, items: Vec<InventoryVector>) -> Result<Message> {
        check_len("notfound", items.len(), MAX_INV_ENTRIES)?;
        Ok(Message::NotFound(items))
    }

    /// `hashes` is the locator followed by the stop hash.
    pub fn getblocks(&self, version: i32, hashes: Vec<Hash256>) -> Result<GetBlocks> {
        Ok(GetBlocks::new(version, locator("getblocks", hashes)?))
    }

    /// `hashes` is the locator followed by the stop hash.
    pub fn getheaders(&self, version: i32, hashes: Vec<Hash256>) -> Result<GetHeaders> {
        Ok(GetHeaders::new(version, locator("getheaders", hashes)?))
    }

    pub fn tx(&self, tx: Transaction) -> Message {
        Message::Tx(tx)
    }

    pub fn block(&self, block: Block) -> Message {
        Message::Block(block)
    }

    pub fn headers(&self, headers: Vec<BlockHeader>) -> Result<Message> {
        check_len("headers", headers.len(), MAX_HEADERS_ENTRIES)?;
        Ok(Message::Headers(headers))
    }

    pub fn feefilter(&self, fee_rate: u64) -> FeeFilter {
        FeeFilter { fee_rate }
    }

    pub fn filteradd(&self, data: Vec<u8>) -> Result<FilterAdd> {
        check_len("filteradd", data.len(), MAX_FILTER_ADD_SIZE)?;
        Ok(FilterAdd { data })
    }

    pub fn filterload(&self, filter: BloomFilter) -> Result<BloomFilter> {
        check_len("filterload", filter.data.len(), MAX_BLOOM_FILTER_SIZE)?;
        if filter.hash_funcs > MAX_BLOOM_HASH_FUNCS {
            return Err(WireError::malformed(format!(
                "filterload: {} hash functions exceeds limit of {MAX_BLOOM_HASH_FUNCS}",
                filter.hash_funcs
            )));
        }
        Ok(filter)
    }

    pub fn merkleblock(
        &self,
        header: BlockHeader,
        total_transactions: u32,
        hashes: Vec<Hash256>,
        flags: Vec<u8>,
    ) -> MerkleBlock {
        MerkleBlock {
            header,
            total_transactions,
            hashes,
            flags,
        }
    }

    pub fn ping(&self) -> Result<Ping> {
        Ok(Ping {
            nonce: self.draw_nonce()?,
        })
    }

    pub fn pong(&self, ping: &Ping) -> Pong {
        Pong { nonce: ping.nonce }
    }

    /// Builds a `reject`. Missing extra data becomes an empty byte string.
    pub fn reject(
        &self,
        message: impl Into<String>,
        code: RejectCode,
        reason: impl Into<String>,
        data: Option<Vec<u8>>,
    ) -> Result<Reject> {
        let message = message.into();
        let reason = reason.into();
        check_len("reject: message", message.len(), MAX_REJECT_MESSAGE_LEN)?;
        check_len("reject: reason", reason.len(), MAX_REJECT_REASON_LEN)?;

        Ok(Reject {
            message,
            code,
            reason,
            data: data.unwrap_or_default(),
        })
    }

    pub fn alert(&self, detail: AlertDetail, signature: Vec<u8>) -> Alert {
        Alert::new(detail, signature)
    }

    /// Decodes one framed message for this factory's network.
    pub fn parse(&self, bytes: &[u8]) -> Result<Message> {
        unwrap_with(self.network, bytes, &self.options)
    }

    /// Frames a message for this factory's network.
    pub fn serialize(&self, message: &Message) -> Vec<u8> {
        wrap(self.network, message)
    }
}

fn check_len(context: &str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(WireError::malformed(format!(
            "{context}: {len} exceeds limit of {max}"
        )));
    }
    Ok(())
}

fn locator(context: &str, hashes: Vec<Hash256>) -> Result<BlockLocator> {
    let locator = BlockLocator::from_combined(hashes)?;
    check_len(context, locator.hashes.len(), MAX_LOCATOR_HASHES)?;
    Ok(locator)
}
