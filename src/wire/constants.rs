use std::fmt;
use std::str::FromStr;

use crate::wire::error::WireError;

/// Network magic value used in the Bitcoin P2P message header.
///
/// The first 4 bytes of every Bitcoin P2P message identify the
/// network (mainnet, testnet, regtest, signet) and act as a
/// message boundary marker in the TCP stream.
///
/// For mainnet, the magic value is `0xD9B4BEF9` (F9 BE B4 D9 in bytes).
///
/// You can also see how Bitcoin Core maps magic values to networks
/// in `GetNetworkForMagic`:
/// https://github.com/bitcoin/bitcoin/blob/master/src/kernel/chainparams.cpp#L703-L723
pub const MAIN_NET_MAGIC: u32 = 0xD9B4BEF9;
pub const TEST_NET3_MAGIC: u32 = 0x0709110B;
pub const REG_TEST_MAGIC: u32 = 0xDAB5BFFA;
pub const SIG_NET_MAGIC: u32 = 0x40CF030A;

/// Current Bitcoin P2P protocol version.
///
/// This value is sent in the `version` message during handshake
/// and is used for peer capability negotiation and feature gating.
///
/// The protocol version is defined in Bitcoin Core:
/// https://github.com/bitcoin/bitcoin/blob/707ad466968b947b364cfc25bcb4d6895e799418/src/node/protocol_version.h#L12
///
/// It is serialized on the wire as a signed 32-bit little-endian integer.
///
/// You can find a list of notable versions here: https://developer.bitcoin.org/reference/p2p_networking.html#protocol-versions
pub const PROTOCOL_VERSION: i32 = 70016;

/// First protocol version carrying the trailing `relay` flag in `version` (BIP37).
pub const RELAY_FIELD_MIN_VERSION: i32 = 70001;

/// Size of the message header: magic (4) + command (12) + length (4) + checksum (4).
pub const HEADER_SIZE: usize = 24;

/// Size of the zero-padded command field.
pub const COMMAND_SIZE: usize = 12;

/// Default cap on the declared payload length, Bitcoin Core's `MAX_SIZE`
/// (0x02000000). Larger frames are rejected before the payload is buffered.
pub const MAX_PAYLOAD_SIZE: u32 = 32 * 1024 * 1024;

/// `addr` / `addrv2` may carry at most 1000 entries.
pub const MAX_ADDR_ENTRIES: usize = 1000;

/// `inv`, `getdata` and `notfound` may carry at most 50000 entries (`MAX_INV_SZ`).
pub const MAX_INV_ENTRIES: usize = 50_000;

/// `headers` carries at most 2000 headers per message.
pub const MAX_HEADERS_ENTRIES: usize = 2000;

/// Bitcoin Core disconnects peers sending longer locators (`MAX_LOCATOR_SZ`).
pub const MAX_LOCATOR_HASHES: usize = 101;

/// `MAX_SUBVERSION_LENGTH`.
pub const MAX_USER_AGENT_LEN: usize = 256;

/// `reject` limits: the rejected command name fits the header field and the
/// reason string is capped at `MAX_REJECT_MESSAGE_LENGTH`.
pub const MAX_REJECT_MESSAGE_LEN: usize = COMMAND_SIZE;
pub const MAX_REJECT_REASON_LEN: usize = 111;

/// BIP37 limits for `filterload`.
pub const MAX_BLOOM_FILTER_SIZE: usize = 36_000;
pub const MAX_BLOOM_HASH_FUNCS: u32 = 50;

/// BIP37 limit for `filteradd` (`MAX_SCRIPT_ELEMENT_SIZE`).
pub const MAX_FILTER_ADD_SIZE: usize = 520;

/// BIP155 limit on the address field of an `addrv2` entry.
pub const MAX_ADDRV2_ADDR_SIZE: usize = 512;

/// Mainnet block 0 hash in wire order. Displays as
/// `000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f`.
#[cfg(test)]
pub(crate) const GENESIS_BLOCK_HASH_MAINNET: [u8; 32] = [
    0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72, 0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63, 0xf7, 0x4f,
    0x93, 0x1e, 0x83, 0x65, 0xe1, 0x5a, 0x08, 0x9c, 0x68, 0xd6, 0x19, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// A logical Bitcoin network.
///
/// Selects the magic bytes written into (and expected from) every message
/// header, plus the defaults a node advertises on that network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet3,
    Regtest,
    Signet,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Mainnet,
        Network::Testnet3,
        Network::Regtest,
        Network::Signet,
    ];

    /// The magic value as a `u32`, serialized little-endian on the wire.
    pub const fn magic(self) -> u32 {
        match self {
            Network::Mainnet => MAIN_NET_MAGIC,
            Network::Testnet3 => TEST_NET3_MAGIC,
            Network::Regtest => REG_TEST_MAGIC,
            Network::Signet => SIG_NET_MAGIC,
        }
    }

    /// The 4 magic bytes exactly as they appear at the start of a frame.
    pub const fn magic_bytes(self) -> [u8; 4] {
        self.magic().to_le_bytes()
    }

    pub fn from_magic(bytes: [u8; 4]) -> Option<Network> {
        Network::ALL
            .into_iter()
            .find(|network| network.magic_bytes() == bytes)
    }

    pub const fn default_port(self) -> u16 {
        match self {
            Network::Mainnet => 8333,
            Network::Testnet3 => 18333,
            Network::Regtest => 18444,
            Network::Signet => 38333,
        }
    }

    pub const fn protocol_version(self) -> i32 {
        PROTOCOL_VERSION
    }

    pub const fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet3 => "testnet3",
            Network::Regtest => "regtest",
            Network::Signet => "signet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Network::Mainnet),
            "testnet3" | "testnet" | "test" => Ok(Network::Testnet3),
            "regtest" => Ok(Network::Regtest),
            "signet" => Ok(Network::Signet),
            other => Err(WireError::malformed(format!("unknown network {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_magic_bytes_match_wire_order() {
        assert_eq!(Network::Mainnet.magic_bytes(), [0xF9, 0xBE, 0xB4, 0xD9]);
        assert_eq!(Network::Testnet3.magic_bytes(), [0x0B, 0x11, 0x09, 0x07]);
        assert_eq!(Network::Regtest.magic_bytes(), [0xFA, 0xBF, 0xB5, 0xDA]);
        assert_eq!(Network::Signet.magic_bytes(), [0x0A, 0x03, 0xCF, 0x40]);
    }

    #[test]
    fn from_magic_resolves_every_network() {
        for network in Network::ALL {
            assert_eq!(Network::from_magic(network.magic_bytes()), Some(network));
        }
        assert_eq!(Network::from_magic([0, 0, 0, 0]), None);
    }

    #[test]
    fn parses_network_names() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("Testnet".parse::<Network>().unwrap(), Network::Testnet3);
        assert_eq!("signet".parse::<Network>().unwrap(), Network::Signet);
        assert!("litecoin".parse::<Network>().is_err());
    }
}
