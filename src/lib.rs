//! Bitcoin P2P wire protocol message layer.
//!
//! - [`wire`] holds the byte-level codecs: primitives, shared structures,
//!   per-command message bodies and the 24-byte envelope.
//! - [`factory`] builds well-formed messages and fills in nonces.
//! - [`random`] is the randomness source the factory draws nonces from.
//!
//! Transport is left to the caller: everything here works on byte slices or
//! on any [`std::io::Read`] / [`std::io::Write`].
//!
//! ```
//! use std::sync::Arc;
//! use btc_wire::random::OsRandom;
//! use btc_wire::wire::{self, Message, Network};
//! use btc_wire::MessageFactory;
//!
//! let factory = MessageFactory::new(Network::Mainnet, Arc::new(OsRandom));
//! let ping = factory.ping().unwrap();
//!
//! let bytes = wire::wrap(Network::Mainnet, &Message::Ping(ping));
//! let Message::Ping(decoded) = factory.parse(&bytes).unwrap() else {
//!     panic!("expected ping");
//! };
//! assert_eq!(decoded, ping);
//! ```
pub mod factory;
pub mod random;
pub mod wire;

pub use factory::MessageFactory;
pub use random::RandomSource;
pub use wire::{Message, Network, WireError};
