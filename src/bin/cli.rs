use clap::{Parser, Subcommand};
use std::error::Error;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btc_wire::MessageFactory;
use btc_wire::random::OsRandom;
use btc_wire::wire::constants::MAX_PAYLOAD_SIZE;
use btc_wire::wire::{
    DecodeOptions, Hash256, InventoryVector, Message, Network, NetworkAddress, PROTOCOL_VERSION,
    RejectCode, Services, WireError,
};

#[derive(Parser)]
#[command(name = "btc-wire", about = "Encode and decode Bitcoin P2P messages")]
struct Cli {
    /// mainnet, testnet3, regtest or signet
    #[arg(long, global = true, default_value = "mainnet")]
    network: Network,

    /// Reject non-canonical encodings
    #[arg(long, global = true)]
    strict: bool,

    #[arg(long, global = true, default_value_t = MAX_PAYLOAD_SIZE)]
    max_payload: u32,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one hex-encoded frame
    Decode { hex: String },
    /// Build a message and print the framed hex
    Encode {
        #[command(subcommand)]
        kind: EncodeKind,
    },
}

#[derive(Subcommand)]
enum EncodeKind {
    Version {
        #[arg(long, default_value_t = PROTOCOL_VERSION)]
        version: i32,
        #[arg(long, default_value = "/btc-wire:0.1.0/")]
        user_agent: String,
        #[arg(long, default_value_t = 0)]
        start_height: i32,
        #[arg(long)]
        no_relay: bool,
    },
    Verack,
    Ping,
    Pong {
        nonce: u64,
    },
    GetAddr,
    Mempool,
    SendHeaders,
    /// Locator hashes followed by the stop hash, in display hex
    GetHeaders {
        #[arg(required = true)]
        hashes: Vec<Hash256>,
    },
    GetBlocks {
        #[arg(required = true)]
        hashes: Vec<Hash256>,
    },
    GetData {
        #[arg(long)]
        block: Vec<Hash256>,
        #[arg(long)]
        tx: Vec<Hash256>,
    },
    FeeFilter {
        fee_rate: u64,
    },
    Reject {
        message: String,
        code: u8,
        reason: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("btc_wire={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = DecodeOptions {
        strict: cli.strict,
        max_payload_size: cli.max_payload,
    };
    let factory = MessageFactory::with_options(cli.network, Arc::new(OsRandom), options);

    match cli.command {
        Commands::Decode { hex } => decode(&factory, &hex),
        Commands::Encode { kind } => {
            let message = build(&factory, kind)?;
            println!("{}", hex::encode(factory.serialize(&message)));
            Ok(())
        }
    }
}

fn decode(factory: &MessageFactory, input: &str) -> Result<(), Box<dyn Error>> {
    let bytes = hex::decode(input.trim())?;

    match factory.parse(&bytes) {
        Ok(message) => {
            println!("{} on {}", message.command().name(), factory.network());
            println!("{message:#?}");
            Ok(())
        }
        Err(WireError::UnknownCommand { command, length }) => {
            println!("unknown command {command:?}, skip {length} payload byte(s)");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn build(factory: &MessageFactory, kind: EncodeKind) -> Result<Message, Box<dyn Error>> {
    let message = match kind {
        EncodeKind::Version {
            version,
            user_agent,
            start_height,
            no_relay,
        } => {
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
            factory
                .version(
                    version,
                    Services::NONE,
                    now as i64,
                    NetworkAddress::unroutable(),
                    NetworkAddress::unroutable(),
                    user_agent,
                    start_height,
                    !no_relay,
                )?
                .into()
        }
        EncodeKind::Verack => factory.verack(),
        EncodeKind::Ping => factory.ping()?.into(),
        EncodeKind::Pong { nonce } => factory.pong(&btc_wire::wire::Ping { nonce }).into(),
        EncodeKind::GetAddr => factory.getaddr(),
        EncodeKind::Mempool => factory.mempool(),
        EncodeKind::SendHeaders => factory.sendheaders(),
        EncodeKind::GetHeaders { hashes } => {
            factory.getheaders(factory.network().protocol_version(), hashes)?.into()
        }
        EncodeKind::GetBlocks { hashes } => {
            factory.getblocks(factory.network().protocol_version(), hashes)?.into()
        }
        EncodeKind::GetData { block, tx } => {
            let items = block
                .into_iter()
                .map(InventoryVector::block)
                .chain(tx.into_iter().map(InventoryVector::tx))
                .collect();
            factory.getdata(items)?
        }
        EncodeKind::FeeFilter { fee_rate } => factory.feefilter(fee_rate).into(),
        EncodeKind::Reject {
            message,
            code,
            reason,
        } => factory
            .reject(message, RejectCode(code), reason, None)?
            .into(),
    };
    Ok(message)
}
