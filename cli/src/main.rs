//! chainstake CLI: query HEX stakes and contract state from the terminal.
//!
//! Usage:
//! ```bash
//! # All stakes of an address on PulseChain
//! chainstake stakes --address 0x... --chain pulsechain
//!
//! # Daily payout data for days 10..20
//! chainstake daily-data --begin 10 --end 20
//!
//! # Configured chains and endpoints
//! chainstake chains --config chainstake.yaml
//! ```

use std::env;
use std::process;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{anyhow, bail, Context};

use chainstake_core::{Chain, StakeEvent};
use chainstake_session::{init_tracing, QueryDispatcher, SessionManager, StakeConfig};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "stakes" | "balance" | "global-info" | "current-day" | "daily-data" => {
            cmd_query(&args[1], &args[2..]).await
        }
        "chains" => cmd_chains(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("chainstake {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainstake {}", env!("CARGO_PKG_VERSION"));
    println!("Query HEX stakes and contract state on Ethereum and PulseChain\n");
    println!("USAGE:");
    println!("    chainstake <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    stakes       List every stake of an address");
    println!("    balance      HEX balance of an address");
    println!("    global-info  Contract-wide totals");
    println!("    current-day  Current HEX day");
    println!("    daily-data   Daily payout data for a day range");
    println!("    chains       List configured chains and endpoints");
    println!("    version      Print version");
    println!("    help         Print this help\n");
    println!("FLAGS:");
    println!("    --address <ADDR>    Owner address  [stakes, balance]");
    println!("    --chain <CHAIN>     ethereum | pulsechain  [default: ethereum]");
    println!("    --begin <DAY>       First day, inclusive  [daily-data]");
    println!("    --end <DAY>         Last day, exclusive  [daily-data]");
    println!("    --config <PATH>     YAML configuration file");
    println!("    --timeout-ms <MS>   Wait limit for the result  [default: {DEFAULT_TIMEOUT_MS}]");
}

fn load_config(args: &[String]) -> anyhow::Result<StakeConfig> {
    match parse_flag(args, "--config") {
        Some(path) => Ok(StakeConfig::load(&path)?),
        None => Ok(StakeConfig::default()),
    }
}

async fn cmd_query(command: &str, args: &[String]) -> anyhow::Result<()> {
    let config = load_config(args)?;
    init_tracing(&config.log);

    let chain = match parse_flag(args, "--chain") {
        Some(name) => Chain::from_str(&name)?,
        None => Chain::Ethereum,
    };
    let timeout_ms = match parse_flag(args, "--timeout-ms") {
        Some(ms) => ms.parse().context("--timeout-ms must be a number")?,
        None => DEFAULT_TIMEOUT_MS,
    };

    let manager = SessionManager::from_config(&config)?;
    let (session, mut events) = manager.open()?;
    tracing::debug!(session = %session.id(), command, %chain, "dispatching query");

    dispatch(session.dispatcher(), command, chain, args)?;

    let event = tokio::time::timeout(Duration::from_millis(timeout_ms), events.recv()).await;
    session.close();

    match event {
        Ok(Some(event)) => {
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        Ok(None) => bail!("session closed before a result arrived"),
        Err(_) => bail!("no result within {timeout_ms}ms (see logs for failed calls)"),
    }
}

fn dispatch(
    dispatcher: &QueryDispatcher,
    command: &str,
    chain: Chain,
    args: &[String],
) -> anyhow::Result<()> {
    match command {
        "stakes" => dispatcher.fetch_stakes(required_address(args)?, chain)?,
        "balance" => dispatcher.fetch_balance(required_address(args)?, chain)?,
        "global-info" => dispatcher.fetch_global_info(chain)?,
        "current-day" => dispatcher.fetch_current_day(chain)?,
        "daily-data" => {
            let begin = required_day(args, "--begin")?;
            let end = required_day(args, "--end")?;
            dispatcher.fetch_daily_data_range(chain, begin, end)?
        }
        other => bail!("unsupported query {other}"),
    }
    Ok(())
}

fn cmd_chains(args: &[String]) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let registry = config.registry()?;

    println!("Configured chains:\n");
    for (chain, endpoint) in registry.iter() {
        println!("  {:<11} id {}", chain.name(), chain.chain_id());
        println!("              RPC:      {}", endpoint.rpc_url);
        println!("              Contract: {}", endpoint.contract);
    }
    Ok(())
}

fn required_address(args: &[String]) -> anyhow::Result<Address> {
    let raw = parse_flag(args, "--address").ok_or_else(|| anyhow!("--address is required"))?;
    Address::from_str(&raw).with_context(|| format!("invalid address {raw}"))
}

fn required_day(args: &[String], flag: &str) -> anyhow::Result<u64> {
    let raw = parse_flag(args, flag).ok_or_else(|| anyhow!("{flag} is required"))?;
    raw.parse().with_context(|| format!("{flag} must be a day number"))
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
