use anyhow::{anyhow, bail, Context, Result};
use dotenv::dotenv;
use ethers::abi::Abi;
use ethers::middleware::SignerMiddleware;
use ethers::signers::{LocalWallet, Signer};
use serde_json::{json, Value};
use std::env;
use std::fs;
use std::sync::Arc;

use swivel_orders::backend::provider::{create_provider, EthersBackend};
use swivel_orders::config::Config;
use swivel_orders::eip712::{order_digest, sign_order};
use swivel_orders::models::exception::ProtocolError;
use swivel_orders::models::order::Order;
use swivel_orders::models::types::{CallOverrides, TypedDataDomain};
use swivel_orders::services::exception_service::ExceptionDecoder;
use swivel_orders::services::executor::GasSafetyExecutor;
use swivel_orders::services::order_service::{cancel, canonicalize};

const USAGE: &str = "usage: swivel-orders <sign|cancel> <order.json> | decode <json-or-hex>";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let args: Vec<String> = env::args().skip(1).collect();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["sign", path] => sign(&config, path).await,
        ["cancel", path, rest @ ..] => cancel_order(&config, path, rest.contains(&"--optimize")).await,
        ["decode", failure] => decode(failure),
        _ => bail!(USAGE),
    }
}

fn load_order(path: &str) -> Result<Order> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing order in {}", path))
}

fn wallet() -> Result<LocalWallet> {
    let key = env::var("PRIVATE_KEY").context("PRIVATE_KEY must be set")?;
    Ok(key.parse()?)
}

async fn sign(config: &Config, path: &str) -> Result<()> {
    let order = load_order(path)?;
    let wallet = wallet()?;
    let signature = sign_order(&order, &wallet, config.chain_id, config.verifying_contract).await?;

    // sign_order already checked both are present
    let domain = TypedDataDomain::resolve(config.chain_id, config.verifying_contract)?;
    let digest = order_digest(&canonicalize(&order)?, &domain)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "signer": format!("{:?}", wallet.address()),
            "digest": format!("{:?}", digest),
            "signature": signature,
        }))?
    );
    Ok(())
}

async fn cancel_order(config: &Config, path: &str, optimize: bool) -> Result<()> {
    let order = canonicalize(&load_order(path)?)?;
    let chain_id = config.chain_id.ok_or_else(|| anyhow!("CHAIN_ID must be set"))?;
    let contract = config
        .verifying_contract
        .ok_or_else(|| anyhow!("SWIVEL_ADDRESS must be set"))?;
    let abi_path = env::var("SWIVEL_ABI").context("SWIVEL_ABI must be set")?;
    let abi: Abi = serde_json::from_str(&fs::read_to_string(&abi_path)?)?;

    let client = SignerMiddleware::new(create_provider(config)?, wallet()?.with_chain_id(chain_id));
    let backend = EthersBackend::new(contract, abi, Arc::new(client));
    let executor = GasSafetyExecutor::with_margins(backend, config.gas_margins.clone());

    match executor.execute(&cancel(&[order]), &CallOverrides::default(), optimize).await {
        Ok(handle) => {
            println!("{:?}", handle.hash);
            Ok(())
        }
        Err(failure) => match ExceptionDecoder::default().decode_failure(&failure) {
            Some(exception) => Err(ProtocolError::from(exception).into()),
            None => Err(failure.into()),
        },
    }
}

fn decode(failure: &str) -> Result<()> {
    // anything that is not JSON is taken as raw revert data
    let value = serde_json::from_str(failure).unwrap_or_else(|_| Value::String(failure.to_string()));
    match ExceptionDecoder::default().protocol_error(&value) {
        Some(err) => println!("{}", serde_json::to_string_pretty(&err)?),
        None => println!("no structured exception"),
    }
    Ok(())
}
