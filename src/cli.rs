//! Command-line surface.
//!
//! Secrets come from environment variables when set, otherwise from a
//! prompt on stdin. They are never accepted as flags so they stay out of
//! shell history.

use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroizing;

use poolstake::api::{BackendClient, StakeApi};
use poolstake::blockchain::types::address_hex;
use poolstake::blockchain::{BlockchainClient, ChainTransferSigner};
use poolstake::config::PoolstakeConfig;
use poolstake::lifecycle::{signals, Shutdown};
use poolstake::reconcile::{LedgerStatus, ReconcileOutcome, StatusReconciler};
use poolstake::session::{AdoptError, AuthSession, StakingSession};
use poolstake::staking::{self, format_token_amount, parse_token_amount, Coordinator, CoordinatorConfig};
use poolstake::wallet::keyfile::{DEFAULT_SECPARAM, MAX_SECPARAM};
use poolstake::wallet::{self, classify_wallet, import, resolve_active_wallet, ImportCredential, Keyfile, SigningIdentity, WalletMatch};

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

const KEYFILE_PASSPHRASE_ENV: &str = "POOLSTAKE_PASSPHRASE";
const PRIVATE_KEY_ENV: &str = "POOLSTAKE_PRIVATE_KEY";
const SESSION_PASSPHRASE_ENV: &str = "POOLSTAKE_SESSION_PASSPHRASE";

/// How many times a wrong confirmation passphrase may be re-entered.
const CONFIRM_ATTEMPTS: usize = 3;

#[derive(Parser)]
#[command(name = "poolstake")]
#[command(about = "Stake to the pool from your own wallet", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import a credential and show the wallet it controls
    Address(CredentialArgs),
    /// Show a wallet's balance as the backend sees it
    Balance {
        /// Wallet address; defaults to the active wallet
        #[arg(long)]
        address: Option<String>,
    },
    /// Seal a raw private key into a keyfile
    ExportKeyfile {
        /// Where to write the keyfile
        #[arg(long)]
        out: PathBuf,
        /// Passphrase hint stored in the file
        #[arg(long, default_value = "")]
        hint: String,
        /// Key derivation time cost
        #[arg(long, default_value_t = DEFAULT_SECPARAM, value_parser = clap::value_parser!(u32).range(1..=MAX_SECPARAM as i64))]
        secparam: u32,
    },
    /// Send a stake transfer to the pool and register it
    Stake {
        /// Amount in tokens, e.g. 5 or 5.25
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        memo: String,
        #[command(flatten)]
        credential: CredentialArgs,
        /// Skip the interactive send confirmation
        #[arg(long)]
        yes: bool,
        /// Make this wallet active if another registered wallet is active
        #[arg(long)]
        switch_wallet: bool,
        /// Exit after registration instead of polling for verification
        #[arg(long)]
        no_wait: bool,
    },
    /// Register a transaction hash sent outside this tool
    Register {
        #[arg(long)]
        tx_hash: String,
    },
    /// List stake transactions recorded for the account
    Transactions,
    /// Show a transaction's ledger status
    Status {
        #[arg(long)]
        tx_hash: String,
        /// Keep polling until the status is final
        #[arg(long)]
        wait: bool,
    },
}

#[derive(Args)]
pub struct CredentialArgs {
    /// Keyfile to unlock (passphrase from POOLSTAKE_PASSPHRASE or prompt)
    #[arg(long, conflicts_with = "raw_key")]
    pub keyfile: Option<PathBuf>,

    /// Use a raw private key (from POOLSTAKE_PRIVATE_KEY or prompt)
    #[arg(long)]
    pub raw_key: bool,
}

pub async fn run(command: Command, config: PoolstakeConfig) -> CliResult {
    match command {
        Command::Address(credential) => address(&config, &credential).await,
        Command::Balance { address } => balance(&config, address).await,
        Command::ExportKeyfile { out, hint, secparam } => export_keyfile(&out, &hint, secparam),
        Command::Stake {
            amount,
            memo,
            credential,
            yes,
            switch_wallet,
            no_wait,
        } => {
            let options = StakeOptions {
                yes,
                switch_wallet,
                no_wait,
            };
            stake(&config, &amount, memo, &credential, options).await
        }
        Command::Register { tx_hash } => register(&config, &tx_hash).await,
        Command::Transactions => transactions(&config).await,
        Command::Status { tx_hash, wait } => status(&config, &tx_hash, wait).await,
    }
}

struct StakeOptions {
    yes: bool,
    switch_wallet: bool,
    no_wait: bool,
}

async fn address(config: &PoolstakeConfig, credential: &CredentialArgs) -> CliResult {
    let identity = import_identity(credential)?;
    let address = address_hex(&identity.address());
    println!("{}", address);

    let auth = AuthSession::from_env(&config.api.token_env);
    if !auth.is_authenticated() {
        return Ok(());
    }
    let api = BackendClient::new(&config.api, auth)?;
    let registry = api.list_wallets().await?;
    let active = resolve_active_wallet(config.account.active_wallet.as_deref(), &registry);
    match classify_wallet(&identity.address(), &registry, active.as_deref()) {
        WalletMatch::ActiveWallet => println!("active wallet for this account"),
        WalletMatch::OtherRegistered { .. } => println!("registered to this account, not active"),
        WalletMatch::NotRegistered => println!("not registered to this account"),
    }
    Ok(())
}

async fn balance(config: &PoolstakeConfig, address: Option<String>) -> CliResult {
    let api = backend(config)?;
    let address = match address {
        Some(address) => address,
        None => {
            let registry = api.list_wallets().await?;
            resolve_active_wallet(config.account.active_wallet.as_deref(), &registry)
                .ok_or("no active wallet; pass --address")?
        }
    };
    let balance = api.wallet_balance(&address).await?;
    println!("{} {}", address, format_token_amount(balance));
    Ok(())
}

fn export_keyfile(out: &std::path::Path, hint: &str, secparam: u32) -> CliResult {
    if out.exists() {
        return Err(format!("{} already exists", out.display()).into());
    }
    let private_key_hex = secret(PRIVATE_KEY_ENV, "Private key (hex)")?;
    let passphrase = new_passphrase(KEYFILE_PASSPHRASE_ENV, "Keyfile passphrase")?;

    let (address, keyfile) = wallet::export_keyfile(&private_key_hex, &passphrase, hint, secparam)?;
    keyfile.save(out)?;
    println!("{} {}", address_hex(&address), out.display());
    Ok(())
}

async fn stake(
    config: &PoolstakeConfig,
    amount: &str,
    memo: String,
    credential: &CredentialArgs,
    options: StakeOptions,
) -> CliResult {
    let amount_micro = parse_token_amount(amount)?;
    let coordinator_config = CoordinatorConfig::from_config(config).ok_or("account.customer_id is not configured")?;
    let auth = authenticated(config)?;
    let api = BackendClient::new(&config.api, auth.clone())?;

    let identity = import_identity(credential)?;
    let registry = api.list_wallets().await?;
    let active = resolve_active_wallet(config.account.active_wallet.as_deref(), &registry);
    let classification = classify_wallet(&identity.address(), &registry, active.as_deref());

    let session = StakingSession::new(active);
    let switch_confirmed = classification.needs_confirmation()
        && (options.switch_wallet
            || ask_yes_no(&format!(
                "{} is registered but not your active wallet. Make it active?",
                address_hex(&identity.address())
            ))?);
    let identity = match session.adopt(identity, classification, switch_confirmed) {
        Ok(identity) => identity,
        Err(AdoptError::ConfirmationRequired { wallet }) => {
            return Err(format!("wallet {} not switched; nothing sent", wallet.p_wallet_id).into())
        }
        Err(e) => return Err(e.into()),
    };

    let chain = BlockchainClient::new(config.chain.clone()).await?;
    let customer_id = coordinator_config.customer_id;
    let coordinator = Coordinator::new(api.clone(), ChainTransferSigner::new(chain), coordinator_config);

    let intent = coordinator.intent_for(&identity, amount_micro, memo);
    let pending = coordinator.prepare(identity, intent).await?;

    eprintln!(
        "About to send {} to the pool at {} from {}. This cannot be undone.",
        format_token_amount(pending.intent().amount_micro),
        address_hex(&pending.intent().to),
        address_hex(&pending.intent().from)
    );
    if !options.yes && !ask_yes_no("Send?")? {
        return Err("cancelled; nothing sent".into());
    }

    let mut pending = pending;
    let mut attempts = 0;
    let confirmed = loop {
        let passphrase = if pending.requires_passphrase() {
            Some(secret(SESSION_PASSPHRASE_ENV, "Session passphrase to confirm")?)
        } else {
            None
        };
        match pending.confirm(passphrase.as_ref().map(|p| p.as_str())) {
            Ok(confirmed) => break confirmed,
            Err(rejected) => {
                eprintln!("{}", rejected.error);
                attempts += 1;
                if attempts >= CONFIRM_ATTEMPTS {
                    return Err("confirmation failed; nothing sent".into());
                }
                pending = rejected.pending;
            }
        }
    };

    let settled = match coordinator.submit(confirmed).await {
        Ok(settled) => settled,
        Err(failure) => {
            if failure.error.needs_support() {
                eprintln!("IMPORTANT: {}", failure.error);
            }
            return Err(failure.into());
        }
    };
    println!("{}", settled.tx_hash);

    if options.no_wait {
        return Ok(());
    }
    let reconciler = StatusReconciler::new(api, auth, customer_id, poll_interval(config));
    report(reconciler_run(&reconciler, &settled.tx_hash).await)
}

async fn register(config: &PoolstakeConfig, tx_hash: &str) -> CliResult {
    let customer_id = config.account.customer_id.ok_or("account.customer_id is not configured")?;
    let api = backend(config)?;
    staking::register_manual(&api, customer_id, tx_hash).await?;
    println!("registered {}", tx_hash.trim());
    Ok(())
}

async fn transactions(config: &PoolstakeConfig) -> CliResult {
    let customer_id = config.account.customer_id.ok_or("account.customer_id is not configured")?;
    let api = backend(config)?;
    for row in api.stake_transactions(customer_id).await? {
        let status = LedgerStatus::from_description(&row.verification_desc);
        println!("{}\t{}\t{}", row.network_txn_id, status, row.verification_desc);
    }
    Ok(())
}

async fn status(config: &PoolstakeConfig, tx_hash: &str, wait: bool) -> CliResult {
    let customer_id = config.account.customer_id.ok_or("account.customer_id is not configured")?;
    let auth = authenticated(config)?;
    let api = BackendClient::new(&config.api, auth.clone())?;
    let reconciler = StatusReconciler::new(api, auth, customer_id, poll_interval(config));

    if wait {
        return report(reconciler_run(&reconciler, tx_hash).await);
    }
    match reconciler.poll_once(tx_hash).await? {
        Some(status) => println!("{}", status),
        None => println!("not listed"),
    }
    Ok(())
}

async fn reconciler_run<A: StakeApi>(reconciler: &StatusReconciler<A>, tx_hash: &str) -> ReconcileOutcome {
    let shutdown = Arc::new(Shutdown::new());
    let ctrl_c = tokio::spawn(signals::shutdown_on_ctrl_c(shutdown.clone()));
    eprintln!("Waiting for the pool to verify the transfer (Ctrl-C to stop)...");
    let outcome = reconciler.run(tx_hash, shutdown.subscribe()).await;
    ctrl_c.abort();
    outcome
}

fn report(outcome: ReconcileOutcome) -> CliResult {
    match outcome {
        ReconcileOutcome::Settled(LedgerStatus::Failed) => Err("the pool marked this transaction as failed".into()),
        ReconcileOutcome::Settled(status) => {
            println!("{}", status);
            Ok(())
        }
        ReconcileOutcome::Cancelled => {
            eprintln!("stopped waiting; check later with `poolstake status`");
            Ok(())
        }
        ReconcileOutcome::Deauthenticated => Err("signed out while waiting".into()),
    }
}

fn poll_interval(config: &PoolstakeConfig) -> Duration {
    Duration::from_secs(config.reconcile.poll_interval_secs)
}

fn authenticated(config: &PoolstakeConfig) -> CliResult<AuthSession> {
    let auth = AuthSession::from_env(&config.api.token_env);
    if !auth.is_authenticated() {
        return Err(format!("not signed in: set {}", config.api.token_env).into());
    }
    Ok(auth)
}

fn backend(config: &PoolstakeConfig) -> CliResult<BackendClient> {
    Ok(BackendClient::new(&config.api, authenticated(config)?)?)
}

fn import_identity(credential: &CredentialArgs) -> CliResult<SigningIdentity> {
    let credential = match (&credential.keyfile, credential.raw_key) {
        (Some(path), _) => ImportCredential::Keyfile {
            keyfile: Keyfile::load(path)?,
            passphrase: secret(KEYFILE_PASSPHRASE_ENV, "Keyfile passphrase")?,
        },
        (None, true) => ImportCredential::RawKey {
            private_key_hex: secret(PRIVATE_KEY_ENV, "Private key (hex)")?,
            session_passphrase: new_passphrase(SESSION_PASSPHRASE_ENV, "Choose a session passphrase")?,
        },
        (None, false) => return Err("pass --keyfile <PATH> or --raw-key".into()),
    };
    Ok(import(&credential)?)
}

/// Read a secret from `env_var`, falling back to a prompt.
fn secret(env_var: &str, label: &str) -> io::Result<Zeroizing<String>> {
    if let Ok(value) = std::env::var(env_var) {
        return Ok(Zeroizing::new(value));
    }
    prompt_secret(label)
}

/// Like [`secret`], but a prompted value must be typed twice.
fn new_passphrase(env_var: &str, label: &str) -> CliResult<Zeroizing<String>> {
    if let Ok(value) = std::env::var(env_var) {
        return Ok(Zeroizing::new(value));
    }
    let first = prompt_secret(label)?;
    let second = prompt_secret("Repeat")?;
    if *first != *second {
        return Err("passphrases do not match".into());
    }
    Ok(first)
}

/// Read a secret from the terminal without echoing it.
fn prompt_secret(label: &str) -> io::Result<Zeroizing<String>> {
    rpassword::prompt_password(format!("{}: ", label)).map(Zeroizing::new)
}

fn prompt(label: &str) -> io::Result<Zeroizing<String>> {
    eprint!("{}: ", label);
    io::stderr().flush()?;
    let mut line = Zeroizing::new(String::new());
    io::stdin().lock().read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

fn ask_yes_no(question: &str) -> io::Result<bool> {
    let answer = prompt(&format!("{} [y/N]", question))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_prefers_environment() {
        std::env::set_var("POOLSTAKE_TEST_SECRET", "from-env");
        let value = secret("POOLSTAKE_TEST_SECRET", "unused").unwrap();
        assert_eq!(value.as_str(), "from-env");
        std::env::remove_var("POOLSTAKE_TEST_SECRET");
    }

    #[test]
    fn secrets_are_not_accepted_as_flags() {
        assert!(Cli::try_parse_from(["poolstake", "address", "--raw-key"]).is_ok());
        assert!(Cli::try_parse_from(["poolstake", "address", "--raw-key", "--private-key", "ab"]).is_err());
        assert!(Cli::try_parse_from(["poolstake", "stake", "--amount", "5", "--passphrase", "pw"]).is_err());
    }

    #[test]
    fn export_secparam_is_bounded() {
        assert!(Cli::try_parse_from(["poolstake", "export-keyfile", "--out", "k.json", "--secparam", "64"]).is_ok());
        assert!(Cli::try_parse_from(["poolstake", "export-keyfile", "--out", "k.json", "--secparam", "65"]).is_err());
        assert!(Cli::try_parse_from(["poolstake", "export-keyfile", "--out", "k.json", "--secparam", "0"]).is_err());
    }
}
