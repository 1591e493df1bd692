//! Command-line interface for Cardano seed phrase recovery

use anyhow::Context;
use cardano_seed_recovery::config::RecoveryConfig;
use cardano_seed_recovery::derivation::StakeDeriver;
use cardano_seed_recovery::error::{OracleError, RecoveryError};
use cardano_seed_recovery::generator::{compose_slots, select_length, CandidateGenerator, Slot};
use cardano_seed_recovery::matcher::TargetSet;
use cardano_seed_recovery::oracle::{BlockfrostClient, ChainOracle};
use cardano_seed_recovery::search::SearchDriver;
use cardano_seed_recovery::wordlist::{is_unknown_token, Wordlist};
use clap::{value_parser, Arg, ArgAction, Command};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = parse_args();
    config.validate().context("invalid arguments")?;

    let wordlist = Arc::new(match &config.wordlist_path {
        Some(path) => Wordlist::from_file(path).context("failed to load wordlist")?,
        None => Wordlist::english(),
    });

    let slots = build_slots(&wordlist, &config);
    let length = select_length(slots.len(), &config.missing_positions, config.length)?;
    if config.length.is_none() {
        info!("Length not set. Using smallest length for the given phrase.");
    }
    info!("{} of {} words missing.", length - slots.len(), length);

    let composed = compose_slots(slots, &config.missing_positions, length)?;
    let generator = CandidateGenerator::new(composed, config.reorder);
    info!("Searching {} candidate phrases.", generator.search_space());

    let targets = TargetSet::new(&config.targets);
    let oracle = build_oracle(&config)?;

    let driver = SearchDriver::new(
        Arc::clone(&wordlist),
        generator,
        StakeDeriver::new(config.passphrase.clone()),
        targets,
        oracle,
    )
    .with_threads(config.threads)
    .with_progress_bar(true);

    let cancel = driver.cancel_flag();
    ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))
        .context("failed to install the interrupt handler")?;

    let outcome = driver.run()?;
    if outcome.cancelled {
        info!("Search interrupted.");
    }
    if outcome.matches.is_empty() {
        info!("No matching stake address found.");
    }
    Ok(())
}

/// Expand the input tokens into candidate slots, reporting each expansion
fn build_slots(wordlist: &Wordlist, config: &RecoveryConfig) -> Vec<Slot> {
    config
        .tokens
        .iter()
        .map(|token| {
            if is_unknown_token(token) {
                info!("? => (any word)");
                return Slot::Unknown;
            }
            let expansion = wordlist.expand(token, config.similar);
            if !expansion.was_in_wordlist {
                warn!("'{token}' not in wordlist!");
            }
            if expansion.candidates.is_empty() {
                warn!("No word within edit distance {} of '{token}'; trying any word.", config.similar);
                return Slot::Unknown;
            }
            let words: Vec<&str> = expansion
                .candidates
                .iter()
                .filter_map(|&i| wordlist.word_of(i))
                .collect();
            info!("{token} => {}", words.join(", "));
            Slot::Known(expansion.candidates)
        })
        .collect()
}

/// Set up the chain oracle, probing its health before the search starts
fn build_oracle(config: &RecoveryConfig) -> anyhow::Result<Option<Box<dyn ChainOracle>>> {
    let Some(key) = &config.blockfrost_key else {
        return Ok(None);
    };
    let client = BlockfrostClient::new(key.clone()).context("failed to set up the chain oracle")?;
    match client.health() {
        Ok(()) => Ok(Some(Box::new(client))),
        Err(OracleError::Auth(status)) => {
            Err(RecoveryError::Oracle(OracleError::Auth(status))).context("chain oracle rejected the API key")
        }
        Err(OracleError::Transient(reason)) => {
            warn!("Chain oracle unavailable ({reason}); continuing without it.");
            Ok(None)
        }
    }
}

fn parse_args() -> RecoveryConfig {
    let matches = Command::new("cardano-seed-recovery")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Recover Cardano seed phrases from partial or damaged mnemonics")
        .after_help(
            "Seed words given on the command line may end up in your shell \
             history. Run from a fresh session and clear the history afterwards.",
        )
        .arg(
            Arg::new("words")
                .value_name("WORD")
                .num_args(0..)
                .help("Known words of the seed phrase, in order ('?' marks an unknown word)"),
        )
        .arg(
            Arg::new("wordlist")
                .short('w')
                .long("wordlist")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Wordlist to use (default: builtin English)"),
        )
        .arg(
            Arg::new("similar")
                .short('s')
                .long("similar")
                .value_name("DISTANCE")
                .value_parser(value_parser!(usize))
                .default_value("0")
                .help("Try similar words up to this edit distance"),
        )
        .arg(
            Arg::new("order")
                .short('o')
                .long("order")
                .action(ArgAction::SetTrue)
                .help("Try row/column reorderings of the written phrase"),
        )
        .arg(
            Arg::new("length")
                .short('l')
                .long("length")
                .value_name("LENGTH")
                .value_parser(value_parser!(usize))
                .help("Length of the seed phrase (12, 15, 18, 21, or 24)"),
        )
        .arg(
            Arg::new("missing")
                .short('m')
                .long("missing")
                .value_name("POSITION")
                .value_parser(value_parser!(usize))
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("1-indexed positions of missing words"),
        )
        .arg(
            Arg::new("address")
                .short('a')
                .long("address")
                .value_name("ADDRESS")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .help("Stake addresses to search for, exact or prefix...suffix"),
        )
        .arg(
            Arg::new("blockfrost")
                .short('b')
                .long("blockfrost")
                .value_name("API_KEY")
                .help("Check stake addresses for on-chain activity via Blockfrost"),
        )
        .arg(
            Arg::new("passphrase")
                .short('p')
                .long("passphrase")
                .value_name("PASSPHRASE")
                .default_value("")
                .help("BIP-39 passphrase protecting the wallet"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("COUNT")
                .value_parser(value_parser!(usize))
                .help("Worker threads (default: number of CPUs)"),
        )
        .get_matches();

    RecoveryConfig {
        tokens: matches
            .get_many::<String>("words")
            .unwrap_or_default()
            .cloned()
            .collect(),
        wordlist_path: matches.get_one::<PathBuf>("wordlist").cloned(),
        similar: *matches.get_one::<usize>("similar").expect("defaulted"),
        reorder: matches.get_flag("order"),
        length: matches.get_one::<usize>("length").copied(),
        missing_positions: matches
            .get_many::<usize>("missing")
            .unwrap_or_default()
            .copied()
            .collect(),
        targets: matches
            .get_many::<String>("address")
            .unwrap_or_default()
            .cloned()
            .collect(),
        blockfrost_key: matches.get_one::<String>("blockfrost").cloned(),
        passphrase: matches.get_one::<String>("passphrase").expect("defaulted").clone(),
        threads: matches
            .get_one::<usize>("threads")
            .copied()
            .unwrap_or_else(num_cpus::get),
    }
}
