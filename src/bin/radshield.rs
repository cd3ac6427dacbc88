//! radshield - exercise the protection primitives from the command line
//!
//! Corrupts values on purpose and shows how each primitive recovers them.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use radshield::hardening::CriticalityMetrics;
use radshield::reed_solomon::corrupt_symbols;
use radshield::tmr::VoteOutcome;
use radshield::{
    ApproximateTmr, CodecConfig, HardeningConfig, HardeningStrategy, HealthWeightedTmr,
    HistoryWeightedTmr, NetworkComponent, ReedSolomonCodec, SelectiveHardening, VoterConfig,
};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = Command::new("radshield")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Radiation-tolerant storage primitives: Reed-Solomon, TMR voting, selective hardening")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("codec")
                .about("Encode a value, corrupt symbols, decode")
                .arg(
                    Arg::new("value")
                        .help("Value to protect")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .index(1),
                )
                .arg(
                    Arg::new("width")
                        .short('w')
                        .long("width")
                        .help("Symbol width in bits (4, 8 or 16)")
                        .value_name("BITS")
                        .value_parser(value_parser!(u8))
                        .default_value("8"),
                )
                .arg(
                    Arg::new("ecc")
                        .short('e')
                        .long("ecc")
                        .help("Parity symbols per codeword")
                        .value_name("COUNT")
                        .value_parser(value_parser!(usize))
                        .default_value("8"),
                )
                .arg(
                    Arg::new("corrupt")
                        .short('k')
                        .long("corrupt")
                        .help("Symbols to corrupt")
                        .value_name("COUNT")
                        .value_parser(value_parser!(usize))
                        .default_value("2"),
                )
                .arg(seed_arg()),
        )
        .subcommand(
            Command::new("vote")
                .about("Store three copies, corrupt one, vote")
                .arg(
                    Arg::new("value")
                        .help("Value to protect")
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .index(1),
                )
                .arg(
                    Arg::new("voter")
                        .long("voter")
                        .help("Voter to use")
                        .value_parser(["health", "history", "approximate"])
                        .default_value("health"),
                )
                .arg(
                    Arg::new("copy")
                        .short('c')
                        .long("copy")
                        .help("Copy to corrupt (0-2)")
                        .value_parser(value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("reads")
                        .short('n')
                        .long("reads")
                        .help("Number of reads before repairing")
                        .value_parser(value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    Arg::new("no-repair")
                        .long("no-repair")
                        .help("Leave the corrupted copy in place")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Assign protection levels to synthetic components")
                .arg(
                    Arg::new("components")
                        .short('n')
                        .long("components")
                        .help("Number of components")
                        .value_parser(value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    Arg::new("budget")
                        .short('b')
                        .long("budget")
                        .help("Resource budget in [0, 1]")
                        .value_parser(value_parser!(f64))
                        .default_value("0.3"),
                )
                .arg(
                    Arg::new("strategy")
                        .long("strategy")
                        .value_parser(["threshold", "greedy", "layerwise", "adaptive"])
                        .default_value("greedy"),
                )
                .arg(seed_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("codec", sub_matches)) => handle_codec(sub_matches),
        Some(("vote", sub_matches)) => handle_vote(sub_matches),
        Some(("plan", sub_matches)) => handle_plan(sub_matches),
        _ => {
            eprintln!("Error: No command specified");
            eprintln!("\nUse 'radshield --help' for usage information");
            std::process::exit(1);
        }
    }
}

fn seed_arg() -> Arg {
    Arg::new("seed")
        .short('s')
        .long("seed")
        .help("Seed for the corruption pattern")
        .value_parser(value_parser!(u64))
        .default_value("1")
}

fn handle_codec(matches: &clap::ArgMatches) -> Result<()> {
    let value = *matches.get_one::<u64>("value").context("value is required")?;
    let corrupt = matches.get_one::<usize>("corrupt").copied().unwrap_or(0);
    let seed = matches.get_one::<u64>("seed").copied().unwrap_or(1);
    let config = CodecConfig::from_args(matches);

    let codec = ReedSolomonCodec::<u64>::new(config).context("Failed to build codec")?;
    let mut codeword = codec.encode(&value);
    let total = codec.total_symbols();
    anyhow::ensure!(
        corrupt <= total,
        "cannot corrupt {} of {} symbols",
        corrupt,
        total
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions = sample(&mut rng, total, corrupt).into_vec();
    positions.sort_unstable();
    corrupt_symbols(&mut codeword, &positions, config.symbol_width);

    println!(
        "GF(2^{}): {} data + {} parity symbols, corrects {}, overhead {:.1}%",
        config.symbol_width.bits(),
        codec.data_symbols(),
        codec.ecc_symbols(),
        codec.correction_capability(),
        codec.overhead_percent()
    );
    println!("Corrupted symbols: {:?}", positions);

    match codec.decode_with_report(&codeword) {
        Ok(report) if report.value == value => {
            println!(
                "Recovered {} (corrected positions {:?})",
                report.value, report.corrected_positions
            );
        }
        Ok(report) => {
            println!(
                "Miscorrected to {} (expected {}); too many errors for this code",
                report.value, value
            );
        }
        Err(err) => println!("Decode failed: {}", err),
    }
    Ok(())
}

fn print_outcome(read: usize, outcome: &VoteOutcome<i64>, health: Option<[f64; 3]>) {
    print!(
        "read {}: {} ({:?}, from copy {})",
        read, outcome.value, outcome.decision, outcome.source
    );
    match health {
        Some(health) => println!(" health {:.2?}", health),
        None => println!(),
    }
}

fn handle_vote(matches: &clap::ArgMatches) -> Result<()> {
    let value = *matches.get_one::<i64>("value").context("value is required")?;
    let copy = matches.get_one::<usize>("copy").copied().unwrap_or(0);
    let reads = matches.get_one::<usize>("reads").copied().unwrap_or(1);
    let repair = !matches.get_flag("no-repair");
    let voter = matches
        .get_one::<String>("voter")
        .map(String::as_str)
        .unwrap_or("health");

    anyhow::ensure!(copy < 3, "copy must be 0, 1 or 2");
    let flip = |bytes: &mut [u8]| bytes[0] = !bytes[0];

    match voter {
        "history" => {
            let mut tmr = HistoryWeightedTmr::new(value);
            tmr.inject_fault(copy, flip);
            for read in 1..=reads {
                let outcome = tmr.get_with_outcome();
                print_outcome(read, &outcome, Some(tmr.health_scores()));
            }
            if repair {
                println!("repair: {}", tmr.repair());
            }
            println!("{:?}", tmr.stats());
        }
        "approximate" => {
            let mut tmr = ApproximateTmr::new(value);
            println!("stored copies {:?} as {:?}", tmr.copies(), tmr.kinds());
            tmr.inject_fault(copy, flip);
            for read in 1..=reads {
                let outcome = tmr.get_with_outcome();
                print_outcome(read, &outcome, None);
            }
            if repair {
                println!("repair: {}", tmr.repair());
            }
            println!("{:?}", tmr.stats());
        }
        _ => {
            let tmr = HealthWeightedTmr::with_config(value, VoterConfig::always_verify());
            tmr.inject_fault(copy, flip);
            for read in 1..=reads {
                let outcome = tmr.get_with_outcome();
                print_outcome(read, &outcome, Some(tmr.health_scores()));
            }
            if repair {
                println!("repair: {}", tmr.repair());
            }
            println!("{:?}", tmr.stats());
        }
    }
    Ok(())
}

fn handle_plan(matches: &clap::ArgMatches) -> Result<()> {
    let count = matches.get_one::<usize>("components").copied().unwrap_or(20);
    let budget = matches.get_one::<f64>("budget").copied().unwrap_or(0.3);
    let seed = matches.get_one::<u64>("seed").copied().unwrap_or(1);
    let strategy = match matches.get_one::<String>("strategy").map(String::as_str) {
        Some("threshold") => HardeningStrategy::FixedThreshold,
        Some("layerwise") => HardeningStrategy::LayerwiseImportance,
        Some("adaptive") => HardeningStrategy::AdaptiveRuntime,
        _ => HardeningStrategy::ResourceConstrained,
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let components: Vec<NetworkComponent> = (0..count)
        .map(|i| {
            let layer = i % 4;
            let metrics = CriticalityMetrics::new(
                rng.random(),
                rng.random(),
                rng.random_range(0.0..=1.0) * (layer + 1) as f64 / 4.0,
                rng.random_range(0.0..0.5),
                rng.random(),
            );
            NetworkComponent::new(format!("w{}", i), format!("layer{}", layer), rng.random(), metrics)
        })
        .collect();

    let hardening = SelectiveHardening::new(HardeningConfig::new(strategy, budget))
        .context("Invalid hardening configuration")?;
    let plan = hardening.analyze(&components);
    println!("{}", plan);

    if strategy == HardeningStrategy::AdaptiveRuntime {
        let mut errors = FxHashMap::default();
        let mut corrections = FxHashMap::default();
        for component in &components {
            let observed = rng.random_range(0..6u32);
            errors.insert(component.id.clone(), observed);
            corrections.insert(component.id.clone(), rng.random_range(0..=observed));
        }
        let updated = hardening.update_adaptive(&plan, &errors, &corrections);
        let changed = components
            .iter()
            .filter(|c| updated.level_of(&c.id) != plan.level_of(&c.id))
            .count();
        println!("After one round of observed errors ({} components changed):", changed);
        println!("{}", updated);
    }
    Ok(())
}
