//! yescrypt proof-of-work CLI
//!
//! # Commands
//!
//! - `hash` - Hash an input with the Yenten preset or a custom profile
//! - `mine` - Search the nonce space of a block header for a valid proof
//! - `benchmark` - Run performance benchmark
//! - `params` - Show validated parameters and their memory footprint

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use yespow::algorithm::{DIGEST_SIZE, Yescrypt};
use yespow::{
    HEADER_SIZE, NONCE_OFFSET, Params, PowHasher, PowProfile, Target, leading_zero_bits,
    meets_target,
};

#[derive(Parser)]
#[command(name = "yespow")]
#[command(author = "Wavi")]
#[command(version = "0.1.0")]
#[command(about = "yescrypt proof-of-work hasher and miner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash an input (used as password, and as salt unless one is given)
    Hash {
        /// Input text, or hex bytes with --hex
        input: String,

        /// Treat the input as hex
        #[arg(long)]
        hex: bool,

        /// Salt text
        #[arg(long, conflicts_with = "salt_hex")]
        salt: Option<String>,

        /// Salt as hex
        #[arg(long)]
        salt_hex: Option<String>,

        /// Output length in bytes
        #[arg(long, default_value = "32")]
        len: usize,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Search nonces of an 80-byte block header
    Mine {
        /// First 76 header bytes as hex
        #[arg(long)]
        header: String,

        /// Target as 64 hex digits or compact bits
        #[arg(long, conflicts_with = "difficulty")]
        target: Option<String>,

        /// Target difficulty (number of leading zero bits)
        #[arg(short, long, default_value = "8")]
        difficulty: u32,

        /// Number of threads to use (default: number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of hashes to compute
        #[arg(short, long, default_value = "100")]
        count: u32,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Show validated parameters
    Params {
        /// Print the profile as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        params: ParamArgs,
    },
}

/// Parameter selection shared by every command
#[derive(clap::Args)]
struct ParamArgs {
    /// JSON parameter profile
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Block count N
    #[arg(short = 'N', long = "cost")]
    n: Option<u64>,

    /// Block size factor r
    #[arg(short, long = "block-size")]
    r: Option<u32>,

    /// Parallelism p
    #[arg(short, long = "parallelism")]
    p: Option<u32>,

    /// Extra time factor t
    #[arg(long = "time")]
    t: Option<u32>,

    /// Memory growth steps g
    #[arg(long = "growth")]
    g: Option<u32>,

    /// S-box size in bytes
    #[arg(long)]
    sbox_bytes: Option<usize>,
}

impl ParamArgs {
    fn profile(&self) -> anyhow::Result<PowProfile> {
        let mut profile = match &self.profile {
            Some(path) => load_profile(path)?,
            None => PowProfile::default(),
        };
        profile.n = self.n.or(profile.n);
        profile.r = self.r.or(profile.r);
        profile.p = self.p.or(profile.p);
        profile.t = self.t.or(profile.t);
        profile.g = self.g.or(profile.g);
        profile.sbox_bytes = self.sbox_bytes.or(profile.sbox_bytes);
        Ok(profile)
    }
}

fn load_profile(path: &Path) -> anyhow::Result<PowProfile> {
    PowProfile::load(path).with_context(|| format!("loading profile {}", path.display()))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Hash {
            input,
            hex,
            salt,
            salt_hex,
            len,
            json,
            params,
        } => cmd_hash(&input, hex, salt, salt_hex, len, json, &params),
        Commands::Mine {
            header,
            target,
            difficulty,
            threads,
            params,
        } => cmd_mine(&header, target.as_deref(), difficulty, threads, &params),
        Commands::Benchmark { count, params } => cmd_benchmark(count, &params),
        Commands::Params { json, params } => cmd_params(json, &params),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[derive(Serialize)]
struct HashOutput {
    input: String,
    salt: String,
    digest: String,
    params: PowProfile,
}

fn cmd_hash(
    input: &str,
    is_hex: bool,
    salt: Option<String>,
    salt_hex: Option<String>,
    len: usize,
    json: bool,
    args: &ParamArgs,
) -> anyhow::Result<()> {
    let password = if is_hex {
        hex::decode(input.trim()).context("input is not valid hex")?
    } else {
        input.as_bytes().to_vec()
    };
    let salt = match (salt, salt_hex) {
        (Some(text), _) => text.into_bytes(),
        (None, Some(h)) => hex::decode(h.trim()).context("salt is not valid hex")?,
        (None, None) => password.clone(),
    };

    let profile = args.profile()?;
    let params = profile.params()?;
    let rom = profile.rom(&params)?;
    let mut hasher = match &rom {
        Some(rom) => Yescrypt::with_rom(params, rom)?,
        None => Yescrypt::new(params)?,
    };

    let mut out = vec![0u8; len];
    hasher.derive(&password, &salt, &mut out)?;

    if json {
        let output = HashOutput {
            input: hex::encode(&password),
            salt: hex::encode(&salt),
            digest: hex::encode(&out),
            params: PowProfile::from_params(&params),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", hex::encode(&out));
    }

    Ok(())
}

struct Found {
    nonce: u32,
    digest: [u8; DIGEST_SIZE],
}

fn cmd_mine(
    header_hex: &str,
    target: Option<&str>,
    difficulty: u32,
    threads: Option<usize>,
    args: &ParamArgs,
) -> anyhow::Result<()> {
    let prefix = hex::decode(header_hex.trim()).context("header is not valid hex")?;
    if prefix.len() != NONCE_OFFSET {
        anyhow::bail!(
            "header must be {} bytes without the nonce, got {}",
            NONCE_OFFSET,
            prefix.len()
        );
    }
    let mut header = [0u8; HEADER_SIZE];
    header[..NONCE_OFFSET].copy_from_slice(&prefix);

    let target = match target {
        Some(t) => t.parse::<Target>()?,
        None => Target::from_leading_zero_bits(difficulty)?,
    };
    let profile = args.profile()?;
    let params = profile.params()?;
    let rom = profile.rom(&params)?;
    let num_threads = threads.unwrap_or_else(num_cpus::get).max(1);

    println!("Starting mining...");
    println!("Target: {}", target);
    println!("Threads: {}", num_threads);
    println!(
        "Memory: {} KB per thread",
        params.footprint().total() / 1024
    );

    let hashes = AtomicU64::new(0);
    let stop = AtomicBool::new(false);
    let found: Mutex<Option<Found>> = Mutex::new(None);
    let start = Instant::now();

    // Allocate every hasher before any thread starts
    let hashers = (0..num_threads)
        .map(|_| PowHasher::build(params, rom.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    thread::scope(|scope| -> anyhow::Result<()> {
        let (hashes, stop, found) = (&hashes, &stop, &found);
        let workers: Vec<_> = hashers
            .into_iter()
            .enumerate()
            .map(|(id, mut hasher)| {
                scope.spawn(move || {
                    let mut header = header;
                    let mut nonce = id as u64;
                    while nonce <= u64::from(u32::MAX) && !stop.load(Ordering::Relaxed) {
                        let digest = hasher.hash_with_nonce(&mut header, nonce as u32);
                        hashes.fetch_add(1, Ordering::Relaxed);

                        if meets_target(&digest, &target) {
                            if !stop.swap(true, Ordering::SeqCst) {
                                if let Ok(mut slot) = found.lock() {
                                    *slot = Some(Found {
                                        nonce: nonce as u32,
                                        digest,
                                    });
                                }
                            }
                            break;
                        }
                        nonce += num_threads as u64;
                    }
                    tracing::debug!(thread = id, "worker finished");
                })
            })
            .collect();

        // Report hashrate every 5 seconds until the workers are done
        let mut last_report = Instant::now();
        while !workers.iter().all(|w| w.is_finished()) {
            thread::sleep(Duration::from_millis(100));
            if last_report.elapsed() >= Duration::from_secs(5) {
                let elapsed = start.elapsed().as_secs_f64();
                let total = hashes.load(Ordering::Relaxed);
                print!(
                    "\rHashrate: {:.2} H/s | Hashes: {} | Time: {:.0}s",
                    total as f64 / elapsed,
                    total,
                    elapsed
                );
                std::io::stdout().flush().ok();
                last_report = Instant::now();
            }
        }
        for worker in workers {
            if worker.join().is_err() {
                anyhow::bail!("mining thread panicked");
            }
        }
        Ok(())
    })?;

    let total = hashes.load(Ordering::Relaxed);
    let result = found
        .lock()
        .map_err(|_| anyhow::anyhow!("result lock poisoned"))?
        .take();
    match result {
        Some(Found { nonce, digest }) => {
            header[NONCE_OFFSET..].copy_from_slice(&nonce.to_le_bytes());
            println!("\nFound valid hash!");
            println!("Nonce: {}", nonce);
            println!("Hash: {}", hex::encode(digest));
            println!("Leading zero bits: {}", leading_zero_bits(&digest));
            println!("Header: {}", hex::encode(header));
            println!("Hashes computed: {}", total);
            Ok(())
        }
        None => anyhow::bail!("nonce space exhausted after {} hashes", total),
    }
}

fn cmd_benchmark(count: u32, args: &ParamArgs) -> anyhow::Result<()> {
    let profile = args.profile()?;
    let params = profile.params()?;
    let rom = profile.rom(&params)?;
    println!("Running benchmark with {} hashes...", count);

    let mut hasher = PowHasher::build(params, rom.as_ref())?;
    let mut header = [0u8; HEADER_SIZE];
    header[..NONCE_OFFSET]
        .iter_mut()
        .enumerate()
        .for_each(|(i, b)| *b = i as u8);

    let start = Instant::now();
    for nonce in 0..count {
        let _ = hasher.hash_with_nonce(&mut header, nonce);
    }

    let elapsed = start.elapsed();
    let hashrate = count as f64 / elapsed.as_secs_f64();

    println!("\nResults:");
    println!("  Total hashes: {}", count);
    println!("  Time elapsed: {:.2}s", elapsed.as_secs_f64());
    println!("  Hashrate: {:.2} H/s", hashrate);

    print_params(&params);
    Ok(())
}

fn cmd_params(json: bool, args: &ParamArgs) -> anyhow::Result<()> {
    let params = args.profile()?.params()?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&PowProfile::from_params(&params))?
        );
    } else {
        print_params(&params);
    }
    Ok(())
}

fn print_params(params: &Params) {
    let flags = params.flags();
    let footprint = params.footprint();

    println!("\nAlgorithm parameters:");
    println!("  N: {} (final {})", params.n(), params.final_n());
    println!("  r: {}  p: {}  t: {}  g: {}", params.r(), params.p(), params.t(), params.g());
    println!("  Mode: {:?}", flags.mode);
    println!("  S-boxes: {:?} ({} bytes)", flags.sboxes, params.sbox_bytes());
    println!("  Confirm: {}", flags.confirm);
    println!("  Scratch per lane: {} KB", footprint.scratch / 1024);
    println!("  Lanes in flight: {}", footprint.lanes_in_flight);
    println!("  Total memory: {} KB", footprint.total() / 1024);
}
