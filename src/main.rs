//! File Envelope - CLI
//!
//! Command-line interface for key and envelope operations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{ArgAction, Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;

use file_envelope::{
    derive_key_with, generate_key, inspect, open, open_batch, open_text, seal, seal_batch,
    seal_text, EnvelopeConfig, FileEntry, OperationRecord, OperationResult, Salt,
};

const KEY_ENV: &str = "FILE_ENVELOPE_KEY";

#[derive(Parser)]
#[command(name = "file-envelope")]
#[command(version = file_envelope::VERSION)]
#[command(about = "Seal and open files with password-derived or generated keys")]
struct Cli {
    /// JSON configuration file (defaults to the per-user config, if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct KeyArg {
    /// Encoded key (url-safe base64, 32 bytes)
    #[arg(short, long, env = KEY_ENV, hide_env_values = true)]
    key: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random key
    Keygen,

    /// Derive a key from a password
    Derive {
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Existing salt (standard base64) to re-derive a key
        #[arg(short, long)]
        salt: Option<String>,
    },

    /// Seal a file into <name>.enc
    Seal {
        /// File to seal
        input: PathBuf,

        #[command(flatten)]
        key: KeyArg,

        /// Output directory (defaults to the input's directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Print the result record instead of writing a file
        #[arg(long)]
        json: bool,
    },

    /// Open a sealed file
    Open {
        /// Sealed file
        input: PathBuf,

        #[command(flatten)]
        key: KeyArg,

        /// Output directory (defaults to the input's directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Print the result record instead of writing a file
        #[arg(long)]
        json: bool,
    },

    /// Seal every file in a directory
    SealDir {
        dir: PathBuf,

        #[command(flatten)]
        key: KeyArg,

        #[arg(short, long)]
        out_dir: PathBuf,
    },

    /// Open every .enc file in a directory
    OpenDir {
        dir: PathBuf,

        #[command(flatten)]
        key: KeyArg,

        #[arg(short, long)]
        out_dir: PathBuf,
    },

    /// Seal a text string and print the token
    SealText {
        text: String,

        #[command(flatten)]
        key: KeyArg,
    },

    /// Open a text token and print the plaintext
    OpenText {
        token: String,

        #[command(flatten)]
        key: KeyArg,
    },

    /// Show authenticated token metadata
    Inspect {
        input: PathBuf,

        #[command(flatten)]
        key: KeyArg,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8, json: bool) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = EnvelopeConfig::discover(cli.config.as_ref())
        .context("failed to load configuration")?;
    init_logging(cli.verbose, cli.log_json || config.log_json);

    match cli.command {
        Commands::Keygen => {
            println!("{}", generate_key().expose_secret());
        }

        Commands::Derive { password, salt } => {
            let password = match password {
                Some(p) => SecretString::from(p),
                None => SecretString::from(
                    rpassword::prompt_password("Password: ").context("failed to read password")?,
                ),
            };
            let salt = salt.map(|s| Salt::from_base64(&s)).transpose()?;

            let derived = derive_key_with(
                password.expose_secret(),
                salt.as_ref().map(Salt::as_bytes),
                &config.kdf,
            )?;

            let output = serde_json::json!({
                "key": derived.key.expose_secret(),
                "salt": derived.salt.to_base64(),
                "salt_hex": derived.salt.to_hex(),
                "iterations": config.kdf.iterations,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Seal {
            input,
            key,
            out_dir,
            json,
        } => {
            let data = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let result = seal(&data, &key.key, &file_name(&input)?);
            finish_file(&input, out_dir, result, json, |payload| Ok(payload.as_bytes().to_vec()))?;
        }

        Commands::Open {
            input,
            key,
            out_dir,
            json,
        } => {
            let data = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let result = open(&data, &key.key, &file_name(&input)?);
            finish_file(&input, out_dir, result, json, |payload| {
                STANDARD.decode(payload).context("invalid payload encoding")
            })?;
        }

        Commands::SealDir { dir, key, out_dir } => {
            let entries = read_dir_entries(&dir)?;
            let results = seal_batch(&entries, &key.key);
            write_batch(&entries, results, &out_dir, |payload| {
                Ok(payload.as_bytes().to_vec())
            })?;
        }

        Commands::OpenDir { dir, key, out_dir } => {
            let entries = read_dir_entries(&dir)?;
            let results = open_batch(&entries, &key.key);
            write_batch(&entries, results, &out_dir, |payload| {
                STANDARD.decode(payload).context("invalid payload encoding")
            })?;
        }

        Commands::SealText { text, key } => {
            println!("{}", seal_text(&text, &key.key)?);
        }

        Commands::OpenText { token, key } => {
            println!("{}", open_text(&token, &key.key)?);
        }

        Commands::Inspect { input, key } => {
            let data = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let info = inspect(&data, &key.key)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

/// Write a single result next to the input (or into `out_dir`), or print it
fn finish_file<F>(
    input: &Path,
    out_dir: Option<PathBuf>,
    result: OperationResult,
    json: bool,
    decode: F,
) -> Result<()>
where
    F: Fn(&str) -> Result<Vec<u8>>,
{
    if json {
        let failed = !result.is_success();
        println!("{}", serde_json::to_string_pretty(&OperationRecord::from(result))?);
        if failed {
            bail!("operation failed");
        }
        return Ok(());
    }

    match result {
        OperationResult::Success { payload, filename } => {
            let dir = out_dir.unwrap_or_else(|| {
                input
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default()
            });
            let target = dir.join(&filename);
            std::fs::write(&target, decode(&payload)?)
                .with_context(|| format!("failed to write {}", target.display()))?;
            println!("{} -> {}", input.display(), target.display());
            Ok(())
        }
        OperationResult::Failure { error } => bail!("{}: {}", input.display(), error),
    }
}

fn read_dir_entries(dir: &Path) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let contents = std::fs::read(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        entries.push(FileEntry::new(file_name(&path)?, contents));
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn write_batch<F>(
    entries: &[FileEntry],
    results: Vec<OperationResult>,
    out_dir: &Path,
    decode: F,
) -> Result<()>
where
    F: Fn(&str) -> Result<Vec<u8>>,
{
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut failures = 0usize;
    for (entry, result) in entries.iter().zip(results) {
        match result {
            OperationResult::Success { payload, filename } => {
                let target = out_dir.join(&filename);
                std::fs::write(&target, decode(&payload)?)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                println!("{} -> {}", entry.name, filename);
            }
            OperationResult::Failure { error } => {
                failures += 1;
                eprintln!("{}: {}", entry.name, error);
            }
        }
    }

    println!("{} of {} files processed", entries.len() - failures, entries.len());
    if failures > 0 {
        bail!("{} file(s) failed", failures);
    }
    Ok(())
}
