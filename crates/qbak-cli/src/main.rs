//! qbak: post-quantum encrypted backups
//!
//! Commands:
//!   (none)                            - back up the configured paths
//!   config                            - edit the configuration
//!   decrypt <file> [<dest>] [--tar]   - verify and restore a backup
//!   keygen                            - print a fresh keypair

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use qbak_archive::{fmt_bytes, TarArchiver};
use qbak_backup::{
    default_config_path, load_config, restore_backup, run_backup, save_config, RestoreMode,
};
use qbak_core::{BackupConfig, QbakError};
use qbak_crypto::{generate_keypair, PrivateKey};

/// Environment variable holding the base64 private key for `decrypt`
const PRIV_KEY_ENV: &str = "PRIV_KEY";

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "qbak",
    version,
    about = "Post-quantum encrypted backups",
    long_about = "qbak: seal files and folders into ML-KEM-1024 encrypted, zstd compressed, \
                  tamper-evident archives; run without a command to back up"
)]
struct Cli {
    /// Path to config.bc (default: next to the executable)
    #[arg(long, short = 'c', env = "QBAK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "QBAK_LOG", default_value = "info", global = true)]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "QBAK_LOG_FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the configuration editor
    Config,

    /// Verify a backup and restore it
    ///
    /// The private key is read from PRIV_KEY, or prompted for when unset.
    Decrypt {
        /// Backup file (.bk)
        file: String,
        /// Where to restore (default: current directory)
        destination: Option<PathBuf>,
        /// Write the decrypted .tar.zst instead of extracting it
        #[arg(long)]
        tar: bool,
    },

    /// Print a new private/public keypair
    Keygen,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log, &cli.log_format);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path().context("locating config.bc")?,
    };

    match cli.command {
        None => cmd_backup(&config_path),
        Some(Commands::Config) => cmd_config(&config_path),
        Some(Commands::Decrypt { file, destination, tar }) => {
            cmd_decrypt(&file, destination.as_deref(), tar)
        }
        Some(Commands::Keygen) => cmd_keygen(),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Load the config, running the first-run setup when there is none.
fn load_or_setup(path: &Path) -> Result<Option<BackupConfig>> {
    let loaded = load_config(path)
        .with_context(|| format!("reading config: {}", path.display()))?;
    if loaded.is_none() {
        first_run(path)?;
    }
    Ok(loaded)
}

fn first_run(path: &Path) -> Result<()> {
    let kp = generate_keypair().context("generating keypair")?;
    let mut config = BackupConfig::with_key(kp.public.to_base64());
    save_config(path, &config)
        .with_context(|| format!("writing config: {}", path.display()))?;

    println!("No config file found, so a default one has been created at {}", path.display());
    println!("This is a brand new private (decryption) key:\n");
    println!("{}\n", kp.private.to_base64().expose_secret());
    println!("The public key is already in the config. Store the private key somewhere safe:");
    println!("it is never written to disk and every backup needs it to be restored.\n");
    print!(" - Press ENTER to continue editing the configuration...");
    io::stdout().flush().context("flushing stdout")?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("reading stdin")?;

    if qbak_tui::edit(&mut config)? {
        save_config(path, &config)
            .with_context(|| format!("writing config: {}", path.display()))?;
    }
    println!("All done. The next run backs up with this configuration.");
    println!("Edit it again any time with: qbak config");
    Ok(())
}

/// Relative paths and destination are taken from the config file's folder,
/// not from wherever the binary was started.
fn resolve_relative(config: &BackupConfig, base: &Path) -> BackupConfig {
    let mut resolved = config.clone();
    if resolved.destination.is_relative() {
        resolved.destination = base.join(&resolved.destination);
    }
    resolved.paths = config
        .paths
        .iter()
        .map(|p| {
            let path = Path::new(p);
            if path.is_relative() {
                base.join(path).to_string_lossy().into_owned()
            } else {
                p.clone()
            }
        })
        .collect();
    resolved
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ── `qbak` (backup) ───────────────────────────────────────────────────────────

fn cmd_backup(config_path: &Path) -> Result<()> {
    let Some(config) = load_or_setup(config_path)? else {
        return Ok(());
    };
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let config = resolve_relative(&config, base);

    if config.paths.is_empty() {
        tracing::warn!("no paths configured, the backup will be empty (edit with `qbak config`)");
    }

    let pb = make_spinner("backup");
    pb.set_message(format!("compressing {} path(s)...", config.paths.len()));
    let report = run_backup(&config);
    pb.finish_and_clear();
    let report = report.context("backup failed")?;

    println!("backed up: {}", report.path.display());
    println!("  files:   {}", report.counts.files);
    println!("  folders: {}", report.counts.folders);
    println!("  size:    {}", fmt_bytes(report.bytes));
    println!("  elapsed: {:.2?}", report.elapsed);
    Ok(())
}

// ── `qbak config` ─────────────────────────────────────────────────────────────

fn cmd_config(config_path: &Path) -> Result<()> {
    let Some(mut config) = load_or_setup(config_path)? else {
        return Ok(());
    };
    if qbak_tui::edit(&mut config)? {
        save_config(config_path, &config)
            .with_context(|| format!("writing config: {}", config_path.display()))?;
        println!("saved {}", config_path.display());
    }
    Ok(())
}

// ── `qbak decrypt` ────────────────────────────────────────────────────────────

fn cmd_decrypt(file: &str, destination: Option<&Path>, raw: bool) -> Result<()> {
    let file = PathBuf::from(file.trim_matches('"').trim_matches('\''));
    let dest = match destination {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().context("resolving current directory")?,
    };

    let private_key = read_private_key()?;
    let mode = if raw {
        RestoreMode::RawStream
    } else {
        RestoreMode::Extract
    };

    let started = Instant::now();
    let pb = make_spinner("decrypt");
    pb.set_message("verifying integrity...");
    let restored = restore_backup(&file, &dest, &private_key, &TarArchiver, mode);
    pb.finish_and_clear();

    let outcome = match restored {
        Ok(outcome) => outcome,
        Err(QbakError::IntegrityFailure) => {
            anyhow::bail!(
                "integrity check failed for {}: the file has been tampered with, \
                 or the private key does not match",
                file.display()
            )
        }
        Err(e) => return Err(e).with_context(|| format!("restoring {}", file.display())),
    };

    println!("restored: {}", outcome.output.display());
    println!("  files:   {}", outcome.counts.files);
    println!("  folders: {}", outcome.counts.folders);
    println!("  elapsed: {:.2?}", started.elapsed());
    Ok(())
}

/// `PRIV_KEY` when set (removed from the environment once read), else a prompt.
fn read_private_key() -> Result<PrivateKey> {
    let encoded = match std::env::var(PRIV_KEY_ENV) {
        Ok(value) => {
            std::env::remove_var(PRIV_KEY_ENV);
            SecretString::from(value)
        }
        Err(_) => SecretString::from(
            rpassword::prompt_password("Private key: ").context("reading private key")?,
        ),
    };
    PrivateKey::from_base64(&encoded).context("invalid private key")
}

// ── `qbak keygen` ─────────────────────────────────────────────────────────────

fn cmd_keygen() -> Result<()> {
    let kp = generate_keypair().context("generating keypair")?;
    println!("Private key (keep secret, needed to restore):\n");
    println!("{}\n", kp.private.to_base64().expose_secret());
    println!("Public key (goes in the config):\n");
    println!("{}", kp.public.to_base64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_command_means_backup() {
        let cli = Cli::try_parse_from(["qbak"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn decrypt_arguments() {
        let cli = Cli::try_parse_from(["qbak", "decrypt", "1700.bk", "/restore", "--tar"]).unwrap();
        match cli.command {
            Some(Commands::Decrypt { file, destination, tar }) => {
                assert_eq!(file, "1700.bk");
                assert_eq!(destination, Some(PathBuf::from("/restore")));
                assert!(tar);
            }
            other => panic!("expected decrypt, got {other:?}"),
        }
    }

    #[test]
    fn config_takes_no_arguments() {
        assert!(Cli::try_parse_from(["qbak", "config", "extra"]).is_err());
    }

    #[test]
    fn relative_entries_follow_config_dir() {
        let mut config = BackupConfig::default();
        config.paths = vec!["docs".into(), "/etc/hosts".into()];
        let resolved = resolve_relative(&config, Path::new("/opt/qbak"));

        assert_eq!(resolved.destination, PathBuf::from("/opt/qbak/data/"));
        assert_eq!(resolved.paths, vec!["/opt/qbak/docs", "/etc/hosts"]);
    }

    #[test]
    fn first_run_is_detected_from_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.bc");
        assert!(load_config(&path).unwrap().is_none());

        save_config(&path, &BackupConfig::with_key("k")).unwrap();
        assert_eq!(load_config(&path).unwrap().unwrap().key, "k");
    }
}
