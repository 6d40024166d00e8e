use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use zesec_rs::config::{CHUNK_SIZE, DEFAULT_ITERATIONS, DEFAULT_PASSES};
use zesec_rs::file::output_path;
use zesec_rs::{Cancellation, Config, EncryptionResult, Error, Hooks, KeyFile, Operation, Password, Processor, Progress};

use crate::ui::display;
use crate::ui::progress::Bar;
use crate::ui::prompt::Prompt;

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt a file into a .zesec container
    Encrypt {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        key_file: Option<PathBuf>,

        /// Securely erase the original after encrypting
        #[arg(long)]
        clean: bool,

        #[arg(short, long)]
        password: Option<String>,
    },

    /// Decrypt a .zesec container
    Decrypt {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        key_file: Option<PathBuf>,

        #[arg(short, long)]
        password: Option<String>,
    },

    /// Encrypt every file in a directory
    EncryptDir {
        #[arg(short, long)]
        dir: PathBuf,

        #[arg(short, long)]
        key_file: Option<PathBuf>,

        #[arg(long)]
        clean: bool,

        #[arg(long)]
        no_recursive: bool,

        #[arg(short, long)]
        password: Option<String>,
    },

    /// Generate a random key file
    Keygen {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        force: bool,
    },

    /// Overwrite a file (or every file in a directory) and delete it
    Wipe {
        path: PathBuf,

        /// Overwrite only; do not delete
        #[arg(long)]
        keep: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the header of a container
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Parser)]
#[command(name = "zesec", version, about = "Password-protected file encryption (ChaCha20-Poly1305, PBKDF2-SHA256) with key files and secure erase.")]
pub struct App {
    #[command(subcommand)]
    command: Commands,

    /// PBKDF2 iterations for new containers
    #[arg(long, global = true, default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    /// Overwrite passes for --clean and wipe
    #[arg(long, global = true, default_value_t = DEFAULT_PASSES)]
    passes: u32,

    /// Streaming chunk size in bytes
    #[arg(long, global = true, default_value_t = CHUNK_SIZE)]
    chunk_size: usize,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();

        let level = match app.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(app)
    }

    pub async fn execute(self) -> Result<()> {
        let config = Config::default().with_iterations(self.iterations).with_passes(self.passes).with_chunk_size(self.chunk_size);
        config.validate().context("invalid settings")?;

        match self.command {
            Commands::Encrypt { input, output, key_file, clean, password } => Self::run_encrypt(config, input, output, key_file, clean, password).await,
            Commands::Decrypt { input, output, key_file, password } => Self::run_decrypt(config, input, output, key_file, password).await,
            Commands::EncryptDir { dir, key_file, clean, no_recursive, password } => Self::run_encrypt_dir(config, dir, key_file, clean, !no_recursive, password).await,
            Commands::Keygen { output, force } => Self::run_keygen(&output, force),
            Commands::Wipe { path, keep, yes } => Self::run_wipe(config, path, !keep, yes).await,
            Commands::Inspect { input } => Self::run_inspect(&input),
        }
    }

    async fn run_encrypt(config: Config, input: PathBuf, output: Option<PathBuf>, key_file: Option<PathBuf>, clean: bool, password: Option<String>) -> Result<()> {
        let output = output.unwrap_or_else(|| output_path(&input, Operation::Encrypt));
        Self::confirm_destination(&output)?;

        let password = password.map_or_else(Prompt::encryption_password, |p| Ok(Password::from_string(p)))?;
        let processor = Processor::new(config)?;

        let source = input.clone();
        let result = Self::blocking(move |hooks| processor.encrypt(&input, &password, key_file.as_deref(), Some(&output), clean, hooks)).await?;

        Self::report(result, clean.then_some(source.as_path()))
    }

    async fn run_decrypt(config: Config, input: PathBuf, output: Option<PathBuf>, key_file: Option<PathBuf>, password: Option<String>) -> Result<()> {
        let output = output.unwrap_or_else(|| output_path(&input, Operation::Decrypt));
        Self::confirm_destination(&output)?;

        let password = password.map_or_else(Prompt::decryption_password, |p| Ok(Password::from_string(p)))?;
        let processor = Processor::new(config)?;

        let result = Self::blocking(move |hooks| processor.decrypt(&input, &password, key_file.as_deref(), Some(&output), hooks)).await?;

        Self::report(result, None)
    }

    async fn run_encrypt_dir(config: Config, dir: PathBuf, key_file: Option<PathBuf>, clean: bool, recursive: bool, password: Option<String>) -> Result<()> {
        let password = password.map_or_else(Prompt::encryption_password, |p| Ok(Password::from_string(p)))?;
        let processor = Processor::new(config)?;

        let results = Self::blocking(move |hooks| processor.encrypt_directory(&dir, &password, key_file.as_deref(), clean, recursive, hooks)).await??;
        display::show_encryption_results(&results);

        if results.iter().any(|r| matches!(r.error, Some(Error::Cancelled))) {
            bail!("operation cancelled");
        }

        let failed = results.iter().filter(|r| !r.success).count();
        if failed > 0 {
            bail!("{failed} file(s) failed");
        }

        Ok(())
    }

    fn run_keygen(output: &Path, force: bool) -> Result<()> {
        KeyFile::generate(output, force).with_context(|| format!("failed to generate key file {}", output.display()))?;
        display::show_key_generated(output);
        Ok(())
    }

    async fn run_wipe(config: Config, path: PathBuf, delete_after: bool, yes: bool) -> Result<()> {
        if delete_after && !yes && !Prompt::confirm_wipe(&path, config.passes)? {
            bail!("operation canceled");
        }

        let is_dir = std::fs::symlink_metadata(&path).with_context(|| format!("cannot access {}", path.display()))?.is_dir();

        if is_dir {
            let outcomes = Self::blocking(move |hooks| zesec_rs::wipe_directory(&config, &path, config.passes, delete_after, true, hooks)).await??;
            display::show_wipe_outcomes(&outcomes);

            let failed = outcomes.iter().filter(|o| !o.is_success()).count();
            if failed > 0 {
                bail!("{failed} file(s) could not be wiped");
            }
            return Ok(());
        }

        let shown = path.clone();
        Self::blocking(move |hooks| zesec_rs::wipe(&config, &path, config.passes, delete_after, hooks)).await?.with_context(|| format!("wipe failed: {}", shown.display()))?;
        display::show_wiped(&shown, delete_after);

        Ok(())
    }

    fn run_inspect(input: &Path) -> Result<()> {
        let header = Processor::inspect(input).with_context(|| format!("cannot read container {}", input.display()))?;
        display::show_header(input, &header);
        Ok(())
    }

    fn confirm_destination(output: &Path) -> Result<()> {
        if output.exists() && !Prompt::confirm_overwrite(output)? {
            bail!("operation canceled");
        }
        Ok(())
    }

    fn report(result: EncryptionResult, cleaned: Option<&Path>) -> Result<()> {
        let operation = result.operation;
        let bytes = result.bytes_processed;
        let output = result.output_path.clone();
        let result = result.into_result();

        match (result, output) {
            (Ok(_), Some(output)) => {
                display::show_success(operation, &output, bytes);
                if let Some(input) = cleaned {
                    display::show_source_deleted(input);
                }
                Ok(())
            }
            (Err(error), Some(output)) => {
                display::show_success(operation, &output, bytes);
                Err(error).context("the container was written, but the original could not be erased")
            }
            (Err(error), None) => Err(error).with_context(|| format!("{operation} failed")),
            (Ok(_), None) => bail!("{operation} produced no output"),
        }
    }

    /// Runs `job` on the blocking pool with a progress bar, cancelling on Ctrl-C.
    async fn blocking<T, F>(job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Hooks<'_>) -> T + Send + 'static,
    {
        let cancel = Cancellation::new();

        let watcher = cancel.clone();
        let signal = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watcher.cancel();
            }
        });

        let result = tokio::task::spawn_blocking(move || {
            let bar = Bar::new("Starting");
            let progress = |p: Progress| bar.update(p);
            let output = job(Hooks::new().with_progress(&progress).with_cancel(&cancel));
            bar.finish();
            output
        })
        .await
        .context("worker task failed");

        signal.abort();
        result
    }
}
