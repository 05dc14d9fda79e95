use std::fs::{self, File};
use std::io::Stdout;
use std::panic;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use simplelog::{ConfigBuilder, WriteLogger};

use rawline::terminal::TerminalMode;
use rawline::{AnsiTerminal, Config, Engine, Keymap, KeyDecoder, Session, WriteMode};

type Term = AnsiTerminal<Stdout>;

#[derive(Parser)]
#[command(name = "rawline", about = "A small multi-line editor on a raw-mode terminal")]
struct Args {
    /// Config file to use instead of ~/.rawline/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What typing does to text after the cursor
    #[arg(short, long, value_enum)]
    mode: Option<WriteMode>,

    /// Don't echo typed characters
    #[arg(long)]
    no_echo: bool,

    /// Milliseconds to wait for the rest of an arrow-key sequence (0: forever)
    #[arg(long)]
    escape_timeout: Option<u64>,

    /// Key that finishes editing, e.g. "ctrl+d" or "esc"
    #[arg(long)]
    exit_key: Option<String>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// Log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    save_config: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.write_mode = mode;
        }
        if self.no_echo {
            config.echo = false;
        }
        if let Some(ms) = self.escape_timeout {
            config.escape_timeout_ms = ms;
        }
        if let Some(key) = &self.exit_key {
            config.exit_key = key.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply(&mut config);
    config.validate().context("Invalid command line option")?;
    Ok(config)
}

/// Log to a file; the terminal belongs to the editor.
fn setup_logging(config: &Config) -> Result<()> {
    let path = config.log_file();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let log_file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    WriteLogger::init(config.log_level()?, log_config, log_file)
        .context("Failed to initialise logger")?;
    Ok(())
}

fn setup_panic_handler() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        TerminalMode::restore_saved();
        error!("panic: {}", panic_info);
        // Start the report on a fresh line, below whatever was being edited.
        print!("\r\n");
        original_hook(panic_info);
    }));
}

/// Readline-style bindings on top of the keymap defaults.
fn bind_editor_keys(keymap: &mut Keymap<Term>) -> rawline::Result<()> {
    let insert = Keymap::<Term>::INSERT;
    keymap.on(insert, "ctrl+a", |engine, _, _| engine.move_cursor_to_beginning(0))?;
    keymap.on(insert, "ctrl+e", |engine, _, _| engine.move_cursor_to_eol(0))?;
    keymap.on(insert, "ctrl+k", |engine, _, x| engine.clear_line(x))?;
    keymap.on(insert, "ctrl+u", |engine, _, x| engine.delete(x))?;
    keymap.on(insert, "ctrl+w", |engine, line, x| {
        engine.delete(word_before(line, x))
    })?;
    keymap.on(insert, "ctrl+l", |engine, _, _| engine.reset())?;
    keymap.on(insert, "ctrl+o", |engine, _, _| {
        let mode = match engine.write_mode() {
            WriteMode::Insert => WriteMode::Overwrite,
            WriteMode::Overwrite => WriteMode::Insert,
        };
        info!("write mode: {:?}", mode);
        engine.set_write_mode(mode);
        Ok(())
    })?;
    Ok(())
}

/// Length of the word (and the spaces after it) ending at column `x`.
fn word_before(line: &str, x: usize) -> usize {
    let before: Vec<char> = line.chars().take(x).collect();
    let spaces = before.iter().rev().take_while(|c| c.is_whitespace()).count();
    let word = before[..before.len() - spaces]
        .iter()
        .rev()
        .take_while(|c| !c.is_whitespace())
        .count();
    spaces + word
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    if args.save_config {
        config.save()?;
        if let Some(path) = Config::config_path() {
            println!("Saved configuration to {}", path.display());
        }
        return Ok(());
    }

    setup_logging(&config)?;
    setup_panic_handler();
    info!("rawline starting with {:?}", config);

    let exit_key = config.exit_key()?;
    let settings = config.decoder_settings();
    println!("Editing; press {} to finish.", exit_key);

    let decoder = KeyDecoder::stdin(settings).context("Failed to start reading keys")?;
    let engine = Engine::with_write_mode(AnsiTerminal::stdout(), config.write_mode);
    let mut keymap = Keymap::new(config.echo);
    bind_editor_keys(&mut keymap)?;

    let mut session = Session::new(decoder, engine, keymap, exit_key)
        .with_poll_interval(settings.poll_interval);
    let outcome = session.run();
    let stats = session.stats();
    let mut engine = session.finish().context("Failed to restore the terminal")?;
    outcome?;

    engine.move_cursor_to_eof()?;
    let lines = engine.lines().len();
    let chars: usize = engine.lines().iter().map(|l| l.chars().count()).sum();
    println!();
    println!("{} lines, {} characters ({} keys)", lines, chars, stats.keys);
    info!("rawline exiting");
    Ok(())
}
