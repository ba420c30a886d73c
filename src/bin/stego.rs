//! # Stego Binary Entry Point
//!
//! Hides text in images, reads it back, renders LSB planes and generates
//! sweep images at fixed payload ratios.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin stego -- embed -i input.png -o output.png -m "hello world"
//! cargo run --bin stego -- extract -i output.png
//!
//! # Keyed pixel order
//! cargo run --bin stego -- embed -i input.png -o output.png -m "hello" -p secret
//! cargo run --bin stego -- extract -i output.png -p secret
//!
//! # Visual attack and ratio sweep
//! cargo run --bin stego -- bitplane -i output.png -o lsb.png --channel red
//! cargo run --bin stego -- sweep -i input.png --out-dir sweep -m "Le chiffre indechiffrable."
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use lsb_stego::analysis::bitplane::{lsb_plane, lsb_planes};
use lsb_stego::common::config::StegoConfig;
use lsb_stego::common::logging::init_logger;
use lsb_stego::processing::{
    bits, capacity, embed, extract_text, load_grid, save_grid, save_plane, sweep, sweep_repeats,
    Channel, ColorMode, EmbedPolicy, PixelOrder,
};
use lsb_stego::StegoError;

/// Command-line arguments for the stego binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// `--policy` values
#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    /// Write the message once, terminated; fail if it does not fit
    Truncate,
    /// Repeat the message until the image is full (not extractable)
    Wrap,
}

impl From<PolicyArg> for EmbedPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Truncate => EmbedPolicy::Truncate,
            PolicyArg::Wrap => EmbedPolicy::Wrap,
        }
    }
}

/// `--mode` values
#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// RGBA if the source has an alpha channel, RGB otherwise
    Preserve,
    Rgb,
    Rgba,
}

impl From<ModeArg> for ColorMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Preserve => ColorMode::Preserve,
            ModeArg::Rgb => ColorMode::Rgb,
            ModeArg::Rgba => ColorMode::Rgba,
        }
    }
}

/// `--channel` values
#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChannelArg {
    Red,
    Green,
    Blue,
}

impl From<ChannelArg> for Channel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Red => Channel::Red,
            ChannelArg::Green => Channel::Green,
            ChannelArg::Blue => Channel::Blue,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide a message in an image
    Embed {
        /// Cover image
        #[arg(short, long)]
        input: PathBuf,

        /// Output image (png, bmp or tiff)
        #[arg(short, long)]
        output: PathBuf,

        /// Message text
        #[arg(short, long, required_unless_present = "message_file", conflicts_with = "message_file")]
        message: Option<String>,

        /// Read the message from a file instead
        #[arg(long)]
        message_file: Option<PathBuf>,

        /// Password for the keyed pixel order (sequential order when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Overrides `embed.policy` from the config
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Colour layout of the output image
        #[arg(long, value_enum, default_value_t = ModeArg::Preserve)]
        mode: ModeArg,
    },

    /// Recover a message hidden with the truncate policy
    Extract {
        /// Image carrying the message
        #[arg(short, long)]
        input: PathBuf,

        /// Password used at embedding time
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Write a channel's LSB plane as a black and white image
    Bitplane {
        #[arg(short, long)]
        input: PathBuf,

        /// Output image; with `--all` a `_red`/`_green`/`_blue` suffix is added
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = ChannelArg::Red)]
        channel: ChannelArg,

        /// Write all three colour planes
        #[arg(long)]
        all: bool,
    },

    /// Embed a repeated message at several payload ratios
    Sweep {
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for `encrypted_rt=<ratio>.png` files
        #[arg(long)]
        out_dir: PathBuf,

        /// Base message, repeated to reach each ratio
        #[arg(short, long)]
        message: String,

        #[arg(short, long, default_value = "0")]
        password: String,

        /// Overrides `sweep.ratios` from the config (comma separated)
        #[arg(long, value_delimiter = ',')]
        ratios: Vec<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let mut config = StegoConfig::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Embed {
            input,
            output,
            message,
            message_file,
            password,
            policy,
            mode,
        } => {
            let message = match (message, message_file) {
                (Some(message), _) => message,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("reading message from {}", path.display()))?,
                (None, None) => bail!("either --message or --message-file is required"),
            };
            let policy = policy.map(EmbedPolicy::from).unwrap_or(config.embed.policy);
            run_embed(
                &config,
                &input,
                &output,
                &message,
                password.as_deref(),
                policy,
                mode.into(),
            )
        }
        Command::Extract { input, password } => {
            let grid = load_grid(&input, ColorMode::Preserve)?;
            let message = extract_text(&grid, password.as_deref(), &config.channel_order()?)?;
            println!("{}", message);
            Ok(())
        }
        Command::Bitplane {
            input,
            output,
            channel,
            all,
        } => run_bitplane(&input, &output, channel.into(), all),
        Command::Sweep {
            input,
            out_dir,
            message,
            password,
            ratios,
        } => {
            override_ratios(&mut config, ratios)?;
            run_sweep(&config, &input, &out_dir, &message, &password)
        }
    }
}

fn run_embed(
    config: &StegoConfig,
    input: &Path,
    output: &Path,
    message: &str,
    password: Option<&str>,
    policy: EmbedPolicy,
    mode: ColorMode,
) -> anyhow::Result<()> {
    let grid = load_grid(input, mode)?;
    let channels = config.channel_order()?;

    // Wrap repeats the bare characters; only truncate gets a terminator.
    let stream = match policy {
        EmbedPolicy::Truncate => bits::encode(message)?,
        EmbedPolicy::Wrap => bits::encode_raw(message)?,
    };
    let order = PixelOrder::for_password(grid.pixel_count(), password);
    let stego = embed(&grid, &stream, &order, policy, &channels)?;
    save_grid(&stego, output)?;

    let available = capacity(&grid, &channels);
    info!(
        "Embedded {} bits into {} ({} bits available, {} order, {:?} policy)",
        stream.len(),
        output.display(),
        available,
        if password.is_some() { "keyed" } else { "sequential" },
        policy
    );
    if policy == EmbedPolicy::Wrap {
        warn!("Wrap-filled images carry no payload boundary and cannot be extracted");
    }
    Ok(())
}

fn run_bitplane(input: &Path, output: &Path, channel: Channel, all: bool) -> anyhow::Result<()> {
    let grid = load_grid(input, ColorMode::Rgb)?;

    if all {
        for (channel, plane) in lsb_planes(&grid) {
            let path = suffixed(output, &channel.name().to_lowercase());
            save_plane(&plane, &path)?;
            info!("Wrote {} LSB plane to {}", channel, path.display());
        }
    } else {
        save_plane(&lsb_plane(&grid, channel), output)?;
        info!("Wrote {} LSB plane to {}", channel, output.display());
    }
    Ok(())
}

/// Replaces the configured ratios with command-line ones and re-validates.
fn override_ratios(config: &mut StegoConfig, ratios: Vec<f64>) -> anyhow::Result<()> {
    if !ratios.is_empty() {
        config.sweep.ratios = ratios;
        config.validate()?;
    }
    Ok(())
}

fn run_sweep(
    config: &StegoConfig,
    input: &Path,
    out_dir: &Path,
    message: &str,
    password: &str,
) -> anyhow::Result<()> {
    if message.is_empty() {
        bail!("sweep needs a non-empty message");
    }

    let grid = load_grid(input, ColorMode::Preserve)?;
    let channels = config.channel_order()?;
    let available = capacity(&grid, &channels);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    for (ratio, result) in sweep(&grid, message, &config.sweep.ratios, password, &channels) {
        match result {
            Ok(stego) => {
                let path = out_dir.join(format!("encrypted_rt={}.png", ratio));
                save_grid(&stego, &path)?;
                info!(
                    "Ratio {}: {} copies of {} available bits -> {}",
                    ratio,
                    sweep_repeats(message, ratio, available)?,
                    available,
                    path.display()
                );
            }
            Err(StegoError::Capacity { needed, capacity }) => {
                warn!(
                    "Ratio {} skipped: needs {} bits, image holds {}",
                    ratio, needed, capacity
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// `dir/name.png` -> `dir/name_<suffix>.png`
fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    path.with_file_name(name)
}
