//! `screenmark` - CLI for taking watermarked screenshots
//!
//! With no subcommand the binary performs one capture run and prints a line
//! for every file it writes.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;

use screenmark::cli::{CaptureCommand, Cli, Command, ConfigCommand, DisplaysCommand};
use screenmark::{
    describe_displays, init_logging, AddressResolver, CachedResolver, Config, Session,
    SessionOptions, UdpProbe, XcapDisplays,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config_path = cli.config.clone();
    match cli.command_or_default() {
        Command::Capture(cmd) => {
            let config = Config::load_from(config_path).context("loading configuration")?;
            handle_capture(config, &cmd)
        }
        Command::Displays(cmd) => handle_displays(&cmd),
        Command::Config(cmd) => handle_config(config_path, cmd),
    }
}

fn handle_capture(mut config: Config, cmd: &CaptureCommand) -> Result<()> {
    cmd.apply(&mut config);

    let options = SessionOptions::from_config(&config)?;
    let probe = UdpProbe::new(config.probe_address()?);
    let resolver: Box<dyn AddressResolver> = if config.network.resolve_per_display {
        Box::new(probe)
    } else {
        Box::new(CachedResolver::new(probe))
    };
    let displays = XcapDisplays::enumerate()?;

    let session = Session::new(displays, resolver, options);
    session.run(|shot| println!("[*] Screenshot Written: {}", shot.path.display()))?;
    Ok(())
}

fn handle_displays(cmd: &DisplaysCommand) -> Result<()> {
    let displays = XcapDisplays::enumerate()?;
    let infos = describe_displays(&displays)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    if infos.is_empty() {
        println!("No active displays.");
    }
    for info in &infos {
        match &info.label {
            Some(label) => println!("{:>3}  {}  {label}", info.index, info.rect),
            None => println!("{:>3}  {}", info.index, info.rect),
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Watermark]");
                println!("  Text color:         {}", config.watermark.text_color);
                println!("  Scale:              {}", config.watermark.scale);
                println!("  Padding:            {}", config.watermark.padding);
                println!("  Rotation (deg):     {}", config.watermark.rotation_degrees);
                println!("  Time format:        {}", config.watermark.time_format);
                println!();
                println!("[Output]");
                println!("  Directory:          {}", config.output_dir().display());
                println!("  Format:             {}", config.output.format);
                println!();
                println!("[Network]");
                println!("  Probe address:      {}", config.network.probe_address);
                println!(
                    "  Resolve per display: {}",
                    config.network.resolve_per_display
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
