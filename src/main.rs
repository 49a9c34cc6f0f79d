mod cleanup;
mod config;
mod deps;
mod error;
mod install;
mod privilege;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use cleanup::{ConfirmProvider, HeadlessConfirm, InteractiveConfirm};
use config::InstallConfig;
use deps::PackageMapping;
use install::InstallOrchestrator;
use privilege::PrivilegeBroker;
use ui::prelude::*;

/// Install or update the Cursor editor for the current user
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a locally downloaded Cursor AppImage; omit to fetch the
    /// latest stable build
    artifact: Option<PathBuf>,

    /// Skip the runtime smoke test (servers, CI)
    #[arg(long)]
    headless: bool,

    /// Activate debug output
    #[arg(short, long)]
    debug: bool,

    /// Emit machine-readable JSON events instead of text
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let format = if cli.json {
        ui::OutputFormat::Json
    } else {
        ui::OutputFormat::Text
    };
    ui::init(format, !cli.json);
    ui::set_debug_mode(cli.debug);

    if let Err(e) = run(cli) {
        emit(
            Level::Error,
            "setup.fatal",
            &format!("{} {e:#}", char::from(NerdFont::Cross)),
            None,
        );
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = InstallConfig::resolve()?;
    let broker = PrivilegeBroker::detect()?;
    let mapping = PackageMapping::for_manager(privilege::NativeManager::detect());

    emit(
        Level::Info,
        "setup.start",
        &format!(
            "{} Installing Cursor for {} ({})",
            char::from(NerdFont::Gear),
            config.user,
            config.home.display()
        ),
        None,
    );

    let confirm: Box<dyn ConfirmProvider> = if cli.headless {
        Box::new(HeadlessConfirm)
    } else {
        Box::new(InteractiveConfirm)
    };

    InstallOrchestrator::new(&config, &broker, mapping, confirm, cli.headless).run(cli.artifact)
}
