//! Top-level application orchestration.
//!
//! `src/main.rs` only maps the result of [`run`] to an exit code. This module
//! parses the command line, resolves settings, installs logging, builds the
//! async runtime, and dispatches to the one-shot commands or the TUI.

use std::path::Path;

use clap::Parser;
use tokio::runtime::Runtime;

use crate::cli::{AnalyzeArgs, BondArgs, BondsArgs, Cli, Command, MarketArgs};
use crate::config::Settings;
use crate::data::{HttpApi, PrismApi};
use crate::domain::{Horizon, Instrument};
use crate::error::AppError;
use crate::logging::{self, LogTarget};
use crate::report;
use crate::session::{
    BondSession, MarketKey, MarketSession, Resolution, analysis, bonds, market,
};

/// Entry point for the `prism` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = Settings::from_env()
        .with_api_base(cli.global.api_base)
        .with_bond_limit(cli.global.limit);

    match cli.command {
        None | Some(Command::Tui) => handle_tui(settings),
        Some(command) => handle_command(command, &settings),
    }
}

fn runtime() -> Result<Runtime, AppError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))
}

fn handle_tui(settings: Settings) -> Result<(), AppError> {
    let target = match settings.log_file.as_deref() {
        Some(path) => LogTarget::File(Path::new(path)),
        None => LogTarget::Off,
    };
    logging::init(target)?;

    let api = HttpApi::from_settings(&settings)?;
    let rt = runtime()?;
    tracing::info!(api_base = %settings.api_base, "starting TUI");
    crate::tui::run(&settings, api, rt.handle().clone())
}

fn handle_command(command: Command, settings: &Settings) -> Result<(), AppError> {
    logging::init(LogTarget::Stderr)?;
    let api = HttpApi::from_settings(settings)?;
    let rt = runtime()?;

    let output = rt.block_on(async {
        match command {
            Command::Bonds(args) => bonds_report(&api, settings.bond_limit, &args).await,
            Command::Bond(args) => bond_report(&api, &args).await,
            Command::Analyze(args) => analysis_report(&api, &args).await,
            Command::Market(args) => market_report(&api, &args).await,
            Command::Tui => Ok(String::new()),
        }
    })?;

    print!("{output}");
    Ok(())
}

async fn bonds_report(api: &dyn PrismApi, limit: usize, args: &BondsArgs) -> Result<String, AppError> {
    let mut session = BondSession::default();
    let ticket = session.request_list(limit);
    let (ticket, result) = bonds::load_list(api, ticket).await;
    if let Resolution::Degraded(reason) = session.apply_list(&ticket, result) {
        return Err(AppError::new(3, format!("Bond list unavailable: {reason}")));
    }

    session.set_query(args.query.as_str());
    Ok(report::format_bond_list(&session.visible()))
}

async fn bond_report(api: &dyn PrismApi, args: &BondArgs) -> Result<String, AppError> {
    let mut session = BondSession::new(args.impact_mode);
    let Some(ticket) = session.select(&args.id) else {
        return Ok(String::new());
    };

    let (ticket, result) = bonds::load_detail(api, ticket).await;
    let applied = session.apply_detail(&ticket, result);
    if let Resolution::Degraded(reason) = applied.resolution {
        return Err(AppError::new(3, format!("Bond detail unavailable: {reason}")));
    }

    if let Some(recompute) = applied.recompute {
        let (recompute, result) = bonds::load_rule(api, recompute).await;
        if let Resolution::Degraded(reason) = session.apply_rule(&recompute, result) {
            tracing::warn!(bond_id = %args.id, %reason, "showing fetched rule estimate");
        }
    }

    let Some(detail) = session.detail() else {
        return Err(AppError::new(3, format!("No detail for bond '{}'", args.id)));
    };
    let impact = session.impact();
    Ok(report::format_bond_detail(detail, session.impact_mode(), impact.as_ref()))
}

async fn analysis_report(api: &dyn PrismApi, args: &AnalyzeArgs) -> Result<String, AppError> {
    if args.text.trim().is_empty() {
        return Err(AppError::new(2, "Analysis text must not be empty."));
    }
    let claimed = args.claimed.as_deref().and_then(analysis::parse_claimed);
    let result = analysis::analyze(api, &args.text, claimed, args.mode).await?;
    Ok(report::format_analysis(&result))
}

async fn market_report(api: &dyn PrismApi, args: &MarketArgs) -> Result<String, AppError> {
    let instrument = Instrument::find(&args.instrument)
        .ok_or_else(|| AppError::new(2, format!("Unknown instrument '{}'", args.instrument)))?;

    let range = Horizon::from_label(&args.range);

    let mut session = MarketSession::new();
    let Some(requests) = session.select(MarketKey::new(instrument.id, range)) else {
        return Ok(String::new());
    };

    let ((series_ticket, prices), (summary_ticket, latest)) = market::load_both(api, requests).await;
    session.apply_series(&series_ticket, prices);
    session.apply_summary(&summary_ticket, latest);

    Ok(report::format_market(
        instrument,
        range,
        session.prices().len(),
        &session.returns(),
        session.summary(),
    ))
}
