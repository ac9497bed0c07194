//! Command-line parsing for the green bond client.
//!
//! Parsing stays separate from dispatch (`app`) and from the session logic.

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_INSTRUMENT, Mode};

/// Top-level CLI. Without a subcommand the interactive TUI starts.
#[derive(Debug, Parser)]
#[command(name = "prism", version, about = "Green bond transparency and market client")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options shared by every command. These override the environment.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Backend base URL (overrides PRISM_API_BASE).
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    /// Number of bonds to request (overrides PRISM_BOND_LIMIT).
    #[arg(long, global = true)]
    pub limit: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List bonds, optionally filtered by issuer, bond id, or ISIN.
    Bonds(BondsArgs),
    /// Show one bond with its scores and the impact estimate for a mode.
    Bond(BondArgs),
    /// Analyze a piece of disclosure text.
    Analyze(AnalyzeArgs),
    /// Price returns and latest snapshot for a green bond ETF.
    Market(MarketArgs),
    /// Launch the interactive TUI (same as running without a subcommand).
    Tui,
}

#[derive(Debug, Clone, Args)]
pub struct BondsArgs {
    /// Case-insensitive search text.
    #[arg(short, long, default_value = "")]
    pub query: String,
}

#[derive(Debug, Clone, Args)]
pub struct BondArgs {
    /// Bond identifier.
    pub id: String,

    /// Which impact estimate to show.
    #[arg(long, value_enum, default_value_t = Mode::Rule)]
    pub impact_mode: Mode,
}

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    /// Disclosure text to analyze.
    #[arg(short, long)]
    pub text: String,

    /// Claimed CO₂ impact in tons. Non-numeric values are ignored.
    #[arg(long)]
    pub claimed: Option<String>,

    /// Scoring mode (defaults to rule on the backend side).
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,
}

#[derive(Debug, Clone, Args)]
pub struct MarketArgs {
    /// Instrument id (grnb or bgrn).
    #[arg(short, long, default_value = DEFAULT_INSTRUMENT)]
    pub instrument: String,

    /// Look-back range (3M, 6M, 1Y, 3Y). Unknown labels use 365 days.
    #[arg(short, long, default_value = "1Y")]
    pub range: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["prism"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn global_overrides_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["prism", "bonds", "--query", "acme", "--limit", "50"]).unwrap();
        assert_eq!(cli.global.limit, Some(50));
        match cli.command {
            Some(Command::Bonds(args)) => assert_eq!(args.query, "acme"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn market_range_uses_labels() {
        let cli = Cli::try_parse_from(["prism", "market", "--range", "3M", "-i", "bgrn"]).unwrap();
        match cli.command {
            Some(Command::Market(args)) => {
                assert_eq!(args.range, "3M");
                assert_eq!(args.instrument, "bgrn");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn market_accepts_unknown_range_label() {
        let cli = Cli::try_parse_from(["prism", "market", "--range", "5Y"]).unwrap();
        match cli.command {
            Some(Command::Market(args)) => assert_eq!(args.range, "5Y"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn analyze_keeps_raw_claimed_string() {
        let cli = Cli::try_parse_from([
            "prism", "analyze", "--text", "Solar", "--claimed", "lots", "--mode", "ml",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Analyze(args)) => {
                assert_eq!(args.claimed.as_deref(), Some("lots"));
                assert_eq!(args.mode, Some(Mode::Ml));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn bond_defaults_to_rule_mode() {
        let cli = Cli::try_parse_from(["prism", "bond", "GB-1"]).unwrap();
        match cli.command {
            Some(Command::Bond(args)) => {
                assert_eq!(args.id, "GB-1");
                assert_eq!(args.impact_mode, Mode::Rule);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
