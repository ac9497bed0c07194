//! Domain types used throughout the client.
//!
//! This module defines:
//!
//! - bond listing/detail payloads (`BondRecord`, `BondDetail`, `ScoreBundle`)
//! - impact estimates and scoring modes (`ImpactEstimate`, `ImpactSource`, `Mode`)
//! - text analysis payloads (`AnalyzeRequest`, `AnalysisResult`)
//! - market data (`PricePoint`, `MarketSummary`, `Horizon`, `Instrument`)

mod lenient;
pub mod types;

pub use types::*;
