//! Impact estimate selection.
//!
//! A bond can carry two impact estimates: the rule-based one (which may have a
//! null `predicted` value) and the ML intensity model's. The active mode
//! decides which one is shown, and the returned copy is tagged with where it
//! came from.

use crate::domain::{ImpactEstimate, ImpactSource, Mode};

/// Pick the estimate to display for `mode`.
///
/// | mode          | usable rule | ml  | result                  |
/// |---------------|-------------|-----|-------------------------|
/// | `ml`          | –           | yes | ml (`ml`)               |
/// | `ml`          | –           | no  | none                    |
/// | `rule`        | yes         | –   | rule (`rule`)           |
/// | `rule`        | no          | yes | ml (`ml_fallback`)      |
/// | `blend`       | yes         | –   | rule (`rule`)           |
/// | `blend`       | no          | yes | ml (`ml`)               |
///
/// A rule estimate is usable only when its `predicted` value is present.
/// Inputs are never modified; the numeric fields are copied verbatim.
pub fn choose_impact(
    rule: Option<&ImpactEstimate>,
    ml: Option<&ImpactEstimate>,
    mode: Mode,
) -> Option<ImpactEstimate> {
    let usable_rule = rule.filter(|r| r.predicted.is_some());

    match mode {
        Mode::Ml => ml.map(|m| tagged(m, ImpactSource::Ml)),
        Mode::Rule => match usable_rule {
            Some(r) => Some(tagged(r, ImpactSource::Rule)),
            None => ml.map(|m| tagged(m, ImpactSource::MlFallback)),
        },
        Mode::Blend => match usable_rule {
            Some(r) => Some(tagged(r, ImpactSource::Rule)),
            None => ml.map(|m| tagged(m, ImpactSource::Ml)),
        },
    }
}

fn tagged(estimate: &ImpactEstimate, source: ImpactSource) -> ImpactEstimate {
    ImpactEstimate {
        source: Some(source),
        ..estimate.clone()
    }
}
