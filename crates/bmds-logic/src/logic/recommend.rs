use serde::{Deserialize, Serialize};

use super::domain::Bin;
use super::ClassifiedModel;
use crate::config::DEFAULT_SUFFICIENTLY_CLOSE_BMDL;

/// Controls which classified models may be recommended and how they are ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderSettings {
    pub enabled: bool,
    pub recommend_questionable: bool,
    /// Max/min BMDL ratio up to which candidates are ranked by AIC instead of BMDL.
    pub sufficiently_close_bmdl: f64,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            recommend_questionable: false,
            sufficiently_close_bmdl: DEFAULT_SUFFICIENTLY_CLOSE_BMDL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationBasis {
    LowestAic,
    LowestBmdl,
}

impl RecommendationBasis {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LowestAic => "Lowest AIC",
            Self::LowestBmdl => "Lowest BMDL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub model_index: Option<usize>,
    pub model_name: Option<String>,
    pub basis: Option<RecommendationBasis>,
    pub reason: String,
}

impl Recommendation {
    fn none(reason: impl Into<String>) -> Self {
        Self {
            model_index: None,
            model_name: None,
            basis: None,
            reason: reason.into(),
        }
    }
}

fn lowest_by<F>(models: &[ClassifiedModel], candidates: &[usize], key: F) -> Option<usize>
where
    F: Fn(&ClassifiedModel) -> Option<f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for &index in candidates {
        let Some(value) = key(&models[index]) else {
            continue;
        };
        if best.map_or(true, |(_, current)| value < current) {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}

fn positive_bmdl(model: &ClassifiedModel) -> Option<f64> {
    model
        .diagnostics
        .bmdl
        .filter(|value| value.is_finite() && *value > 0.0)
}

fn finite_aic(model: &ClassifiedModel) -> Option<f64> {
    model.diagnostics.aic.filter(|value| value.is_finite())
}

/// Pick a single model from a classified batch.
///
/// Candidates are viable models (and questionable ones when allowed). When candidate BMDLs span
/// more than `sufficiently_close_bmdl`, the lowest BMDL wins; otherwise the lowest AIC wins.
/// Ties go to the earlier model.
pub fn recommend(models: &[ClassifiedModel], settings: &RecommenderSettings) -> Recommendation {
    if !settings.enabled {
        return Recommendation::none("Recommendation disabled");
    }

    let allowed = |bin: Bin| match bin {
        Bin::Viable => true,
        Bin::Questionable => settings.recommend_questionable,
        Bin::Unusable => false,
    };

    let candidates: Vec<usize> = models
        .iter()
        .enumerate()
        .filter(|(_, model)| allowed(model.classification.overall_bin))
        .map(|(index, _)| index)
        .collect();

    if candidates.is_empty() {
        return Recommendation::none("No models eligible for recommendation");
    }

    let bmdls: Vec<f64> = candidates
        .iter()
        .filter_map(|&index| positive_bmdl(&models[index]))
        .collect();
    let spread = match (
        bmdls.iter().copied().reduce(f64::min),
        bmdls.iter().copied().reduce(f64::max),
    ) {
        (Some(min), Some(max)) => max / min,
        _ => 1.0,
    };

    let (basis, chosen) = if spread > settings.sufficiently_close_bmdl {
        (
            RecommendationBasis::LowestBmdl,
            lowest_by(models, &candidates, positive_bmdl),
        )
    } else {
        (
            RecommendationBasis::LowestAic,
            lowest_by(models, &candidates, finite_aic),
        )
    };

    match chosen {
        Some(index) => Recommendation {
            model_index: Some(index),
            model_name: Some(models[index].name.clone()),
            basis: Some(basis),
            reason: match basis {
                RecommendationBasis::LowestBmdl => format!(
                    "BMDL range ratio {:.2} exceeds {}; lowest BMDL selected",
                    spread, settings.sufficiently_close_bmdl
                ),
                RecommendationBasis::LowestAic => {
                    "BMDLs sufficiently close; lowest AIC selected".to_string()
                }
            },
        },
        None => Recommendation::none(format!(
            "No candidate reports a usable value for {}",
            basis.label()
        )),
    }
}
