use serde::Deserialize;

/// One row of the climate panel collection, keyed by `ava_id`.
///
/// Every figure is optional: the producer writes `null` where a series had
/// too little data.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PanelStats {
    pub ava_id: String,
    #[serde(default)]
    pub name: String,
    /// Reporting period label, e.g. "1981–2020"
    #[serde(default)]
    pub period: String,
    pub tmean_all_c: Option<f64>,
    pub tmean_summer_c: Option<f64>,
    pub ppt_annual_mm: Option<f64>,
    pub tmean_trend_c_decade: Option<f64>,
    pub ppt_trend_mm_decade: Option<f64>,
    #[serde(default)]
    pub years: Vec<i32>,
    #[serde(default)]
    pub tmean_annual_c: Vec<Option<f64>>,
    #[serde(default)]
    pub ppt_annual_mm_series: Vec<Option<f64>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SuitabilityMeta {
    pub gdd_base_c: Option<f64>,
    #[serde(default)]
    pub growing_season_months: Vec<u8>,
    /// `[first, last]` year of the source series
    #[serde(default)]
    pub years_used: Vec<Option<i32>>,
}

/// Growing-season summary for one region
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Suitability {
    #[serde(default)]
    pub name: String,
    pub avg_gdd_estimated: Option<f64>,
    pub avg_precip_growing_season: Option<f64>,
    pub frost_free_days: Option<f64>,
    pub heat_risk_days: Option<f64>,
    #[serde(default)]
    pub meta: SuitabilityMeta,
}

impl SuitabilityMeta {
    pub fn year_range(&self) -> Option<(i32, i32)> {
        match self.years_used.as_slice() {
            [Some(start), Some(end), ..] => Some((*start, *end)),
            _ => None,
        }
    }
}
