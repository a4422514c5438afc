//! Formatted, unit-aware fields for the info box and the detail panel.

use crate::data::records::{PanelStats, Suitability};
use crate::feature::{Feature, FeatureId};
use crate::selection::units::{self, fmt_grouped, fmt_number, fmt_signed, UnitMode, PLACEHOLDER};
use chrono::NaiveDate;

pub const HOVER_PROMPT: &str = "Move your mouse over an AVA";
pub const NO_CLIMATE: &str = "No climate stats found for this AVA.";
pub const NO_SUITABILITY: &str = "No suitability stats found for this AVA.";

const DEFAULT_GDD_BASE_C: f64 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct PanelField {
    pub label: &'static str,
    pub value: String,
    pub unit: &'static str,
    pub note: Option<String>,
    /// False for figures the source cannot produce yet
    pub enabled: bool,
}

impl PanelField {
    fn new(label: &'static str, value: String, unit: &'static str) -> Self {
        Self {
            label,
            value,
            unit,
            note: None,
            enabled: true,
        }
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClimateView {
    pub name: String,
    pub period: String,
    pub fields: Vec<PanelField>,
    /// Annual mean temperature in display units, gaps dropped
    pub series: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SuitabilityView {
    pub note: String,
    pub fields: Vec<PanelField>,
}

/// One panel section: still in flight, known to be absent, or ready
#[derive(Clone, Debug, PartialEq)]
pub enum Section<T> {
    Loading,
    Missing(&'static str),
    Ready(T),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelView {
    pub id: FeatureId,
    pub title: String,
    pub climate: Section<ClimateView>,
    pub suitability: Section<SuitabilityView>,
    /// Nested sub-feature count once loaded
    pub nested: Option<usize>,
}

pub fn climate_view(stats: &PanelStats, mode: UnitMode) -> ClimateView {
    let t_unit = mode.temperature_unit();
    let p_unit = mode.precipitation_unit();
    let (precip_digits, precip_trend_digits) = match mode {
        UnitMode::Metric => (0, 1),
        UnitMode::Imperial => (1, 2),
    };

    let fields = vec![
        PanelField::new("Mean temp (all year)", fmt_number(stats.tmean_all_c.map(|c| mode.temperature(c)), 1), t_unit),
        PanelField::new("Mean temp (Jun–Aug)", fmt_number(stats.tmean_summer_c.map(|c| mode.temperature(c)), 1), t_unit),
        PanelField::new(
            "Annual precip",
            fmt_number(stats.ppt_annual_mm.map(|mm| mode.precipitation(mm)), precip_digits),
            p_unit,
        ),
        PanelField::new(
            "Temp trend",
            fmt_signed(stats.tmean_trend_c_decade.map(|c| mode.temperature_delta(c)), 2),
            t_unit,
        )
        .note("per decade"),
        PanelField::new(
            "Precip trend",
            fmt_signed(stats.ppt_trend_mm_decade.map(|mm| mode.precipitation(mm)), precip_trend_digits),
            p_unit,
        )
        .note("per decade"),
    ];

    let series = stats
        .tmean_annual_c
        .iter()
        .flatten()
        .filter(|c| c.is_finite())
        .map(|&c| mode.temperature(c))
        .collect();

    ClimateView {
        name: stats.name.clone(),
        period: if stats.period.is_empty() { PLACEHOLDER.to_string() } else { stats.period.clone() },
        fields,
        series,
    }
}

pub fn suitability_view(s: &Suitability, mode: UnitMode) -> SuitabilityView {
    let note = match s.meta.year_range() {
        Some((start, end)) => format!("AVA-scale summary ({start}–{end})."),
        None => format!("AVA-scale summary ({PLACEHOLDER})."),
    };
    let base = s.meta.gdd_base_c.filter(|b| b.is_finite()).unwrap_or(DEFAULT_GDD_BASE_C);
    let precip_digits = match mode {
        UnitMode::Metric => 0,
        UnitMode::Imperial => 2,
    };

    let mut frost = PanelField::new("Frost-free days", fmt_number(s.frost_free_days, 0), "")
        .note("Requires PRISM daily Tmin");
    frost.enabled = s.frost_free_days.is_some();
    let mut heat = PanelField::new("Heat-risk days (>35°C)", fmt_number(s.heat_risk_days, 0), "")
        .note("Requires PRISM daily Tmax");
    heat.enabled = s.heat_risk_days.is_some();

    SuitabilityView {
        note,
        fields: vec![
            // Degree-days stay numeric in both unit systems
            PanelField::new("Avg GDD (est.)", fmt_number(s.avg_gdd_estimated, 0), "")
                .note(format!("Base {base}°C · growing season")),
            PanelField::new(
                "Avg precip (growing season)",
                fmt_number(s.avg_precip_growing_season.map(|mm| mode.precipitation(mm)), precip_digits),
                mode.precipitation_unit(),
            )
            .note("Sum of monthly precip"),
            frost,
            heat,
        ],
    }
}

/// Info box lines for a hovered feature
pub fn hover_lines(feature: &Feature, area_sq_m: f64) -> Vec<String> {
    let created = feature.created.as_deref().map(pretty_date).unwrap_or_else(|| "Unknown".to_string());
    vec![
        format!("AVA: {}", feature.name),
        format!("Date created: {created}"),
        format!(
            "Area: {} km² ({} mi²)",
            fmt_grouped(Some(units::sq_m_to_km2(area_sq_m))),
            fmt_grouped(Some(units::sq_m_to_mi2(area_sq_m)))
        ),
    ]
}

/// `1984-06-07` (optionally with a time suffix) becomes `June 7, 1984`;
/// anything unparseable comes back as given
pub fn pretty_date(raw: &str) -> String {
    let raw = raw.trim();
    let parsed = raw
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok());

    match parsed {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::SuitabilityMeta;
    use crate::feature::square;

    fn stats() -> PanelStats {
        PanelStats {
            ava_id: "red_mountain".into(),
            name: "Red Mountain".into(),
            period: "1981–2020".into(),
            tmean_all_c: Some(12.0),
            tmean_summer_c: Some(24.0),
            ppt_annual_mm: Some(254.0),
            tmean_trend_c_decade: Some(0.3),
            ppt_trend_mm_decade: None,
            tmean_annual_c: vec![Some(11.5), None, Some(12.5)],
            ..Default::default()
        }
    }

    fn value<'a>(fields: &'a [PanelField], label: &str) -> &'a str {
        &fields.iter().find(|f| f.label == label).unwrap().value
    }

    #[test]
    fn test_climate_metric() {
        let view = climate_view(&stats(), UnitMode::Metric);
        assert_eq!(value(&view.fields, "Mean temp (all year)"), "12.0");
        assert_eq!(value(&view.fields, "Annual precip"), "254");
        assert_eq!(value(&view.fields, "Temp trend"), "+0.30");
        assert_eq!(value(&view.fields, "Precip trend"), PLACEHOLDER);
        assert_eq!(view.series, vec![11.5, 12.5]);
    }

    #[test]
    fn test_climate_imperial() {
        let view = climate_view(&stats(), UnitMode::Imperial);
        assert_eq!(value(&view.fields, "Mean temp (all year)"), "53.6");
        assert_eq!(value(&view.fields, "Mean temp (Jun–Aug)"), "75.2");
        assert_eq!(value(&view.fields, "Annual precip"), "10.0");
        // 0.3 * 9/5, no +32
        assert_eq!(value(&view.fields, "Temp trend"), "+0.54");
        assert_eq!(view.fields[0].unit, "°F");
    }

    #[test]
    fn test_suitability_units() {
        let s = Suitability {
            name: "Red Mountain".into(),
            avg_gdd_estimated: Some(1650.4),
            avg_precip_growing_season: Some(50.8),
            meta: SuitabilityMeta {
                gdd_base_c: None,
                years_used: vec![Some(1981), Some(2020)],
                ..Default::default()
            },
            ..Default::default()
        };

        let metric = suitability_view(&s, UnitMode::Metric);
        assert_eq!(metric.note, "AVA-scale summary (1981–2020).");
        assert_eq!(metric.fields[0].value, "1650");
        assert_eq!(metric.fields[0].note.as_deref(), Some("Base 10°C · growing season"));
        assert_eq!(metric.fields[1].value, "51");
        assert!(!metric.fields[2].enabled);

        let imperial = suitability_view(&s, UnitMode::Imperial);
        assert_eq!(imperial.fields[0].value, "1650");
        assert_eq!(imperial.fields[1].value, "2.00");
        assert_eq!(imperial.fields[1].unit, "in");
    }

    #[test]
    fn test_hover_lines() {
        let feature = square("a", -120.0, 46.0, 0.5).with_created("1984-06-07T00:00:00Z");
        let lines = hover_lines(&feature, 2_589_988.110336 * 1500.0);
        assert_eq!(lines[0], "AVA: a");
        assert_eq!(lines[1], "Date created: June 7, 1984");
        assert_eq!(lines[2], "Area: 3,885 km² (1,500 mi²)");

        let undated = square("b", 0.0, 0.0, 0.1);
        assert_eq!(hover_lines(&undated, 0.0)[1], "Date created: Unknown");
    }

    #[test]
    fn test_pretty_date_fallbacks() {
        assert_eq!(pretty_date("06/07/1984"), "June 7, 1984");
        assert_eq!(pretty_date("circa 1984"), "circa 1984");
        assert_eq!(pretty_date("1984"), "1984");
    }
}
