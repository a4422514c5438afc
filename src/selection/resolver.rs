use crate::feature::Feature;
use crate::selection::area::AreaCache;

/// Pick the feature the pointer most plausibly means.
///
/// Overlapping regions nest, so the smallest area wins. Ties keep the first
/// candidate, and a non-finite area ranks as infinitely large. Returns
/// `None` only when there are no candidates.
pub fn resolve<'a, I>(candidates: I, areas: &mut AreaCache) -> Option<&'a Feature>
where
    I: IntoIterator<Item = &'a Feature>,
{
    let mut chosen: Option<(&'a Feature, f64)> = None;

    for feature in candidates {
        let area = areas.area_of(feature);
        let area = if area.is_finite() { area } else { f64::INFINITY };

        match chosen {
            Some((_, best)) if area >= best => {}
            _ => chosen = Some((feature, area)),
        }
    }

    chosen.map(|(feature, _)| feature)
}
