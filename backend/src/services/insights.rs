//! Seasonal dengue advisories

use rand::seq::SliceRandom;
use rand::Rng;

const RAINY_SEASON: &str = "🌧️ Rainy season conditions are favorable for mosquito breeding. Increased rainfall creates more stagnant water sources.";
const SUMMER: &str =
    "🌡️ Higher temperatures during summer months can accelerate mosquito development cycles.";
const GENERIC: &str = "🌤️ Current weather patterns suggest moderate mosquito activity. Monitor standing water sources.";

const ADDITIONAL: &[&str] = &[
    "💧 High humidity levels create ideal conditions for mosquito survival and breeding.",
    "🌡️ Temperature fluctuations can affect mosquito activity patterns throughout the day.",
    "🌧️ Recent rainfall increases the number of potential breeding sites in the area.",
    "🦟 Stagnant water in containers, tires, and plant pots are common breeding grounds.",
    "🌡️ Optimal mosquito breeding temperature is between 25-30°C, typical in this region.",
];

/// Advisory for `month` (1-12)
pub fn seasonal_insight(month: u32) -> &'static str {
    match month {
        5..=10 => RAINY_SEASON,
        3 | 4 => SUMMER,
        _ => GENERIC,
    }
}

/// Seasonal advisory followed by one general tip
pub fn seasonal_insights<R: Rng + ?Sized>(month: u32, rng: &mut R) -> Vec<String> {
    let mut insights = vec![seasonal_insight(month).to_string()];
    if let Some(extra) = ADDITIONAL.choose(rng) {
        insights.push(extra.to_string());
    }
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_season_boundaries() {
        assert_eq!(seasonal_insight(5), RAINY_SEASON);
        assert_eq!(seasonal_insight(10), RAINY_SEASON);
        assert_eq!(seasonal_insight(3), SUMMER);
        assert_eq!(seasonal_insight(4), SUMMER);
        assert_eq!(seasonal_insight(12), GENERIC);
        assert_eq!(seasonal_insight(1), GENERIC);
    }

    #[test]
    fn test_two_insights() {
        let mut rng = StdRng::seed_from_u64(9);
        let insights = seasonal_insights(7, &mut rng);
        assert_eq!(insights.len(), 2);
        assert!(ADDITIONAL.contains(&insights[1].as_str()));
    }
}
