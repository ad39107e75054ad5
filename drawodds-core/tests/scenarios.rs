use drawodds_core::{
    BundledLoader, DrawEngine, EngineConfig, OddsTable, ReferenceData, Residency, Severity,
    Strategy, StrategyCriteria, combined_odds, generate_recommendations, summarize,
};

const CACHE_ARCHERY: &str = r#"{
    "jurisdictions": { "utah": { "name": "Utah", "species": { "elk": {
        "units": { "cache": { "name": "Cache", "quality": "High", "access": "Good" } },
        "hunt_types": ["archery"]
    } } } },
    "odds": { "utah": { "elk": { "cache": { "archery": {
        "resident": { "0": 20, "5": 67, "10": 95 }
    } } } } }
}"#;

fn criteria(
    jurisdictions: &[&str],
    species: &[&str],
    min_odds: u8,
    points: u32,
) -> StrategyCriteria {
    StrategyCriteria {
        jurisdictions: jurisdictions.iter().map(ToString::to_string).collect(),
        species: species.iter().map(ToString::to_string).collect(),
        hunt_types: Vec::new(),
        min_odds,
        points,
    }
}

#[test]
fn sparse_table_resolves_exact_and_interpolated_levels() {
    let data = ReferenceData::from_json(CACHE_ARCHERY).unwrap();
    let engine = DrawEngine::new(data, EngineConfig::default());
    let at = |points| {
        let query = engine
            .query("utah", "elk", "cache", "archery", Residency::Resident, points)
            .unwrap();
        engine.resolve_odds(&query).unwrap()
    };
    assert_eq!(at(5), Some(67));
    assert_eq!(at(7), Some(78));
    assert_eq!(at(0), Some(20));
}

#[test]
fn midpoint_interpolation_rounds() {
    let table = OddsTable::from_levels([(3, 45), (5, 65)]);
    assert_eq!(table.odds_at(4.0), Some(55));
}

#[test]
fn recommendation_tiers_for_reference_points() {
    let cfg = EngineConfig::default();
    let high = generate_recommendations(85, 5, None, &cfg);
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].severity, Severity::Success);
    let low = generate_recommendations(10, 5, None, &cfg);
    assert_eq!(low[0].severity, Severity::Danger);
}

#[test]
fn conservative_antelope_scan() {
    let engine = DrawEngine::from_loader(&BundledLoader).unwrap();
    let found = engine
        .find_opportunities(
            &criteria(&["wyoming"], &["antelope"], 80, 0),
            Strategy::Conservative,
        )
        .unwrap();
    assert!(!found.is_empty());
    assert!(found.iter().all(|o| o.odds >= 80));
    assert!(found.windows(2).all(|w| w[0].odds >= w[1].odds));
    assert_eq!(found[0].unit, "area19");
}

#[test]
fn every_strategy_respects_cap_and_filter() {
    let engine = DrawEngine::from_loader(&BundledLoader).unwrap();
    let all = ["utah", "colorado", "wyoming", "montana", "idaho", "arizona", "nevada"];
    let species = ["elk", "deer", "antelope", "moose", "sheep", "goat", "bear"];
    for strategy in Strategy::ALL {
        for points in [0, 3, 8, 15] {
            let found = engine
                .find_opportunities(&criteria(&all, &species, 0, points), strategy)
                .unwrap();
            assert!(found.len() <= engine.config().max_results);
            for o in &found {
                assert!(
                    strategy.admits(o.odds, o.quality, o.min_points, points),
                    "{strategy} admitted {o:?}"
                );
                assert_eq!(o.max_odds, o.odds + 10);
            }
            let summary = summarize(&found, strategy);
            assert_eq!(summary.count, found.len());
        }
    }
}

#[test]
fn unreachable_minimum_is_empty() {
    let engine = DrawEngine::from_loader(&BundledLoader).unwrap();
    let found = engine
        .find_opportunities(
            &criteria(&["utah", "colorado"], &["elk", "deer"], 100, 0),
            Strategy::Balanced,
        )
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn combined_draws_across_applications() {
    assert_eq!(combined_odds(&[67, 85]), 95);
}
