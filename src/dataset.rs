// =============================================================================
// Dataset — In-memory signal & scenario collections
// =============================================================================
//
// Both collections are read from disk exactly once at startup and never
// mutated afterwards. Every query here is a pure read over that snapshot, so
// request handlers share the dataset without any locking.
//
// Load failures are fatal: the caller propagates them out of `main`.
// =============================================================================

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::types::{CombinationCount, Scenario, Signal};

// =============================================================================
// Query filters
// =============================================================================

/// Equality filters for the scenario listing. Absent or empty values impose
/// no constraint.
#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    pub polarity: Option<String>,
    pub likelihood: Option<String>,
}

impl ScenarioFilter {
    /// `true` when the scenario satisfies every provided constraint.
    pub fn matches(&self, scenario: &Scenario) -> bool {
        field_matches(self.polarity.as_deref(), scenario.polarity())
            && field_matches(self.likelihood.as_deref(), scenario.likelihood())
    }
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        None | Some("") => true,
        Some(w) => actual == Some(w),
    }
}

/// Split a comma-separated id list, trimming whitespace and dropping empty
/// tokens. Order and duplicates are kept as given.
pub fn parse_id_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// =============================================================================
// Dataset
// =============================================================================

/// The two collections served by the API, in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    signals: Vec<Signal>,
    scenarios: Vec<Scenario>,
}

impl Dataset {
    pub fn new(signals: Vec<Signal>, scenarios: Vec<Scenario>) -> Self {
        Self { signals, scenarios }
    }

    /// Load both collections from JSON files. Each file must hold an array of
    /// objects.
    pub fn load(signals_path: impl AsRef<Path>, scenarios_path: impl AsRef<Path>) -> Result<Self> {
        let signals: Vec<Signal> = load_collection(signals_path.as_ref())?;
        let scenarios: Vec<Scenario> = load_collection(scenarios_path.as_ref())?;
        Ok(Self::new(signals, scenarios))
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Draw up to `limit` distinct signals at random, in random order.
    pub fn sample_signals<R: Rng + ?Sized>(&self, rng: &mut R, limit: usize) -> Vec<&Signal> {
        let amount = limit.min(self.signals.len());
        let mut indices: Vec<usize> = (0..self.signals.len()).collect();
        let (chosen, _) = indices.partial_shuffle(rng, amount);
        chosen.iter().map(|&i| &self.signals[i]).collect()
    }

    /// Scenarios matching every provided filter, in load order.
    pub fn filter_scenarios(&self, filter: &ScenarioFilter) -> Vec<&Scenario> {
        self.scenarios.iter().filter(|s| filter.matches(s)).collect()
    }

    /// Signals whose `id` appears in the comma-separated `ids` list, in load
    /// order. An absent or blank list returns every signal. Signals without a
    /// string `id` never match.
    pub fn filter_signals_by_ids(&self, ids: Option<&str>) -> Vec<&Signal> {
        let requested: HashSet<&str> = ids
            .map(parse_id_list)
            .unwrap_or_default()
            .into_iter()
            .collect();
        if requested.is_empty() {
            return self.signals.iter().collect();
        }

        self.signals
            .iter()
            .filter(|s| s.id().is_some_and(|id| requested.contains(id)))
            .collect()
    }

    /// Count scenarios per `(polarity, likelihood)` pair, sorted by pair.
    pub fn combination_counts(&self) -> Vec<CombinationCount> {
        let mut counts: BTreeMap<(Option<&str>, Option<&str>), usize> = BTreeMap::new();
        for s in &self.scenarios {
            *counts.entry((s.polarity(), s.likelihood())).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|((polarity, likelihood), count)| CombinationCount {
                polarity: polarity.map(str::to_string),
                likelihood: likelihood.map(str::to_string),
                count,
            })
            .collect()
    }
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset from {}", path.display()))?;

    let records: Vec<T> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse dataset from {}", path.display()))?;

    info!(path = %path.display(), records = records.len(), "dataset loaded");
    Ok(records)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn signal(id: &str) -> Signal {
        serde_json::from_value(json!({ "id": id, "title": format!("Signal {id}") })).unwrap()
    }

    fn scenario(id: &str, polarity: &str, likelihood: &str) -> Scenario {
        serde_json::from_value(json!({
            "id": id,
            "polarity": polarity,
            "likelihood": likelihood,
        }))
        .unwrap()
    }

    fn ids<'a>(signals: impl IntoIterator<Item = &'a Signal>) -> Vec<&'a str> {
        signals.into_iter().filter_map(Signal::id).collect()
    }

    fn sample_dataset() -> Dataset {
        Dataset::new(
            ["a", "b", "c", "d", "e", "f", "g", "h"].iter().map(|i| signal(i)).collect(),
            vec![
                scenario("s1", "positive", "probable"),
                scenario("s2", "negative", "possible"),
                scenario("s3", "negative", "probable"),
                scenario("s4", "positive", "plausible"),
                scenario("s5", "negative", "probable"),
            ],
        )
    }

    #[test]
    fn parse_id_list_trims_and_drops_empty_tokens() {
        assert_eq!(parse_id_list(" a, ,b ,,c "), vec!["a", "b", "c"]);
        assert_eq!(parse_id_list("a,a"), vec!["a", "a"]);
        assert!(parse_id_list(" , ").is_empty());
    }

    #[test]
    fn filter_signals_by_ids_keeps_dataset_order() {
        let ds = Dataset::new(vec![signal("a"), signal("b"), signal("c")], vec![]);
        let out = ds.filter_signals_by_ids(Some("c, a"));
        assert_eq!(ids(out), vec!["a", "c"]);
    }

    #[test]
    fn filter_signals_without_ids_returns_everything() {
        let ds = sample_dataset();
        let all = ids(ds.signals());
        assert_eq!(ids(ds.filter_signals_by_ids(None)), all);
        assert_eq!(ids(ds.filter_signals_by_ids(Some(""))), all);
        assert_eq!(ids(ds.filter_signals_by_ids(Some(" ,, "))), all);
    }

    #[test]
    fn queries_borrow_from_the_loaded_snapshot() {
        let ds = sample_dataset();
        let all = ds.filter_signals_by_ids(None);
        assert!(all.iter().zip(ds.signals()).all(|(a, b)| std::ptr::eq(*a, b)));

        let picked = ds.filter_signals_by_ids(Some("c"));
        assert!(std::ptr::eq(picked[0], &ds.signals()[2]));

        let scenarios = ds.filter_scenarios(&ScenarioFilter::default());
        assert!(std::ptr::eq(scenarios[0], &ds.scenarios()[0]));
    }

    #[test]
    fn filter_signals_unknown_ids_yield_empty() {
        let ds = sample_dataset();
        assert!(ds.filter_signals_by_ids(Some("zz,yy")).is_empty());
    }

    #[test]
    fn filter_signals_returns_exactly_requested_present_ids() {
        let ds = sample_dataset();
        let out = ds.filter_signals_by_ids(Some("h,b,missing,b,e"));
        assert_eq!(ids(out), vec!["b", "e", "h"]);
    }

    #[test]
    fn signal_without_id_never_matches() {
        let anon: Signal = serde_json::from_value(json!({ "title": "anon" })).unwrap();
        let ds = Dataset::new(vec![anon, signal("a")], vec![]);
        let out = ds.filter_signals_by_ids(Some("a"));
        assert_eq!(ids(out), vec!["a"]);
    }

    #[test]
    fn filter_scenarios_and_composition() {
        let ds = sample_dataset();
        let filter = ScenarioFilter {
            polarity: Some("negative".into()),
            likelihood: Some("probable".into()),
        };
        let out = ds.filter_scenarios(&filter);
        let got: Vec<_> = out.iter().map(|s| s.0["id"].as_str().unwrap()).collect();
        assert_eq!(got, vec!["s3", "s5"]);
    }

    #[test]
    fn filter_scenarios_single_constraint() {
        let ds = sample_dataset();
        let filter = ScenarioFilter {
            polarity: None,
            likelihood: Some("probable".into()),
        };
        let out = ds.filter_scenarios(&filter);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|s| s.likelihood() == Some("probable")));
    }

    #[test]
    fn filter_scenarios_is_case_sensitive() {
        let ds = sample_dataset();
        let filter = ScenarioFilter {
            polarity: Some("Negative".into()),
            likelihood: None,
        };
        assert!(ds.filter_scenarios(&filter).is_empty());
    }

    #[test]
    fn filter_scenarios_without_constraints_returns_everything() {
        let ds = sample_dataset();
        let all: Vec<&Scenario> = ds.scenarios().iter().collect();
        assert_eq!(ds.filter_scenarios(&ScenarioFilter::default()), all);

        let blank = ScenarioFilter {
            polarity: Some(String::new()),
            likelihood: Some(String::new()),
        };
        assert_eq!(ds.filter_scenarios(&blank), all);
    }

    #[test]
    fn scenario_missing_field_does_not_match_provided_filter() {
        let partial: Scenario = serde_json::from_value(json!({ "likelihood": "probable" })).unwrap();
        let ds = Dataset::new(vec![], vec![partial]);
        let filter = ScenarioFilter {
            polarity: Some("positive".into()),
            likelihood: None,
        };
        assert!(ds.filter_scenarios(&filter).is_empty());
    }

    #[test]
    fn sample_is_bounded_distinct_and_drawn_from_dataset() {
        let ds = sample_dataset();
        let known: HashSet<&str> = ids(ds.signals()).into_iter().collect();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let out = ds.sample_signals(&mut rng, 5);
            assert_eq!(out.len(), 5);
            let got: HashSet<&str> = ids(out).into_iter().collect();
            assert_eq!(got.len(), 5);
            assert!(got.is_subset(&known));
        }
    }

    #[test]
    fn sample_of_small_dataset_returns_all() {
        let ds = Dataset::new(vec![signal("a"), signal("b"), signal("c")], vec![]);
        let mut rng = StdRng::seed_from_u64(7);
        let out = ds.sample_signals(&mut rng, 5);
        let mut got = ids(out);
        got.sort_unstable();
        assert_eq!(got, vec!["a", "b", "c"]);
    }

    #[test]
    fn sample_of_empty_dataset_is_empty() {
        let ds = Dataset::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(ds.sample_signals(&mut rng, 5).is_empty());
    }

    #[test]
    fn sample_varies_between_calls() {
        let ds = sample_dataset();
        let mut rng = StdRng::seed_from_u64(99);
        let first = ids(ds.sample_signals(&mut rng, 5))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let differs = (0..20).any(|_| {
            let next = ds.sample_signals(&mut rng, 5);
            ids(next) != first
        });
        assert!(differs);
    }

    #[test]
    fn combination_counts_sorted_by_pair() {
        let ds = sample_dataset();
        let counts = ds.combination_counts();
        let flat: Vec<(Option<&str>, Option<&str>, usize)> = counts
            .iter()
            .map(|c| (c.polarity.as_deref(), c.likelihood.as_deref(), c.count))
            .collect();
        assert_eq!(
            flat,
            vec![
                (Some("negative"), Some("possible"), 1),
                (Some("negative"), Some("probable"), 2),
                (Some("positive"), Some("plausible"), 1),
                (Some("positive"), Some("probable"), 1),
            ]
        );
    }

    #[test]
    fn load_reads_both_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sig_path = dir.path().join("signals.json");
        let sc_path = dir.path().join("scenarios.json");
        std::fs::write(&sig_path, r#"[{"id":"b"},{"id":"a"}]"#).unwrap();
        std::fs::write(
            &sc_path,
            r#"[{"polarity":"negative","likelihood":"high","id":"x"}]"#,
        )
        .unwrap();

        let ds = Dataset::load(&sig_path, &sc_path).unwrap();
        assert_eq!(ids(ds.signals()), vec!["b", "a"]);
        assert_eq!(ds.scenarios().len(), 1);
        assert_eq!(
            serde_json::to_string(&ds.scenarios()[0]).unwrap(),
            r#"{"polarity":"negative","likelihood":"high","id":"x"}"#
        );
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sig_path = dir.path().join("signals.json");
        std::fs::write(&sig_path, "[]").unwrap();

        let err = Dataset::load(&sig_path, dir.path().join("nope.json")).unwrap_err();
        assert!(format!("{err:#}").contains("nope.json"));
    }

    #[test]
    fn load_malformed_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sig_path = dir.path().join("signals.json");
        let sc_path = dir.path().join("scenarios.json");
        std::fs::write(&sig_path, "[{\"id\":").unwrap();
        std::fs::write(&sc_path, "[]").unwrap();

        assert!(Dataset::load(&sig_path, &sc_path).is_err());
    }

    #[test]
    fn load_rejects_non_array_document() {
        let dir = tempfile::tempdir().unwrap();
        let sig_path = dir.path().join("signals.json");
        let sc_path = dir.path().join("scenarios.json");
        std::fs::write(&sig_path, r#"{"id":"a"}"#).unwrap();
        std::fs::write(&sc_path, "[]").unwrap();

        assert!(Dataset::load(&sig_path, &sc_path).is_err());
    }
}
