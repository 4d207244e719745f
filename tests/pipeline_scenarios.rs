use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use diary_recommender::cleaning::{in_major_city, MetadataCleaner};
use diary_recommender::config::RowOverride;
use diary_recommender::nouns::LexiconTagger;
use diary_recommender::pipeline::{self, TrainingOutput, CLUSTERED_FILE, MODEL_FILE};
use diary_recommender::records::{read_diaries, read_diarists, Diarist, RawDiary};
use diary_recommender::{
    DiaryError, ModelBundle, OverrideTables, PipelineConfig, Query, Recommendation, Recommender,
};

const THEMES: [&str; 5] = [
    "Grabbed a latte at the coffee shop, then a pastry from the barista.",
    "Yoga class at the studio, then a smoothie and a new mat.",
    "Groceries at the market: produce, cheese and bread for the week.",
    "Train ticket to the museum, then a concert at the theater.",
    "Dinner at a restaurant with wine, pasta and dessert.",
];

const GROUPS: [(u32, u32); 5] = [
    (23, 30_000),
    (31, 60_000),
    (39, 100_000),
    (47, 160_000),
    (55, 250_000),
];

const DOCS_PER_GROUP: usize = 8;

fn title(group: usize, i: usize) -> String {
    format!("/en-us/money-diary-group-{}-{}", group, i)
}

/// Five well separated age/salary groups of eight diarists. Every group
/// writes about every theme, so coffee shows up in each cluster.
fn write_inputs(dir: &Path) {
    let mut csv = String::from("story_title,occupation,age,location,salary\n");
    let mut jsonl = String::new();
    for (g, &(age, salary)) in GROUPS.iter().enumerate() {
        for i in 0..DOCS_PER_GROUP {
            let jitter = i as i64 - 4;
            let age = age as i64 + jitter / 2;
            let salary = salary as i64 + jitter * 500;
            writeln!(
                csv,
                "{},Analyst,{},\"Austin, TX\",\"${}\"",
                title(g, i),
                age,
                salary
            )
            .unwrap();

            let diary = RawDiary {
                story_title: title(g, i),
                diary_text: vec![
                    format!("Day One — 7 a.m. [Sponsored] {}", THEMES[i % 5]),
                    THEMES[(i + g + 1) % 5].to_string(),
                ],
            };
            writeln!(jsonl, "{}", serde_json::to_string(&diary).unwrap()).unwrap();
        }
    }
    // dropped for a missing age
    csv.push_str("/en-us/money-diary-blank,BLANK,BLANK,Denver,\"$40,000\"\n");
    // no diarist for this one
    jsonl.push_str(r#"{"story_title": "/en-us/orphan", "diary_text": ["Coffee shop"]}"#);
    jsonl.push('\n');

    fs::write(dir.join("diarists.csv"), csv).unwrap();
    fs::write(dir.join("diaries.jsonl"), jsonl).unwrap();
}

fn clean(dir: &Path, overrides: &OverrideTables) -> diary_recommender::Result<Vec<Diarist>> {
    let raw = read_diarists(&dir.join("diarists.csv"))?;
    MetadataCleaner::new(overrides).clean(raw)
}

fn train(dir: &Path) -> TrainingOutput {
    let diarists = clean(dir, &OverrideTables::default()).unwrap();
    let diaries = read_diaries(&dir.join("diaries.jsonl")).unwrap();
    pipeline::train(
        &PipelineConfig::default(),
        diarists,
        &diaries,
        &LexiconTagger::new(),
    )
    .unwrap()
}

#[test]
fn test_cleaned_table_invariants() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let diarists = clean(dir.path(), &OverrideTables::default()).unwrap();

    assert_eq!(diarists.len(), GROUPS.len() * DOCS_PER_GROUP);
    assert!(diarists.iter().all(|d| d.age > 0 && d.salary >= 0.0));
    assert!(diarists.iter().all(|d| d.salary.fract() == 0.0));
    let titles: HashSet<&str> = diarists.iter().map(|d| d.story_title.as_str()).collect();
    assert_eq!(titles.len(), diarists.len());
    assert!(!titles.contains("/en-us/money-diary-blank"));
}

#[test]
fn test_major_city_membership() {
    assert!(in_major_city("New York, NY"));
    assert!(in_major_city("Brooklyn, NY"));
    assert!(!in_major_city("Springfield"));
}

#[test]
fn test_override_for_missing_row_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let overrides = OverrideTables {
        salary: vec![RowOverride {
            row: 999,
            value: 50_000.0,
        }],
        ..OverrideTables::default()
    };
    let err = clean(dir.path(), &overrides).unwrap_err();
    assert!(matches!(err, DiaryError::Config(_)));
}

#[test]
fn test_every_diarist_gets_a_cluster() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let output = train(dir.path());

    assert_eq!(output.labels.len(), output.diarists.len());
    assert!(output.labels.iter().all(|&l| l < 5));
    assert_eq!(output.bundle.clusters.len(), 5);

    // each age/salary group is one cluster
    for group in output.labels.chunks(DOCS_PER_GROUP) {
        let distinct: HashSet<usize> = group.iter().copied().collect();
        assert_eq!(distinct.len(), 1);
    }
    let all: HashSet<usize> = output.labels.iter().copied().collect();
    assert_eq!(all.len(), 5);
}

#[test]
fn test_doc_topic_weights_are_non_negative() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let output = train(dir.path());

    for model in output.bundle.clusters.values() {
        assert_eq!(model.doc_topic().nrows(), DOCS_PER_GROUP);
        assert_eq!(model.doc_topic().ncols(), 5);
        assert!(model.doc_topic().iter().all(|&w| w >= 0.0));
    }
    // the orphan diary is not part of the corpus model
    assert_eq!(output.bundle.corpus.n_documents(), GROUPS.len() * DOCS_PER_GROUP);
}

#[test]
fn test_coffee_reader_gets_three_diaries() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let output = train(dir.path());
    let tagger = LexiconTagger::new();
    let recommender = Recommender::new(&output.bundle, &tagger);

    for text in [
        "I spent the morning at a coffee shop and worked from home,",
        "I spent the morning at a coffee shop and grabbed a latte.",
    ] {
        let query = Query {
            age: 25,
            salary: 50_000.0,
            text: text.to_string(),
        };
        let Recommendation::Ranked { cluster, picks } = recommender.recommend(&query).unwrap()
        else {
            panic!("expected ranked picks for {:?}", text);
        };
        assert!(cluster < 5);
        assert_eq!(picks.len(), 3);

        let urls: HashSet<&str> = picks.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls.len(), 3);
        for pick in &picks {
            assert!(pick.url.starts_with("https://www.refinery29.com/en-us/money-diary-"));
            assert!((0.0..=1.0 + 1e-9).contains(&pick.distance));
        }
        assert!(picks.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(
            picks.iter().map(|p| p.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }
}

#[test]
fn test_empty_and_unknown_text_is_insufficient() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let output = train(dir.path());
    let tagger = LexiconTagger::new();
    let recommender = Recommender::new(&output.bundle, &tagger);

    for text in ["", "   ", "!!! 123", "spreadsheet invoice"] {
        let query = Query {
            age: 25,
            salary: 50_000.0,
            text: text.to_string(),
        };
        let outcome = recommender.recommend(&query).unwrap();
        assert!(
            matches!(outcome, Recommendation::InsufficientText { .. }),
            "{:?} gave {:?}",
            text,
            outcome
        );
    }
}

#[test]
fn test_out_of_range_query_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let output = train(dir.path());
    let tagger = LexiconTagger::new();
    let recommender = Recommender::new(&output.bundle, &tagger);

    let too_young = Query {
        age: 5,
        salary: 50_000.0,
        text: "coffee".to_string(),
    };
    assert!(matches!(
        recommender.recommend(&too_young),
        Err(DiaryError::InvalidQuery(_))
    ));
    let negative = Query {
        age: 30,
        salary: -1.0,
        text: "coffee".to_string(),
    };
    assert!(matches!(
        recommender.recommend(&negative),
        Err(DiaryError::InvalidQuery(_))
    ));
}

#[test]
fn test_saved_bundle_recommends_the_same() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let output = train(dir.path());
    let out_dir = dir.path().join("out");
    let written = output.write_to(&out_dir).unwrap();

    assert!(out_dir.join(MODEL_FILE).exists());
    assert!(out_dir.join(CLUSTERED_FILE).exists());
    assert_eq!(written.len(), 2 + 5);

    let loaded = ModelBundle::load(&out_dir.join(MODEL_FILE)).unwrap();
    assert_eq!(loaded.clusters.len(), 5);

    let tagger = LexiconTagger::new();
    let query = Query {
        age: 25,
        salary: 50_000.0,
        text: "coffee shop latte".to_string(),
    };
    let before = Recommender::new(&output.bundle, &tagger).recommend(&query).unwrap();
    let after = Recommender::new(&loaded, &tagger).recommend(&query).unwrap();
    match (before, after) {
        (
            Recommendation::Ranked { cluster: a, picks: pa },
            Recommendation::Ranked { cluster: b, picks: pb },
        ) => {
            assert_eq!(a, b);
            for (x, y) in pa.iter().zip(&pb) {
                assert_eq!(x.story_title, y.story_title);
                assert!((x.distance - y.distance).abs() < 1e-9);
            }
        }
        other => panic!("expected ranked picks, got {:?}", other),
    }
}

#[test]
fn test_bundle_with_invalid_config_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let output = train(dir.path());
    let path = dir.path().join("edited").join(MODEL_FILE);

    let mut no_picks = output.bundle.clone();
    no_picks.config.recommend.count = 0;
    no_picks.save(&path).unwrap();
    assert!(matches!(ModelBundle::load(&path), Err(DiaryError::Config(_))));

    let mut inverted_ages = output.bundle.clone();
    inverted_ages.config.recommend.min_age = 60;
    inverted_ages.config.recommend.max_age = 30;
    inverted_ages.save(&path).unwrap();
    assert!(matches!(ModelBundle::load(&path), Err(DiaryError::Config(_))));

    output.bundle.save(&path).unwrap();
    assert!(ModelBundle::load(&path).is_ok());
}

#[test]
fn test_stop_word_only_diaries_cannot_be_modeled() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let diarists = clean(dir.path(), &OverrideTables::default()).unwrap();
    let diaries: Vec<RawDiary> = diarists
        .iter()
        .map(|d| RawDiary {
            story_title: d.story_title.clone(),
            diary_text: vec!["It was the and of it, then we were there.".to_string()],
        })
        .collect();

    let err = pipeline::train(
        &PipelineConfig::default(),
        diarists,
        &diaries,
        &LexiconTagger::new(),
    )
    .unwrap_err();
    assert!(matches!(err, DiaryError::ModelFit { .. }), "{}", err);
}
