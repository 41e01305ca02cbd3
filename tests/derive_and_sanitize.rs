//! Integration tests for feature derivation and frame sanitization.

use lifeboat::config::PipelineConfig;
use lifeboat::derive::FeatureDeriver;
use lifeboat::error::PipelineError;
use lifeboat::frame::{Column, ImputedRecord, Sex};
use lifeboat::sanitize::{FeatureSanitizer, OTHER_LEVEL};

fn record(row_id: u32, name: &str, cabin: &str) -> ImputedRecord {
    ImputedRecord {
        row_id,
        pclass: (row_id % 3) as u8 + 1,
        name: name.to_string(),
        sex: if row_id % 2 == 0 { Sex::Female } else { Sex::Male },
        age: 20.0 + (row_id % 30) as f64,
        sibsp: row_id % 3,
        parch: row_id % 2,
        fare: 9.0 + (row_id % 40) as f64,
        cabin: cabin.to_string(),
        embarked: if row_id % 2 == 0 { "S" } else { "C" }.to_string(),
        home_dest: "Missing".to_string(),
        survived: row_id % 2 == 0,
    }
}

fn small_table() -> Vec<ImputedRecord> {
    (0..30)
        .map(|i| {
            let name = format!("Surname{}, Mr. Brian", i % 10);
            let cabin = if i % 3 == 0 { "C85" } else { "Missing" };
            record(i, &name, cabin)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

#[test]
fn cabin_c85_derives_deck_prefix_and_count() {
    let records = vec![
        record(0, "Moore, Mr. Brian", "C85"),
        record(1, "Smith, Mrs. Anna", "Missing"),
    ];
    let frame = FeatureDeriver::derive(&records).unwrap();

    match frame.column("cabin_deck").unwrap() {
        Column::Categorical(v) => {
            assert_eq!(v[0], "C");
            assert_eq!(v[1], "M");
        }
        _ => panic!("expected categorical cabin_deck"),
    }
    match frame.column("cabin_prefix_2").unwrap() {
        Column::Categorical(v) => {
            assert_eq!(v[0], "C8");
            assert_eq!(v[1], "Other");
        }
        _ => panic!("expected categorical cabin_prefix_2"),
    }
    match frame.column("cabin_count").unwrap() {
        Column::Continuous(v) => {
            assert_eq!(v[0], 0.0);
            assert_eq!(v[1], 0.0);
        }
        _ => panic!("expected continuous cabin_count"),
    }
}

#[test]
fn multi_cabin_booking_counts_delimiters() {
    let records = vec![
        record(0, "Moore, Mr. Brian", "C23 C25 C27"),
        record(1, "Smith, Mrs. Anna", "B5"),
    ];
    let frame = FeatureDeriver::derive(&records).unwrap();
    match frame.column("cabin_count").unwrap() {
        Column::Continuous(v) => {
            assert_eq!(v[0], 2.0);
            assert_eq!(v[1], 0.0);
        }
        _ => panic!("expected continuous cabin_count"),
    }
}

#[test]
fn title_and_surname_come_from_the_name_segments() {
    let records = vec![
        record(0, "Moore, Mr. Brian", "Missing"),
        record(1, "Moore, Mrs. Anna", "Missing"),
        record(2, "Smith, Miss. Jane", "Missing"),
    ];
    let frame = FeatureDeriver::derive(&records).unwrap();

    match frame.column("title").unwrap() {
        Column::Categorical(v) => assert_eq!(v, &vec!["Mr", "Mrs", "Miss"]),
        _ => panic!("expected categorical title"),
    }
    // Two Moores, one Smith.
    match frame.column("surname_freq").unwrap() {
        Column::Continuous(v) => assert_eq!(v, &vec![2.0, 2.0, 1.0]),
        _ => panic!("expected continuous surname_freq"),
    }
}

#[test]
fn malformed_name_aborts_derivation() {
    let records = vec![
        record(0, "Moore, Mr. Brian", "Missing"),
        record(1, "No Comma Here", "Missing"),
    ];
    let err = FeatureDeriver::derive(&records).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::MalformedRecord { row_id: 1, .. }
    ));
}

#[test]
fn derivation_is_idempotent() {
    let records = small_table();
    let first = FeatureDeriver::derive(&records).unwrap();
    let second = FeatureDeriver::derive(&records).unwrap();
    assert_eq!(first, second);
}

#[test]
fn leakage_fields_never_enter_the_frame() {
    let frame = FeatureDeriver::derive(&small_table()).unwrap();
    for banned in ["boat", "body", "name", "ticket", "cabin"] {
        assert!(
            frame.column(banned).is_none(),
            "column {} must not be present",
            banned
        );
    }
}

// ---------------------------------------------------------------------------
// Sanitization
// ---------------------------------------------------------------------------

#[test]
fn every_surviving_level_meets_the_support_threshold() {
    let config = PipelineConfig {
        min_level_support: 8,
        ..PipelineConfig::default()
    };
    let frame = FeatureDeriver::derive(&small_table()).unwrap();
    let out = FeatureSanitizer::new(&config).sanitize(&frame).unwrap();

    for (name, column) in out.iter() {
        if let Column::Categorical(values) = column {
            let mut counts = std::collections::HashMap::new();
            for v in values {
                *counts.entry(v.as_str()).or_insert(0usize) += 1;
            }
            for (level, count) in counts {
                assert!(
                    count >= config.min_level_support || level == OTHER_LEVEL,
                    "{}={} has support {} below {}",
                    name,
                    level,
                    count,
                    config.min_level_support
                );
            }
        }
    }
}

#[test]
fn sanitizer_preserves_row_count() {
    let config = PipelineConfig::default();
    let frame = FeatureDeriver::derive(&small_table()).unwrap();
    let out = FeatureSanitizer::new(&config).sanitize(&frame).unwrap();
    assert_eq!(out.n_rows(), frame.n_rows());
    assert!(out.n_cols() <= frame.n_cols());
}

#[test]
fn collapsing_can_make_a_column_droppable() {
    // 28 of one level, a scattering of rare ones: after the rare levels merge
    // into "Other" (2 rows) the ratio 28:2 exceeds the bound and the distinct
    // fraction is small, so the column goes away.
    let config = PipelineConfig {
        min_level_support: 3,
        nzv_freq_ratio: 10.0,
        nzv_unique_pct: 10.0,
        ..PipelineConfig::default()
    };
    let records: Vec<ImputedRecord> = (0..30)
        .map(|i| {
            let cabin = match i {
                0 => "A1",
                1 => "B2",
                _ => "Missing",
            };
            record(i, &format!("Surname{}, Mr. Brian", i % 5), cabin)
        })
        .collect();
    let frame = FeatureDeriver::derive(&records).unwrap();
    let out = FeatureSanitizer::new(&config).sanitize(&frame).unwrap();
    assert!(out.column("cabin_deck").is_none());
}
