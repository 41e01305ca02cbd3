//! Derived attributes computed from raw string fields.
//!
//! Every derivation is a pure per-row function except the surname frequency,
//! which takes one grouped pass over the full table after per-row fields are
//! computed. Running the deriver twice on the same imputed frame yields
//! identical columns.
//!
//! Name and cabin strings are expected well-formed upstream; anything that
//! does not match the structured pattern is a hard `MalformedRecord` error
//! rather than a silent default, since a silent default would corrupt the
//! downstream signal undetectably.
use std::collections::HashMap;

use crate::error::PipelineError;
use crate::frame::{Column, Frame, ImputedRecord};

/// Literal sentinel the imputer substitutes for an absent cabin string.
pub const CABIN_SENTINEL: &str = "Missing";
/// Catch-all level for cabin prefixes that cannot be formed.
pub const PREFIX_OTHER: &str = "Other";

/// First comma-delimited segment of the name.
pub fn parse_surname(name: &str, row_id: u32) -> Result<String, PipelineError> {
    let comma = name.find(',').ok_or_else(|| PipelineError::MalformedRecord {
        row_id,
        field: "name",
        raw: name.to_string(),
    })?;
    Ok(name[..comma].trim().to_string())
}

/// Courtesy title: the segment between the first comma and the next period.
pub fn parse_title(name: &str, row_id: u32) -> Result<String, PipelineError> {
    let malformed = || PipelineError::MalformedRecord {
        row_id,
        field: "name",
        raw: name.to_string(),
    };
    let comma = name.find(',').ok_or_else(malformed)?;
    let rest = &name[comma + 1..];
    let period = rest.find('.').ok_or_else(malformed)?;
    let title = rest[..period].trim();
    if title.is_empty() {
        return Err(malformed());
    }
    Ok(title.to_string())
}

/// Deck letter: first character of the cabin string. The imputed sentinel
/// `"Missing"` therefore maps to the `"M"` deck.
pub fn cabin_deck(cabin: &str, row_id: u32) -> Result<String, PipelineError> {
    match cabin.chars().next() {
        Some(c) => Ok(c.to_string()),
        None => Err(PipelineError::MalformedRecord {
            row_id,
            field: "cabin",
            raw: cabin.to_string(),
        }),
    }
}

/// Two-character cabin prefix bucket; `"Other"` when the cabin is the
/// missing sentinel or shorter than two characters.
pub fn cabin_prefix_2(cabin: &str) -> String {
    if cabin == CABIN_SENTINEL {
        return PREFIX_OTHER.to_string();
    }
    let prefix: String = cabin.chars().take(2).collect();
    if prefix.chars().count() < 2 {
        PREFIX_OTHER.to_string()
    } else {
        prefix
    }
}

/// Count of space delimiters in the cabin string; a multi-cabin booking like
/// `"C23 C25 C27"` counts 2, a single cabin 0, the missing sentinel 0.
pub fn cabin_token_count(cabin: &str) -> f64 {
    if cabin == CABIN_SENTINEL {
        return 0.0;
    }
    cabin.chars().filter(|&c| c == ' ').count() as f64
}

pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Build the full predictor frame from imputed records.
    ///
    /// The returned frame carries the raw modeling fields (class, sex, age,
    /// family counters, fare, embarkation port, destination) plus the
    /// derived cabin, title and surname-frequency attributes. Leakage fields
    /// (`boat`, `body`) and free-text fields (`name`, `ticket`) never enter.
    pub fn derive(records: &[ImputedRecord]) -> Result<Frame, PipelineError> {
        let n = records.len();
        let mut surname = Vec::with_capacity(n);
        let mut title = Vec::with_capacity(n);
        let mut deck = Vec::with_capacity(n);
        let mut prefix2 = Vec::with_capacity(n);
        let mut cabin_count = Vec::with_capacity(n);

        for r in records {
            surname.push(parse_surname(&r.name, r.row_id)?);
            title.push(parse_title(&r.name, r.row_id)?);
            deck.push(cabin_deck(&r.cabin, r.row_id)?);
            prefix2.push(cabin_prefix_2(&r.cabin));
            cabin_count.push(cabin_token_count(&r.cabin));
        }

        // Grouped pass: how many records share each surname.
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for s in &surname {
            *counts.entry(s.as_str()).or_insert(0) += 1;
        }
        let surname_freq: Vec<f64> = surname
            .iter()
            .map(|s| counts[s.as_str()] as f64)
            .collect();

        let row_ids = records.iter().map(|r| r.row_id).collect();
        let outcome = records.iter().map(|r| r.survived).collect();
        let mut frame = Frame::new(row_ids, outcome);

        frame.push_column(
            "pclass",
            Column::Categorical(records.iter().map(|r| r.pclass.to_string()).collect()),
        );
        frame.push_column(
            "sex",
            Column::Categorical(records.iter().map(|r| r.sex.label().to_string()).collect()),
        );
        frame.push_column(
            "age",
            Column::Continuous(records.iter().map(|r| r.age).collect()),
        );
        frame.push_column(
            "sibsp",
            Column::Continuous(records.iter().map(|r| r.sibsp as f64).collect()),
        );
        frame.push_column(
            "parch",
            Column::Continuous(records.iter().map(|r| r.parch as f64).collect()),
        );
        frame.push_column(
            "family_size",
            Column::Continuous(
                records
                    .iter()
                    .map(|r| (r.sibsp + r.parch + 1) as f64)
                    .collect(),
            ),
        );
        frame.push_column(
            "fare",
            Column::Continuous(records.iter().map(|r| r.fare).collect()),
        );
        frame.push_column(
            "embarked",
            Column::Categorical(records.iter().map(|r| r.embarked.clone()).collect()),
        );
        frame.push_column(
            "home_dest",
            Column::Categorical(records.iter().map(|r| r.home_dest.clone()).collect()),
        );
        frame.push_column("cabin_deck", Column::Categorical(deck));
        frame.push_column("cabin_prefix_2", Column::Categorical(prefix2));
        frame.push_column("cabin_count", Column::Continuous(cabin_count));
        frame.push_column("title", Column::Categorical(title));
        frame.push_column("surname_freq", Column::Continuous(surname_freq));

        frame.log_summary("derived frame");
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_parsing_matches_expected_segments() {
        assert_eq!(parse_surname("Moore, Mr. Brian", 0).unwrap(), "Moore");
        assert_eq!(parse_title("Moore, Mr. Brian", 0).unwrap(), "Mr");
    }

    #[test]
    fn name_without_comma_fails_loudly() {
        let err = parse_surname("Moore Mr. Brian", 7).unwrap_err();
        match err {
            PipelineError::MalformedRecord { row_id, field, .. } => {
                assert_eq!(row_id, 7);
                assert_eq!(field, "name");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn title_without_period_fails_loudly() {
        assert!(parse_title("Moore, Mr Brian", 0).is_err());
    }

    #[test]
    fn cabin_derivations() {
        assert_eq!(cabin_deck("C85", 0).unwrap(), "C");
        assert_eq!(cabin_prefix_2("C85"), "C8");
        assert_eq!(cabin_token_count("C85"), 0.0);
        assert_eq!(cabin_token_count("C23 C25 C27"), 2.0);
        assert_eq!(cabin_deck(CABIN_SENTINEL, 0).unwrap(), "M");
        assert_eq!(cabin_prefix_2(CABIN_SENTINEL), "Other");
    }
}
