//! Diarist metadata cleaning.
//!
//! Turns raw collected rows into [`Diarist`] records: sentinel rows are
//! dropped, salaries are normalized and patched from the override tables,
//! duplicates are removed, and the location-derived flags are computed.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::OverrideTables;
use crate::error::{DiaryError, Result};
use crate::records::{is_missing, Diarist, RawDiarist};

const MAJOR_CITIES_ABBREVIATED: &[&str] = &[
    "New York, NY", "Los Angeles, CA", "Chicago, IL", "Houston, TX", "Phoenix, AZ",
    "Philadelphia, PA", "San Antonio, TX", "Dallas, TX", "San Jose, CA", "Austin, TX",
    "Jacksonville, FL", "Fort Worth, TX", "Columbus, OH", "Charlotte, NC", "San Francisco, CA",
    "Indianapolis, IN", "Seattle, WA", "Denver, CO", "Washington, DC", "Boston, MA",
    "El Paso, TX", "Nashville, TN", "Detroit, MI", "Oklahoma City, OK",
];

const MAJOR_CITIES_FULL_STATE: &[&str] = &[
    "New York, New York", "Los Angeles, California", "Chicago, Illinois", "Houston, Texas",
    "Phoenix, Arizona", "Philadelphia, PA", "San Antonio, Texas", "Dallas, Texas",
    "San Jose, California", "Austin, Texas", "Jacksonville, Florida", "Fort Worth, Texas",
    "Columbus, Ohio", "Charlotte, North Carolina", "San Francisco, California",
    "Indianapolis, Indiana", "Seattle, Washington", "Denver, Colorado", "Washington DC",
    "Boston, Massachusetts", "El Paso, Texas", "Nashville, Tennessee", "Detroit, Michigan",
    "Oklahoma City, Oklahoma",
];

const NEW_YORK_ALIASES: &[&str] = &["Brooklyn, NY", "Queens, NY", "Manhattan, NY"];

/// Exact-match test against the major city lists. The location is not
/// trimmed or case-folded.
pub fn in_major_city(location: &str) -> bool {
    MAJOR_CITIES_ABBREVIATED.contains(&location)
        || MAJOR_CITIES_FULL_STATE.contains(&location)
        || NEW_YORK_ALIASES.contains(&location)
}

/// Removes the currency symbol and thousands separators.
pub fn strip_currency(salary: &str) -> String {
    salary.replace(['$', ','], "")
}

#[derive(Debug, Clone)]
struct WorkingRow {
    row: usize,
    story_title: String,
    occupation: String,
    age: String,
    location: String,
    salary: String,
}

#[derive(Debug, Clone)]
struct SalariedRow {
    row: usize,
    story_title: String,
    occupation: String,
    age: String,
    location: String,
    salary: f64,
}

pub struct MetadataCleaner<'a> {
    overrides: &'a OverrideTables,
}

impl<'a> MetadataCleaner<'a> {
    pub fn new(overrides: &'a OverrideTables) -> Self {
        Self { overrides }
    }

    pub fn clean(&self, raw: Vec<RawDiarist>) -> Result<Vec<Diarist>> {
        let total = raw.len();
        let rows = drop_blank_rows(raw);
        debug!("Dropped {} rows with a missing age or location", total - rows.len());

        let rows = self.patch_salaries(rows)?;
        let mut rows = coerce_salaries(rows)?;
        let before_dedup = rows.len();
        dedup_by_title_and_salary(&mut rows);
        if rows.len() < before_dedup {
            debug!("Dropped {} duplicate (title, salary) rows", before_dedup - rows.len());
        }
        ensure_unique_titles(&rows)?;

        self.patch_locations(&mut rows)?;
        let nomads = self.flag_rows(&self.overrides.nomad, rows.len(), "nomad")?;
        let international =
            self.flag_rows(&self.overrides.international, rows.len(), "international")?;

        let diarists = rows
            .into_iter()
            .enumerate()
            .map(|(row, r)| {
                let age = parse_age(r.row, &r.age)?;
                Ok(Diarist {
                    row,
                    occupation: (!is_missing(&r.occupation)).then(|| r.occupation.trim().to_string()),
                    age,
                    salary: r.salary,
                    in_major_city: in_major_city(&r.location),
                    nomad: nomads.contains(&row),
                    international: international.contains(&row),
                    story_title: r.story_title,
                    location: r.location,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Cleaned diarist table - raw={}, kept={}, major_city={}",
            total,
            diarists.len(),
            diarists.iter().filter(|d| d.in_major_city).count()
        );
        Ok(diarists)
    }

    fn patch_salaries(&self, mut rows: Vec<WorkingRow>) -> Result<Vec<WorkingRow>> {
        let index: HashMap<usize, usize> =
            rows.iter().enumerate().map(|(i, r)| (r.row, i)).collect();
        for patch in &self.overrides.salary {
            let &i = index.get(&patch.row).ok_or_else(|| {
                DiaryError::config(format!(
                    "salary override for row {} but that row is not in the table",
                    patch.row
                ))
            })?;
            rows[i].salary = format_salary(patch.value);
        }
        Ok(rows)
    }

    fn patch_locations(&self, rows: &mut [SalariedRow]) -> Result<()> {
        let n_rows = rows.len();
        for patch in &self.overrides.location {
            let row = rows.get_mut(patch.row).ok_or_else(|| {
                DiaryError::config(format!(
                    "location override for row {} but the cleaned table has {} rows",
                    patch.row, n_rows
                ))
            })?;
            row.location = patch.value.clone();
        }
        Ok(())
    }

    fn flag_rows(&self, ids: &[usize], n_rows: usize, flag: &str) -> Result<HashSet<usize>> {
        if let Some(&bad) = ids.iter().find(|&&id| id >= n_rows) {
            return Err(DiaryError::config(format!(
                "{} override for row {} but the cleaned table has {} rows",
                flag, bad, n_rows
            )));
        }
        Ok(ids.iter().copied().collect())
    }
}

fn format_salary(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn drop_blank_rows(raw: Vec<RawDiarist>) -> Vec<WorkingRow> {
    raw.into_iter()
        .enumerate()
        .filter(|(_, r)| !is_missing(&r.age) && !is_missing(&r.location))
        .map(|(row, r)| WorkingRow {
            row,
            story_title: r.story_title,
            occupation: r.occupation,
            age: r.age,
            location: r.location,
            salary: strip_currency(&r.salary),
        })
        .collect()
}

fn coerce_salaries(rows: Vec<WorkingRow>) -> Result<Vec<SalariedRow>> {
    rows.into_iter()
        .map(|r| {
            let salary: f64 = r.salary.trim().parse().map_err(|_| {
                DiaryError::data_quality(
                    r.row,
                    format!("salary {:?} is not a number and has no override", r.salary),
                )
            })?;
            if !salary.is_finite() || salary < 0.0 {
                return Err(DiaryError::data_quality(
                    r.row,
                    format!("salary {} is negative or not finite", salary),
                ));
            }
            Ok(SalariedRow {
                row: r.row,
                story_title: r.story_title,
                occupation: r.occupation,
                age: r.age,
                location: r.location,
                salary: salary.round_ties_even(),
            })
        })
        .collect()
}

/// Sorts by (title, salary) descending and keeps the first of each pair.
fn dedup_by_title_and_salary(rows: &mut Vec<SalariedRow>) {
    rows.sort_by(|a, b| {
        b.story_title
            .cmp(&a.story_title)
            .then(b.salary.partial_cmp(&a.salary).unwrap_or(Ordering::Equal))
    });
    rows.dedup_by(|later, earlier| {
        later.story_title == earlier.story_title && later.salary == earlier.salary
    });
}

fn ensure_unique_titles(rows: &[SalariedRow]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for r in rows {
        if !seen.insert(r.story_title.as_str()) {
            warn!("Story {} appears with more than one salary", r.story_title);
            return Err(DiaryError::data_quality(
                r.row,
                format!(
                    "story {} has more than one salary; add a salary override",
                    r.story_title
                ),
            ));
        }
    }
    Ok(())
}

fn parse_age(row: usize, age: &str) -> Result<u32> {
    match age.trim().parse::<u32>() {
        Ok(age) if age > 0 => Ok(age),
        _ => Err(DiaryError::data_quality(
            row,
            format!("age {:?} is not a positive integer", age),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RowOverride;

    fn raw(title: &str, age: &str, location: &str, salary: &str) -> RawDiarist {
        RawDiarist {
            story_title: title.to_string(),
            occupation: "Analyst".to_string(),
            age: age.to_string(),
            location: location.to_string(),
            salary: salary.to_string(),
        }
    }

    #[test]
    fn test_in_major_city() {
        assert!(in_major_city("New York, NY"));
        assert!(!in_major_city("Springfield"));
        assert!(in_major_city("Brooklyn, NY"));
        assert!(in_major_city("Washington DC"));
        assert!(!in_major_city("new york, ny"));
        assert!(!in_major_city(" New York, NY"));
    }

    #[test]
    fn test_strip_currency() {
        assert_eq!(strip_currency("$72,500"), "72500");
        assert_eq!(strip_currency("$20-$25/hour"), "20-25/hour");
    }

    #[test]
    fn test_blank_rows_are_dropped_and_salaries_parsed() {
        let rows = vec![
            raw("/c", "31", "Boston, MA", "$95,000"),
            raw("/b", "BLANK", "Denver, CO", "$40,000"),
            raw("/a", "24", "BLANK", "$30,000"),
            raw("/d", "27", "Springfield", "$52,500.50"),
        ];
        let cleaned = MetadataCleaner::new(&OverrideTables::default()).clean(rows).unwrap();

        assert_eq!(cleaned.len(), 2);
        // sorted by title descending, then reindexed
        assert_eq!(cleaned[0].story_title, "/d");
        assert_eq!(cleaned[0].row, 0);
        assert_eq!(cleaned[0].salary, 52500.0);
        assert!(!cleaned[0].in_major_city);
        assert_eq!(cleaned[1].salary, 95000.0);
        assert!(cleaned[1].in_major_city);
    }

    #[test]
    fn test_salary_override_uses_raw_row_position() {
        let rows = vec![
            raw("/a", "BLANK", "Boston, MA", "$1"),
            raw("/b", "29", "Boston, MA", "$20/hour"),
        ];
        let overrides = OverrideTables {
            salary: vec![RowOverride { row: 1, value: 41600.0 }],
            ..Default::default()
        };
        let cleaned = MetadataCleaner::new(&overrides).clean(rows).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].salary, 41600.0);
    }

    #[test]
    fn test_unparseable_salary_without_override_fails() {
        let rows = vec![raw("/a", "29", "Boston, MA", "$20/hour")];
        let err = MetadataCleaner::new(&OverrideTables::default()).clean(rows).unwrap_err();
        assert!(matches!(err, DiaryError::DataQuality { row: 0, .. }));
    }

    #[test]
    fn test_override_for_dropped_row_is_config_error() {
        let rows = vec![
            raw("/a", "BLANK", "Boston, MA", "$50,000"),
            raw("/b", "29", "Boston, MA", "$60,000"),
        ];
        let overrides = OverrideTables {
            salary: vec![RowOverride { row: 0, value: 1.0 }],
            ..Default::default()
        };
        let err = MetadataCleaner::new(&overrides).clean(rows).unwrap_err();
        assert!(matches!(err, DiaryError::Config(_)));

        let overrides = OverrideTables {
            nomad: vec![5],
            ..Default::default()
        };
        let rows = vec![raw("/b", "29", "Boston, MA", "$60,000")];
        let err = MetadataCleaner::new(&overrides).clean(rows).unwrap_err();
        assert!(matches!(err, DiaryError::Config(_)));
    }

    #[test]
    fn test_duplicates_are_dropped_and_flags_follow_new_rows() {
        let rows = vec![
            raw("/a", "29", "Brooklyn", "$60,000"),
            raw("/a", "29", "Brooklyn", "$60,000"),
            raw("/b", "35", "Bali", "$80,000"),
        ];
        let overrides = OverrideTables {
            location: vec![RowOverride { row: 1, value: "Brooklyn, NY".to_string() }],
            nomad: vec![0],
            international: vec![0],
            ..Default::default()
        };
        let cleaned = MetadataCleaner::new(&overrides).clean(rows).unwrap();
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].story_title, "/b");
        assert!(cleaned[0].nomad && cleaned[0].international);
        assert_eq!(cleaned[1].location, "Brooklyn, NY");
        assert!(cleaned[1].in_major_city);
        assert!(!cleaned[1].nomad);
    }

    #[test]
    fn test_conflicting_salaries_for_one_story_fail() {
        let rows = vec![
            raw("/z", "40", "Boston, MA", "$70,000"),
            raw("/a", "29", "Boston, MA", "$60,000"),
            raw("/a", "29", "Boston, MA", "$65,000"),
        ];
        let err = MetadataCleaner::new(&OverrideTables::default()).clean(rows).unwrap_err();
        // sorted, the $60,000 row comes last; it is reported by its input position
        assert!(matches!(err, DiaryError::DataQuality { row: 1, .. }));
    }

    #[test]
    fn test_bad_age_reports_input_record_not_sorted_position() {
        let rows = vec![
            raw("/a", "29", "Boston, MA", "$60,000"),
            raw("/b", "BLANK", "Boston, MA", "$50,000"),
            raw("/z", "thirty", "Denver, CO", "$70,000"),
        ];
        // "/z" sorts to position 0 of the cleaned table
        let err = MetadataCleaner::new(&OverrideTables::default()).clean(rows).unwrap_err();
        assert!(matches!(err, DiaryError::DataQuality { row: 2, .. }), "{}", err);
        assert!(err.to_string().contains("input record 2"));
    }

    #[test]
    fn test_missing_occupation_is_none_and_ages_are_checked() {
        let mut row = raw("/a", "0", "Boston, MA", "$60,000");
        row.occupation = "BLANK".to_string();
        let err = MetadataCleaner::new(&OverrideTables::default())
            .clean(vec![row.clone()])
            .unwrap_err();
        assert!(matches!(err, DiaryError::DataQuality { .. }));

        row.age = "41".to_string();
        let cleaned = MetadataCleaner::new(&OverrideTables::default()).clean(vec![row]).unwrap();
        assert_eq!(cleaned[0].occupation, None);
        assert_eq!(cleaned[0].age, 41);
    }
}
