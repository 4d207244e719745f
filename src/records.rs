// Raw and cleaned diary records, plus the CSV / JSON Lines readers and writers.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{DiaryError, Result};

/// Marker the collector writes for any field it could not find.
pub const MISSING: &str = "BLANK";

pub fn is_missing(value: &str) -> bool {
    value.trim() == MISSING
}

/// One diarist row as collected, before any cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDiarist {
    pub story_title: String,
    pub occupation: String,
    pub age: String,
    pub location: String,
    pub salary: String,
}

/// Diary text as collected: one string per paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDiary {
    pub story_title: String,
    pub diary_text: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diarist {
    /// Position in the cleaned, reindexed table
    pub row: usize,
    pub story_title: String,
    pub occupation: Option<String>,
    pub age: u32,
    pub salary: f64,
    pub location: String,
    pub nomad: bool,
    pub international: bool,
    pub in_major_city: bool,
}

/// A diary that made it into the corpus, joined to its diarist.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusDocument {
    pub story_title: String,
    /// Index into the diarist table
    pub diarist: usize,
    pub cleaned: String,
    pub nouns: String,
}

#[derive(Debug, Serialize)]
struct CleanedRow<'a> {
    story_title: &'a str,
    occupation: &'a str,
    age: u32,
    location: &'a str,
    salary: f64,
    nomad: u8,
    international: u8,
    high_cost_of_living_area: u8,
}

impl<'a> From<&'a Diarist> for CleanedRow<'a> {
    fn from(d: &'a Diarist) -> Self {
        CleanedRow {
            story_title: &d.story_title,
            occupation: d.occupation.as_deref().unwrap_or(MISSING),
            age: d.age,
            location: &d.location,
            salary: d.salary,
            nomad: d.nomad as u8,
            international: d.international as u8,
            high_cost_of_living_area: d.in_major_city as u8,
        }
    }
}

#[derive(Debug, Serialize)]
struct ClusteredRow<'a> {
    story_title: &'a str,
    occupation: &'a str,
    age: u32,
    location: &'a str,
    salary: f64,
    nomad: u8,
    international: u8,
    high_cost_of_living_area: u8,
    cluster: usize,
}

pub fn read_diarists(path: &Path) -> Result<Vec<RawDiarist>> {
    let file = File::open(path)?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: RawDiarist = result?;
        records.push(record);
    }
    Ok(records)
}

pub fn read_diaries(path: &Path) -> Result<Vec<RawDiary>> {
    let reader = BufReader::new(File::open(path)?);
    let mut diaries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let diary: RawDiary = serde_json::from_str(&line).map_err(|e| {
            DiaryError::data_quality(diaries.len(), format!("malformed diary line: {}", e))
        })?;
        diaries.push(diary);
    }
    Ok(diaries)
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(WriterBuilder::new().has_headers(true).from_path(path)?)
}

/// Writes the cleaned diarist table.
pub fn write_cleaned(path: &Path, diarists: &[Diarist]) -> Result<()> {
    let mut wtr = create_writer(path)?;
    for d in diarists {
        wtr.serialize(CleanedRow::from(d))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the cleaned diarist table with one cluster label per row.
pub fn write_clustered(path: &Path, diarists: &[Diarist], labels: &[usize]) -> Result<()> {
    if diarists.len() != labels.len() {
        return Err(DiaryError::config(format!(
            "{} diarists but {} cluster labels",
            diarists.len(),
            labels.len()
        )));
    }
    let mut wtr = create_writer(path)?;
    for (d, &cluster) in diarists.iter().zip(labels) {
        let row = CleanedRow::from(d);
        wtr.serialize(ClusteredRow {
            story_title: row.story_title,
            occupation: row.occupation,
            age: row.age,
            location: row.location,
            salary: row.salary,
            nomad: row.nomad,
            international: row.international,
            high_cost_of_living_area: row.high_cost_of_living_area,
            cluster,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
