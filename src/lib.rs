//! Money diary recommender.
//!
//! Diarists are clustered by age and salary, the diaries of each cluster
//! get their own noun-based topic model, and a reader is pointed to the
//! three diaries of their cluster whose topics are closest to what they
//! wrote about themselves.

pub mod artifacts;
pub mod cleaning;
pub mod clustering;
pub mod config;
pub mod error;
pub mod nmf;
pub mod nouns;
pub mod pipeline;
pub mod recommender;
pub mod records;
pub mod scaler;
pub mod stopwords;
pub mod text;
pub mod topics;
pub mod utils;
pub mod vectorizer;

pub use artifacts::ModelBundle;
pub use config::{OverrideTables, PipelineConfig};
pub use error::{DiaryError, Result};
pub use recommender::{Query, Recommendation, Recommender};
