//! cariesprep: survey preparation library
//!
//! Derives per-subject dental caries phenotypes from an oral health
//! examination file and builds a merged, cleaned, one-hot encoded feature
//! table from demographic, laboratory, questionnaire, examination and
//! nutrition survey extracts.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
