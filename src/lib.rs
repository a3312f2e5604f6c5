//! mizan - fuzzy search over Quran, Hadith and podcast collections.
//!
//! This library ranks plain collections of records (surahs, juzs, mushaf
//! pages, hadith books, podcast episodes) against free-text queries. It is
//! tolerant of case, diacritics, Arabic-Indic digits and small typos, memoizes
//! results with a bounded TTL cache, and debounces bursts of queries.
//!
//! # Modules
//!
//! - [`search`] - Normalization, edit distance, matching, ranking, caching and dispatch
//! - [`corpus`] - Candidate records and collection loading
//! - [`commands`] - High-level operations (search, categories, watch)
//! - [`config`] - Configuration loading
//! - [`cli`] - Command-line interface definitions

pub mod cli;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod search;

#[cfg(feature = "mcp")]
pub mod mcp;
