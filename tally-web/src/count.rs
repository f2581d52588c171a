//! Tokenization, frequency counting and ranking.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tally_common::Result;
use thiserror::Error;

use crate::document::Document;

/// Lowercase the text and split it on whitespace runs.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

pub fn unique_words(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

pub fn frequency_table(text: &str) -> FrequencyTable {
    FrequencyTable::from_tokens(tokenize(text))
}

/// Word counts in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for token in tokens {
            let token = token.into();
            match table.index.get(&token) {
                Some(&slot) => table.entries[slot].1 += 1,
                None => {
                    table.index.insert(token.clone(), table.entries.len());
                    table.entries.push((token, 1));
                }
            }
        }
        table
    }

    pub fn get(&self, word: &str) -> Option<usize> {
        self.index.get(word).map(|&slot| self.entries[slot].1)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of tokens counted.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(word, count)| (word.as_str(), *count))
    }
}

/// How many ranked entries to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopN {
    All,
    First(usize),
}

impl Default for TopN {
    fn default() -> Self {
        Self::First(10)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid word count `{0}`: expected a non-negative number, or -1 for every word")]
pub struct InvalidTopN(pub String);

impl TryFrom<i64> for TopN {
    type Error = InvalidTopN;

    fn try_from(n: i64) -> std::result::Result<Self, Self::Error> {
        match n {
            -1 => Ok(Self::All),
            n if n >= 0 => usize::try_from(n)
                .map(Self::First)
                .map_err(|_| InvalidTopN(n.to_string())),
            n => Err(InvalidTopN(n.to_string())),
        }
    }
}

impl FromStr for TopN {
    type Err = InvalidTopN;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let n: i64 = s.parse().map_err(|_| InvalidTopN(s.to_string()))?;
        Self::try_from(n)
    }
}

/// One line of the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub word: String,
    pub count: usize,
}

impl fmt::Display for RankedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} --- {}", self.rank, self.word, self.count)
    }
}

/// Sort by count descending and keep the first `limit` entries.
///
/// The sort is stable, so equal counts stay in first-occurrence order.
pub fn top_words(table: &FrequencyTable, limit: TopN) -> Vec<RankedEntry> {
    let mut sorted: Vec<(&str, usize)> = table.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let take = match limit {
        TopN::All => sorted.len(),
        TopN::First(n) => n,
    };

    sorted
        .into_iter()
        .take(take)
        .enumerate()
        .map(|(i, (word, count))| RankedEntry {
            rank: i + 1,
            word: word.to_string(),
            count,
        })
        .collect()
}

/// Counts words in text produced by a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct WordCounter {
    text: String,
}

impl WordCounter {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Run the whole cleaning pipeline on `doc` and keep the result.
    pub fn from_document(mut doc: Document) -> Result<Self> {
        doc.clean_all()?;
        Ok(Self::new(doc.into_text()?))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> Vec<String> {
        tokenize(&self.text)
    }

    pub fn unique_words(&self) -> HashSet<String> {
        unique_words(&self.text)
    }

    pub fn frequency_table(&self) -> FrequencyTable {
        frequency_table(&self.text)
    }

    pub fn top_words(&self, limit: TopN) -> Vec<RankedEntry> {
        let table = self.frequency_table();
        let ranked = top_words(&table, limit);
        tracing::debug!(
            tokens = table.total(),
            unique = table.len(),
            ranked = ranked.len(),
            "count.ranked"
        );
        ranked
    }
}
