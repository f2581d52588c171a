//! Page acquisition and word ranking.
//!
//! - Fetcher seam and URL validation (`fetch`)
//! - Markup reduction passes (`extract`)
//! - Per-document cleaning state (`document`)
//! - Tokenization, counting and ranking (`count`)
//!
//! ```
//! use tally_web::count::{TopN, WordCounter};
//! use tally_web::document::Document;
//!
//! let doc = Document::from_markup("<p>Hello</p> <b>hello</b> world", false);
//! let counter = WordCounter::from_document(doc).unwrap();
//! let top = counter.top_words(TopN::First(1));
//! assert_eq!(top[0].to_string(), "1. hello --- 2");
//! ```

pub mod count;
pub mod document;
pub mod extract;
pub mod fetch;
