//! `wordtally`: fetch a page, reduce it to visible text and rank its words.

pub mod cli;
pub mod pipeline;
pub mod sink;
