//! Normalizing a document to a uniform house style.

mod cleaner;
mod profile;

pub use cleaner::{clean_bytes, clean_document, CleanReport};
pub use profile::{CleanProfile, Margins, PageSize, PunctuationMap};
