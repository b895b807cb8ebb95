//! Docrev: paragraph-level revision of Word documents
//!
//! Splits a `.docx` into paragraphs, sends each one to a chat-completions
//! service for light copy-editing, and builds a new document showing only
//! the paragraphs that changed, with deletions struck through in red and
//! insertions in bold blue.
//!
//! # Architecture
//!
//! - [`extract`] produces the single canonical list of [`ParagraphUnit`]s.
//!   Each unit's index is its only correlation key.
//! - [`revise`] sends units to the service through a bounded worker pool.
//!   Every failure degrades to the original text, so the resulting
//!   [`RevisionTable`] always has one entry per unit, in index order.
//! - [`diff`] renders a character-level diff of each changed pair and
//!   [`reconstruct`] assembles the output document.
//! - [`clean`] independently normalizes an existing document to a uniform
//!   house style.
//!
//! # Example
//!
//! ```no_run
//! use docrev::{build_revised_document, dispatch_revisions, extract_paragraphs};
//! use docrev::docx::Package;
//! use docrev::reconstruct::ReconstructOptions;
//! use docrev::revise::{SilentProgress, DEFAULT_ENDPOINT, DEFAULT_POOL_SIZE};
//!
//! let package = Package::open("report.docx")?;
//! let units = extract_paragraphs(&package)?;
//! let table = dispatch_revisions(
//!     &units,
//!     "sk-...",
//!     DEFAULT_ENDPOINT,
//!     DEFAULT_POOL_SIZE,
//!     &SilentProgress,
//! );
//! let originals = docrev::extract::unit_texts(&units);
//! let bytes = build_revised_document(
//!     &originals,
//!     table.into_inner(),
//!     &ReconstructOptions::default(),
//! )?;
//! std::fs::write("report_revised.docx", bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod clean;
pub mod config;
pub mod diff;
pub mod docx;
pub mod extract;
pub mod output;
pub mod reconstruct;
pub mod revise;

// Re-exports
pub use clean::{clean_document, CleanProfile, CleanReport};
pub use config::{ConfigError, DocrevConfig};
pub use diff::{DiffSpan, DiffStyle};
pub use docx::{DocxError, Package};
pub use extract::{extract_paragraphs, ParagraphUnit};
pub use output::{atomic_write, OutputError, DOCX_MIME};
pub use reconstruct::{build_revised_document, reconstruct, ReconstructOptions};
pub use revise::{
    ChatCompletionsBackend, Dispatcher, ProgressObserver, RevisionClient, RevisionError,
    RevisionTable, ServiceSettings,
};

/// Revise `units` against the service at `endpoint` with default settings.
///
/// See [`dispatch_with_settings`].
pub fn dispatch_revisions(
    units: &[ParagraphUnit],
    credential: &str,
    endpoint: &str,
    pool_size: usize,
    observer: &dyn ProgressObserver,
) -> RevisionTable {
    let settings = ServiceSettings {
        endpoint: endpoint.to_string(),
        ..ServiceSettings::default()
    };
    dispatch_with_settings(units, credential, settings, pool_size, observer)
}

/// Revise every unit with at most `pool_size` requests in flight.
///
/// Never fails: if the HTTP client cannot even be constructed, the error is
/// logged and every unit keeps its original text.
pub fn dispatch_with_settings(
    units: &[ParagraphUnit],
    credential: &str,
    settings: ServiceSettings,
    pool_size: usize,
    observer: &dyn ProgressObserver,
) -> RevisionTable {
    match ChatCompletionsBackend::new(credential, settings) {
        Ok(backend) => {
            let client = RevisionClient::new(backend);
            let table = Dispatcher::new(&client, pool_size).dispatch(units, observer);
            if client.failure_count() > 0 {
                log::warn!(
                    "{} of {} paragraphs kept their original text",
                    client.failure_count(),
                    units.len()
                );
            }
            table
        }
        Err(e) => {
            log::error!("revision service unavailable, keeping all originals: {e}");
            extract::unit_texts(units).into()
        }
    }
}
