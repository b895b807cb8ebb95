//! Just enough of the WordprocessingML package format to read paragraph
//! text, rewrite formatting in place, and produce new documents.

mod errors;
pub mod package;
pub mod reader;
pub mod style;
pub mod writer;
pub mod xml;

pub use errors::DocxError;
pub use package::Package;
pub use style::{Rgb, Run, RunStyle};
pub use writer::{OutputDocument, Paragraph};
