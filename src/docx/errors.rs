use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("invalid DOCX archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("package part not found: {name}")]
    MissingPart { name: String },

    #[error("invalid XML in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed document: {message}")]
    Malformed { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocxError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        DocxError::Malformed {
            message: message.into(),
        }
    }
}
