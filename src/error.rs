use rust_xlsxwriter::XlsxError;
use thiserror::Error;

/// Fatal conversion failures. A value that fails to parse under one layout is
/// never an error; it falls through to the next candidate or to text.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid column declaration {declaration:?}: {reason}")]
    InvalidDeclaration { declaration: String, reason: String },

    #[error("cannot create sheet {sheet:?}: {source}")]
    SheetCreate {
        sheet: String,
        #[source]
        source: XlsxError,
    },

    #[error("cannot write {sheet}!{cell}: {source}")]
    SinkWrite {
        sheet: String,
        cell: String,
        #[source]
        source: XlsxError,
    },

    #[error("cannot save workbook: {0}")]
    Save(#[source] XlsxError),
}

impl ConvertError {
    pub fn invalid_declaration(declaration: &str, reason: impl Into<String>) -> Self {
        ConvertError::InvalidDeclaration {
            declaration: declaration.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
