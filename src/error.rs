use crate::validation::FieldId;

pub type Result<T> = std::result::Result<T, BoletoError>;

#[derive(thiserror::Error, Debug)]
pub enum BoletoError {
    #[error("required configuration field {0} is blank")]
    Configuration(FieldId),
    #[error("required field {0} is missing or blank")]
    Validation(FieldId),
    #[error("field {field} does not fit in {width} positions")]
    FieldOverflow { field: FieldId, width: usize },
    #[error("this operation is not available for the selected bank")]
    UnsupportedOperation,
    #[error("this operation is not implemented yet")]
    NotImplemented,
    #[error("malformed file at line {line}: {reason}")]
    StructuralDecode { line: usize, reason: String },
    #[error("transport failure: {0}")]
    Transport(String),
}
