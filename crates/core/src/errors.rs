use thiserror::Error;

/// Failure raised by any store-side collaborator: repositories, the
/// transaction log, or a stored procedure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("database failure: {0}")]
    Database(String),
    #[error("row decode failure: {0}")]
    Decode(String),
    #[error("procedure call failed: {0}")]
    Procedure(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    /// A delivery line named a locator the warehouse does not recognise.
    /// Aborts the whole batch before anything is written.
    #[error("location validation rejected batch: {message}")]
    LocationInvalid { message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    pub fn status(&self) -> u16 {
        match self {
            Self::LocationInvalid { .. } => 400,
            Self::Store(_) => 500,
        }
    }

    /// Message safe to hand back to a handheld client.
    pub fn client_message(&self) -> String {
        match self {
            Self::LocationInvalid { message } => message.clone(),
            Self::Store(_) => "An unexpected internal error occurred.".to_string(),
        }
    }
}
