use std::sync::Arc;

use tracing::warn;

use crate::ingest::ports::LocationProcedure;

pub const INVALID_LOCATOR: &str = "Invalid Locator";
pub const VALIDATION_FAILED: &str = "Location validation failed";
pub const VALIDATION_ERROR: &str = "Location validation error";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocationVerdict {
    Valid,
    Invalid { message: String },
}

impl LocationVerdict {
    fn invalid(message: &str) -> Self {
        Self::Invalid { message: message.to_string() }
    }
}

/// Interprets the locator procedure's first row. Anything other than a clear
/// `200` is treated as invalid, including call failures.
#[derive(Clone)]
pub struct LocationValidator {
    procedure: Arc<dyn LocationProcedure>,
}

impl LocationValidator {
    pub fn new(procedure: Arc<dyn LocationProcedure>) -> Self {
        Self { procedure }
    }

    pub async fn validate(
        &self,
        subinventory: &str,
        locator: &str,
        correlation_id: &str,
    ) -> LocationVerdict {
        match self.procedure.check(subinventory, locator).await {
            Ok(Some(row)) => interpret(&row),
            Ok(None) => LocationVerdict::invalid(VALIDATION_FAILED),
            Err(error) => {
                warn!(
                    event_name = "ingest.location.call_failed",
                    correlation_id,
                    subinventory,
                    locator,
                    error = %error,
                    "location procedure call failed"
                );
                LocationVerdict::invalid(VALIDATION_ERROR)
            }
        }
    }
}

fn interpret(row: &str) -> LocationVerdict {
    if row.contains("200") {
        LocationVerdict::Valid
    } else if row.contains("400") {
        LocationVerdict::invalid(INVALID_LOCATOR)
    } else {
        LocationVerdict::invalid(VALIDATION_FAILED)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{LocationValidator, LocationVerdict, INVALID_LOCATOR, VALIDATION_ERROR};
    use crate::errors::StoreError;
    use crate::ingest::ports::LocationProcedure;

    struct Scripted(Result<Option<String>, StoreError>);

    #[async_trait]
    impl LocationProcedure for Scripted {
        async fn check(&self, _: &str, _: &str) -> Result<Option<String>, StoreError> {
            self.0.clone()
        }
    }

    async fn verdict(answer: Result<Option<String>, StoreError>) -> LocationVerdict {
        LocationValidator::new(Arc::new(Scripted(answer))).validate("STORES", "A1", "req-1").await
    }

    #[tokio::test]
    async fn row_containing_200_is_valid() {
        assert_eq!(verdict(Ok(Some("{STATUS=200}".to_string()))).await, LocationVerdict::Valid);
    }

    #[tokio::test]
    async fn row_containing_400_is_an_invalid_locator() {
        assert_eq!(
            verdict(Ok(Some("{STATUS=400}".to_string()))).await,
            LocationVerdict::Invalid { message: INVALID_LOCATOR.to_string() }
        );
    }

    #[tokio::test]
    async fn unclear_or_missing_rows_fail_closed() {
        assert!(matches!(
            verdict(Ok(Some("{STATUS=UNKNOWN}".to_string()))).await,
            LocationVerdict::Invalid { .. }
        ));
        assert!(matches!(verdict(Ok(None)).await, LocationVerdict::Invalid { .. }));
    }

    #[tokio::test]
    async fn procedure_errors_fail_closed() {
        assert_eq!(
            verdict(Err(StoreError::Procedure("timeout".to_string()))).await,
            LocationVerdict::Invalid { message: VALIDATION_ERROR.to_string() }
        );
    }
}
