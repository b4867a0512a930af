//! Menu gateway.

use std::sync::Arc;

use async_trait::async_trait;
use menu::{MenuCatalog, MenuError, ValidationReport, ValidationRequest};

use crate::error::ServiceError;

/// Validation of requested order lines against the menu.
#[async_trait]
pub trait MenuService: Send + Sync {
    /// Validates every line. An invalid report is a successful answer;
    /// only failure to get an answer is an error.
    async fn validate(&self, request: ValidationRequest)
    -> Result<ValidationReport, ServiceError>;
}

#[async_trait]
impl<T: MenuService + ?Sized> MenuService for Arc<T> {
    async fn validate(
        &self,
        request: ValidationRequest,
    ) -> Result<ValidationReport, ServiceError> {
        (**self).validate(request).await
    }
}

impl From<MenuError> for ServiceError {
    fn from(err: MenuError) -> Self {
        ServiceError::Rejected {
            service: "menu",
            status: err.http_status(),
            code: err.code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}

#[async_trait]
impl MenuService for MenuCatalog {
    async fn validate(
        &self,
        request: ValidationRequest,
    ) -> Result<ValidationReport, ServiceError> {
        Ok(MenuCatalog::validate(self, &request).await)
    }
}
