use std::sync::Arc;

use async_trait::async_trait;

use crate::{entities::contact_me::ContactPayload, errors::AppError};

/// Outbound seam to whatever actually delivers the email.
#[async_trait]
pub trait EmailRelay: Send + Sync {
    async fn send(&self, payload: &ContactPayload) -> Result<(), AppError>;
}

#[async_trait]
impl<T: EmailRelay + ?Sized> EmailRelay for Arc<T> {
    async fn send(&self, payload: &ContactPayload) -> Result<(), AppError> {
        (**self).send(payload).await
    }
}
