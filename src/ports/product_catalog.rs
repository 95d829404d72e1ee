use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::order::{Product, ProductId};
use super::PortError;

/// Product lookup used to price new orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Active products among `ids`. Unknown or inactive ids are left out of
    /// the result, they are not an error.
    async fn get_active_by_ids(
        &self,
        ids: &[ProductId],
        cancel: &CancellationToken,
    ) -> Result<Vec<Product>, PortError>;
}
