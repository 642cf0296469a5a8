use crate::{db_types::Account, traits::EngineError};

/// Read access to the identity service's account records.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Fetches the account with the given id. If no account exists, `None` is returned.
    async fn fetch_account(&self, account_id: i64) -> Result<Option<Account>, EngineError>;
}
