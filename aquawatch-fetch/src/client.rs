//! Account client contract.
//!
//! An account client talks to the water provider: it logs in, fetches a
//! period's consumption, and keeps the latest result as readable state.
//! Concrete clients live outside this workspace; the refresh coordinator
//! only depends on this trait.

use aquawatch_core::{AccountSnapshot, Period};
use async_trait::async_trait;

use crate::error::ProviderError;

/// An authenticated connection to the provider for one account.
///
/// Methods take `&mut self` because a login or fetch updates the client's
/// session and cached data. The coordinator owns the client behind a lock,
/// so implementations need not be reentrant.
///
/// ## Implementing a Client
///
/// ```ignore
/// struct ProviderApi { http: reqwest::Client, token: Option<String>, data: Option<AccountSnapshot> }
///
/// #[async_trait]
/// impl AccountClient for ProviderApi {
///     async fn login(&mut self) -> Result<bool, ProviderError> {
///         let resp = self.http.post(LOGIN_URL).form(&self.form()).send().await?;
///         self.token = Some(parse_token(resp).await?);
///         Ok(true)
///     }
///
///     async fn fetch_account_data(&mut self, period: Period) -> Result<(), ProviderError> {
///         if self.token.is_none() {
///             self.login().await?;
///         }
///         self.data = Some(self.download(period).await?);
///         Ok(())
///     }
///
///     fn account_data(&self) -> Option<&AccountSnapshot> {
///         self.data.as_ref()
///     }
/// }
/// ```
#[async_trait]
pub trait AccountClient: Send + Sync {
    /// Authenticates against the provider.
    ///
    /// Returns `Ok(false)` when the provider answers but does not grant a
    /// session without raising an error.
    async fn login(&mut self) -> Result<bool, ProviderError>;

    /// Authenticates if needed and downloads consumption for `period`,
    /// replacing the client's current snapshot on success.
    async fn fetch_account_data(&mut self, period: Period) -> Result<(), ProviderError>;

    /// The snapshot from the most recent successful fetch.
    fn account_data(&self) -> Option<&AccountSnapshot>;
}

#[async_trait]
impl<T: AccountClient + ?Sized> AccountClient for Box<T> {
    async fn login(&mut self) -> Result<bool, ProviderError> {
        (**self).login().await
    }

    async fn fetch_account_data(&mut self, period: Period) -> Result<(), ProviderError> {
        (**self).fetch_account_data(period).await
    }

    fn account_data(&self) -> Option<&AccountSnapshot> {
        (**self).account_data()
    }
}
