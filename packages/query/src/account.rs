//! Account lookups on top of verified store queries.

use ibc_proto::{cosmos::auth::v1beta1::BaseAccount, google::protobuf::Any};
use prost::Message;
use verified_query_node_client::NodeClient;

use crate::{client::QueryClient, context::QueryContext, error::QueryError};

/// Default name of the store holding accounts.
pub const DEFAULT_ACCOUNT_STORE: &str = "acc";

/// Prefix of account keys in the account store.
pub const ADDRESS_STORE_KEY_PREFIX: u8 = 0x01;

/// Type url of [`BaseAccount`] when packed in an [`Any`].
pub const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";

/// The account fields needed to build transactions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Bech32 address as stored in the account
    pub address: String,
    /// Number assigned when the account was created
    pub account_number: u64,
    /// Number of transactions sent from the account
    pub sequence: u64,
}

/// Decodes the bytes stored under an account key.
pub trait AccountDecoder: Send + Sync {
    /// Decodes `bytes` into an [`Account`].
    ///
    /// # Errors
    /// Returns [`QueryError::AccountDecode`] if `bytes` is not an account.
    fn decode(&self, bytes: &[u8]) -> Result<Account, QueryError>;
}

/// Decoder for a [`BaseAccount`] packed in a protobuf [`Any`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtoAccountDecoder;

impl AccountDecoder for ProtoAccountDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Account, QueryError> {
        let any = Any::decode(bytes).map_err(|e| QueryError::AccountDecode(e.to_string()))?;
        if any.type_url != BASE_ACCOUNT_TYPE_URL {
            return Err(QueryError::AccountDecode(format!(
                "unsupported account type `{}`",
                any.type_url
            )));
        }

        let account = BaseAccount::decode(any.value.as_slice())
            .map_err(|e| QueryError::AccountDecode(e.to_string()))?;
        Ok(Account {
            address: account.address,
            account_number: account.account_number,
            sequence: account.sequence,
        })
    }
}

/// Key of the account of `address` in the account store.
#[must_use]
pub fn address_store_key(address: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(address.len() + 1);
    key.push(ADDRESS_STORE_KEY_PREFIX);
    key.extend_from_slice(address);
    key
}

/// Account queries against a configured account store.
pub struct Accounts<'a, C, D> {
    client: &'a QueryClient<C>,
    decoder: D,
    store: String,
}

impl<C: NodeClient> QueryClient<C> {
    /// Account queries against `store` decoded with `decoder`.
    pub fn accounts<D: AccountDecoder>(
        &self,
        decoder: D,
        store: impl Into<String>,
    ) -> Accounts<'_, C, D> {
        Accounts {
            client: self,
            decoder,
            store: store.into(),
        }
    }
}

impl<C: NodeClient, D: AccountDecoder> Accounts<'_, C, D> {
    /// The account of `address`, `None` if no account is stored.
    ///
    /// # Errors
    /// See [`QueryClient::query`]. Returns [`QueryError::AccountDecode`] for undecodable bytes.
    pub async fn get_account(
        &self,
        address: &[u8],
        ctx: &QueryContext,
    ) -> Result<Option<Account>, QueryError> {
        let bytes = self
            .client
            .query_store(&address_store_key(address), &self.store, ctx)
            .await?;
        if bytes.is_empty() {
            return Ok(None);
        }

        self.decoder.decode(&bytes).map(Some)
    }

    /// Account number of `address`.
    ///
    /// # Errors
    /// Returns [`QueryError::AccountNotFound`] if there is no account.
    pub async fn account_number(
        &self,
        address: &[u8],
        ctx: &QueryContext,
    ) -> Result<u64, QueryError> {
        Ok(self.existing_account(address, ctx).await?.account_number)
    }

    /// Sequence of `address`.
    ///
    /// # Errors
    /// Returns [`QueryError::AccountNotFound`] if there is no account.
    pub async fn account_sequence(
        &self,
        address: &[u8],
        ctx: &QueryContext,
    ) -> Result<u64, QueryError> {
        Ok(self.existing_account(address, ctx).await?.sequence)
    }

    /// Fails unless an account is stored for `address`. The bytes are not decoded.
    ///
    /// # Errors
    /// Returns [`QueryError::AccountNotFound`] if there is no account.
    pub async fn ensure_account_exists(
        &self,
        address: &[u8],
        ctx: &QueryContext,
    ) -> Result<(), QueryError> {
        let bytes = self
            .client
            .query_store(&address_store_key(address), &self.store, ctx)
            .await?;
        if bytes.is_empty() {
            return Err(QueryError::AccountNotFound(address.to_vec()));
        }
        Ok(())
    }

    async fn existing_account(
        &self,
        address: &[u8],
        ctx: &QueryContext,
    ) -> Result<Account, QueryError> {
        self.get_account(address, ctx)
            .await?
            .ok_or_else(|| QueryError::AccountNotFound(address.to_vec()))
    }
}
