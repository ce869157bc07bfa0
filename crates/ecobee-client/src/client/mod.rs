//! ecobee API client.
//!
//! Provides an async HTTP client with:
//! - Connection pooling via reqwest
//! - Bearer authorization and transparent token refresh via [`AuthorizingMiddleware`]
//! - Optional retry middleware with exponential backoff for transient data-request failures

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;

use crate::auth::{AuthorizingMiddleware, TokenExchange, TokenStore};
use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};
use crate::models::{ApiStatus, Selection, Thermostat, ThermostatPage, ThermostatSummary};

/// ecobee API client.
#[derive(Clone)]
pub struct EcobeeClient {
    /// HTTP client with middleware; the authorizing middleware is always last.
    client: ClientWithMiddleware,

    /// Shared with the middleware chain.
    auth: Arc<AuthorizingMiddleware>,

    /// Data API base URL, e.g. `https://api.ecobee.com/1`.
    data_api_url: String,
}

impl EcobeeClient {
    /// Create a client that authorizes every request with tokens from `store`.
    ///
    /// The store should already be seeded by the PIN workflow; an unseeded store makes
    /// every request fail with an authorization error.
    ///
    /// # Errors
    ///
    /// Returns error if no application id is configured or the HTTP client cannot be built.
    pub fn new(config: &Config, store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let app_id = config.require_app_id()?;
        let http = build_http_client(config)?;

        let exchange = TokenExchange::new(http.clone(), &config.api_url, app_id);
        let auth = Arc::new(
            AuthorizingMiddleware::new(store, exchange)
                .with_reauth_threshold(config.reauth_threshold),
        );

        let mut builder = ClientBuilder::new(http);
        if config.max_retries > 0 {
            let retry_policy = ExponentialBackoff::builder()
                .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
                .build_with_max_retries(config.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }
        let client = builder.with_arc(auth.clone()).build();

        Ok(Self {
            client,
            auth,
            data_api_url: format!("{}/{}", config.api_url, api::DATA_VERSION),
        })
    }

    /// A bearer token valid for at least the reauthentication threshold, refreshing it
    /// first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Auth`] if the store cannot be read or the refresh fails.
    pub async fn access_token(&self) -> ClientResult<String> {
        Ok(self.auth.valid_access_token().await?)
    }

    /// The token store backing this client.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        self.auth.store()
    }

    /// The underlying client, for endpoints this crate doesn't wrap. Requests sent through
    /// it are authorized like any other.
    #[must_use]
    pub const fn http(&self) -> &ClientWithMiddleware {
        &self.client
    }

    /// Revision numbers for every registered thermostat. A cheap polling call.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn thermostat_summary(&self) -> ClientResult<ThermostatSummary> {
        let selection = Selection::registered().with_alerts();
        let summary: ThermostatSummary = self.get_selected("thermostatSummary", &selection).await?;
        check_status(&summary.status)?;
        Ok(summary)
    }

    /// Thermostats matching `selection`.
    ///
    /// Only the first page is returned; a warning is logged when more pages exist.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn thermostats(&self, selection: &Selection) -> ClientResult<Vec<Thermostat>> {
        let page: ThermostatPage = self.get_selected("thermostat", selection).await?;
        check_status(&page.status)?;

        if page.page.has_more() {
            tracing::warn!(
                page = page.page.page,
                total_pages = page.page.total_pages,
                "Skipped remaining pages of thermostat response"
            );
        }
        Ok(page.thermostat_list)
    }

    /// GET `{data_api_url}/{endpoint}?json={"selection":...}`.
    async fn get_selected<T>(&self, endpoint: &str, selection: &Selection) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.data_api_url, endpoint);
        let json = selection.to_query_json().map_err(ClientError::Encode)?;

        tracing::debug!(%url, selection_type = ?selection.selection_type, "Fetching");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json; charset=utf-8")
            .query(&[("json", json)])
            .send()
            .await?;

        let response = Self::handle_response(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(ClientError::Parse)
    }

    /// Handle API response status codes.
    async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 => Err(ClientError::Unauthorized { message: text }),
            404 => Err(ClientError::not_found(text)),
            400 => Err(ClientError::bad_request(text)),
            500..=599 => Err(ClientError::server(status.as_u16(), text)),
            _ => Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text }),
        }
    }
}

/// Turn a non-zero `status.code` in a 2xx body into an error.
fn check_status(status: &ApiStatus) -> ClientResult<()> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(ClientError::Api { code: status.code, message: status.message.clone() })
    }
}

fn build_http_client(config: &Config) -> ClientResult<Client> {
    Ok(Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .gzip(true)
        .build()?)
}

impl std::fmt::Debug for EcobeeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcobeeClient")
            .field("data_api_url", &self.data_api_url)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}
