//! HTTP gateways over the savings REST API.
//!
//! Provides both async and blocking client variants behind feature flags.
//! Each client implements the matching gateway trait, so it can back a
//! goal store directly.

use crate::models::{DepositId, GoalId, InstallmentId};

/// Base URL used when none is configured.
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Collection route for savings goals.
const GOALS_PATH: &str = "/api/savings-goals";

/// Route of a single goal.
fn goal_path(id: GoalId) -> String {
    format!("{GOALS_PATH}/{id}")
}

/// Route of a goal's installment schedule.
fn installments_path(goal_id: GoalId) -> String {
    format!("{GOALS_PATH}/{goal_id}/installments")
}

/// Route of an action (`pay`, `skip`) on one installment.
fn installment_action_path(goal_id: GoalId, installment_id: InstallmentId, action: &str) -> String {
    format!("{GOALS_PATH}/{goal_id}/installments/{installment_id}/{action}")
}

/// Route of a goal's deposits.
fn deposits_path(goal_id: GoalId) -> String {
    format!("{GOALS_PATH}/{goal_id}/deposits")
}

/// Route of a single deposit.
fn deposit_path(deposit_id: DepositId) -> String {
    format!("{GOALS_PATH}/deposits/{deposit_id}")
}

/// Generates a savings client (async or blocking) with builder, gateway
/// implementation and tests.
macro_rules! define_client {
    (
        client_name: $client:ident,
        builder_name: $builder:ident,
        gateway_trait: $gateway:ident,
        http_type: $http_type:ty,
        request_type: $req_type:ty,
        response_type: $resp_type:ty,
        client_doc: $client_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
        $(send_bound: $send_bound:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder {
            /// Bearer token for API authentication.
            token: Option<SecretString>,
            /// Base URL override.
            base_url: Option<String>,
        }

        impl $builder {
            /// Sets the bearer token for API authentication.
            #[inline]
            #[must_use]
            pub fn token<T: Into<String>>(mut self, token: T) -> Self {
                self.token = Some(SecretString::from(token.into()));
                self
            }

            /// Overrides the base URL (useful for testing with a mock server).
            ///
            /// A trailing `/` is ignored.
            #[inline]
            #[must_use]
            pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
                self.base_url = Some(url.into().trim_end_matches('/').to_owned());
                self
            }

            /// Builds the client.
            ///
            /// # Errors
            ///
            /// Returns [`GatewayError::Configuration`] if no token was provided.
            /// Returns [`GatewayError::Http`] if the HTTP client fails to build.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub fn build(self) -> Result<$client> {
                let token = self.token.ok_or_else(|| {
                    GatewayError::Configuration("an API token is required".to_owned())
                })?;
                let base_url = self
                    .base_url
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
                tracing::debug!(base_url = %base_url, "building client");
                let http = <$http_type>::builder().build()?;

                Ok($client {
                    http,
                    token,
                    base_url,
                })
            }
        }

        #[doc = $client_doc]
        #[derive(Debug)]
        pub struct $client {
            /// Underlying HTTP client.
            http: $http_type,
            /// Bearer access token.
            token: SecretString,
            /// API base URL without a trailing slash.
            base_url: String,
        }

        impl $client {
            /// Creates a new builder for configuring the client.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder {
                $builder {
                    token: None,
                    base_url: None,
                }
            }

            /// Joins a route onto the base URL.
            fn url(&self, path: &str) -> String {
                format!("{}{path}", self.base_url)
            }

            /// Sends an authenticated request and returns the body of a
            /// successful response.
            #[tracing::instrument(skip_all)]
            $($async_kw)? fn execute(&self, request: $req_type) -> Result<String> {
                let response: $resp_type = request
                    .header(
                        AUTHORIZATION,
                        format!("Bearer {}", self.token.expose_secret()),
                    )
                    .send()
                    $( .$await_ext )?
                    ?;

                let status = response.status();
                tracing::debug!(status = %status, "received response");
                if status.is_success() {
                    Ok(response.text() $( .$await_ext )? ?)
                } else {
                    let message = response
                        .text()
                        $( .$await_ext )?
                        .unwrap_or_else(|_| String::new());
                    tracing::debug!(status = status.as_u16(), message = %message, "API error");
                    Err(GatewayError::Api {
                        status: status.as_u16(),
                        message,
                    }
                    .into())
                }
            }

            /// Fetches and deserializes a JSON resource.
            #[tracing::instrument(skip_all, fields(path = %path))]
            $($async_kw)? fn get_json<Resp: DeserializeOwned>(&self, path: &str) -> Result<Resp> {
                let body = self.execute(self.http.get(self.url(path))) $( .$await_ext )? ?;
                serde_json::from_str(&body).map_err(SavingsError::from)
            }

            /// Sends a JSON body and deserializes the JSON answer.
            #[tracing::instrument(skip_all, fields(method = %method, path = %path))]
            $($async_kw)? fn send_json<
                Req: Serialize $(+ $send_bound)?,
                Resp: DeserializeOwned,
            >(
                &self,
                method: Method,
                path: &str,
                request: &Req,
            ) -> Result<Resp> {
                let body = self
                    .execute(self.http.request(method, self.url(path)).json(request))
                    $( .$await_ext )?
                    ?;
                serde_json::from_str(&body).map_err(SavingsError::from)
            }

            /// Sends a bodiless POST and deserializes the JSON answer.
            #[tracing::instrument(skip_all, fields(path = %path))]
            $($async_kw)? fn post_empty<Resp: DeserializeOwned>(&self, path: &str) -> Result<Resp> {
                let body = self.execute(self.http.post(self.url(path))) $( .$await_ext )? ?;
                serde_json::from_str(&body).map_err(SavingsError::from)
            }

            /// Sends a DELETE, ignoring any response body.
            #[tracing::instrument(skip_all, fields(path = %path))]
            $($async_kw)? fn delete(&self, path: &str) -> Result<()> {
                let _body = self.execute(self.http.delete(self.url(path))) $( .$await_ext )? ?;
                Ok(())
            }
        }

        impl $gateway for $client {
            #[inline]
            $($async_kw)? fn list_goals(&self) -> Result<Vec<SavingsGoal>> {
                self.get_json(GOALS_PATH) $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn get_goal(&self, id: GoalId) -> Result<SavingsGoal> {
                self.get_json(&goal_path(id)) $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn create_goal(&self, request: &CreateGoalRequest) -> Result<SavingsGoal> {
                self.send_json(Method::POST, GOALS_PATH, request) $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn update_goal(
                &self,
                id: GoalId,
                request: &UpdateGoalRequest,
            ) -> Result<SavingsGoal> {
                self.send_json(Method::PUT, &goal_path(id), request) $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn delete_goal(&self, id: GoalId) -> Result<()> {
                self.delete(&goal_path(id)) $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn list_installments(&self, goal_id: GoalId) -> Result<Vec<Installment>> {
                self.get_json(&installments_path(goal_id)) $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn pay_installment(
                &self,
                goal_id: GoalId,
                installment_id: InstallmentId,
                request: &PayInstallmentRequest,
            ) -> Result<Deposit> {
                let path = installment_action_path(goal_id, installment_id, "pay");
                self.send_json(Method::POST, &path, request) $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn skip_installment(
                &self,
                goal_id: GoalId,
                installment_id: InstallmentId,
            ) -> Result<Installment> {
                let path = installment_action_path(goal_id, installment_id, "skip");
                self.post_empty(&path) $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn add_installments(
                &self,
                goal_id: GoalId,
                request: &AddInstallmentsRequest,
            ) -> Result<Vec<Installment>> {
                self.send_json(Method::POST, &installments_path(goal_id), request)
                    $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn list_deposits(&self, goal_id: GoalId) -> Result<Vec<Deposit>> {
                self.get_json(&deposits_path(goal_id)) $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn create_free_form_deposit(
                &self,
                goal_id: GoalId,
                request: &FreeFormDepositRequest,
            ) -> Result<Deposit> {
                self.send_json(Method::POST, &deposits_path(goal_id), request)
                    $( .$await_ext )?
            }

            #[inline]
            $($async_kw)? fn delete_deposit(&self, deposit_id: DepositId) -> Result<()> {
                self.delete(&deposit_path(deposit_id)) $( .$await_ext )?
            }
        }

    };
}

#[cfg(feature = "async")]
mod async_client {
    //! Async HTTP gateway.

    use reqwest::Method;
    use reqwest::header::AUTHORIZATION;
    use secrecy::{ExposeSecret, SecretString};
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use super::{
        DEFAULT_BASE_URL, GOALS_PATH, deposit_path, deposits_path, goal_path,
        installment_action_path, installments_path,
    };
    use crate::error::{GatewayError, Result, SavingsError};
    use crate::gateway::Gateway;
    use crate::models::{
        AddInstallmentsRequest, CreateGoalRequest, Deposit, DepositId, FreeFormDepositRequest,
        GoalId, Installment, InstallmentId, PayInstallmentRequest, SavingsGoal,
        UpdateGoalRequest,
    };

    define_client! {
        client_name: SavingsClient,
        builder_name: SavingsClientBuilder,
        gateway_trait: Gateway,
        http_type: reqwest::Client,
        request_type: reqwest::RequestBuilder,
        response_type: reqwest::Response,
        client_doc: "Async gateway over the savings REST API.\n\nUse [`SavingsClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`SavingsClient`].",
        async_kw: async,
        await_kw: await,
        send_bound: Sync,
    }
}

#[cfg(feature = "blocking")]
mod blocking_client {
    //! Blocking (synchronous) HTTP gateway.

    use reqwest::Method;
    use reqwest::header::AUTHORIZATION;
    use secrecy::{ExposeSecret, SecretString};
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use super::{
        DEFAULT_BASE_URL, GOALS_PATH, deposit_path, deposits_path, goal_path,
        installment_action_path, installments_path,
    };
    use crate::error::{GatewayError, Result, SavingsError};
    use crate::gateway::BlockingGateway;
    use crate::models::{
        AddInstallmentsRequest, CreateGoalRequest, Deposit, DepositId, FreeFormDepositRequest,
        GoalId, Installment, InstallmentId, PayInstallmentRequest, SavingsGoal,
        UpdateGoalRequest,
    };

    define_client! {
        client_name: SavingsBlockingClient,
        builder_name: SavingsBlockingClientBuilder,
        gateway_trait: BlockingGateway,
        http_type: reqwest::blocking::Client,
        request_type: reqwest::blocking::RequestBuilder,
        response_type: reqwest::blocking::Response,
        client_doc: "Blocking (synchronous) gateway over the savings REST API.\n\nUse [`SavingsBlockingClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`SavingsBlockingClient`].",
    }
}

#[cfg(feature = "async")]
pub use async_client::{SavingsClient, SavingsClientBuilder};
#[cfg(feature = "blocking")]
pub use blocking_client::{SavingsBlockingClient, SavingsBlockingClientBuilder};
