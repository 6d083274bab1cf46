//! Typed endpoint surface over the core request verbs.
//!
//! Thin wrappers that pin down paths and payload shapes; all auth, CSRF and
//! error semantics come from the shared pipeline in [`super::fetch`].

use serde_json::{json, Value};

use crate::error::Result;
use crate::query::encode_query_string;
use crate::types::{
    ManualActionDefinition, ManualActionTriggerPayload, PasswordLogin, PipelineTabDefinition, User,
};

use super::fetch::{ApiClient, ApiResponse};
use super::subscription::{SubscribeOptions, Subscription};

impl ApiClient {
    /// Fetch the authenticated user.
    pub async fn current_user(&self) -> Result<User> {
        self.get("/api/user").await?.into_json()
    }

    /// List registered users (admin only), one page at a time.
    pub async fn users(&self, page: u32) -> Result<Vec<User>> {
        let query = encode_query_string([("page", Some(page.into()))]);
        self.get(&format!("/api/users?{query}")).await?.into_json()
    }

    /// Log in with application-local credentials.
    ///
    /// On success the response carries a bearer token; applying it to this
    /// client ([`ApiClient::set_token`]) and persisting it
    /// ([`crate::TokenStore::store_token`]) stays with the caller.
    pub async fn login_with_password(&self, username: &str, password: &str) -> Result<PasswordLogin> {
        let body = json!({ "username": username, "password": password });
        self.post("/api/login", Some(&body)).await?.into_json()
    }

    /// List the manual action definitions configured for a repository.
    pub async fn manual_actions(&self, repo_id: i64) -> Result<Vec<ManualActionDefinition>> {
        self.get(&format!("/api/repos/{repo_id}/manual-actions"))
            .await?
            .into_json()
    }

    /// Trigger a configured manual action with user-supplied values.
    ///
    /// The response shape is defined by the action's webhook, so it is
    /// returned undecoded.
    pub async fn trigger_manual_action(
        &self,
        repo_id: i64,
        action_id: &str,
        payload: &ManualActionTriggerPayload,
    ) -> Result<ApiResponse> {
        let body = serde_json::to_value(payload)?;
        self.post(
            &format!("/api/repos/{repo_id}/manual-actions/{action_id}"),
            Some(&body),
        )
        .await
    }

    /// Fetch the dynamic tab definitions for a pipeline.
    pub async fn pipeline_tabs(&self, repo_id: i64, number: i64) -> Result<Vec<PipelineTabDefinition>> {
        self.get(&format!("/api/repos/{repo_id}/pipelines/{number}/tabs"))
            .await?
            .into_json()
    }

    /// Subscribe to the global pipeline event stream.
    ///
    /// The stream has no natural end; the channel reconnects after
    /// transient failures until [`Subscription::close`] is called.
    pub fn stream_events<F>(&self, on_message: F) -> Subscription
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.subscribe("/api/stream/events", on_message, SubscribeOptions::default())
    }

    /// Subscribe to the live logs of a single pipeline step.
    ///
    /// Log streams end when the step finishes - the server sends its
    /// end-of-stream marker and the channel closes instead of reconnecting.
    pub fn stream_logs<F>(&self, repo_id: i64, pipeline: i64, step: i64, on_message: F) -> Subscription
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.subscribe(
            &format!("/api/stream/logs/{repo_id}/{pipeline}/{step}"),
            on_message,
            SubscribeOptions { reconnect: false },
        )
    }
}
