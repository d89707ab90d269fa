//! The save pipeline: token acquisition, fail-fast validation, one
//! persist call, and a single retry after an authentication failure.
//!
//! A second save while one is in flight is disabled at the UI boundary,
//! not queued here, so the coordinator stays strictly sequential.

use crate::config::validate_graph;
use crate::error::{GatewayError, SaveError};
use crate::graph::WorkflowGraph;
use crate::metadata::MetadataCache;
use crate::payload::FlowPayload;

/// An OAuth token plus the instance it is valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub instance_url: String,
}

/// Gateway exchanging a user id for an access token.
pub trait TokenGateway {
    fn fetch_token(&self, user_id: &str) -> Result<AccessToken, GatewayError>;
}

/// Gateway persisting an assembled flow payload.
pub trait SaveGateway {
    fn persist(&self, token: &AccessToken, payload: &FlowPayload) -> Result<SaveReceipt, GatewayError>;
}

/// What the save gateway returns on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub success: bool,
    pub mapping_ids: Vec<String>,
}

/// Identity of the flow being saved; the instance URL comes back with
/// the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveIdentity {
    pub user_id: String,
    pub flow_id: String,
    pub form_version_id: String,
}

/// Drives a save end to end, caching the token across saves.
///
/// On an auth failure from the save gateway the cached token is dropped,
/// refreshed once, and the persist retried exactly once; a second failure
/// surfaces to the caller. Network errors are never retried.
pub struct SaveCoordinator<T: TokenGateway, S: SaveGateway> {
    tokens: T,
    saver: S,
    token: Option<AccessToken>,
}

impl<T: TokenGateway, S: SaveGateway> SaveCoordinator<T, S> {
    pub fn new(tokens: T, saver: S) -> Self {
        Self {
            tokens,
            saver,
            token: None,
        }
    }

    pub fn save(
        &mut self,
        graph: &WorkflowGraph,
        metadata: &MetadataCache,
        identity: &SaveIdentity,
    ) -> Result<SaveReceipt, SaveError> {
        let token = self.ensure_token(&identity.user_id)?;

        // Fail fast: the first misconfigured node aborts the save before
        // any network call.
        validate_graph(graph, metadata)?;

        let payload = FlowPayload::from_graph(
            graph,
            identity.user_id.clone(),
            token.instance_url.clone(),
            identity.flow_id.clone(),
            &identity.form_version_id,
        )
        .map_err(|e| SaveError::Payload(e.to_string()))?;

        match self.saver.persist(&token, &payload) {
            Ok(receipt) => {
                tracing::info!(flow = %identity.flow_id, mappings = receipt.mapping_ids.len(), "flow saved");
                Ok(receipt)
            }
            Err(GatewayError::Auth(reason)) => {
                tracing::warn!(%reason, "save rejected, refreshing token and retrying once");
                self.token = None;
                let token = self.ensure_token(&identity.user_id)?;
                match self.saver.persist(&token, &payload) {
                    Ok(receipt) => Ok(receipt),
                    Err(GatewayError::Auth(reason)) => Err(SaveError::Auth(reason)),
                    Err(GatewayError::Network(reason)) => Err(SaveError::Network(reason)),
                }
            }
            Err(GatewayError::Network(reason)) => Err(SaveError::Network(reason)),
        }
    }

    fn ensure_token(&mut self, user_id: &str) -> Result<AccessToken, SaveError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let token = self.tokens.fetch_token(user_id).map_err(|e| match e {
            GatewayError::Auth(reason) => SaveError::Auth(reason),
            GatewayError::Network(reason) => SaveError::Network(reason),
        })?;
        self.token = Some(token.clone());
        Ok(token)
    }
}
