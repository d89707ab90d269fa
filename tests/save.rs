//! The save pipeline: payload assembly, fail-fast validation, token
//! caching, and the single auth retry.
mod common;

use common::*;
use kairo::prelude::*;
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct CountingTokens {
    fetches: Rc<Cell<usize>>,
}

impl TokenGateway for CountingTokens {
    fn fetch_token(&self, _user_id: &str) -> Result<AccessToken, GatewayError> {
        let n = self.fetches.get() + 1;
        self.fetches.set(n);
        Ok(AccessToken {
            access_token: format!("token-{n}"),
            instance_url: "https://example.my.salesforce.com".to_string(),
        })
    }
}

/// Fails the first `auth_failures` persist calls with an auth error, then
/// succeeds. Records every token it was handed.
struct FlakySaver {
    persists: Rc<Cell<usize>>,
    auth_failures: Cell<usize>,
    tokens_seen: Rc<RefCell<Vec<String>>>,
}

impl SaveGateway for FlakySaver {
    fn persist(
        &self,
        token: &AccessToken,
        payload: &FlowPayload,
    ) -> Result<SaveReceipt, GatewayError> {
        self.persists.set(self.persists.get() + 1);
        self.tokens_seen.borrow_mut().push(token.access_token.clone());
        if self.auth_failures.get() > 0 {
            self.auth_failures.set(self.auth_failures.get() - 1);
            return Err(GatewayError::Auth("session expired".to_string()));
        }
        Ok(SaveReceipt {
            success: true,
            mapping_ids: payload.mappings.iter().map(|m| m.node_id.clone()).collect(),
        })
    }
}

struct NetworkDownSaver {
    persists: Rc<Cell<usize>>,
}

impl SaveGateway for NetworkDownSaver {
    fn persist(
        &self,
        _token: &AccessToken,
        _payload: &FlowPayload,
    ) -> Result<SaveReceipt, GatewayError> {
        self.persists.set(self.persists.get() + 1);
        Err(GatewayError::Network("connection reset".to_string()))
    }
}

fn identity() -> SaveIdentity {
    SaveIdentity {
        user_id: "user-1".to_string(),
        flow_id: "flow-1".to_string(),
        form_version_id: "fv-1".to_string(),
    }
}

fn coordinator(
    auth_failures: usize,
) -> (
    SaveCoordinator<CountingTokens, FlakySaver>,
    Rc<Cell<usize>>,
    Rc<Cell<usize>>,
    Rc<RefCell<Vec<String>>>,
) {
    let fetches = Rc::new(Cell::new(0));
    let persists = Rc::new(Cell::new(0));
    let tokens_seen = Rc::new(RefCell::new(Vec::new()));
    let coordinator = SaveCoordinator::new(
        CountingTokens {
            fetches: fetches.clone(),
        },
        FlakySaver {
            persists: persists.clone(),
            auth_failures: Cell::new(auth_failures),
            tokens_seen: tokens_seen.clone(),
        },
    );
    (coordinator, fetches, persists, tokens_seen)
}

#[test]
fn clean_save_fetches_once_and_persists_once() {
    let (mut coordinator, fetches, persists, _) = coordinator(0);
    let receipt = coordinator
        .save(&linear_flow(), &MetadataCache::new(), &identity())
        .expect("save");
    assert!(receipt.success);
    assert_eq!(fetches.get(), 1);
    assert_eq!(persists.get(), 1);
}

#[test]
fn auth_failure_refreshes_the_token_and_retries_once() {
    let (mut coordinator, fetches, persists, tokens_seen) = coordinator(1);
    let receipt = coordinator
        .save(&linear_flow(), &MetadataCache::new(), &identity())
        .expect("save");
    assert!(receipt.success);
    assert_eq!(fetches.get(), 2);
    assert_eq!(persists.get(), 2);
    // The retry must carry the refreshed token, not the stale one.
    assert_eq!(
        *tokens_seen.borrow(),
        vec!["token-1".to_string(), "token-2".to_string()]
    );
}

#[test]
fn second_auth_failure_surfaces_without_more_retries() {
    let (mut coordinator, _, persists, _) = coordinator(2);
    let err = coordinator
        .save(&linear_flow(), &MetadataCache::new(), &identity())
        .unwrap_err();
    assert_eq!(err, SaveError::Auth("session expired".to_string()));
    assert_eq!(persists.get(), 2);
}

#[test]
fn network_failures_are_never_retried() {
    let persists = Rc::new(Cell::new(0));
    let mut coordinator = SaveCoordinator::new(
        CountingTokens {
            fetches: Rc::new(Cell::new(0)),
        },
        NetworkDownSaver {
            persists: persists.clone(),
        },
    );
    let err = coordinator
        .save(&linear_flow(), &MetadataCache::new(), &identity())
        .unwrap_err();
    assert_eq!(err, SaveError::Network("connection reset".to_string()));
    assert_eq!(persists.get(), 1);
}

#[test]
fn validation_failure_aborts_before_any_persist() {
    let (mut coordinator, _, persists, _) = coordinator(0);
    let graph = WorkflowGraph::new();
    let graph = add(graph, step("find-1", ActionKind::Find));
    let err = coordinator
        .save(&graph, &MetadataCache::new(), &identity())
        .unwrap_err();
    assert!(matches!(err, SaveError::Validation(ConfigError::MissingObject { .. })));
    assert_eq!(persists.get(), 0);
}

#[test]
fn token_is_cached_across_saves() {
    let (mut coordinator, fetches, persists, _) = coordinator(0);
    let graph = linear_flow();
    let metadata = MetadataCache::new();
    coordinator.save(&graph, &metadata, &identity()).expect("first");
    coordinator.save(&graph, &metadata, &identity()).expect("second");
    assert_eq!(fetches.get(), 1);
    assert_eq!(persists.get(), 2);
}

#[test]
fn payload_mappings_exclude_start_and_end() {
    let graph = linear_flow();
    let payload =
        FlowPayload::from_graph(&graph, "user-1", "https://example", "flow-1", "fv-1")
            .expect("payload");
    let ids: Vec<_> = payload.mappings.iter().map(|m| m.node_id.as_str()).collect();
    assert_eq!(ids, vec!["find-1", "create-1"]);
    // Every canvas node is still persisted, Start and End included.
    assert_eq!(payload.nodes.len(), 4);
    assert!(payload.nodes.iter().all(|n| n.node_type == "custom"));
}

#[test]
fn payload_mappings_carry_execution_links() {
    let graph = linear_flow();
    let payload =
        FlowPayload::from_graph(&graph, "user-1", "https://example", "flow-1", "fv-1")
            .expect("payload");
    let find = &payload.mappings[0];
    assert_eq!(find.previous_node_id.as_deref(), Some("start"));
    assert_eq!(find.next_node_ids, vec!["create-1".to_string()]);
    assert_eq!(find.salesforce_object.as_deref(), Some("Account"));
    assert_eq!(find.logic_type.as_deref(), Some("AND"));
    assert_eq!(find.order, Some(2));
    assert_eq!(find.form_version_id, "fv-1");
}

#[test]
fn loop_self_edge_stays_out_of_execution_links() {
    let graph = looped_flow();
    let payload =
        FlowPayload::from_graph(&graph, "user-1", "https://example", "flow-1", "fv-1")
            .expect("payload");
    let row = payload
        .mappings
        .iter()
        .find(|m| m.node_id == "loop-1")
        .expect("loop row");
    assert_eq!(row.previous_node_id.as_deref(), Some("find-1"));
    assert_eq!(row.next_node_ids, vec!["end".to_string()]);
    assert!(row.loop_config.is_some());
    // The self-edge itself is still persisted for the canvas.
    assert!(payload.edges.iter().any(|e| e.source == e.target));
}

#[test]
fn payload_serializes_in_camel_case() {
    let graph = linear_flow();
    let payload =
        FlowPayload::from_graph(&graph, "user-1", "https://example", "flow-1", "fv-1")
            .expect("payload");
    let value = serde_json::to_value(&payload).expect("serialize");
    assert!(value.get("userId").is_some());
    assert!(value.get("instanceUrl").is_some());
    assert!(value.get("flowId").is_some());
    let row = &value["mappings"][0];
    assert!(row.get("nodeId").is_some());
    assert!(row.get("nextNodeIds").is_some());
    assert!(row.get("formVersionId").is_some());
    let node = &value["nodes"][0];
    assert_eq!(node["type"], "custom");
    assert!(node["data"].get("displayLabel").is_some());
}
