//! # Repository Dispatch Scenarios
//!
//! End-to-end runs of declared repositories against the in-memory
//! chaincode operations adapter.
//!
//! ## Test Categories
//!
//! 1. **Query** - id binding, blank payloads, templates
//! 2. **Transactions** - pending events, transient data, idempotent criteria
//! 3. **Lifecycle** - install fallback, endorsement policy, collections

use chaincode_repository::adapters::in_memory::{CallMode, RecordedCriteria};
use chaincode_repository::prelude::*;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Notify;

// =============================================================================
// TEST HELPERS
// =============================================================================

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
struct Car {
    #[serde(default)]
    id: String,
    make: String,
    owner: String,
}

fn mapping() -> Arc<MappingContext> {
    Arc::new(
        MappingContext::new().with_mapped(
            EntityMapping::<Car>::new()
                .id_text("id", |car, tx| car.id = tx.to_string())
                .transient("owner", "car-owner", |car: &Car| Some(car.owner.clone())),
        ),
    )
}

fn car_type() -> ReturnType {
    ReturnType::Entity(EntityType::of::<Car>())
}

fn operations(common_root: &Path) -> Arc<InMemoryChaincodeOperations> {
    Arc::new(
        InMemoryChaincodeOperations::new()
            .with_organization(Organization::new("peerOrg1", "Org1MSP").with_user(User::new("admin", "Org1MSP")))
            .with_config(ChaincodeConfig {
                chaincode_root_path: None,
                common_root_path: common_root.to_path_buf(),
                endorsement_policy_file_path: None,
            }),
    )
}

fn repository(ops: Arc<InMemoryChaincodeOperations>, methods: Vec<MethodDeclaration>) -> ChaincodeRepository {
    chaincode_telemetry::init_test_logging();
    ChaincodeRepository::builder("CarRepository")
        .operations(ops)
        .channel(ChannelAttributes {
            name: "mychannel".into(),
            org: "peerOrg1".into(),
        })
        .chaincode(ChaincodeAttributes {
            name: "fabcar".into(),
            version: "1.0".into(),
            ..ChaincodeAttributes::default()
        })
        .id_type(IdType::String)
        .domain(EntityType::of::<Car>())
        .mapping(mapping())
        .methods(methods)
        .build()
        .unwrap()
}

// =============================================================================
// QUERY
// =============================================================================

#[tokio::test]
async fn test_find_by_id_binds_transaction_id() {
    let ops = operations(Path::new("/tmp"));
    ops.respond(
        OperationKind::Query,
        Some(ResultSet::new(
            Some(r#"{"id":"from-payload","make":"Tesla","owner":"Adriana"}"#.into()),
            "tx-42",
        )),
    );
    let repository = repository(
        ops.clone(),
        vec![MethodDeclaration::query("findById", car_type())
            .parameters(["id"])
            .args(["?0"])
            .serialization(SerializationMode::Deserialize, SerializationProvider::Json)],
    );

    let car = repository
        .execute("findById", &["CAR1".into()])
        .await
        .unwrap()
        .into_entity::<Car>()
        .unwrap();

    assert_eq!(car.id, "tx-42");
    assert_eq!(car.make, "Tesla");

    let call = ops.last_call().unwrap();
    assert_eq!(call.kind, OperationKind::Query);
    assert_eq!(call.func, "findById");
    assert_eq!(call.args, vec!["CAR1"]);
    assert_eq!(call.criteria.criteria().channel(), "mychannel");
}

#[tokio::test]
async fn test_blank_payload_is_null() {
    let ops = operations(Path::new("/tmp"));
    ops.respond(OperationKind::Query, Some(ResultSet::new(Some("   ".into()), "tx-1")));
    let repository = repository(
        ops,
        vec![MethodDeclaration::query("findById", car_type())
            .args(["?0"])
            .serialization(SerializationMode::Deserialize, SerializationProvider::Json)],
    );

    let output = repository.execute("findById", &["CAR404".into()]).await.unwrap();
    assert!(output.is_null());
}

#[tokio::test]
async fn test_expression_and_named_templates() {
    let ops = operations(Path::new("/tmp"));
    let repository = repository(
        ops.clone(),
        vec![MethodDeclaration::query("findByOwner", ReturnType::String)
            .parameters(["car", "limit"])
            .args(["?#{[0].owner + '-' + #limit}", ":limit", "fixed"])],
    );

    let car = Car {
        id: String::new(),
        make: "Audi".into(),
        owner: "Brad".into(),
    };
    repository
        .execute("findByOwner", &[ParamValue::entity(car), 10_i64.into()])
        .await
        .unwrap();

    assert_eq!(ops.last_call().unwrap().args, vec!["Brad-10", "10", "fixed"]);
}

#[tokio::test]
async fn test_named_query_overrides_args() {
    let ops = operations(Path::new("/tmp"));
    let repository = ChaincodeRepository::builder("CarRepository")
        .operations(ops.clone())
        .chaincode(ChaincodeAttributes {
            channel: "mychannel".into(),
            name: "fabcar".into(),
            ..ChaincodeAttributes::default()
        })
        .named_queries(NamedQueries::new().with("CarRepository.queryByMake", "make_;_?0"))
        .method(MethodDeclaration::query("queryByMake", ReturnType::String).args(["ignored"]))
        .build()
        .unwrap();

    repository.execute("queryByMake", &["Volvo".into()]).await.unwrap();
    assert_eq!(ops.last_call().unwrap().args, vec!["make", "Volvo"]);
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

#[tokio::test]
async fn test_future_event_returns_before_completion() {
    let gate = Arc::new(Notify::new());
    let ops = Arc::new(
        InMemoryChaincodeOperations::new()
            .with_organization(Organization::new("peerOrg1", "Org1MSP"))
            .with_async_gate(gate.clone()),
    );
    let repository = repository(ops.clone(), vec![MethodDeclaration::invoke("createCar", ReturnType::future_event())]);

    let output = repository.execute("createCar", &["CAR9".into()]).await.unwrap();
    let mut pending = output.into_pending().unwrap();

    assert!((&mut pending).now_or_never().is_none());
    assert_eq!(ops.last_call().unwrap().mode, CallMode::Async);

    gate.notify_one();
    let event = pending.await.unwrap();
    assert!(event.valid);
    assert_eq!(event.channel, "mychannel");
}

#[tokio::test]
async fn test_pending_failure_is_wrapped() {
    let gate = Arc::new(Notify::new());
    let ops = Arc::new(InMemoryChaincodeOperations::new().with_async_gate(gate.clone()));
    ops.fail_with(OperationError::Timeout { wait_ms: 100 });
    let repository = repository(ops, vec![MethodDeclaration::invoke("createCar", ReturnType::future_event())]);

    let pending = repository.execute("createCar", &[]).await.unwrap().into_pending().unwrap();
    gate.notify_one();
    let err = pending.await.unwrap_err();
    assert!(matches!(
        err,
        ChaincodeError::Operation { ref method, kind: OperationKind::Invoke, .. } if method == "createCar"
    ));
}

#[tokio::test]
async fn test_transient_data_and_idempotent_criteria() {
    let ops = operations(Path::new("/tmp"));
    let method = MethodDeclaration::invoke("createCar", ReturnType::ResultSet)
        .args(["?0"])
        .proposal(ProposalAttributes {
            client_user: "admin".into(),
            wait_time: 1000,
            ..ProposalAttributes::default()
        })
        .transaction(TransactionAttributes {
            user: "admin".into(),
            wait_time: 2000,
        });
    let repository = repository(ops.clone(), vec![method]);

    let car = ParamValue::entity(Car {
        id: "CAR1".into(),
        make: "Fiat".into(),
        owner: "Chen".into(),
    });
    repository.execute("createCar", &[car.clone()]).await.unwrap();
    repository.execute("createCar", &[car]).await.unwrap();

    let calls = ops.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].criteria, calls[1].criteria);
    assert_eq!(calls[0].args, calls[1].args);

    let transient = calls[0].criteria.transient_data();
    assert_eq!(transient.get("car-owner").map(Vec::as_slice), Some(&b"Chen"[..]));

    match &calls[0].criteria {
        RecordedCriteria::Invoke(criteria) => {
            assert_eq!(criteria.proposal.client_user.as_ref().map(|u| u.name.as_str()), Some("admin"));
            assert_eq!(criteria.transaction.transaction_wait_time, 2000);
        }
        other => panic!("unexpected criteria {other:?}"),
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

#[tokio::test]
async fn test_install_version_and_source_fallback() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("chaincode/go")).unwrap();

    let ops = operations(root.path());
    let repository = repository(
        ops.clone(),
        vec![MethodDeclaration::install(
            "install",
            ReturnType::ResultSet,
            InstallAttributes {
                version: "2.0".into(),
                chaincode_location: "chaincode/go".into(),
                meta_inf: String::new(),
            },
        )],
    );

    let envelope = repository.execute("install", &[]).await.unwrap().into_envelope();
    assert!(envelope.is_some());

    let call = ops.last_call().unwrap();
    assert_eq!(call.kind, OperationKind::Install);
    assert_eq!(call.source_location.as_deref(), Some(root.path().join("chaincode/go").as_path()));
    match call.criteria {
        RecordedCriteria::Install(criteria) => {
            assert_eq!(criteria.chaincode_upgrade_version.as_deref(), Some("2.0"));
            assert!(criteria.meta_inf().is_none());
        }
        other => panic!("unexpected criteria {other:?}"),
    }
}

#[tokio::test]
async fn test_instantiate_collection_formats() {
    let root = tempfile::tempdir().unwrap();
    fs::write(
        root.path().join("policy.json"),
        r#"[{"StaticCollectionConfig": {"name": "collectionCars", "policy": "OR('Org1MSP.member')", "maxPeerCount": 3}}]"#,
    )
    .unwrap();
    fs::write(root.path().join("policy.xml"), "<collections/>").unwrap();

    let deploy = |file: &str| DeployAttributes {
        endorsement_policy_file: "endorsement.yaml".into(),
        collection_configuration: root.path().join(file).display().to_string(),
    };
    let ops = operations(root.path());
    let repository = repository(
        ops.clone(),
        vec![
            MethodDeclaration::instantiate("instantiate", ReturnType::Event, deploy("policy.json")),
            MethodDeclaration::upgrade("upgrade", ReturnType::Event, deploy("policy.xml")),
        ],
    );

    let event = repository.execute("instantiate", &[]).await.unwrap().into_event();
    assert!(event.is_some());
    match ops.last_call().unwrap().criteria {
        RecordedCriteria::Instantiate(criteria) => {
            let collections = criteria.collection_configuration.unwrap();
            assert_eq!(collections.collections().next().unwrap().max_peer_count, 3);
            assert_eq!(
                criteria.endorsement_policy_file,
                Some(root.path().join("endorsement.yaml"))
            );
        }
        other => panic!("unexpected criteria {other:?}"),
    }

    let err = repository.execute("upgrade", &[]).await.unwrap_err();
    assert!(matches!(err, ChaincodeError::UnsupportedFormat { ref extension, .. } if extension == "xml"));
    assert_eq!(ops.calls().len(), 1);
}

#[tokio::test]
async fn test_unknown_user_org_fails_before_call() {
    let ops = Arc::new(InMemoryChaincodeOperations::new());
    let repository = repository(
        ops.clone(),
        vec![MethodDeclaration::invoke("createCar", ReturnType::ResultSet).transaction(TransactionAttributes {
            user: "admin".into(),
            wait_time: 0,
        })],
    );

    let err = repository.execute("createCar", &[]).await.unwrap_err();
    assert!(matches!(err, ChaincodeError::OrganizationNotFound { .. }));
    assert!(ops.calls().is_empty());
}
