//! # Descriptor-Declared Repositories
//!
//! Repositories loaded from TOML descriptor files behave like the ones
//! declared in code.

use chaincode_repository::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Marble {
    #[serde(default)]
    id: String,
    color: String,
    size: u32,
}

const MARBLES: &str = r#"
name = "MarbleRepository"
id_type = "String"
domain = "Marble"

[channel]
name = "mychannel"
org = "peerOrg1"

[chaincode]
name = "marbles"
version = "1.0"
lang = "golang"

[named_queries]
"MarbleRepository.readMarble" = "?0"

[[methods]]
name = "readMarble"
kind = "query"
returns = "Marble"
parameters = ["name"]
serialization = { mode = "deserialize", provider = "yaml" }

[[methods]]
name = "initMarble"
kind = "invoke"
returns = "event"
parameters = ["name", "color", "size"]
proposal = { args = ["?0", "?1", "?2"], client_user = "admin" }
transaction = { user = "admin", wait_time = 5000 }

[[methods]]
name = "install"
kind = "install"
returns = "string"
install = { version = "1.1" }
"#;

fn mapping() -> Arc<MappingContext> {
    Arc::new(
        MappingContext::new().with_mapped(EntityMapping::<Marble>::new().id_text("id", |m, tx| m.id = tx.to_string())),
    )
}

fn operations() -> Arc<InMemoryChaincodeOperations> {
    Arc::new(
        InMemoryChaincodeOperations::new()
            .with_organization(Organization::new("peerOrg1", "Org1MSP").with_user(User::new("admin", "Org1MSP")))
            .with_config(ChaincodeConfig {
                chaincode_root_path: Some(std::env::temp_dir()),
                ..ChaincodeConfig::default()
            }),
    )
}

fn load(ops: Arc<InMemoryChaincodeOperations>) -> ChaincodeRepository {
    chaincode_telemetry::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marbles.toml");
    fs::write(&path, MARBLES).unwrap();

    let context = mapping();
    let descriptor = RepositoryDescriptor::load(&path, &context).unwrap();
    ChaincodeRepository::from_descriptor(descriptor, ops, context).unwrap()
}

#[test]
fn test_descriptor_builds_repository() {
    let repository = load(operations());

    assert_eq!(repository.name(), "MarbleRepository");
    assert_eq!(repository.identity().channel(), "mychannel");
    assert_eq!(repository.identity().version(), "1.0");
    assert_eq!(
        repository.methods().collect::<Vec<_>>(),
        vec!["initMarble", "install", "readMarble"]
    );

    let info = repository.entity_information().unwrap();
    assert_eq!(info.name(), "Marble");
    assert_eq!(info.id_property(), Some("id"));
}

#[tokio::test]
async fn test_yaml_result_provider() {
    let ops = operations();
    ops.respond(
        OperationKind::Query,
        Some(ResultSet::new(Some("color: blue\nsize: 35\n".into()), "tx-marble")),
    );
    let repository = load(ops.clone());

    let marble = repository
        .execute("readMarble", &["marble1".into()])
        .await
        .unwrap()
        .into_entity::<Marble>()
        .unwrap();

    assert_eq!(marble.id, "tx-marble");
    assert_eq!(marble.color, "blue");
    assert_eq!(marble.size, 35);
    assert_eq!(ops.last_call().unwrap().args, vec!["marble1"]);
}

#[tokio::test]
async fn test_invoke_and_install_from_descriptor() {
    let ops = operations();
    let repository = load(ops.clone());

    let event = repository
        .execute("initMarble", &["marble2".into(), "red".into(), 50_i64.into()])
        .await
        .unwrap()
        .into_event()
        .unwrap();
    assert_eq!(event.channel, "mychannel");
    assert_eq!(ops.last_call().unwrap().args, vec!["marble2", "red", "50"]);

    ops.respond(OperationKind::Install, Some(ResultSet::new(None, "tx-install")));
    let output = repository.execute("install", &[]).await.unwrap();
    assert_eq!(output.as_text(), Some("tx-install"));
    assert_eq!(ops.last_call().unwrap().source_location, Some(std::env::temp_dir()));
}

#[test]
fn test_descriptor_shape_errors_surface_at_build() {
    let content = r#"
name = "R"
[channel]
name = "c"
[[methods]]
name = "watch"
kind = "query"
returns = "future<event>"
"#;
    let context = mapping();
    let descriptor = RepositoryDescriptor::parse(content, &context).unwrap();
    let err = ChaincodeRepository::from_descriptor(descriptor, operations(), context).unwrap_err();
    assert!(matches!(err, ChaincodeError::UnsupportedOperation(ref msg) if msg.contains("watch")));

    let content = r#"
name = "R"
id_type = "Long"
"#;
    let descriptor = RepositoryDescriptor::parse(content, &mapping()).unwrap();
    let err = ChaincodeRepository::from_descriptor(descriptor, operations(), mapping()).unwrap_err();
    assert!(matches!(err, ChaincodeError::UnsupportedOperation(_)));
}
