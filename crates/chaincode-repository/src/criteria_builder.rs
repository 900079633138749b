//! # Operation Criteria Builder
//!
//! Assembles the per-kind criteria for one call from the repository
//! identity, the method's attributes and the collaborator's configuration.
//!
//! Configured paths are checked in two steps: the literal path first, then
//! the same path under `common_root_path`. Falling back is logged, never an
//! error.

use crate::adapters::collection_config::load_collection_configuration;
use crate::domain::criteria::{
    Criteria, InstallCriteria, InstantiateCriteria, InvokeCriteria, ProposalOptions, QueryCriteria,
    TransactionOptions, TransientData, UpgradeCriteria,
};
use crate::domain::entities::{ChaincodeConfig, CollectionConfiguration, User};
use crate::domain::method::{DeployAttributes, InstallAttributes, ProposalAttributes, TransactionAttributes};
use crate::domain::value_objects::is_blank;
use crate::errors::{ChaincodeError, ConfigError};
use crate::ports::outbound::ChaincodeOperations;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Builder for the criteria of one call.
pub struct OperationCriteriaBuilder<'a> {
    identity: &'a Criteria,
    config: &'a ChaincodeConfig,
    operations: &'a dyn ChaincodeOperations,
}

impl<'a> OperationCriteriaBuilder<'a> {
    /// Creates a builder over a repository identity.
    #[must_use]
    pub fn new(
        identity: &'a Criteria,
        config: &'a ChaincodeConfig,
        operations: &'a dyn ChaincodeOperations,
    ) -> Self {
        Self {
            identity,
            config,
            operations,
        }
    }

    /// Literal path if it exists, else the path under `common_root_path`.
    #[must_use]
    pub fn resolve_path(&self, configured: &Path, what: &str) -> PathBuf {
        if configured.exists() {
            return configured.to_path_buf();
        }

        let fallback = self.config.common_root_path.join(configured);
        warn!(
            path = %configured.display(),
            fallback = %fallback.display(),
            "{what} does not exist, trying the common root path"
        );
        fallback
    }

    /// Resolves a user name through the organization lookup.
    ///
    /// Blank names yield no user. A name the organization does not know is
    /// logged and yields no user.
    pub fn user(&self, name: &str) -> Result<Option<User>, ChaincodeError> {
        if is_blank(name) {
            return Ok(None);
        }

        let organization = self.operations.organization(self.identity).ok_or_else(|| {
            ChaincodeError::OrganizationNotFound {
                channel: self.identity.channel().to_string(),
                org: self.identity.org().to_string(),
            }
        })?;

        let user = organization.user(name).cloned();
        if user.is_none() {
            warn!(user = name, org = %organization.name, "User not found in organization");
        }
        Ok(user)
    }

    fn proposal_options(
        &self,
        proposal: &ProposalAttributes,
        transient_data: TransientData,
    ) -> Result<ProposalOptions, ChaincodeError> {
        Ok(ProposalOptions {
            request_user: self.user(&proposal.request_user)?,
            client_user: self.user(&proposal.client_user)?,
            proposal_wait_time: proposal.wait_time,
            specific_peers: proposal.specific_peers,
            transient_data,
        })
    }

    fn transaction_options(
        &self,
        transaction: &TransactionAttributes,
    ) -> Result<TransactionOptions, ChaincodeError> {
        Ok(TransactionOptions {
            transactions_user: self.user(&transaction.user)?,
            transaction_wait_time: transaction.wait_time,
        })
    }

    fn policy_file(&self, configured: &str) -> Option<PathBuf> {
        let configured = if is_blank(configured) {
            self.config.endorsement_policy_file_path.clone()?
        } else {
            PathBuf::from(configured)
        };
        Some(self.resolve_path(&configured, "Endorsement policy file"))
    }

    fn collection_configuration(
        &self,
        configured: &str,
    ) -> Result<Option<CollectionConfiguration>, ChaincodeError> {
        if is_blank(configured) {
            return Ok(None);
        }
        let path = self.resolve_path(Path::new(configured), "Collection configuration file");
        load_collection_configuration(&path).map(Some)
    }

    /// Install criteria and the resolved chaincode source location.
    pub fn install(
        &self,
        install: &InstallAttributes,
        proposal: &ProposalAttributes,
        transient_data: TransientData,
    ) -> Result<(InstallCriteria, PathBuf), ChaincodeError> {
        let mut criteria = InstallCriteria::new(self.identity.clone());
        criteria.proposal = self.proposal_options(proposal, transient_data)?;
        criteria.chaincode_upgrade_version =
            (!is_blank(&install.version)).then(|| install.version.clone());
        criteria.chaincode_meta_inf = (!is_blank(&install.meta_inf))
            .then(|| self.resolve_path(Path::new(&install.meta_inf), "Chaincode META-INF directory"));

        let location = if is_blank(&install.chaincode_location) {
            self.config.chaincode_root_path.clone().ok_or_else(|| {
                ConfigError::Missing("chaincode source location for install".to_string())
            })?
        } else {
            PathBuf::from(&install.chaincode_location)
        };
        let source = self.resolve_path(&location, "Chaincode source directory");

        Ok((criteria, source))
    }

    /// Instantiate criteria.
    pub fn instantiate(
        &self,
        deploy: &DeployAttributes,
        proposal: &ProposalAttributes,
        transaction: &TransactionAttributes,
        transient_data: TransientData,
    ) -> Result<InstantiateCriteria, ChaincodeError> {
        let mut criteria = InstantiateCriteria::new(self.identity.clone());
        criteria.collection_configuration = self.collection_configuration(&deploy.collection_configuration)?;
        criteria.endorsement_policy_file = self.policy_file(&deploy.endorsement_policy_file);
        criteria.proposal = self.proposal_options(proposal, transient_data)?;
        criteria.transaction = self.transaction_options(transaction)?;
        Ok(criteria)
    }

    /// Upgrade criteria.
    pub fn upgrade(
        &self,
        deploy: &DeployAttributes,
        proposal: &ProposalAttributes,
        transaction: &TransactionAttributes,
        transient_data: TransientData,
    ) -> Result<UpgradeCriteria, ChaincodeError> {
        let mut criteria = UpgradeCriteria::new(self.identity.clone());
        criteria.collection_configuration = self.collection_configuration(&deploy.collection_configuration)?;
        criteria.endorsement_policy_file = self.policy_file(&deploy.endorsement_policy_file);
        criteria.proposal = self.proposal_options(proposal, transient_data)?;
        criteria.transaction = self.transaction_options(transaction)?;
        Ok(criteria)
    }

    /// Invoke criteria.
    pub fn invoke(
        &self,
        proposal: &ProposalAttributes,
        transaction: &TransactionAttributes,
        transient_data: TransientData,
    ) -> Result<InvokeCriteria, ChaincodeError> {
        let mut criteria = InvokeCriteria::new(self.identity.clone());
        criteria.proposal = self.proposal_options(proposal, transient_data)?;
        criteria.transaction = self.transaction_options(transaction)?;
        Ok(criteria)
    }

    /// Query criteria.
    pub fn query(
        &self,
        proposal: &ProposalAttributes,
        transient_data: TransientData,
    ) -> Result<QueryCriteria, ChaincodeError> {
        let mut criteria = QueryCriteria::new(self.identity.clone());
        criteria.proposal = self.proposal_options(proposal, transient_data)?;
        Ok(criteria)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryChaincodeOperations;
    use crate::domain::entities::Organization;
    use std::fs;
    use std::time::Duration;

    fn identity() -> Criteria {
        Criteria::builder()
            .channel("mychannel")
            .org("peerOrg1")
            .name("example_cc_go")
            .version("1.0")
            .build()
    }

    fn operations(common_root: &Path) -> InMemoryChaincodeOperations {
        InMemoryChaincodeOperations::new()
            .with_organization(
                Organization::new("peerOrg1", "Org1MSP")
                    .with_user(User::new("admin", "Org1MSP"))
                    .with_user(User::new("user1", "Org1MSP")),
            )
            .with_config(ChaincodeConfig {
                chaincode_root_path: None,
                common_root_path: common_root.to_path_buf(),
                endorsement_policy_file_path: None,
            })
    }

    #[test]
    fn test_users_resolved() {
        let identity = identity();
        let ops = operations(Path::new("/tmp"));
        let config = ops.config(&identity);
        let builder = OperationCriteriaBuilder::new(&identity, &config, &ops);

        let proposal = ProposalAttributes {
            client_user: "admin".into(),
            request_user: "ghost".into(),
            wait_time: 120_000,
            specific_peers: true,
            ..ProposalAttributes::default()
        };
        let criteria = builder.query(&proposal, TransientData::new()).unwrap();

        assert_eq!(criteria.proposal.client_user.as_ref().map(|u| u.name.as_str()), Some("admin"));
        assert!(criteria.proposal.request_user.is_none());
        assert!(criteria.proposal.specific_peers);
        assert_eq!(criteria.proposal.proposal_wait(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_organization_missing() {
        let identity = identity();
        let ops = InMemoryChaincodeOperations::new();
        let config = ChaincodeConfig::default();
        let builder = OperationCriteriaBuilder::new(&identity, &config, &ops);

        assert!(builder.user("  ").unwrap().is_none());
        let err = builder.user("admin").unwrap_err();
        assert!(matches!(err, ChaincodeError::OrganizationNotFound { ref org, .. } if org == "peerOrg1"));
    }

    #[test]
    fn test_install_fallback_to_common_root() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("chaincode/go")).unwrap();

        let identity = identity();
        let ops = operations(root.path());
        let config = ops.config(&identity);
        let builder = OperationCriteriaBuilder::new(&identity, &config, &ops);

        let install = InstallAttributes {
            version: "2.0".into(),
            chaincode_location: "chaincode/go".into(),
            meta_inf: String::new(),
        };
        let (criteria, source) = builder
            .install(&install, &ProposalAttributes::default(), TransientData::new())
            .unwrap();

        assert_eq!(criteria.chaincode_upgrade_version.as_deref(), Some("2.0"));
        assert!(criteria.meta_inf().is_none());
        assert_eq!(source, root.path().join("chaincode/go"));
    }

    #[test]
    fn test_install_defaults_to_chaincode_root() {
        let root = tempfile::tempdir().unwrap();
        let identity = identity();
        let config = ChaincodeConfig {
            chaincode_root_path: Some(root.path().to_path_buf()),
            ..ChaincodeConfig::default()
        };
        let ops = InMemoryChaincodeOperations::new();
        let builder = OperationCriteriaBuilder::new(&identity, &config, &ops);

        let (criteria, source) = builder
            .install(&InstallAttributes::default(), &ProposalAttributes::default(), TransientData::new())
            .unwrap();
        assert_eq!(source, root.path());
        assert!(criteria.chaincode_upgrade_version.is_none());

        let config = ChaincodeConfig::default();
        let builder = OperationCriteriaBuilder::new(&identity, &config, &ops);
        let err = builder
            .install(&InstallAttributes::default(), &ProposalAttributes::default(), TransientData::new())
            .unwrap_err();
        assert!(matches!(err, ChaincodeError::Config(ConfigError::Missing(_))));
    }

    #[test]
    fn test_policy_defaults_and_absent() {
        let identity = identity();
        let ops = InMemoryChaincodeOperations::new();
        let deploy = DeployAttributes::default();

        let config = ChaincodeConfig::default();
        let builder = OperationCriteriaBuilder::new(&identity, &config, &ops);
        let criteria = builder
            .instantiate(&deploy, &ProposalAttributes::default(), &TransactionAttributes::default(), TransientData::new())
            .unwrap();
        assert!(criteria.endorsement_policy_file.is_none());
        assert!(criteria.collection_configuration.is_none());

        let config = ChaincodeConfig {
            common_root_path: PathBuf::from("/opt/fabric"),
            endorsement_policy_file_path: Some(PathBuf::from("policy/endorsement.yaml")),
            ..ChaincodeConfig::default()
        };
        let builder = OperationCriteriaBuilder::new(&identity, &config, &ops);
        let criteria = builder
            .upgrade(&deploy, &ProposalAttributes::default(), &TransactionAttributes::default(), TransientData::new())
            .unwrap();
        assert_eq!(
            criteria.endorsement_policy_file,
            Some(PathBuf::from("/opt/fabric/policy/endorsement.yaml"))
        );
    }

    #[test]
    fn test_collection_configuration_loaded() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join("collections.json"),
            r#"[{"StaticCollectionConfig": {"name": "c1", "policy": "OR('Org1MSP.member')"}}]"#,
        )
        .unwrap();

        let identity = identity();
        let ops = operations(root.path());
        let config = ops.config(&identity);
        let builder = OperationCriteriaBuilder::new(&identity, &config, &ops);

        let deploy = DeployAttributes {
            collection_configuration: "collections.json".into(),
            ..DeployAttributes::default()
        };
        let criteria = builder
            .instantiate(&deploy, &ProposalAttributes::default(), &TransactionAttributes::default(), TransientData::new())
            .unwrap();
        assert_eq!(criteria.collection_configuration.unwrap().len(), 1);

        let deploy = DeployAttributes {
            collection_configuration: "collections.xml".into(),
            ..DeployAttributes::default()
        };
        let err = builder
            .instantiate(&deploy, &ProposalAttributes::default(), &TransactionAttributes::default(), TransientData::new())
            .unwrap_err();
        assert!(matches!(err, ChaincodeError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_building_twice_is_equal() {
        let identity = identity();
        let ops = operations(Path::new("/tmp"));
        let config = ops.config(&identity);
        let builder = OperationCriteriaBuilder::new(&identity, &config, &ops);

        let proposal = ProposalAttributes {
            client_user: "user1".into(),
            wait_time: 10,
            ..ProposalAttributes::default()
        };
        let transaction = TransactionAttributes {
            user: "admin".into(),
            wait_time: 20,
        };
        let first = builder.invoke(&proposal, &transaction, TransientData::new()).unwrap();
        let second = builder.invoke(&proposal, &transaction, TransientData::new()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.transaction.transaction_wait(), Some(Duration::from_millis(20)));
    }
}
