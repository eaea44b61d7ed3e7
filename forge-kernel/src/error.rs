//! Erreurs du moteur de provisioning
//!
//! - `ConfigurationError` : config invalide ou sous-réseau mal formé (fatal, rien n'est déclaré)
//! - `ProvisionerError` : remontée telle quelle depuis le provisioner externe
//! - `ProvisionError` : erreur globale d'un run de provisioning

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("malformed subnet entry '{0}': expected \"subnetId,availabilityZone\"")]
    MalformedSubnet(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid account id '{0}': must be numeric")]
    InvalidAccountId(String),
    #[error("invalid vpc id '{0}'")]
    InvalidVpcId(String),
    #[error("broker count must be at least 1, got {0}")]
    InvalidBrokerCount(u32),
    #[error("consumer group entry #{0} has an empty id or topic")]
    InvalidConsumerGroup(usize),
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionerError {
    #[error("resource '{0}' is already declared")]
    DuplicateLogicalId(String),
    #[error("resource '{id}' depends on undeclared resource '{dependency}'")]
    UnknownDependency { id: String, dependency: String },
    #[error("resource '{id}' has no attribute '{attribute}'")]
    MissingAttribute { id: String, attribute: String },
    #[error("export '{0}' is already declared")]
    DuplicateExport(String),
    #[error("provisioner rejected '{id}': {reason}")]
    Rejected { id: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Provisioner(#[from] ProvisionerError),
    #[error("alarm name '{0}' is generated twice")]
    DuplicateAlarmName(String),
}
