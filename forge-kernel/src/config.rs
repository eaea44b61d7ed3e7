//! Chargement et validation de la configuration d'infrastructure
//!
//! Lit un fichier TOML (ou YAML selon l'extension), valide le schéma et
//! produit un `ValidatedConfig` typé. Le cœur du provisioning ne consomme que
//! ce `ValidatedConfig`, il ne touche jamais au fichier ni à l'environnement.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::error::ConfigurationError;
use crate::models::{ConsumerGroup, Namespace};

pub const CONFIG_ENV_VAR: &str = "KAFKAFORGE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "infra.toml";
pub const DEFAULT_BROKER_COUNT: u32 = 3;

/// Configuration brute telle que lue dans le fichier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub app: AppConf,
    #[serde(default)]
    pub aws: AwsConf,
    #[serde(default)]
    pub vpc: VpcConf,
    #[serde(default)]
    pub kafka: KafkaConf,
    #[serde(default)]
    pub monitoring: MonitoringConf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConf {
    pub ns: Option<String>,
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConf {
    pub account: Option<AccountId>,
    pub region: Option<String>,
}

/// L'account peut être écrit en nombre ou en chaîne de chiffres
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VpcConf {
    pub id: Option<String>,
    #[serde(default, alias = "subnetInfo")]
    pub subnet_info: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KafkaConf {
    pub brokers: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConf {
    #[serde(default)]
    pub consumer_groups: Vec<ConsumerGroup>,
}

/// Configuration validée, seule entrée du cœur de provisioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedConfig {
    pub namespace: String,
    pub stage: String,
    pub account_id: String,
    pub region: String,
    pub vpc_id: String,
    pub subnet_info: Option<Vec<String>>,
    pub broker_count: u32,
    pub consumer_groups: Vec<ConsumerGroup>,
}

impl ValidatedConfig {
    pub fn ns(&self) -> Namespace {
        Namespace::new(&self.namespace, &self.stage)
    }
}

impl RawConfig {
    /// Valide le schéma. Les chaînes de sous-réseau ne sont PAS parsées ici,
    /// c'est le rôle du résolveur de placement au moment du provisioning.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigurationError> {
        let namespace = required(self.app.ns, "app.ns")?;
        let stage = required(self.app.stage, "app.stage")?;
        let region = required(self.aws.region, "aws.region")?;

        let account_id = match self.aws.account {
            None => return Err(ConfigurationError::MissingField("aws.account")),
            Some(AccountId::Number(n)) => n.to_string(),
            Some(AccountId::Text(s)) => {
                if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ConfigurationError::InvalidAccountId(s));
                }
                s
            }
        };

        let vpc_id = required(self.vpc.id, "vpc.id")?;
        if !is_valid_vpc_id(&vpc_id) {
            return Err(ConfigurationError::InvalidVpcId(vpc_id));
        }

        let broker_count = self.kafka.brokers.unwrap_or(DEFAULT_BROKER_COUNT);
        if broker_count < 1 {
            return Err(ConfigurationError::InvalidBrokerCount(broker_count));
        }

        for (index, group) in self.monitoring.consumer_groups.iter().enumerate() {
            if group.id.trim().is_empty() || group.topic.trim().is_empty() {
                return Err(ConfigurationError::InvalidConsumerGroup(index));
            }
        }

        Ok(ValidatedConfig {
            namespace,
            stage,
            account_id,
            region,
            vpc_id,
            subnet_info: self.vpc.subnet_info,
            broker_count,
            consumer_groups: self.monitoring.consumer_groups,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigurationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigurationError::MissingField(field)),
    }
}

/// `vpc-` suivi de 8 ou 17 caractères hexadécimaux minuscules
pub fn is_valid_vpc_id(id: &str) -> bool {
    match id.strip_prefix("vpc-") {
        Some(hex) => {
            (hex.len() == 8 || hex.len() == 17)
                && hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        }
        None => false,
    }
}

/// Parse le contenu selon l'extension du fichier (YAML si .yaml/.yml, TOML sinon)
pub fn parse_config(path: &Path, text: &str) -> Result<RawConfig, ConfigurationError> {
    let parse_err = |message: String| ConfigurationError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string())),
        _ => toml::from_str(text).map_err(|e| parse_err(e.to_string())),
    }
}

/// Chemin du fichier : `$KAFKAFORGE_CONFIG` ou `infra.toml`
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV_VAR)
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into())
        .into()
}

pub async fn load_config_from(path: &Path) -> Result<ValidatedConfig, ConfigurationError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    if text.trim().is_empty() {
        warn!("config {} is empty", path.display());
    }

    let config = parse_config(path, &text)?.validate()?;
    info!(
        "loaded config {} (ns: {}, region: {}, brokers: {})",
        path.display(),
        config.ns().prefix(),
        config.region,
        config.broker_count
    );
    Ok(config)
}

pub async fn load_config() -> Result<ValidatedConfig, ConfigurationError> {
    load_config_from(&config_path()).await
}
