/*!
Helpers pour construire des configurations d'infrastructure de test

Facilite l'écriture de tests en fournissant:
- Un builder fluide de `ValidatedConfig` avec des valeurs par défaut saines
- L'écriture de fichiers `infra.toml` pour tester le loader
*/

use anyhow::Result;
use kafkaforge_kernel::config::ValidatedConfig;
use kafkaforge_kernel::models::ConsumerGroup;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Construction de configurations conformes au schéma
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: ValidatedConfig,
}

impl ConfigBuilder {
    /// Config par défaut : KafkaDev, 3 brokers, placement par défaut, aucun consumer group
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                namespace: "Kafka".to_string(),
                stage: "Dev".to_string(),
                account_id: "123456789012".to_string(),
                region: "us-east-1".to_string(),
                vpc_id: "vpc-0123abcd".to_string(),
                subnet_info: None,
                broker_count: 3,
                consumer_groups: Vec::new(),
            },
        }
    }

    pub fn namespace<S: Into<String>>(mut self, namespace: S, stage: S) -> Self {
        self.config.namespace = namespace.into();
        self.config.stage = stage.into();
        self
    }

    pub fn region<S: Into<String>>(mut self, region: S) -> Self {
        self.config.region = region.into();
        self
    }

    pub fn brokers(mut self, count: u32) -> Self {
        self.config.broker_count = count;
        self
    }

    /// Ajoute une entrée brute "subnetId,availabilityZone" (non validée ici)
    pub fn subnet<S: Into<String>>(mut self, raw: S) -> Self {
        self.config
            .subnet_info
            .get_or_insert_with(Vec::new)
            .push(raw.into());
        self
    }

    pub fn consumer_group<S: Into<String>>(mut self, id: S, topic: S) -> Self {
        self.config
            .consumer_groups
            .push(ConsumerGroup::new(id, topic));
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }

    /// Rendu TOML au format attendu par le loader
    pub fn to_toml(&self) -> Result<String> {
        let c = &self.config;
        let file = ConfigFile {
            app: AppSection {
                ns: &c.namespace,
                stage: &c.stage,
            },
            aws: AwsSection {
                account: &c.account_id,
                region: &c.region,
            },
            vpc: VpcSection {
                id: &c.vpc_id,
                subnet_info: c.subnet_info.as_deref(),
            },
            kafka: KafkaSection {
                brokers: c.broker_count,
            },
            monitoring: MonitoringSection {
                consumer_groups: &c.consumer_groups,
            },
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// Écrit `infra.toml` dans `dir` et retourne son chemin
    pub fn write_to<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join("infra.toml");
        std::fs::write(&path, self.to_toml()?)?;
        log::info!("📝 Wrote test config: {}", path.display());
        Ok(path)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ConfigFile<'a> {
    app: AppSection<'a>,
    aws: AwsSection<'a>,
    vpc: VpcSection<'a>,
    kafka: KafkaSection,
    monitoring: MonitoringSection<'a>,
}

#[derive(Serialize)]
struct AppSection<'a> {
    ns: &'a str,
    stage: &'a str,
}

#[derive(Serialize)]
struct AwsSection<'a> {
    account: &'a str,
    region: &'a str,
}

#[derive(Serialize)]
struct VpcSection<'a> {
    id: &'a str,
    #[serde(rename = "subnetInfo", skip_serializing_if = "Option::is_none")]
    subnet_info: Option<&'a [String]>,
}

#[derive(Serialize)]
struct KafkaSection {
    brokers: u32,
}

#[derive(Serialize)]
struct MonitoringSection<'a> {
    consumer_groups: &'a [ConsumerGroup],
}
