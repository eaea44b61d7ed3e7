//! KafkaForge kernel - synthèse du plan de provisioning d'un cluster Kafka managé
//!
//! Pipeline, une seule passe synchrone par run :
//! config validée → placement réseau → déclaration du cluster → bundle de métriques
//! → alarmes + dashboard (consommateurs indépendants du même bundle).

pub mod alarms;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod metrics;
pub mod models;
pub mod placement;
pub mod provision;
pub mod provisioner;

pub use config::{load_config, load_config_from, RawConfig, ValidatedConfig};
pub use error::{ConfigurationError, ProvisionError, ProvisionerError};
pub use models::{ClusterTopology, ConsumerGroup, Namespace, SubnetSpec};
pub use placement::PlacementDecision;
pub use provision::{provision, synthesize, ProvisionOutcome, SynthesisPlan};
pub use provisioner::{Declaration, Output, Plan, PlanRecorder, Provisioner, Resource, ResourceHandle};
