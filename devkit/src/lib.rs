/*!
# KafkaForge DevKit - Stubs et Utilitaires pour Développement

Bibliothèque facilitant le test du kernel de provisioning avec:
- Mock du provisioner externe (aucun compte cloud requis)
- Builder de configurations validées et de fichiers infra.toml
- Harness de test avec assertions sur le plan déclaré
*/

pub mod provisioner_stub;
pub mod config_helpers;
pub mod test_utils;

pub use provisioner_stub::MockProvisioner;
pub use config_helpers::ConfigBuilder;
pub use test_utils::TestHarness;
