/*!
Test Harness pour les runs de provisioning

Facilite l'écriture de tests de bout en bout avec:
- Run complet contre le MockProvisioner
- Assertions sur les ressources déclarées (alarmes, ordre, dépendances)
- Statistiques du plan généré
*/

use crate::config_helpers::ConfigBuilder;
use crate::provisioner_stub::MockProvisioner;
use anyhow::Result;
use kafkaforge_kernel::alarms::{AlarmSpec, ComparisonOperator};
use kafkaforge_kernel::config::ValidatedConfig;
use kafkaforge_kernel::provisioner::{Declaration, Resource};
use kafkaforge_kernel::{provision, ProvisionError, ProvisionOutcome};
use std::collections::BTreeMap;

/// Harness de test complet pour un run de provisioning
pub struct TestHarness {
    pub provisioner: MockProvisioner,
    pub config: ValidatedConfig,
    outcome: Option<ProvisionOutcome>,
}

impl TestHarness {
    /// Crée un nouveau harness avec la config par défaut du ConfigBuilder
    pub fn new() -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        Self {
            provisioner: MockProvisioner::new(),
            config: ConfigBuilder::new().build(),
            outcome: None,
        }
    }

    pub fn with_config(mut self, config: ValidatedConfig) -> Self {
        self.config = config;
        self
    }

    /// Lance le provisioning ; le résultat est conservé pour les assertions
    pub fn run(&mut self) -> Result<&ProvisionOutcome, ProvisionError> {
        let outcome = provision(&self.config, &mut self.provisioner)?;
        log::info!(
            "✅ Provisioned {} ({} alarms, {} widgets)",
            self.config.ns().prefix(),
            outcome.alarm_count,
            outcome.widget_count
        );
        Ok(self.outcome.insert(outcome))
    }

    pub fn outcome(&self) -> Option<&ProvisionOutcome> {
        self.outcome.as_ref()
    }

    pub fn declarations(&self) -> Vec<Declaration> {
        self.provisioner.get_declarations()
    }

    pub fn resources_of(&self, type_name: &str) -> Vec<Declaration> {
        self.provisioner.find_by_type(type_name)
    }

    /// Toutes les alarmes déclarées, dans l'ordre de déclaration
    pub fn alarms(&self) -> Vec<AlarmSpec> {
        self.declarations()
            .into_iter()
            .filter_map(|d| match d.resource {
                Resource::Alarm(alarm) => Some(alarm),
                _ => None,
            })
            .collect()
    }

    /// Récupère une alarme par nom complet
    pub fn alarm(&self, name: &str) -> Option<AlarmSpec> {
        self.alarms().into_iter().find(|a| a.name == name)
    }

    /// Assert qu'une alarme existe avec l'opérateur et le seuil attendus
    pub fn assert_alarm_policy(
        &self,
        name: &str,
        comparison: ComparisonOperator,
        threshold: f64,
    ) -> Result<()> {
        let Some(alarm) = self.alarm(name) else {
            anyhow::bail!("Alarm not declared: {}", name);
        };

        if alarm.comparison_operator != comparison || alarm.threshold != threshold {
            anyhow::bail!(
                "Alarm '{}' mismatch: expected {:?} {}, got {:?} {}",
                name,
                comparison,
                threshold,
                alarm.comparison_operator,
                alarm.threshold
            );
        }

        log::info!("✅ Alarm '{}' = {:?} {}", name, comparison, threshold);
        Ok(())
    }

    /// Assert que `first` a été déclaré avant `second`
    pub fn assert_declared_before(&self, first: &str, second: &str) -> Result<()> {
        let declarations = self.declarations();
        let position = |id: &str| declarations.iter().position(|d| d.logical_id == id);

        match (position(first), position(second)) {
            (Some(a), Some(b)) if a < b => Ok(()),
            (Some(_), Some(_)) => anyhow::bail!("'{}' declared after '{}'", first, second),
            _ => anyhow::bail!("'{}' or '{}' not declared", first, second),
        }
    }

    /// Stats sur les ressources déclarées
    pub fn get_stats(&self) -> PlanStats {
        let declarations = self.declarations();
        let mut type_counts = BTreeMap::new();

        for declaration in &declarations {
            *type_counts
                .entry(declaration.resource.type_name().to_string())
                .or_insert(0) += 1;
        }

        PlanStats {
            total_resources: declarations.len(),
            type_counts,
            exports: self
                .provisioner
                .get_exports()
                .into_iter()
                .map(|o| o.export_name)
                .collect(),
        }
    }

    /// Reset le harness pour un nouveau run
    pub fn reset(&mut self) {
        self.provisioner.clear();
        self.outcome = None;
        log::info!("🧹 Test harness reset");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct PlanStats {
    pub total_resources: usize,
    pub type_counts: BTreeMap<String, usize>,
    pub exports: Vec<String>,
}

impl PlanStats {
    pub fn count(&self, type_name: &str) -> usize {
        self.type_counts.get(type_name).copied().unwrap_or(0)
    }

    pub fn print(&self) {
        println!("📊 Plan Statistics:");
        println!("  Total resources: {}", self.total_resources);
        for (type_name, count) in &self.type_counts {
            println!("    {}: {}", type_name, count);
        }
        println!("  Exports: {:?}", self.exports);
    }
}

/// Macro pour créer facilement des tests de provisioning
#[macro_export]
macro_rules! plan_test {
    ($name:ident, $config:expr, $body:expr) => {
        #[test]
        fn $name() {
            use $crate::test_utils::TestHarness;

            let mut harness = TestHarness::new().with_config($config);
            let test_fn: Box<dyn Fn(&mut TestHarness) -> anyhow::Result<()>> = Box::new($body);

            match test_fn(&mut harness) {
                Ok(_) => {
                    harness.get_stats().print();
                    println!("✅ Test '{}' passed", stringify!($name));
                }
                Err(e) => {
                    eprintln!("❌ Test '{}' failed: {}", stringify!($name), e);
                    panic!("Test failed: {}", e);
                }
            }
        }
    };
}
