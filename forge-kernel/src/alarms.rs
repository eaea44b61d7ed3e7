/**
 * ALARM GENERATOR - Alarmes CloudWatch dérivées du bundle de métriques
 *
 * RÔLE :
 * Une alarme par instance de métrique (scalaire → 1, par broker → N, par group → 1),
 * toutes routées vers le même topic de notification.
 *
 * FONCTIONNEMENT :
 * - Politique fixe par famille dans ALARM_POLICIES (opérateur, seuil, périodes)
 * - Ordre : scalaires (contrôleur, partitions offline), puis under-replicated → CPU → disque
 *   par index de broker croissant, puis lag dans l'ordre du bundle
 * - Noms : `{prefix}{stem}`, suffixés par l'index broker ou `-{group}`
 */

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::ProvisionError;
use crate::metrics::{Metric, MetricBundle, MetricKind};
use crate::models::Namespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "LessThanThreshold")]
    LessThan,
    #[serde(rename = "GreaterThanThreshold")]
    GreaterThan,
    #[serde(rename = "GreaterThanOrEqualToThreshold")]
    GreaterThanOrEqual,
}

impl ComparisonOperator {
    /// Évalue une valeur observée contre un seuil
    pub fn breaches(&self, value: f64, threshold: f64) -> bool {
        match self {
            ComparisonOperator::LessThan => value < threshold,
            ComparisonOperator::GreaterThan => value > threshold,
            ComparisonOperator::GreaterThanOrEqual => value >= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmPolicy {
    pub kind: MetricKind,
    /// Racine du nom d'alarme, après le préfixe namespace
    pub stem: &'static str,
    pub comparison: ComparisonOperator,
    pub threshold: f64,
    pub evaluation_periods: u32,
}

/// Seuils opérationnels par famille de métrique
pub const ALARM_POLICIES: [AlarmPolicy; 6] = [
    AlarmPolicy {
        kind: MetricKind::ActiveControllerCount,
        stem: "KafkaActiveControllerCount",
        comparison: ComparisonOperator::LessThan,
        threshold: 1.0,
        evaluation_periods: 3,
    },
    AlarmPolicy {
        kind: MetricKind::OfflinePartitionsCount,
        stem: "KafkaOfflinePartitionsCount",
        comparison: ComparisonOperator::GreaterThan,
        threshold: 0.0,
        evaluation_periods: 3,
    },
    AlarmPolicy {
        kind: MetricKind::UnderReplicatedPartitions,
        stem: "KafkaUnderReplicatedPartitions",
        comparison: ComparisonOperator::GreaterThan,
        threshold: 0.0,
        evaluation_periods: 3,
    },
    AlarmPolicy {
        kind: MetricKind::CpuUser,
        stem: "KafkaCpuUser",
        comparison: ComparisonOperator::GreaterThan,
        threshold: 60.0,
        evaluation_periods: 3,
    },
    AlarmPolicy {
        kind: MetricKind::DataLogsDiskUsed,
        stem: "KafkaDataLogsDiskUsed",
        comparison: ComparisonOperator::GreaterThanOrEqual,
        threshold: 85.0,
        evaluation_periods: 3,
    },
    AlarmPolicy {
        kind: MetricKind::MaxOffsetLag,
        stem: "KafkaMaxOffsetLag",
        comparison: ComparisonOperator::GreaterThanOrEqual,
        threshold: 100.0,
        evaluation_periods: 3,
    },
];

/// La table est indexée par le discriminant de `MetricKind`
pub fn policy_for(kind: MetricKind) -> &'static AlarmPolicy {
    &ALARM_POLICIES[kind as usize]
}

/// Destination des actions d'alarme (topic SNS), créée une seule fois par run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSink {
    pub logical_id: String,
    pub topic_arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSpec {
    pub name: String,
    pub kind: MetricKind,
    pub metric: Metric,
    pub comparison_operator: ComparisonOperator,
    pub threshold: f64,
    pub evaluation_periods: u32,
    pub alarm_actions: Vec<String>,
}

impl AlarmSpec {
    fn new(name: String, policy: &AlarmPolicy, metric: &Metric, sink: &NotificationSink) -> Self {
        Self {
            name,
            kind: policy.kind,
            metric: metric.clone(),
            comparison_operator: policy.comparison,
            threshold: policy.threshold,
            evaluation_periods: policy.evaluation_periods,
            alarm_actions: vec![sink.topic_arn.clone()],
        }
    }

    /// Identifiant logique de la déclaration : le nom sans le préfixe namespace
    pub fn logical_id(&self, ns: &Namespace) -> String {
        let suffix = self.name.strip_prefix(ns.prefix()).unwrap_or(&self.name);
        format!("{suffix}Alarm")
    }
}

/// Génère toutes les alarmes du bundle, câblées sur `sink`
pub fn generate(bundle: &MetricBundle, sink: &NotificationSink, ns: &Namespace) -> Vec<AlarmSpec> {
    let mut alarms = Vec::with_capacity(bundle.metric_count());

    for kind in MetricKind::SCALAR {
        if let Some(metric) = bundle.scalar(kind) {
            let policy = policy_for(kind);
            alarms.push(AlarmSpec::new(ns.name(policy.stem), policy, metric, sink));
        }
    }

    for kind in MetricKind::PER_BROKER {
        let policy = policy_for(kind);
        // itère la longueur réelle de la série, pas un compteur à part
        for (index, metric) in bundle.per_broker(kind).iter().enumerate() {
            let name = ns.name(&format!("{}{}", policy.stem, index));
            alarms.push(AlarmSpec::new(name, policy, metric, sink));
        }
    }

    let lag_policy = policy_for(MetricKind::MaxOffsetLag);
    for (group_id, metric) in bundle.per_group_metrics.iter() {
        let name = ns.name(&format!("{}-{}", lag_policy.stem, group_id));
        alarms.push(AlarmSpec::new(name, lag_policy, metric, sink));
    }

    debug!("generated {} alarms for {}", alarms.len(), ns.prefix());
    alarms
}

/// Vérifie l'unicité des noms d'alarme ; une collision est un bug de nommage
pub fn ensure_unique_names(alarms: &[AlarmSpec]) -> Result<(), ProvisionError> {
    let mut seen = HashSet::with_capacity(alarms.len());
    for alarm in alarms {
        if !seen.insert(alarm.name.as_str()) {
            return Err(ProvisionError::DuplicateAlarmName(alarm.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;
    use crate::models::{ClusterTopology, ConsumerGroup};

    fn sink() -> NotificationSink {
        NotificationSink {
            logical_id: "NotificationTopic".into(),
            topic_arn: "${NotificationTopic.TopicArn}".into(),
        }
    }

    fn alarms_for(brokers: u32, groups: &[ConsumerGroup]) -> Vec<AlarmSpec> {
        let bundle = metrics::build(&ClusterTopology::new("kafkadev", brokers), groups);
        generate(&bundle, &sink(), &Namespace::new("Kafka", "Dev"))
    }

    #[test]
    fn test_three_brokers_without_groups_yields_eleven_alarms() {
        let alarms = alarms_for(3, &[]);
        assert_eq!(alarms.len(), 11);
        assert!(alarms.iter().all(|a| a.kind != MetricKind::MaxOffsetLag));
    }

    #[test]
    fn test_one_group_adds_one_lag_alarm() {
        let alarms = alarms_for(3, &[ConsumerGroup::new("trip", "trip-service")]);
        assert_eq!(alarms.len(), 12);

        let lag = alarms.last().unwrap();
        assert_eq!(lag.name, "KafkaDevKafkaMaxOffsetLag-trip");
        assert_eq!(lag.comparison_operator, ComparisonOperator::GreaterThanOrEqual);
        assert_eq!(lag.threshold, 100.0);
    }

    #[test]
    fn test_generation_order_and_names() {
        let names: Vec<String> = alarms_for(2, &[]).into_iter().map(|a| a.name).collect();
        assert_eq!(
            names,
            vec![
                "KafkaDevKafkaActiveControllerCount",
                "KafkaDevKafkaOfflinePartitionsCount",
                "KafkaDevKafkaUnderReplicatedPartitions0",
                "KafkaDevKafkaUnderReplicatedPartitions1",
                "KafkaDevKafkaCpuUser0",
                "KafkaDevKafkaCpuUser1",
                "KafkaDevKafkaDataLogsDiskUsed0",
                "KafkaDevKafkaDataLogsDiskUsed1",
            ]
        );
    }

    #[test]
    fn test_per_broker_alarm_count_is_three_times_brokers() {
        for brokers in 1..=8 {
            let per_broker = alarms_for(brokers, &[])
                .iter()
                .filter(|a| MetricKind::PER_BROKER.contains(&a.kind))
                .count();
            assert_eq!(per_broker, 3 * brokers as usize);
        }
    }

    #[test]
    fn test_cpu_and_disk_thresholds_never_vary() {
        for brokers in [1, 3, 9] {
            for alarm in alarms_for(brokers, &[]) {
                match alarm.kind {
                    MetricKind::CpuUser => {
                        assert_eq!(alarm.comparison_operator, ComparisonOperator::GreaterThan);
                        assert_eq!(alarm.threshold, 60.0);
                    }
                    MetricKind::DataLogsDiskUsed => {
                        assert_eq!(
                            alarm.comparison_operator,
                            ComparisonOperator::GreaterThanOrEqual
                        );
                        assert_eq!(alarm.threshold, 85.0);
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_policy_table_is_indexed_by_kind() {
        for policy in &ALARM_POLICIES {
            assert_eq!(policy_for(policy.kind).kind, policy.kind);
        }
    }

    #[test]
    fn test_policy_table() {
        let table: Vec<(MetricKind, ComparisonOperator, f64, u32)> = ALARM_POLICIES
            .iter()
            .map(|p| (p.kind, p.comparison, p.threshold, p.evaluation_periods))
            .collect();
        assert_eq!(
            table,
            vec![
                (MetricKind::ActiveControllerCount, ComparisonOperator::LessThan, 1.0, 3),
                (MetricKind::OfflinePartitionsCount, ComparisonOperator::GreaterThan, 0.0, 3),
                (MetricKind::UnderReplicatedPartitions, ComparisonOperator::GreaterThan, 0.0, 3),
                (MetricKind::CpuUser, ComparisonOperator::GreaterThan, 60.0, 3),
                (MetricKind::DataLogsDiskUsed, ComparisonOperator::GreaterThanOrEqual, 85.0, 3),
                (MetricKind::MaxOffsetLag, ComparisonOperator::GreaterThanOrEqual, 100.0, 3),
            ]
        );
    }

    #[test]
    fn test_every_alarm_targets_the_shared_sink() {
        let alarms = alarms_for(3, &[ConsumerGroup::new("trip", "trip-service")]);
        assert!(alarms
            .iter()
            .all(|a| a.alarm_actions == vec!["${NotificationTopic.TopicArn}".to_string()]));
    }

    #[test]
    fn test_names_are_unique() {
        let alarms = alarms_for(12, &[ConsumerGroup::new("1", "t"), ConsumerGroup::new("2", "t")]);
        assert!(ensure_unique_names(&alarms).is_ok());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut alarms = alarms_for(1, &[]);
        alarms.push(alarms[0].clone());
        let err = ensure_unique_names(&alarms).unwrap_err();
        assert!(matches!(err, ProvisionError::DuplicateAlarmName(ref n) if n == "KafkaDevKafkaActiveControllerCount"));
    }

    #[test]
    fn test_logical_id_strips_prefix() {
        let ns = Namespace::new("Kafka", "Dev");
        let alarms = alarms_for(1, &[]);
        assert_eq!(alarms[4].logical_id(&ns), "KafkaDataLogsDiskUsed0Alarm");
    }

    #[test]
    fn test_comparison_operator_breaches() {
        assert!(ComparisonOperator::LessThan.breaches(0.0, 1.0));
        assert!(!ComparisonOperator::GreaterThan.breaches(60.0, 60.0));
        assert!(ComparisonOperator::GreaterThanOrEqual.breaches(85.0, 85.0));
    }
}
