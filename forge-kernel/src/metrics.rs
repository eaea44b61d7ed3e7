/**
 * METRIC SET - Signaux de monitoring dérivés de la topologie du cluster
 *
 * RÔLE :
 * Construit le bundle de métriques CloudWatch (namespace AWS/Kafka) à partir du
 * nombre de brokers et de la liste fixe des consumer groups surveillés.
 *
 * FONCTIONNEMENT :
 * - 2 métriques scalaires cluster : contrôleur actif, partitions offline (SUM, 1 min)
 * - 3 familles par broker, longueur == broker_count : under-replicated (SUM),
 *   CPU (AVERAGE), disque (AVERAGE)
 * - 1 métrique de lag par consumer group (MAXIMUM), indexée par group id
 *
 * Fonction pure : mêmes entrées → bundle structurellement identique.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{ClusterTopology, ConsumerGroup};

pub const KAFKA_NAMESPACE: &str = "AWS/Kafka";
pub const DEFAULT_PERIOD_SECS: u64 = 60;

pub const DIM_CLUSTER_NAME: &str = "Cluster Name";
pub const DIM_BROKER_ID: &str = "Broker ID";
pub const DIM_CONSUMER_GROUP: &str = "Consumer Group";
pub const DIM_TOPIC: &str = "Topic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statistic {
    Sum,
    Average,
    Maximum,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Sum => "Sum",
            Statistic::Average => "Average",
            Statistic::Maximum => "Maximum",
        }
    }
}

/// Famille de métrique. L'ordre de déclaration est l'ordre de génération
/// (les BTreeMap du bundle itèrent dans cet ordre).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    ActiveControllerCount,
    OfflinePartitionsCount,
    UnderReplicatedPartitions,
    CpuUser,
    DataLogsDiskUsed,
    MaxOffsetLag,
}

impl MetricKind {
    pub const SCALAR: [MetricKind; 2] = [
        MetricKind::ActiveControllerCount,
        MetricKind::OfflinePartitionsCount,
    ];

    pub const PER_BROKER: [MetricKind; 3] = [
        MetricKind::UnderReplicatedPartitions,
        MetricKind::CpuUser,
        MetricKind::DataLogsDiskUsed,
    ];

    /// Nom CloudWatch de la métrique
    pub fn metric_name(&self) -> &'static str {
        match self {
            MetricKind::ActiveControllerCount => "ActiveControllerCount",
            MetricKind::OfflinePartitionsCount => "OfflinePartitionsCount",
            MetricKind::UnderReplicatedPartitions => "UnderReplicatedPartitions",
            MetricKind::CpuUser => "CpuUser",
            MetricKind::DataLogsDiskUsed => "KafkaDataLogsDiskUsed",
            MetricKind::MaxOffsetLag => "MaxOffsetLag",
        }
    }

    pub fn statistic(&self) -> Statistic {
        match self {
            MetricKind::ActiveControllerCount
            | MetricKind::OfflinePartitionsCount
            | MetricKind::UnderReplicatedPartitions => Statistic::Sum,
            MetricKind::CpuUser | MetricKind::DataLogsDiskUsed => Statistic::Average,
            MetricKind::MaxOffsetLag => Statistic::Maximum,
        }
    }
}

/// Référence opaque vers une série CloudWatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub namespace: String,
    pub name: String,
    pub statistic: Statistic,
    pub period_secs: u64,
    pub dimensions: BTreeMap<String, String>,
}

impl Metric {
    fn kafka(kind: MetricKind, dimensions: BTreeMap<String, String>) -> Self {
        Self {
            namespace: KAFKA_NAMESPACE.to_string(),
            name: kind.metric_name().to_string(),
            statistic: kind.statistic(),
            period_secs: DEFAULT_PERIOD_SECS,
            dimensions,
        }
    }

    pub fn dimension(&self, key: &str) -> Option<&str> {
        self.dimensions.get(key).map(String::as_str)
    }
}

/// Map ordonnée par insertion group id → métrique de lag.
/// Ré-insérer un id remplace la métrique mais garde la position d'origine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetrics {
    entries: Vec<(String, Metric)>,
}

impl GroupMetrics {
    pub fn insert(&mut self, group_id: String, metric: Metric) {
        match self.entries.iter_mut().find(|(id, _)| *id == group_id) {
            Some(slot) => slot.1 = metric,
            None => self.entries.push((group_id, metric)),
        }
    }

    pub fn get(&self, group_id: &str) -> Option<&Metric> {
        self.entries
            .iter()
            .find(|(id, _)| id == group_id)
            .map(|(_, metric)| metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Metric)> {
        self.entries.iter().map(|(id, metric)| (id.as_str(), metric))
    }

    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.entries.iter().map(|(_, metric)| metric)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricBundle {
    pub scalar_metrics: BTreeMap<MetricKind, Metric>,
    pub per_broker_metrics: BTreeMap<MetricKind, Vec<Metric>>,
    pub per_group_metrics: GroupMetrics,
}

impl MetricBundle {
    pub fn scalar(&self, kind: MetricKind) -> Option<&Metric> {
        self.scalar_metrics.get(&kind)
    }

    /// Série par broker, vide si la famille est absente
    pub fn per_broker(&self, kind: MetricKind) -> &[Metric] {
        self.per_broker_metrics
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn metric_count(&self) -> usize {
        self.scalar_metrics.len()
            + self.per_broker_metrics.values().map(Vec::len).sum::<usize>()
            + self.per_group_metrics.len()
    }
}

/// Construit le bundle complet pour une topologie et une liste de consumer groups
pub fn build(topology: &ClusterTopology, consumer_groups: &[ConsumerGroup]) -> MetricBundle {
    let cluster_dims = || {
        BTreeMap::from([(DIM_CLUSTER_NAME.to_string(), topology.identifier.clone())])
    };

    let scalar_metrics = MetricKind::SCALAR
        .iter()
        .map(|&kind| (kind, Metric::kafka(kind, cluster_dims())))
        .collect();

    let per_broker_metrics = MetricKind::PER_BROKER
        .iter()
        .map(|&kind| {
            let series = topology
                .broker_ids()
                .map(|broker| {
                    let mut dims = cluster_dims();
                    dims.insert(DIM_BROKER_ID.to_string(), broker.to_string());
                    Metric::kafka(kind, dims)
                })
                .collect();
            (kind, series)
        })
        .collect();

    let mut per_group_metrics = GroupMetrics::default();
    for group in consumer_groups {
        let mut dims = cluster_dims();
        dims.insert(DIM_CONSUMER_GROUP.to_string(), group.id.clone());
        dims.insert(DIM_TOPIC.to_string(), group.topic.clone());
        per_group_metrics.insert(group.id.clone(), Metric::kafka(MetricKind::MaxOffsetLag, dims));
    }

    let bundle = MetricBundle {
        scalar_metrics,
        per_broker_metrics,
        per_group_metrics,
    };

    debug!(
        "built metric bundle for '{}': {} brokers, {} consumer groups, {} metrics",
        topology.identifier,
        topology.broker_count,
        bundle.per_group_metrics.len(),
        bundle.metric_count()
    );
    bundle
}
