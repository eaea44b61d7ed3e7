use serde::{Deserialize, Serialize};

/// Topologie du cluster : identité + nombre de brokers.
/// Construite une seule fois par run, jamais modifiée ensuite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopology {
    pub identifier: String,
    pub broker_count: u32,
}

impl ClusterTopology {
    pub fn new(identifier: impl Into<String>, broker_count: u32) -> Self {
        Self {
            identifier: identifier.into(),
            broker_count,
        }
    }

    /// Index des brokers, 0..broker_count
    pub fn broker_ids(&self) -> impl Iterator<Item = u32> {
        0..self.broker_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub subnet_id: String,
    pub availability_zone: String,
}

/// Consumer group surveillé (liste fixe fournie par la config, pas de découverte live)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerGroup {
    pub id: String,
    pub topic: String,
}

impl ConsumerGroup {
    pub fn new(id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
        }
    }
}

/// Convention de nommage : `namespace + stage` concaténés sans séparateur.
///
/// Les ressources dont le système cible exige des minuscules (nom du cluster,
/// topic de notification) passent par [`Namespace::lower`], les autres gardent
/// la casse d'origine. Reproduire exactement ce schéma est ce qui permet à un
/// re-run de mettre à jour au lieu de dupliquer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    pub fn new(namespace: &str, stage: &str) -> Self {
        Self {
            prefix: format!("{namespace}{stage}"),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn lower(&self) -> String {
        self.prefix.to_lowercase()
    }

    /// `{prefix}{suffix}`, casse conservée
    pub fn name(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    pub fn cluster_name(&self) -> String {
        self.lower()
    }

    pub fn notification_topic_name(&self) -> String {
        format!("{}-kafka-notification", self.lower())
    }

    pub fn stack_name(&self) -> String {
        self.name("MskStack")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_prefix_concatenates_without_separator() {
        let ns = Namespace::new("Kafka", "Dev");
        assert_eq!(ns.prefix(), "KafkaDev");
        assert_eq!(ns.name("MskSecurityGroupId"), "KafkaDevMskSecurityGroupId");
        assert_eq!(ns.stack_name(), "KafkaDevMskStack");
    }

    #[test]
    fn test_lowercase_names() {
        let ns = Namespace::new("Kafka", "Dev");
        assert_eq!(ns.cluster_name(), "kafkadev");
        assert_eq!(ns.notification_topic_name(), "kafkadev-kafka-notification");
    }

    #[test]
    fn test_broker_ids() {
        let topology = ClusterTopology::new("kafkadev", 3);
        assert_eq!(topology.broker_ids().collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
