/**
 * PROVISIONER PORT - Interface vers le moteur d'orchestration cloud
 *
 * RÔLE :
 * Le kernel ne crée rien lui-même : il déclare des ressources à un provisioner
 * externe qui les transforme en infrastructure réelle et renvoie des handles
 * (ARN, id de security group...).
 *
 * FONCTIONNEMENT :
 * - Provisioner trait = déclaration de ressource + export de valeur
 * - Declaration = id logique + ressource typée + dépendances + tags
 * - ResourceHandle = attributs renvoyés par le provisioner (références, pas valeurs live)
 * - PlanRecorder (plan.rs) = implémentation en mémoire qui enregistre le plan
 */

mod plan;

pub use plan::{Plan, PlanRecorder};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::alarms::AlarmSpec;
use crate::dashboard::DashboardLayout;
use crate::error::ProvisionerError;
use crate::placement::PlacementDecision;

pub type Tags = BTreeMap<String, String>;

/// Interface commune de tout moteur de provisioning (CloudFormation, recorder, mock...)
pub trait Provisioner {
    /// Déclare une ressource ; ses dépendances doivent déjà être déclarées
    fn declare(&mut self, declaration: Declaration) -> Result<ResourceHandle, ProvisionerError>;

    /// Expose une valeur aux stacks voisines
    fn export(&mut self, output: Output) -> Result<(), ProvisionerError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub logical_id: String,
    pub resource: Resource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,
}

impl Declaration {
    pub fn new(logical_id: impl Into<String>, resource: Resource) -> Self {
        Self {
            logical_id: logical_id.into(),
            resource,
            depends_on: Vec::new(),
            tags: Tags::new(),
        }
    }

    pub fn depends_on(mut self, handle: &ResourceHandle) -> Self {
        self.depends_on.push(handle.logical_id.clone());
        self
    }

    pub fn with_tags(mut self, tags: &Tags) -> Self {
        self.tags = tags.clone();
        self
    }
}

/// Valeur exportée, nommée de façon déterministe depuis le namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub logical_id: String,
    pub export_name: String,
    pub value: String,
}

/// Handle renvoyé par le provisioner pour une ressource déclarée
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub logical_id: String,
    pub attributes: BTreeMap<String, String>,
}

impl ResourceHandle {
    pub fn attr(&self, name: &str) -> Result<&str, ProvisionerError> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ProvisionerError::MissingAttribute {
                id: self.logical_id.clone(),
                attribute: name.to_string(),
            })
    }

    pub fn arn(&self) -> Result<&str, ProvisionerError> {
        self.attr(ATTR_ARN)
    }
}

pub const ATTR_REF: &str = "Ref";
pub const ATTR_ARN: &str = "Arn";
pub const ATTR_GROUP_ID: &str = "GroupId";
pub const ATTR_TOPIC_ARN: &str = "TopicArn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

/// Ressources que le kernel sait déclarer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Resource {
    #[serde(rename = "AWS::EC2::SecurityGroup")]
    SecurityGroup(SecurityGroup),
    #[serde(rename = "AWS::MSK::Configuration")]
    BrokerConfiguration(BrokerConfiguration),
    #[serde(rename = "AWS::Logs::LogGroup")]
    LogGroup(LogGroup),
    #[serde(rename = "AWS::MSK::Cluster")]
    Cluster(Cluster),
    #[serde(rename = "AWS::ApplicationAutoScaling::ScalableTarget")]
    ScalableTarget(ScalableTarget),
    #[serde(rename = "AWS::ApplicationAutoScaling::ScalingPolicy")]
    ScalingPolicy(ScalingPolicy),
    #[serde(rename = "AWS::SNS::Topic")]
    NotificationTopic(NotificationTopic),
    #[serde(rename = "AWS::CloudWatch::Alarm")]
    Alarm(AlarmSpec),
    #[serde(rename = "AWS::CloudWatch::Dashboard")]
    Dashboard(Dashboard),
}

impl Resource {
    pub fn type_name(&self) -> &'static str {
        match self {
            Resource::SecurityGroup(_) => "AWS::EC2::SecurityGroup",
            Resource::BrokerConfiguration(_) => "AWS::MSK::Configuration",
            Resource::LogGroup(_) => "AWS::Logs::LogGroup",
            Resource::Cluster(_) => "AWS::MSK::Cluster",
            Resource::ScalableTarget(_) => "AWS::ApplicationAutoScaling::ScalableTarget",
            Resource::ScalingPolicy(_) => "AWS::ApplicationAutoScaling::ScalingPolicy",
            Resource::NotificationTopic(_) => "AWS::SNS::Topic",
            Resource::Alarm(_) => "AWS::CloudWatch::Alarm",
            Resource::Dashboard(_) => "AWS::CloudWatch::Dashboard",
        }
    }

    /// Attributs que le provisioner renvoie pour ce type (en plus de `Ref`)
    pub fn attribute_names(&self) -> &'static [&'static str] {
        match self {
            Resource::SecurityGroup(_) => &[ATTR_GROUP_ID],
            Resource::BrokerConfiguration(_) | Resource::LogGroup(_) | Resource::Cluster(_) => {
                &[ATTR_ARN]
            }
            Resource::NotificationTopic(_) => &[ATTR_TOPIC_ARN],
            Resource::Alarm(_) => &[ATTR_ARN],
            Resource::ScalableTarget(_) | Resource::ScalingPolicy(_) | Resource::Dashboard(_) => {
                &[]
            }
        }
    }
}

/// Règle de trafic : `self_reference` = la security group elle-même
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficRule {
    pub protocol: String,
    pub self_reference: bool,
    pub description: String,
}

impl TrafficRule {
    pub fn all_traffic_internal() -> Self {
        Self {
            protocol: "-1".to_string(),
            self_reference: true,
            description: "All traffic between brokers".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub group_name: String,
    pub vpc_id: String,
    pub allow_all_outbound: bool,
    pub ingress: Vec<TrafficRule>,
    pub egress: Vec<TrafficRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfiguration {
    pub name: String,
    pub kafka_versions: Vec<String>,
    pub server_properties: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroup {
    pub retention_days: u32,
    pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitoringLevel {
    Default,
    PerBroker,
    PerTopicPerBroker,
    PerTopicPerPartition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMonitoring {
    pub level: MonitoringLevel,
    pub prometheus_jmx_exporter: bool,
    pub prometheus_node_exporter: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationInfo {
    pub arn: String,
    pub revision: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_name: String,
    pub kafka_version: String,
    pub number_of_broker_nodes: u32,
    pub instance_type: String,
    pub ebs_volume_size_gib: u32,
    pub vpc_id: String,
    pub placement: PlacementDecision,
    pub security_groups: Vec<String>,
    pub monitoring: ClusterMonitoring,
    pub log_group: String,
    pub configuration: ConfigurationInfo,
    pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalableTarget {
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub resource_id: String,
    pub scalable_dimension: String,
    pub service_namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    pub policy_name: String,
    pub scaling_target: String,
    pub predefined_metric: String,
    pub target_value: f64,
    pub disable_scale_in: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTopic {
    pub topic_name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub dashboard_name: String,
    pub layout: DashboardLayout,
    pub body: Value,
}
