/**
 * CLUSTER PROVISIONING - Orchestration d'un run de synthèse complet
 *
 * RÔLE :
 * Transforme un ValidatedConfig en graphe de ressources déclaré au provisioner :
 * security group, configuration broker, log group, cluster, auto-scaling stockage,
 * topic de notification, alarmes et dashboard, plus l'export du security group.
 *
 * FONCTIONNEMENT :
 * 1. Planification pure (placement, bundle de métriques, alarmes, dashboard).
 *    Un échec ici = aucune déclaration n'atteint le provisioner.
 * 2. Déclarations, dans l'ordre des dépendances.
 * Les erreurs du provisioner remontent telles quelles.
 */

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::alarms::{self, AlarmSpec, NotificationSink};
use crate::config::ValidatedConfig;
use crate::dashboard::{self, DashboardLayout};
use crate::error::ProvisionError;
use crate::metrics;
use crate::models::{ClusterTopology, Namespace};
use crate::placement::{self, PlacementDecision};
use crate::provisioner::{
    BrokerConfiguration, Cluster, ClusterMonitoring, ConfigurationInfo, Dashboard, Declaration,
    LogGroup, MonitoringLevel, NotificationTopic, Output, Provisioner, RemovalPolicy, Resource,
    ResourceHandle, ScalableTarget, ScalingPolicy, SecurityGroup, Tags, TrafficRule,
    ATTR_GROUP_ID, ATTR_TOPIC_ARN,
};

pub const KAFKA_VERSION: &str = "2.8.1";
pub const INSTANCE_TYPE: &str = "kafka.m5.xlarge";
pub const EBS_VOLUME_SIZE_GIB: u32 = 1000;
pub const CONFIGURATION_REVISION: u32 = 1;
pub const LOG_RETENTION_DAYS: u32 = 14;

/// Propriétés serveur fixes, non dérivées de la config
pub const SERVER_PROPERTIES: [(&str, &str); 6] = [
    ("auto.create.topics.enable", "false"),
    ("default.replication.factor", "3"),
    ("log.retention.hours", "376"),
    ("log.retention.bytes", "-1"),
    ("unclean.leader.election.enable", "false"),
    ("min.insync.replicas", "2"),
];

/// Auto-scaling du stockage broker : croissance seulement, jamais de scale-in
pub const STORAGE_MIN_CAPACITY: u32 = 1;
pub const STORAGE_MAX_CAPACITY: u32 = 4096;
pub const STORAGE_TARGET_UTILIZATION: f64 = 75.0;
pub const STORAGE_SCALABLE_DIMENSION: &str = "kafka:broker-storage:VolumeSize";
pub const STORAGE_SERVICE_NAMESPACE: &str = "kafka";
pub const STORAGE_PREDEFINED_METRIC: &str = "KafkaBrokerStorageUtilization";

pub const SECURITY_GROUP_ID: &str = "MskSecurityGroup";
pub const CONFIGURATION_ID: &str = "MskConfiguration";
pub const CLUSTER_ID: &str = "MskCluster";
pub const SCALABLE_TARGET_ID: &str = "MskStorageASGTarget";
pub const SCALING_POLICY_ID: &str = "MskStorageASGPolicy";
pub const TOPIC_ID: &str = "NotificationTopic";
pub const DASHBOARD_ID: &str = "KafkaDashboard";
pub const SECURITY_GROUP_OUTPUT_ID: &str = "MskSecurityGroupOutput";

/// Résultat d'un run : handle du cluster + id de security group exporté
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub cluster: ResourceHandle,
    pub security_group_id: String,
    pub alarm_count: usize,
    pub widget_count: usize,
}

/// Tout ce qui se calcule sans toucher au provisioner
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisPlan {
    pub ns: Namespace,
    pub topology: ClusterTopology,
    pub placement: PlacementDecision,
    pub alarms: Vec<AlarmSpec>,
    pub dashboard: DashboardLayout,
}

pub fn server_properties() -> String {
    SERVER_PROPERTIES
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

/// Le sink est référencé par identifiant ; son ARN est connu d'avance
pub fn notification_sink() -> NotificationSink {
    NotificationSink {
        logical_id: TOPIC_ID.to_string(),
        topic_arn: format!("${{{TOPIC_ID}.{ATTR_TOPIC_ARN}}}"),
    }
}

/// Phase pure : placement → métriques → alarmes + dashboard
pub fn synthesize(config: &ValidatedConfig) -> Result<SynthesisPlan, ProvisionError> {
    let ns = config.ns();
    let placement = placement::resolve(config.subnet_info.as_deref())?;

    // même compteur pour les brokers déclarés et les brokers surveillés
    let topology = ClusterTopology::new(ns.cluster_name(), config.broker_count);
    let bundle = metrics::build(&topology, &config.consumer_groups);

    let alarms = alarms::generate(&bundle, &notification_sink(), &ns);
    alarms::ensure_unique_names(&alarms)?;
    let dashboard = dashboard::compose(&bundle);

    Ok(SynthesisPlan {
        ns,
        topology,
        placement,
        alarms,
        dashboard,
    })
}

/// Point d'entrée : un run de provisioning complet contre `provisioner`
pub fn provision(
    config: &ValidatedConfig,
    provisioner: &mut dyn Provisioner,
) -> Result<ProvisionOutcome, ProvisionError> {
    let plan = synthesize(config)?;
    info!(
        "synthesized {}: {} brokers, {} alarms, {} widgets",
        plan.ns.prefix(),
        plan.topology.broker_count,
        plan.alarms.len(),
        plan.dashboard.len()
    );

    let tags = resource_tags(config);
    let ns = &plan.ns;

    let configuration = provisioner.declare(
        Declaration::new(
            CONFIGURATION_ID,
            Resource::BrokerConfiguration(BrokerConfiguration {
                name: ns.name("Configuration"),
                kafka_versions: vec![KAFKA_VERSION.to_string()],
                server_properties: server_properties(),
            }),
        )
        .with_tags(&tags),
    )?;

    let security_group = provisioner.declare(
        Declaration::new(
            SECURITY_GROUP_ID,
            Resource::SecurityGroup(SecurityGroup {
                group_name: ns.name("MskSecurityGroup"),
                vpc_id: config.vpc_id.clone(),
                allow_all_outbound: false,
                ingress: vec![TrafficRule::all_traffic_internal()],
                egress: vec![TrafficRule::all_traffic_internal()],
            }),
        )
        .with_tags(&tags),
    )?;
    let security_group_id = security_group.attr(ATTR_GROUP_ID)?.to_string();

    let log_group = provisioner.declare(
        Declaration::new(
            ns.name("MSKLogGroup"),
            Resource::LogGroup(LogGroup {
                retention_days: LOG_RETENTION_DAYS,
                removal_policy: RemovalPolicy::Destroy,
            }),
        )
        .with_tags(&tags),
    )?;

    let cluster = provisioner.declare(
        Declaration::new(
            CLUSTER_ID,
            Resource::Cluster(Cluster {
                cluster_name: plan.topology.identifier.clone(),
                kafka_version: KAFKA_VERSION.to_string(),
                number_of_broker_nodes: plan.topology.broker_count,
                instance_type: INSTANCE_TYPE.to_string(),
                ebs_volume_size_gib: EBS_VOLUME_SIZE_GIB,
                vpc_id: config.vpc_id.clone(),
                placement: plan.placement.clone(),
                security_groups: vec![security_group_id.clone()],
                monitoring: ClusterMonitoring {
                    level: MonitoringLevel::PerTopicPerPartition,
                    prometheus_jmx_exporter: true,
                    prometheus_node_exporter: true,
                },
                log_group: log_group.arn()?.to_string(),
                configuration: ConfigurationInfo {
                    arn: configuration.arn()?.to_string(),
                    revision: CONFIGURATION_REVISION,
                },
                removal_policy: RemovalPolicy::Destroy,
            }),
        )
        .depends_on(&security_group)
        .depends_on(&configuration)
        .depends_on(&log_group)
        .with_tags(&tags),
    )?;
    debug!("declared cluster {} with {:?}", plan.topology.identifier, plan.placement);

    declare_storage_scaling(provisioner, ns, &cluster, &tags)?;

    let sink = notification_sink();
    let topic = provisioner.declare(
        Declaration::new(
            sink.logical_id.clone(),
            Resource::NotificationTopic(NotificationTopic {
                topic_name: ns.notification_topic_name(),
                display_name: ns.notification_topic_name(),
            }),
        )
        .with_tags(&tags),
    )?;

    for alarm in &plan.alarms {
        provisioner.declare(
            Declaration::new(alarm.logical_id(ns), Resource::Alarm(alarm.clone()))
                .depends_on(&topic)
                .depends_on(&cluster)
                .with_tags(&tags),
        )?;
    }

    provisioner.declare(
        Declaration::new(
            DASHBOARD_ID,
            Resource::Dashboard(Dashboard {
                dashboard_name: ns.name("KafkaDashboard"),
                body: plan.dashboard.render(&config.region),
                layout: plan.dashboard.clone(),
            }),
        )
        .depends_on(&cluster)
        .with_tags(&tags),
    )?;

    provisioner.export(Output {
        logical_id: SECURITY_GROUP_OUTPUT_ID.to_string(),
        export_name: ns.name("MskSecurityGroupId"),
        value: security_group_id.clone(),
    })?;

    info!("provisioned {} ({} alarms)", plan.topology.identifier, plan.alarms.len());

    Ok(ProvisionOutcome {
        cluster,
        security_group_id,
        alarm_count: plan.alarms.len(),
        widget_count: plan.dashboard.len(),
    })
}

fn declare_storage_scaling(
    provisioner: &mut dyn Provisioner,
    ns: &Namespace,
    cluster: &ResourceHandle,
    tags: &Tags,
) -> Result<(), ProvisionError> {
    let target = provisioner.declare(
        Declaration::new(
            SCALABLE_TARGET_ID,
            Resource::ScalableTarget(ScalableTarget {
                min_capacity: STORAGE_MIN_CAPACITY,
                max_capacity: STORAGE_MAX_CAPACITY,
                resource_id: cluster.arn()?.to_string(),
                scalable_dimension: STORAGE_SCALABLE_DIMENSION.to_string(),
                service_namespace: STORAGE_SERVICE_NAMESPACE.to_string(),
            }),
        )
        .depends_on(cluster)
        .with_tags(tags),
    )?;

    provisioner.declare(
        Declaration::new(
            SCALING_POLICY_ID,
            Resource::ScalingPolicy(ScalingPolicy {
                policy_name: ns.name("StorageAutoScaling"),
                scaling_target: target.logical_id.clone(),
                predefined_metric: STORAGE_PREDEFINED_METRIC.to_string(),
                target_value: STORAGE_TARGET_UTILIZATION,
                disable_scale_in: true,
            }),
        )
        .depends_on(&target)
        .with_tags(tags),
    )?;
    Ok(())
}

fn resource_tags(config: &ValidatedConfig) -> Tags {
    BTreeMap::from([
        ("namespace".to_string(), config.ns().prefix().to_string()),
        ("stage".to_string(), config.stage.clone()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, ProvisionerError};
    use crate::models::ConsumerGroup;
    use crate::provisioner::{Plan, PlanRecorder};

    fn config(subnets: Option<Vec<&str>>, groups: Vec<ConsumerGroup>) -> ValidatedConfig {
        ValidatedConfig {
            namespace: "Kafka".into(),
            stage: "Dev".into(),
            account_id: "123456789012".into(),
            region: "us-east-1".into(),
            vpc_id: "vpc-0123abcd".into(),
            subnet_info: subnets.map(|s| s.into_iter().map(String::from).collect()),
            broker_count: 3,
            consumer_groups: groups,
        }
    }

    fn run(config: &ValidatedConfig) -> (Result<ProvisionOutcome, ProvisionError>, Plan) {
        let mut recorder = PlanRecorder::new("KafkaDevMskStack", "123456789012", "us-east-1");
        let outcome = provision(config, &mut recorder);
        (outcome, recorder.into_plan())
    }

    #[test]
    fn test_server_properties_payload() {
        assert_eq!(
            server_properties(),
            "auto.create.topics.enable=false\n\
             default.replication.factor=3\n\
             log.retention.hours=376\n\
             log.retention.bytes=-1\n\
             unclean.leader.election.enable=false\n\
             min.insync.replicas=2\n"
        );
    }

    #[test]
    fn test_full_run_declares_expected_graph() {
        let (outcome, plan) = run(&config(None, vec![]));
        let outcome = outcome.unwrap();

        assert_eq!(outcome.alarm_count, 11);
        assert_eq!(outcome.widget_count, 5);
        assert_eq!(outcome.security_group_id, "${MskSecurityGroup.GroupId}");
        assert_eq!(outcome.cluster.arn().unwrap(), "${MskCluster.Arn}");

        // sg + config + log group + cluster + target + policy + topic + 11 alarms + dashboard
        assert_eq!(plan.resources.len(), 7 + 11 + 1);
        assert_eq!(plan.resources_of("AWS::SNS::Topic").count(), 1);
        assert_eq!(plan.resources_of("AWS::CloudWatch::Dashboard").count(), 1);

        let output = plan.output("KafkaDevMskSecurityGroupId").unwrap();
        assert_eq!(output.value, "${MskSecurityGroup.GroupId}");
    }

    #[test]
    fn test_cluster_declared_after_its_network_boundary() {
        let (_, plan) = run(&config(None, vec![]));
        let cluster = plan.resource(CLUSTER_ID).unwrap();
        assert!(cluster.depends_on.contains(&SECURITY_GROUP_ID.to_string()));
        assert!(plan.position(SECURITY_GROUP_ID) < plan.position(CLUSTER_ID));
    }

    #[test]
    fn test_cluster_resource_fields() {
        let (_, plan) = run(&config(Some(vec!["subnet-1,us-east-1a"]), vec![]));
        let Resource::Cluster(cluster) = &plan.resource(CLUSTER_ID).unwrap().resource else {
            panic!("MskCluster is not a cluster");
        };

        assert_eq!(cluster.cluster_name, "kafkadev");
        assert_eq!(cluster.number_of_broker_nodes, 3);
        assert_eq!(cluster.instance_type, "kafka.m5.xlarge");
        assert_eq!(cluster.monitoring.level, MonitoringLevel::PerTopicPerPartition);
        assert!(cluster.monitoring.prometheus_jmx_exporter);
        assert!(cluster.monitoring.prometheus_node_exporter);
        assert_eq!(cluster.configuration.revision, 1);
        assert_eq!(cluster.placement.subnets().len(), 1);
    }

    #[test]
    fn test_storage_scaling_never_scales_in() {
        let (_, plan) = run(&config(None, vec![]));

        let Resource::ScalableTarget(target) = &plan.resource(SCALABLE_TARGET_ID).unwrap().resource
        else {
            panic!("not a scalable target");
        };
        assert_eq!((target.min_capacity, target.max_capacity), (1, 4096));
        assert_eq!(target.resource_id, "${MskCluster.Arn}");

        let Resource::ScalingPolicy(policy) = &plan.resource(SCALING_POLICY_ID).unwrap().resource
        else {
            panic!("not a scaling policy");
        };
        assert_eq!(policy.policy_name, "KafkaDevStorageAutoScaling");
        assert_eq!(policy.target_value, 75.0);
        assert!(policy.disable_scale_in);
    }

    #[test]
    fn test_bad_subnet_declares_nothing() {
        let (outcome, plan) = run(&config(Some(vec!["subnet-1"]), vec![]));
        assert!(matches!(
            outcome,
            Err(ProvisionError::Configuration(ConfigurationError::MalformedSubnet(_)))
        ));
        assert!(plan.resources.is_empty());
        assert!(plan.outputs.is_empty());
    }

    #[test]
    fn test_every_resource_is_tagged() {
        let (_, plan) = run(&config(None, vec![ConsumerGroup::new("trip", "trip-service")]));
        for declaration in &plan.resources {
            assert_eq!(declaration.tags["namespace"], "KafkaDev");
            assert_eq!(declaration.tags["stage"], "Dev");
        }
    }

    struct RejectingProvisioner;

    impl Provisioner for RejectingProvisioner {
        fn declare(&mut self, declaration: Declaration) -> Result<ResourceHandle, ProvisionerError> {
            Err(ProvisionerError::Rejected {
                id: declaration.logical_id,
                reason: "quota exceeded".into(),
            })
        }

        fn export(&mut self, _output: Output) -> Result<(), ProvisionerError> {
            Ok(())
        }
    }

    #[test]
    fn test_provisioner_errors_pass_through_unmodified() {
        let err = provision(&config(None, vec![]), &mut RejectingProvisioner).unwrap_err();
        match err {
            ProvisionError::Provisioner(ProvisionerError::Rejected { id, reason }) => {
                assert_eq!(id, CONFIGURATION_ID);
                assert_eq!(reason, "quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
