use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use super::{Declaration, Output, Provisioner, Resource, ResourceHandle, ATTR_REF};
use crate::alarms::AlarmSpec;
use crate::error::ProvisionerError;

/// Graphe de ressources déclarées, dans l'ordre de déclaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub stack_name: String,
    pub account: String,
    pub region: String,
    pub resources: Vec<Declaration>,
    pub outputs: Vec<Output>,
}

impl Plan {
    pub fn resource(&self, logical_id: &str) -> Option<&Declaration> {
        self.resources.iter().find(|d| d.logical_id == logical_id)
    }

    pub fn resources_of<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Declaration> {
        self.resources
            .iter()
            .filter(move |d| d.resource.type_name() == type_name)
    }

    pub fn alarms(&self) -> impl Iterator<Item = &AlarmSpec> {
        self.resources.iter().filter_map(|d| match &d.resource {
            Resource::Alarm(alarm) => Some(alarm),
            _ => None,
        })
    }

    /// Position de déclaration d'une ressource
    pub fn position(&self, logical_id: &str) -> Option<usize> {
        self.resources.iter().position(|d| d.logical_id == logical_id)
    }

    pub fn output(&self, export_name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.export_name == export_name)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Provisioner en mémoire : enregistre le plan sans rien créer.
///
/// Les attributs renvoyés sont des références déterministes `${Id.Attr}`,
/// résolues plus tard par le moteur qui applique le plan.
#[derive(Debug)]
pub struct PlanRecorder {
    plan: Plan,
    declared: HashSet<String>,
}

impl PlanRecorder {
    pub fn new(stack_name: &str, account: &str, region: &str) -> Self {
        Self {
            plan: Plan {
                stack_name: stack_name.to_string(),
                account: account.to_string(),
                region: region.to_string(),
                resources: Vec::new(),
                outputs: Vec::new(),
            },
            declared: HashSet::new(),
        }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn into_plan(self) -> Plan {
        self.plan
    }
}

impl Provisioner for PlanRecorder {
    fn declare(&mut self, declaration: Declaration) -> Result<ResourceHandle, ProvisionerError> {
        let id = declaration.logical_id.clone();

        if self.declared.contains(&id) {
            return Err(ProvisionerError::DuplicateLogicalId(id));
        }
        // l'arête de dépendance doit pointer vers une ressource déjà déclarée
        if let Some(missing) = declaration
            .depends_on
            .iter()
            .find(|dep| !self.declared.contains(*dep))
        {
            return Err(ProvisionerError::UnknownDependency {
                id,
                dependency: missing.clone(),
            });
        }

        let handle = reference_handle(&id, &declaration.resource);
        debug!("recorded {} ({})", id, declaration.resource.type_name());

        self.declared.insert(id);
        self.plan.resources.push(declaration);
        Ok(handle)
    }

    fn export(&mut self, output: Output) -> Result<(), ProvisionerError> {
        if self.plan.output(&output.export_name).is_some() {
            return Err(ProvisionerError::DuplicateExport(output.export_name));
        }
        self.plan.outputs.push(output);
        Ok(())
    }
}

/// Handle dont chaque attribut est une référence `${Id.Attr}` (ou `${Id}` pour Ref)
pub(crate) fn reference_handle(logical_id: &str, resource: &Resource) -> ResourceHandle {
    let mut attributes = BTreeMap::new();
    attributes.insert(ATTR_REF.to_string(), format!("${{{logical_id}}}"));
    for name in resource.attribute_names() {
        attributes.insert(name.to_string(), format!("${{{logical_id}.{name}}}"));
    }
    ResourceHandle {
        logical_id: logical_id.to_string(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioner::{NotificationTopic, ATTR_TOPIC_ARN};

    fn topic() -> Resource {
        Resource::NotificationTopic(NotificationTopic {
            topic_name: "kafkadev-kafka-notification".into(),
            display_name: "kafkadev-kafka-notification".into(),
        })
    }

    #[test]
    fn test_declare_returns_reference_handle() {
        let mut recorder = PlanRecorder::new("KafkaDevMskStack", "123456789012", "us-east-1");
        let handle = recorder
            .declare(Declaration::new("NotificationTopic", topic()))
            .unwrap();

        assert_eq!(handle.attr(ATTR_REF).unwrap(), "${NotificationTopic}");
        assert_eq!(
            handle.attr(ATTR_TOPIC_ARN).unwrap(),
            "${NotificationTopic.TopicArn}"
        );
        assert!(matches!(
            handle.arn(),
            Err(ProvisionerError::MissingAttribute { .. })
        ));
        assert_eq!(recorder.plan().resources.len(), 1);
    }

    #[test]
    fn test_duplicate_logical_id_is_rejected() {
        let mut recorder = PlanRecorder::new("s", "1", "r");
        recorder.declare(Declaration::new("Topic", topic())).unwrap();
        let err = recorder.declare(Declaration::new("Topic", topic())).unwrap_err();
        assert_eq!(err, ProvisionerError::DuplicateLogicalId("Topic".into()));
    }

    #[test]
    fn test_dependency_must_be_declared_first() {
        let mut recorder = PlanRecorder::new("s", "1", "r");
        let mut declaration = Declaration::new("Alarm", topic());
        declaration.depends_on.push("Missing".into());

        let err = recorder.declare(declaration).unwrap_err();
        assert_eq!(
            err,
            ProvisionerError::UnknownDependency {
                id: "Alarm".into(),
                dependency: "Missing".into(),
            }
        );
        assert!(recorder.plan().resources.is_empty());
    }

    #[test]
    fn test_duplicate_export_is_rejected() {
        let mut recorder = PlanRecorder::new("s", "1", "r");
        let output = Output {
            logical_id: "Out".into(),
            export_name: "KafkaDevMskSecurityGroupId".into(),
            value: "${MskSecurityGroup.GroupId}".into(),
        };
        recorder.export(output.clone()).unwrap();
        assert!(recorder.export(output).is_err());
    }

    #[test]
    fn test_plan_serializes_type_tag() {
        let mut recorder = PlanRecorder::new("s", "1", "r");
        recorder.declare(Declaration::new("Topic", topic())).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&recorder.plan().to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["resources"][0]["resource"]["type"], "AWS::SNS::Topic");
        assert_eq!(json["resources"][0]["logical_id"], "Topic");
    }
}
