/*!
Mock Provisioner pour développement sans compte cloud

Simule le moteur d'orchestration externe : enregistre toutes les déclarations
et exports, renvoie des handles "live" factices, et peut être programmé pour
échouer sur une ressource donnée (quota, conflit de nom...).
*/

use kafkaforge_kernel::error::ProvisionerError;
use kafkaforge_kernel::provisioner::{
    Declaration, Output, Provisioner, ResourceHandle, ATTR_ARN, ATTR_GROUP_ID, ATTR_REF,
    ATTR_TOPIC_ARN,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Mock Provisioner qui simule un moteur CloudFormation-like
#[derive(Clone)]
pub struct MockProvisioner {
    declarations: Arc<Mutex<Vec<Declaration>>>,
    exports: Arc<Mutex<Vec<Output>>>,
    failures: Arc<Mutex<HashMap<String, String>>>,
}

impl MockProvisioner {
    pub fn new() -> Self {
        Self {
            declarations: Arc::new(Mutex::new(Vec::new())),
            exports: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Programme un échec sur une ressource (ex: quota dépassé)
    pub fn fail_on<S: Into<String>>(&self, logical_id: S, reason: S) -> &Self {
        self.failures
            .lock()
            .unwrap()
            .insert(logical_id.into(), reason.into());
        self
    }

    /// Récupère toutes les déclarations reçues (pour assertions de tests)
    pub fn get_declarations(&self) -> Vec<Declaration> {
        self.declarations.lock().unwrap().clone()
    }

    pub fn get_exports(&self) -> Vec<Output> {
        self.exports.lock().unwrap().clone()
    }

    /// Trouve les déclarations d'un type donné (ex: "AWS::CloudWatch::Alarm")
    pub fn find_by_type(&self, type_name: &str) -> Vec<Declaration> {
        self.declarations
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.resource.type_name() == type_name)
            .cloned()
            .collect()
    }

    pub fn find(&self, logical_id: &str) -> Option<Declaration> {
        self.declarations
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.logical_id == logical_id)
            .cloned()
    }

    /// Reset toutes les déclarations enregistrées
    pub fn clear(&self) {
        self.declarations.lock().unwrap().clear();
        self.exports.lock().unwrap().clear();
        self.failures.lock().unwrap().clear();
    }

    fn live_handle(declaration: &Declaration) -> ResourceHandle {
        let id = &declaration.logical_id;
        let mut attributes = BTreeMap::new();
        attributes.insert(ATTR_REF.to_string(), id.clone());
        for name in declaration.resource.attribute_names() {
            let value = match *name {
                ATTR_GROUP_ID => format!("sg-{}", id.to_lowercase()),
                ATTR_TOPIC_ARN | ATTR_ARN => format!("arn:mock:{}", id),
                other => format!("mock-{}-{}", id, other),
            };
            attributes.insert(name.to_string(), value);
        }
        ResourceHandle {
            logical_id: id.clone(),
            attributes,
        }
    }
}

impl Default for MockProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl Provisioner for MockProvisioner {
    fn declare(&mut self, declaration: Declaration) -> Result<ResourceHandle, ProvisionerError> {
        if let Some(reason) = self.failures.lock().unwrap().get(&declaration.logical_id) {
            log::warn!("💥 [MOCK] Rejected {}: {}", declaration.logical_id, reason);
            return Err(ProvisionerError::Rejected {
                id: declaration.logical_id.clone(),
                reason: reason.clone(),
            });
        }

        let mut declarations = self.declarations.lock().unwrap();
        if declarations.iter().any(|d| d.logical_id == declaration.logical_id) {
            return Err(ProvisionerError::DuplicateLogicalId(declaration.logical_id));
        }

        let handle = Self::live_handle(&declaration);
        log::info!(
            "📦 [MOCK] Declared {} ({})",
            declaration.logical_id,
            declaration.resource.type_name()
        );
        declarations.push(declaration);
        Ok(handle)
    }

    fn export(&mut self, output: Output) -> Result<(), ProvisionerError> {
        log::info!("📤 [MOCK] Exported {} = {}", output.export_name, output.value);
        self.exports.lock().unwrap().push(output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kafkaforge_kernel::provisioner::{NotificationTopic, Resource, SecurityGroup};

    fn topic() -> Resource {
        Resource::NotificationTopic(NotificationTopic {
            topic_name: "t".into(),
            display_name: "t".into(),
        })
    }

    #[test]
    fn test_mock_records_declarations() {
        let mut provisioner = MockProvisioner::new();
        let observer = provisioner.clone();

        let handle = provisioner
            .declare(Declaration::new("NotificationTopic", topic()))
            .unwrap();
        assert_eq!(handle.attr(ATTR_TOPIC_ARN).unwrap(), "arn:mock:NotificationTopic");

        // le clone partage le même stockage
        assert_eq!(observer.get_declarations().len(), 1);
        assert_eq!(observer.find_by_type("AWS::SNS::Topic").len(), 1);
    }

    #[test]
    fn test_security_group_handle_has_group_id() {
        let mut provisioner = MockProvisioner::new();
        let sg = Resource::SecurityGroup(SecurityGroup {
            group_name: "g".into(),
            vpc_id: "vpc-0123abcd".into(),
            allow_all_outbound: false,
            ingress: vec![],
            egress: vec![],
        });
        let handle = provisioner.declare(Declaration::new("MskSecurityGroup", sg)).unwrap();
        assert_eq!(handle.attr(ATTR_GROUP_ID).unwrap(), "sg-msksecuritygroup");
    }

    #[test]
    fn test_programmed_failure() {
        let mut provisioner = MockProvisioner::new();
        provisioner.fail_on("NotificationTopic", "quota exceeded");

        let err = provisioner
            .declare(Declaration::new("NotificationTopic", topic()))
            .unwrap_err();
        assert_eq!(
            err,
            ProvisionerError::Rejected {
                id: "NotificationTopic".into(),
                reason: "quota exceeded".into(),
            }
        );
        assert!(provisioner.get_declarations().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut provisioner = MockProvisioner::new();
        provisioner.declare(Declaration::new("A", topic())).unwrap();
        provisioner.clear();
        assert!(provisioner.get_declarations().is_empty());
    }
}
