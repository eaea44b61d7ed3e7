//! Placement réseau des brokers
//!
//! Soit la politique par défaut (sous-réseaux privés avec egress), soit une
//! liste explicite de sous-réseaux épinglés. Jamais les deux à la fois.
//! Aucun appel réseau ici : les identifiants sont référencés, pas vérifiés.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigurationError;
use crate::models::SubnetSpec;

/// Classe de sous-réseau utilisée quand aucune liste explicite n'est fournie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubnetType {
    PrivateWithEgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlacementDecision {
    DefaultPolicy { subnet_type: SubnetType },
    ExplicitSubnets { subnets: Vec<SubnetSpec> },
}

impl PlacementDecision {
    pub fn default_policy() -> Self {
        PlacementDecision::DefaultPolicy {
            subnet_type: SubnetType::PrivateWithEgress,
        }
    }

    /// Sous-réseaux épinglés, vide pour la politique par défaut
    pub fn subnets(&self) -> &[SubnetSpec] {
        match self {
            PlacementDecision::DefaultPolicy { .. } => &[],
            PlacementDecision::ExplicitSubnets { subnets } => subnets,
        }
    }
}

/// Résout le placement à partir des chaînes brutes `"subnetId,availabilityZone"`.
///
/// Absente ou vide → politique par défaut. Sinon chaque entrée doit contenir
/// exactement deux champs non vides ; l'ordre d'entrée est conservé.
pub fn resolve<S: AsRef<str>>(
    explicit_subnets: Option<&[S]>,
) -> Result<PlacementDecision, ConfigurationError> {
    let raw = match explicit_subnets {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            debug!("no explicit subnets, using default placement policy");
            return Ok(PlacementDecision::default_policy());
        }
    };

    let subnets = raw
        .iter()
        .map(|entry| parse_subnet(entry.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("pinned placement on {} explicit subnets", subnets.len());
    Ok(PlacementDecision::ExplicitSubnets { subnets })
}

fn parse_subnet(entry: &str) -> Result<SubnetSpec, ConfigurationError> {
    let malformed = || ConfigurationError::MalformedSubnet(entry.to_string());

    let (subnet_id, availability_zone) = entry.split_once(',').ok_or_else(malformed)?;
    let (subnet_id, availability_zone) = (subnet_id.trim(), availability_zone.trim());

    if subnet_id.is_empty() || availability_zone.is_empty() || availability_zone.contains(',') {
        return Err(malformed());
    }

    Ok(SubnetSpec {
        subnet_id: subnet_id.to_string(),
        availability_zone: availability_zone.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_or_empty_uses_default_policy() {
        assert_eq!(resolve::<&str>(None).unwrap(), PlacementDecision::default_policy());
        let empty: Vec<String> = vec![];
        assert_eq!(
            resolve(Some(empty.as_slice())).unwrap(),
            PlacementDecision::default_policy()
        );
    }

    #[test]
    fn test_explicit_subnets_keep_order() {
        let raw = ["subnet-1,us-east-1a", "subnet-2,us-east-1b"];
        let decision = resolve(Some(&raw[..])).unwrap();

        let subnets = decision.subnets();
        assert_eq!(subnets.len(), 2);
        assert_eq!(subnets[0].subnet_id, "subnet-1");
        assert_eq!(subnets[0].availability_zone, "us-east-1a");
        assert_eq!(subnets[1].subnet_id, "subnet-2");
        assert_eq!(subnets[1].availability_zone, "us-east-1b");
    }

    #[test]
    fn test_missing_comma_is_configuration_error() {
        let raw = ["subnet-1"];
        let err = resolve(Some(&raw[..])).unwrap_err();
        assert!(matches!(err, ConfigurationError::MalformedSubnet(ref s) if s == "subnet-1"));
    }

    #[test]
    fn test_empty_side_is_configuration_error() {
        for bad in [",us-east-1a", "subnet-1,", ",", "subnet-1, "] {
            let raw = [bad];
            assert!(resolve(Some(&raw[..])).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_one_bad_entry_fails_the_whole_list() {
        let raw = ["subnet-1,us-east-1a", "subnet-2"];
        assert!(resolve(Some(&raw[..])).is_err());
    }

    #[test]
    fn test_extra_field_is_rejected() {
        let raw = ["subnet-1,us-east-1a,extra"];
        assert!(resolve(Some(&raw[..])).is_err());
    }

    #[test]
    fn test_decision_serializes_with_mode_tag() {
        let json = serde_json::to_value(PlacementDecision::default_policy()).unwrap();
        assert_eq!(json["mode"], "default_policy");
        assert_eq!(json["subnet_type"], "PRIVATE_WITH_EGRESS");
    }
}
