//! Onboarding roles and policy actions
//!
//! A role is metadata assigned once at onboarding and synced to the policy
//! store. Business logic never branches on it: visibility is decided by the
//! capability set the oracle returns for the actions below.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::CareShareError;

/// Resource type every health record check is made against
pub const HEALTH_RECORDS_RESOURCE: &str = "HealthRecords";

/// Role assigned to a user at onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum UserRole {
    /// Tracks their own health data
    #[default]
    User,
    /// Partner of a record owner
    Partner,
    /// Clinician following a patient
    Doctor,
    /// Parent of a record owner
    Parent,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::User,
        UserRole::Partner,
        UserRole::Doctor,
        UserRole::Parent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Partner => "partner",
            UserRole::Doctor => "doctor",
            UserRole::Parent => "parent",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = CareShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "partner" => Ok(UserRole::Partner),
            "doctor" => Ok(UserRole::Doctor),
            "parent" => Ok(UserRole::Parent),
            other => Err(CareShareError::BadRequest(format!(
                "Invalid role '{}', expected one of: user, partner, doctor, parent",
                other
            ))),
        }
    }
}

/// Actions checked against the policy oracle for the health records resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyAction {
    #[serde(rename = "viewrecordsfull")]
    ViewRecordsFull,
    #[serde(rename = "viewrecordslimited")]
    ViewRecordsLimited,
    #[serde(rename = "update")]
    Update,
}

impl PolicyAction {
    /// Every action that makes up a capability set
    pub const TRACKED: [PolicyAction; 3] = [
        PolicyAction::ViewRecordsFull,
        PolicyAction::ViewRecordsLimited,
        PolicyAction::Update,
    ];

    /// Wire name understood by the policy service
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyAction::ViewRecordsFull => "viewrecordsfull",
            PolicyAction::ViewRecordsLimited => "viewrecordslimited",
            PolicyAction::Update => "update",
        }
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("doctor".parse::<UserRole>().unwrap(), UserRole::Doctor);
        assert_eq!(" Parent ".parse::<UserRole>().unwrap(), UserRole::Parent);
        assert!("admin".parse::<UserRole>().is_err());
        assert!("".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&UserRole::Partner).unwrap();
        assert_eq!(json, "\"partner\"");
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_action_wire_names() {
        let json = serde_json::to_string(&PolicyAction::ViewRecordsLimited).unwrap();
        assert_eq!(json, "\"viewrecordslimited\"");
        assert_eq!(PolicyAction::Update.to_string(), "update");
        assert_eq!(PolicyAction::TRACKED.len(), 3);
    }
}
