//! Per-request capability set

use serde::{Deserialize, Serialize};

use crate::auth::PolicyAction;

/// Resolved, per-request booleans governing field-level visibility.
///
/// Never persisted. The default is the most restrictive set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySet {
    pub can_view_full: bool,
    pub can_view_limited: bool,
    pub can_update: bool,
}

/// How much of a record a viewer may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    None,
    Limited,
    Full,
}

impl CapabilitySet {
    /// Fail-closed capability set
    pub const fn restricted() -> Self {
        Self {
            can_view_full: false,
            can_view_limited: false,
            can_update: false,
        }
    }

    pub const fn full() -> Self {
        Self {
            can_view_full: true,
            can_view_limited: true,
            can_update: true,
        }
    }

    pub const fn limited() -> Self {
        Self {
            can_view_full: false,
            can_view_limited: true,
            can_update: false,
        }
    }

    /// Record a single oracle decision
    pub fn set(&mut self, action: PolicyAction, permitted: bool) {
        match action {
            PolicyAction::ViewRecordsFull => self.can_view_full = permitted,
            PolicyAction::ViewRecordsLimited => self.can_view_limited = permitted,
            PolicyAction::Update => self.can_update = permitted,
        }
    }

    /// Full view wins over limited view
    pub fn visibility(&self) -> Visibility {
        if self.can_view_full {
            Visibility::Full
        } else if self.can_view_limited {
            Visibility::Limited
        } else {
            Visibility::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_restricted() {
        assert_eq!(CapabilitySet::default(), CapabilitySet::restricted());
        assert_eq!(CapabilitySet::default().visibility(), Visibility::None);
    }

    #[test]
    fn test_full_wins_over_limited() {
        let caps = CapabilitySet {
            can_view_full: true,
            can_view_limited: false,
            can_update: false,
        };
        assert_eq!(caps.visibility(), Visibility::Full);
        assert_eq!(CapabilitySet::limited().visibility(), Visibility::Limited);
    }

    #[test]
    fn test_update_alone_grants_no_visibility() {
        let mut caps = CapabilitySet::restricted();
        caps.set(PolicyAction::Update, true);
        assert_eq!(caps.visibility(), Visibility::None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(CapabilitySet::limited()).unwrap();
        assert_eq!(json["canViewLimited"], true);
        assert_eq!(json["canViewFull"], false);
        assert_eq!(json["canUpdate"], false);
    }
}
