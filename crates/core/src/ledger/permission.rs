//! Permission evaluation for ledger operations.
//!
//! Capabilities form a closed enumeration; each one statically declares the
//! subject fields it requires and whether it needs admin rights. The
//! evaluator works on the caller's membership row alone, so it stays pure
//! and the storage layer only has to supply one lookup.
//!
//! A caller without baseline access (no membership row, or `has_access`
//! false) is always answered with `PermissionDenied` - never `NotFound` -
//! so outsiders cannot probe which groups exist.

use super::error::LedgerError;
use serde::{Deserialize, Serialize};

/// Subject fields a capability check requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// The capability is checked against a group alone.
    Group,
    /// The capability additionally references a split that must belong to
    /// the stated group (verified by the storage layer after the access
    /// gate passes).
    GroupSplit,
}

/// Closed set of capabilities a caller can exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Create a new split in a group.
    CreateSplit,
    /// Read splits and balances of a group.
    ReadSplits,
    /// Edit an existing split.
    UpdateSplit,
    /// Soft-delete a split.
    DeleteSplit,
    /// Restore a deleted split outside the quick-restore window.
    RestoreSplit,
    /// Add members to a group.
    AddMembers,
    /// Grant or revoke member access.
    ManageAccess,
    /// Grant or revoke admin rights.
    ManageAdmins,
    /// Change group-level permission settings.
    ManagePermissions,
}

impl Capability {
    /// The subject fields this capability requires.
    #[must_use]
    pub const fn subject(self) -> Subject {
        match self {
            Self::UpdateSplit | Self::DeleteSplit | Self::RestoreSplit => Subject::GroupSplit,
            Self::CreateSplit
            | Self::ReadSplits
            | Self::AddMembers
            | Self::ManageAccess
            | Self::ManageAdmins
            | Self::ManagePermissions => Subject::Group,
        }
    }

    /// Whether this capability requires admin rights in addition to access.
    ///
    /// `RestoreSplit` is elevated: ordinary members get the time-boxed
    /// quick-restore path instead of this capability.
    #[must_use]
    pub const fn requires_admin(self) -> bool {
        match self {
            Self::RestoreSplit
            | Self::AddMembers
            | Self::ManageAccess
            | Self::ManageAdmins
            | Self::ManagePermissions => true,
            Self::CreateSplit | Self::ReadSplits | Self::UpdateSplit | Self::DeleteSplit => false,
        }
    }
}

/// The caller's membership state within the referenced group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberAccess {
    /// Whether the member currently has access to the group.
    pub has_access: bool,
    /// Whether the member is a group admin.
    pub is_admin: bool,
}

/// Checks whether a caller with the given membership may exercise a
/// capability.
///
/// `membership` is `None` when the caller has no membership row in the
/// group, including when the group itself does not exist.
///
/// # Errors
///
/// Returns `PermissionDenied` when the caller lacks access or admin rights.
pub fn check_permission(
    capability: Capability,
    membership: Option<&MemberAccess>,
) -> Result<(), LedgerError> {
    let Some(member) = membership else {
        return Err(LedgerError::PermissionDenied);
    };

    if !member.has_access {
        return Err(LedgerError::PermissionDenied);
    }

    if capability.requires_admin() && !member.is_admin {
        return Err(LedgerError::PermissionDenied);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MEMBER: MemberAccess = MemberAccess {
        has_access: true,
        is_admin: false,
    };
    const ADMIN: MemberAccess = MemberAccess {
        has_access: true,
        is_admin: true,
    };
    const REVOKED: MemberAccess = MemberAccess {
        has_access: false,
        is_admin: true,
    };

    #[rstest]
    #[case(Capability::CreateSplit)]
    #[case(Capability::ReadSplits)]
    #[case(Capability::UpdateSplit)]
    #[case(Capability::DeleteSplit)]
    fn test_member_capabilities_allowed_for_plain_member(#[case] cap: Capability) {
        assert!(check_permission(cap, Some(&MEMBER)).is_ok());
    }

    #[rstest]
    #[case(Capability::RestoreSplit)]
    #[case(Capability::AddMembers)]
    #[case(Capability::ManageAccess)]
    #[case(Capability::ManageAdmins)]
    #[case(Capability::ManagePermissions)]
    fn test_admin_capabilities_denied_for_plain_member(#[case] cap: Capability) {
        assert!(matches!(
            check_permission(cap, Some(&MEMBER)),
            Err(LedgerError::PermissionDenied)
        ));
        assert!(check_permission(cap, Some(&ADMIN)).is_ok());
    }

    #[test]
    fn test_no_membership_is_denied_not_not_found() {
        // An outsider probing a group (existing or not) sees the same error.
        let err = check_permission(Capability::ReadSplits, None).unwrap_err();
        assert!(matches!(err, LedgerError::PermissionDenied));
    }

    #[test]
    fn test_revoked_access_is_denied_even_for_admin() {
        assert!(matches!(
            check_permission(Capability::CreateSplit, Some(&REVOKED)),
            Err(LedgerError::PermissionDenied)
        ));
        assert!(matches!(
            check_permission(Capability::ManageAdmins, Some(&REVOKED)),
            Err(LedgerError::PermissionDenied)
        ));
    }

    #[test]
    fn test_subject_table() {
        assert_eq!(Capability::UpdateSplit.subject(), Subject::GroupSplit);
        assert_eq!(Capability::DeleteSplit.subject(), Subject::GroupSplit);
        assert_eq!(Capability::RestoreSplit.subject(), Subject::GroupSplit);
        assert_eq!(Capability::CreateSplit.subject(), Subject::Group);
        assert_eq!(Capability::AddMembers.subject(), Subject::Group);
    }
}
