use crate::application::services::AccessControlError;
use crate::domain::permission::PermPair;

/// Boundary validation for access-control arguments.
pub struct AccessControlValidator;

impl AccessControlValidator {
    pub fn validate_role_name(role_name: &str) -> Result<(), AccessControlError> {
        if role_name.is_empty() {
            return Err(AccessControlError::InvalidArgument(
                "Role must be specified.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_permission_name(perm_name: &str) -> Result<(), AccessControlError> {
        if perm_name.is_empty() {
            return Err(AccessControlError::InvalidArgument(
                "Permission name must be specified.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_user_name(user_name: &str) -> Result<(), AccessControlError> {
        if user_name.is_empty() {
            return Err(AccessControlError::InvalidUser {
                user: String::new(),
                message: "User name must be specified.".to_string(),
            });
        }
        Ok(())
    }

    /// Rejects pairs with an empty object or operation.
    pub fn validate_pair(pair: &PermPair) -> Result<(), AccessControlError> {
        if !pair.is_well_formed() {
            return Err(AccessControlError::InvalidPermission {
                perm: pair.clone(),
                message: "Permission is ill-defined.".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_role_name() {
        assert!(AccessControlValidator::validate_role_name("editor").is_ok());
        assert!(matches!(
            AccessControlValidator::validate_role_name(""),
            Err(AccessControlError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_user_name() {
        assert!(AccessControlValidator::validate_user_name("alice").is_ok());
        let err = AccessControlValidator::validate_user_name("").unwrap_err();
        assert!(matches!(err, AccessControlError::InvalidUser { .. }));
        assert_eq!(err.to_string(), "User name must be specified.");
    }

    #[test]
    fn test_validate_pair() {
        assert!(AccessControlValidator::validate_pair(&PermPair::new("doc", "edit")).is_ok());
        assert!(matches!(
            AccessControlValidator::validate_pair(&PermPair::new("doc", "")),
            Err(AccessControlError::InvalidPermission { .. })
        ));
    }
}
