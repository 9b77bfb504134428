use crate::error::CoreError;
use crate::models::{Actor, Role};

/// Whether `actor` may operate on data owned by `subject_id`.
///
/// Caregivers may act on anyone, including themselves. Regular users may
/// only act on their own data. A non-positive target id is never allowed,
/// whatever the role. The rule is evaluated against the target owner,
/// never against ids supplied elsewhere in a request.
pub fn can_act_on(actor: &Actor, subject_id: i64) -> bool {
    if subject_id <= 0 {
        return false;
    }
    match actor.role {
        Role::Caregiver => true,
        Role::User => actor.subject_id == subject_id,
    }
}

/// Same check as [`can_act_on`], as a guard that yields a uniform error.
/// The message deliberately does not reveal whether the target exists.
pub fn ensure_can_act_on(actor: &Actor, subject_id: i64) -> Result<(), CoreError> {
    if can_act_on(actor, subject_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "not allowed to act on this user's data".to_string(),
        ))
    }
}
