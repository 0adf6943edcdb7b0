/// Request context passed into every domain operation
///
/// The API resolves the session cookie into a [`RequestContext`] once per
/// request and hands it down explicitly; nothing in the domain layer reads
/// ambient session state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Authenticated user
    pub user_id: Uuid,

    /// Team the user is operating within, if any
    pub current_team_id: Option<Uuid>,
}

impl RequestContext {
    pub fn new(user_id: Uuid, current_team_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            current_team_id,
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self::new(user.id, user.current_team_id)
    }

    /// The current team, or a validation error if none is selected
    pub fn team_id(&self) -> ServiceResult<Uuid> {
        self.current_team_id
            .ok_or_else(|| ServiceError::validation("No team selected"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_id_requires_current_team() {
        let ctx = RequestContext::new(Uuid::new_v4(), None);
        assert!(matches!(ctx.team_id(), Err(ServiceError::Validation(_))));

        let team_id = Uuid::new_v4();
        let ctx = RequestContext::new(Uuid::new_v4(), Some(team_id));
        assert_eq!(ctx.team_id().unwrap(), team_id);
    }
}
