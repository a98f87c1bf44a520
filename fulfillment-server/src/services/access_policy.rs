//! Access policy collaborator
//!
//! Identity resolution and role management live outside this engine;
//! the orchestrator only asks whether a resolved actor may perform an
//! operation before any mutation happens.

use shared::fulfillment::{AssignmentSnapshot, OrderSnapshot};
use shared::{Actor, ActorRole};

/// Permission checks consulted before every mutating operation
pub trait AccessPolicy: Send + Sync {
    /// May this actor create orders?
    fn can_create_order(&self, actor: &Actor) -> bool;

    /// May this actor manage the given order (publish, assign, verify,
    /// approve, pay, cancel)?
    fn can_manage(&self, actor: &Actor, order: &OrderSnapshot) -> bool;

    /// May this actor act on the given assignment (accept, reject,
    /// progress, deliver, dispute)?
    fn can_act_on_assignment(&self, actor: &Actor, assignment: &AssignmentSnapshot) -> bool;
}

/// Default policy: officers manage everything, farm operators act only
/// on assignments belonging to their own farm
pub struct RoleBasedPolicy;

impl AccessPolicy for RoleBasedPolicy {
    fn can_create_order(&self, actor: &Actor) -> bool {
        matches!(actor.role, ActorRole::Officer | ActorRole::System)
    }

    fn can_manage(&self, actor: &Actor, _order: &OrderSnapshot) -> bool {
        matches!(actor.role, ActorRole::Officer | ActorRole::System)
    }

    fn can_act_on_assignment(&self, actor: &Actor, assignment: &AssignmentSnapshot) -> bool {
        match &actor.role {
            ActorRole::Officer | ActorRole::System => true,
            ActorRole::FarmOperator { farm_id } => assignment.farm_id == *farm_id,
        }
    }
}

/// Permissive policy for tests
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn can_create_order(&self, _actor: &Actor) -> bool {
        true
    }

    fn can_manage(&self, _actor: &Actor, _order: &OrderSnapshot) -> bool {
        true
    }

    fn can_act_on_assignment(&self, _actor: &Actor, _assignment: &AssignmentSnapshot) -> bool {
        true
    }
}
