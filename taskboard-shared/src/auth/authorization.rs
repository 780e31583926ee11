/// Authorization engine: role-and-membership-based access control
///
/// Every write permission in Taskboard is decided by a single matrix keyed by
/// the actor's global role and their relation to the relevant project, and
/// every read is scoped by a [`Visibility`] predicate that is pushed into the
/// SQL query instead of filtering rows in memory. Visibility and mutability
/// are separate concerns: an actor may see an object they cannot write.
///
/// # Decision rule (first match wins)
///
/// 1. `admin` → allow
/// 2. `viewer` → deny (viewers never write, regardless of membership)
/// 3. `collaborator` → allow iff the actor created the target (or the
///    target's project), or holds a `collaborator` membership on the project.
///    A `viewer` membership does not grant write: the project-level role can
///    be more restrictive than the global role, never less.
/// 4. otherwise deny
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{require_write, Actor, WriteAction, WriteScope};
/// use taskboard_shared::models::user::GlobalRole;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, created_by: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let actor = Actor { user_id: Uuid::new_v4(), role: GlobalRole::Collaborator };
/// require_write(&pool, &actor, WriteAction::Update, &WriteScope { project_id, created_by }).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::{ProjectMembership, ProjectRole};
use crate::models::user::GlobalRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Actor is not authorized for the attempted write.
    ///
    /// Deliberately carries no reason: denial is reported opaquely.
    #[error("Not authorized to perform this action")]
    Forbidden,

    /// Database error while loading the membership relation
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// The resolved acting user, carried through the whole request
///
/// The role is a snapshot taken once when the credential is resolved, so a
/// single request always sees one consistent authority level even if an
/// admin changes the underlying record concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Global role at the time the request was authenticated
    pub role: GlobalRole,
}

impl Actor {
    /// Whether this actor bypasses all membership checks
    pub fn is_admin(&self) -> bool {
        matches!(self.role, GlobalRole::Admin)
    }
}

/// Mutating actions routed through the write matrix
///
/// Reads never reach `can_write`; they go through [`Visibility`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Update,
    Delete,
    StateChange,
}

/// What the write targets: the relevant project and the target's creator
///
/// For update/delete the creator is the existing object's `created_by` (a
/// comment's author, a task's or project's creator); for create it is the
/// parent project's creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteScope {
    /// Project the target belongs to (or is)
    pub project_id: Uuid,

    /// Creator of the target object
    pub created_by: Uuid,
}

/// The actor's relation to a project, loaded fresh for every check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectRelation {
    /// Actor created the target (creator-is-implicit-member rule)
    pub is_creator: bool,

    /// Actor's membership role on the project, if any
    pub membership: Option<ProjectRole>,
}

impl ProjectRelation {
    /// Loads the actor's relation to the scope's project
    ///
    /// The membership row is consulted directly on every call, never cached,
    /// so a revoked membership takes effect on the next check.
    pub async fn load(pool: &PgPool, actor_id: Uuid, scope: &WriteScope) -> Result<Self, sqlx::Error> {
        let membership = ProjectMembership::role_for(pool, scope.project_id, actor_id).await?;

        Ok(Self {
            is_creator: actor_id == scope.created_by,
            membership,
        })
    }
}

/// The pure allow/deny matrix
///
/// All resource kinds share this one function so the whole policy is
/// testable in one place. The action parameter exists because callers name
/// their intent with it; today no action is treated specially.
pub fn decide_write(role: GlobalRole, _action: WriteAction, relation: ProjectRelation) -> bool {
    match role {
        GlobalRole::Admin => true,
        GlobalRole::Viewer => false,
        GlobalRole::Collaborator => {
            relation.is_creator || relation.membership == Some(ProjectRole::Collaborator)
        }
    }
}

/// Checks whether the actor may perform a mutating action on the scope
///
/// Pure predicate over the freshly loaded membership relation; no side
/// effects. Admins skip the relation lookup entirely.
pub async fn can_write(
    pool: &PgPool,
    actor: &Actor,
    action: WriteAction,
    scope: &WriteScope,
) -> Result<bool, sqlx::Error> {
    if actor.is_admin() {
        return Ok(true);
    }
    if actor.role == GlobalRole::Viewer {
        return Ok(false);
    }

    let relation = ProjectRelation::load(pool, actor.user_id, scope).await?;
    Ok(decide_write(actor.role, action, relation))
}

/// Like [`can_write`] but signals denial as [`AuthzError::Forbidden`]
pub async fn require_write(
    pool: &PgPool,
    actor: &Actor,
    action: WriteAction,
    scope: &WriteScope,
) -> Result<(), AuthzError> {
    if can_write(pool, actor, action, scope).await? {
        Ok(())
    } else {
        Err(AuthzError::Forbidden)
    }
}

/// Project creation has no existing target to scope against: any
/// authenticated admin or collaborator may create one.
pub fn can_create_project(role: GlobalRole) -> bool {
    role.can_create_projects()
}

/// Visibility predicate composed into collection queries
///
/// Returned by [`Visibility::for_actor`] and passed down into the model
/// layer, which translates it into WHERE clauses (membership EXISTS
/// subqueries). A row that fails the predicate is indistinguishable from a
/// row that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// No restriction (admins)
    All,

    /// Restricted to rows reachable by this user: rows they created, rows in
    /// projects they created, or rows in projects they hold a membership on
    User(Uuid),
}

impl Visibility {
    /// Builds the visibility predicate for an actor
    pub fn for_actor(actor: &Actor) -> Self {
        if actor.is_admin() {
            Visibility::All
        } else {
            Visibility::User(actor.user_id)
        }
    }

    /// Whether this predicate restricts anything
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Visibility::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: [WriteAction; 4] = [
        WriteAction::Create,
        WriteAction::Update,
        WriteAction::Delete,
        WriteAction::StateChange,
    ];

    fn relation(is_creator: bool, membership: Option<ProjectRole>) -> ProjectRelation {
        ProjectRelation { is_creator, membership }
    }

    #[test]
    fn test_admin_always_writes() {
        for action in ACTIONS {
            assert!(decide_write(GlobalRole::Admin, action, relation(false, None)));
        }
    }

    #[test]
    fn test_viewer_never_writes() {
        // Even a viewer who created the object or holds a collaborator
        // membership is denied: global viewer is a hard floor.
        for action in ACTIONS {
            assert!(!decide_write(GlobalRole::Viewer, action, relation(true, None)));
            assert!(!decide_write(
                GlobalRole::Viewer,
                action,
                relation(false, Some(ProjectRole::Collaborator))
            ));
        }
    }

    #[test]
    fn test_collaborator_needs_creator_or_collaborator_membership() {
        for action in ACTIONS {
            // No relation at all
            assert!(!decide_write(GlobalRole::Collaborator, action, relation(false, None)));

            // Creator without membership row
            assert!(decide_write(GlobalRole::Collaborator, action, relation(true, None)));

            // Collaborator membership
            assert!(decide_write(
                GlobalRole::Collaborator,
                action,
                relation(false, Some(ProjectRole::Collaborator))
            ));
        }
    }

    #[test]
    fn test_viewer_membership_does_not_grant_write() {
        // Project-level role can be more restrictive than global role: a
        // global collaborator holding only a viewer membership cannot write.
        for action in ACTIONS {
            assert!(!decide_write(
                GlobalRole::Collaborator,
                action,
                relation(false, Some(ProjectRole::Viewer))
            ));
        }
    }

    #[test]
    fn test_matrix_uniform_across_actions() {
        let relations = [
            relation(false, None),
            relation(true, None),
            relation(false, Some(ProjectRole::Viewer)),
            relation(false, Some(ProjectRole::Collaborator)),
            relation(true, Some(ProjectRole::Viewer)),
        ];
        for role in [GlobalRole::Admin, GlobalRole::Collaborator, GlobalRole::Viewer] {
            for rel in relations {
                let outcomes: Vec<bool> =
                    ACTIONS.iter().map(|a| decide_write(role, *a, rel)).collect();
                assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
            }
        }
    }

    #[test]
    fn test_project_creation_gate() {
        assert!(can_create_project(GlobalRole::Admin));
        assert!(can_create_project(GlobalRole::Collaborator));
        assert!(!can_create_project(GlobalRole::Viewer));
    }

    #[test]
    fn test_visibility_for_actor() {
        let admin = Actor { user_id: Uuid::new_v4(), role: GlobalRole::Admin };
        assert_eq!(Visibility::for_actor(&admin), Visibility::All);
        assert!(Visibility::for_actor(&admin).is_unrestricted());

        for role in [GlobalRole::Collaborator, GlobalRole::Viewer] {
            let actor = Actor { user_id: Uuid::new_v4(), role };
            assert_eq!(Visibility::for_actor(&actor), Visibility::User(actor.user_id));
        }
    }

    #[test]
    fn test_forbidden_is_opaque() {
        // Denial text must not explain why.
        let msg = AuthzError::Forbidden.to_string();
        assert_eq!(msg, "Not authorized to perform this action");
    }
}
