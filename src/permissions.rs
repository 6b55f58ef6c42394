use uuid::Uuid;

use crate::auth::extractors::Actor;
use crate::users::repo::User;

/// The CRUD action a request is asking for. Matched exhaustively so a new
/// action cannot fall through without a policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Delete,
}

impl Action {
    /// Safe actions never mutate state.
    pub fn is_safe(self) -> bool {
        match self {
            Self::List | Self::Retrieve => true,
            Self::Create | Self::Update | Self::PartialUpdate | Self::Delete => false,
        }
    }
}

/// Coarse check for the user resource: registration is open to anyone,
/// everything else needs an authenticated actor.
pub fn self_or_admin(actor: &Actor, action: Action) -> bool {
    match action {
        Action::Create => true,
        Action::List
        | Action::Retrieve
        | Action::Update
        | Action::PartialUpdate
        | Action::Delete => actor.is_authenticated(),
    }
}

/// Object-level check for the user resource: deletion is admin-only, any
/// other object action needs admin or the actor themselves.
pub fn self_or_admin_object(actor: &Actor, action: Action, target: &User) -> bool {
    let Some(user) = actor.user() else {
        return false;
    };
    match action {
        Action::Delete => user.is_staff,
        Action::List
        | Action::Retrieve
        | Action::Create
        | Action::Update
        | Action::PartialUpdate => user.is_staff || user.id == target.id,
    }
}

/// Object-level check for posts and comments: reads are open, mutations need
/// admin or the record's author.
pub fn author_or_admin_object(actor: &Actor, action: Action, author_id: Uuid) -> bool {
    if action.is_safe() {
        return true;
    }
    match actor.user() {
        Some(user) => user.is_staff || user.id == author_id,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn make_user(is_staff: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "someone".into(),
            email: "someone@mail.ru".into(),
            password_hash: "x".into(),
            phone: "1234567890".into(),
            birth_date: date!(1990 - 01 - 01),
            is_staff,
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    #[test]
    fn admin_can_delete_any_post() {
        let admin = Actor::User(make_user(true));
        let author_id = Uuid::new_v4();
        assert!(author_or_admin_object(&admin, Action::Delete, author_id));
    }

    #[test]
    fn author_can_update_own_post() {
        let user = make_user(false);
        let author_id = user.id;
        let actor = Actor::User(user);
        assert!(author_or_admin_object(&actor, Action::Update, author_id));
    }

    #[test]
    fn other_user_cannot_delete_post() {
        let actor = Actor::User(make_user(false));
        let author_id = Uuid::new_v4();
        assert!(!author_or_admin_object(&actor, Action::Delete, author_id));
    }

    #[test]
    fn safe_actions_are_open_to_everyone() {
        let author_id = Uuid::new_v4();
        for action in [Action::List, Action::Retrieve] {
            assert!(author_or_admin_object(&Actor::Anonymous, action, author_id));
            assert!(author_or_admin_object(
                &Actor::User(make_user(false)),
                action,
                author_id
            ));
        }
    }

    #[test]
    fn anonymous_can_register() {
        assert!(self_or_admin(&Actor::Anonymous, Action::Create));
    }

    #[test]
    fn anonymous_cannot_list_users() {
        assert!(!self_or_admin(&Actor::Anonymous, Action::List));
    }

    #[test]
    fn authenticated_user_passes_coarse_check() {
        let actor = Actor::User(make_user(false));
        assert!(self_or_admin(&actor, Action::Retrieve));
    }

    #[test]
    fn user_cannot_delete_even_self() {
        let user = make_user(false);
        let target = user.clone();
        let actor = Actor::User(user);
        assert!(!self_or_admin_object(&actor, Action::Delete, &target));
    }

    #[test]
    fn admin_can_delete_user() {
        let actor = Actor::User(make_user(true));
        let target = make_user(false);
        assert!(self_or_admin_object(&actor, Action::Delete, &target));
    }

    #[test]
    fn user_can_access_self() {
        let user = make_user(false);
        let target = user.clone();
        let actor = Actor::User(user);
        assert!(self_or_admin_object(&actor, Action::Retrieve, &target));
        assert!(self_or_admin_object(&actor, Action::Update, &target));
    }

    #[test]
    fn user_cannot_access_other() {
        let actor = Actor::User(make_user(false));
        let target = make_user(false);
        assert!(!self_or_admin_object(&actor, Action::Retrieve, &target));
    }

    #[test]
    fn admin_can_access_any_user() {
        let actor = Actor::User(make_user(true));
        let target = make_user(false);
        assert!(self_or_admin_object(&actor, Action::Retrieve, &target));
    }
}
