//! Catalog: the fixed, ordered table of store actions
//!
//! The catalog is built once at startup and handed to the front ends by
//! value (or behind an `Arc`). Nothing mutates it afterwards, so it needs no
//! synchronization.

use std::collections::HashMap;

use super::requirement::{
    Requirement, COMMENT_LENGTH, GAME_NAME_LENGTH, INTEGER_RANGE, ISO_DATE, ISO_DATETIME,
    MONEY_AMOUNT, NONEMPTY, POSITIVE_INTEGER, USERNAME_LENGTH,
};
use super::{Action, Classification, Parameter, StatementKind};
use crate::error::BindingError;
use crate::value::SemanticType;

/// Defects in a catalog definition. These are caught by tests, not handled
/// at runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("token '{token}' is used by both '{first}' and '{second}'")]
    DuplicateToken {
        token: String,
        first: String,
        second: String,
    },

    #[error("action '{token}' declares parameter '{binding_name}' more than once")]
    DuplicateParameter {
        token: String,
        binding_name: String,
    },

    #[error("action '{token}' has an empty token, description or parameter label")]
    MissingText { token: String },

    #[error("action '{token}': {source}")]
    Binding {
        token: String,
        #[source]
        source: BindingError,
    },
}

/// Immutable, insertion-ordered sequence of actions
#[derive(Debug)]
pub struct Catalog {
    actions: Vec<Action>,
}

impl Catalog {
    /// Wrap a list of actions. Use `verify` to check the table's invariants.
    pub fn new(actions: Vec<Action>) -> Self {
        Catalog { actions }
    }

    /// All actions, in catalog order
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Case-insensitive exact match on the invocation token. The first match
    /// in catalog order wins.
    pub fn lookup(&self, token: &str) -> Option<&Action> {
        self.actions.iter().find(|action| action.matches(token))
    }

    /// Check every invariant of the table:
    /// - tokens are unique under the ASCII case folding `lookup` uses
    /// - binding names are unique within an action
    /// - every binding parses and its slot count matches the parameters
    pub fn verify(&self) -> Result<(), CatalogError> {
        let mut seen: HashMap<String, &Action> = HashMap::new();

        for action in &self.actions {
            if action.token.trim().is_empty()
                || action.description.trim().is_empty()
                || action.parameters.iter().any(|p| p.display_label.is_empty())
            {
                return Err(CatalogError::MissingText {
                    token: action.token.to_string(),
                });
            }

            let key = action.token.trim().to_ascii_lowercase();
            if let Some(first) = seen.get(&key) {
                return Err(CatalogError::DuplicateToken {
                    token: action.token.to_string(),
                    first: first.description.to_string(),
                    second: action.description.to_string(),
                });
            }
            seen.insert(key, action);

            for (i, param) in action.parameters.iter().enumerate() {
                if action.parameters[..i]
                    .iter()
                    .any(|p| p.binding_name == param.binding_name)
                {
                    return Err(CatalogError::DuplicateParameter {
                        token: action.token.to_string(),
                        binding_name: param.binding_name.to_string(),
                    });
                }
            }

            action.procedure().map_err(|source| CatalogError::Binding {
                token: action.token.to_string(),
                source,
            })?;
        }

        Ok(())
    }

    /// The Vapor game store catalog
    pub fn game_store() -> Self {
        use Classification::{Mutate, MutateReturnId, Query};
        use SemanticType::{Date, DateTime, Integer, Money, String};
        use StatementKind::{Delete, Insert, Select, Update};

        Catalog::new(vec![
            Action::new(
                MutateReturnId,
                Insert,
                "create account",
                "ca",
                "vapor.insert_user(?, ?, ?)",
                vec![
                    text("username", "username", &USERNAME_LENGTH),
                    Parameter::new(Date, "join_date", "join date", &[&NONEMPTY, &ISO_DATE]),
                ],
            ),
            Action::new(
                Mutate,
                Update,
                "change username",
                "uu",
                "vapor.update_username(?, ?)",
                vec![
                    id("user_id", "user id"),
                    text("new_name", "new username", &USERNAME_LENGTH),
                ],
            ),
            Action::new(
                Mutate,
                Delete,
                "delete account",
                "du",
                "vapor.delete_user(?)",
                vec![id("user_id", "user id")],
            ),
            Action::new(
                Query,
                Select,
                "get account information for user",
                "gu",
                "vapor.get_user_info(?)",
                vec![id("user_id", "user id")],
            ),
            Action::new(
                Mutate,
                Insert,
                "add new comment",
                "mc",
                "vapor.insert_comment(?, ?, ?, ?)",
                vec![
                    id("commenter_id", "commenter's user id"),
                    id("profile_id", "profile user's id"),
                    Parameter::new(
                        DateTime,
                        "posted_at",
                        "datetime",
                        &[&NONEMPTY, &ISO_DATETIME],
                    ),
                    text("message", "message", &COMMENT_LENGTH),
                ],
            ),
            Action::new(
                Query,
                Select,
                "list users who follow this user",
                "lfr",
                "vapor.get_follower_list(?)",
                vec![id("user_id", "followed-user id")],
            ),
            Action::new(
                Query,
                Select,
                "list users this user follows",
                "lfd",
                "vapor.get_followed_list(?)",
                vec![id("user_id", "follower-user id")],
            ),
            Action::new(
                Mutate,
                Insert,
                "have userA follow userB",
                "fu",
                "vapor.insert_follow(?, ?, ?)",
                vec![
                    id("follower_id", "userA (follower) id"),
                    id("followed_id", "userB (followed) id"),
                    Parameter::new(Date, "follow_date", "date", &[&NONEMPTY, &ISO_DATE]),
                ],
            ),
            Action::new(
                Mutate,
                Delete,
                "have userA unfollow userB",
                "ufu",
                "vapor.delete_follow(?, ?)",
                vec![
                    id("follower_id", "userA id"),
                    id("followed_id", "userB id"),
                ],
            ),
            Action::new(
                MutateReturnId,
                Insert,
                "add a new game",
                "ag",
                "vapor.insert_game(?, ?, ?, ?, ?, ?)",
                vec![
                    text("game_name", "game name", &GAME_NAME_LENGTH),
                    id("review_avg", "review average"),
                    id("esrb_rating_id", "ESRB rating id"),
                    Parameter::new(Date, "release_date", "release date", &[&NONEMPTY, &ISO_DATE]),
                    money("price", "price"),
                ],
            ),
            Action::new(
                Mutate,
                Update,
                "update the review average for a game",
                "ugr",
                "vapor.update_game_review_avg(?, ?)",
                vec![
                    id("game_id", "game id"),
                    id("review_avg", "new review average"),
                ],
            ),
            Action::new(
                Mutate,
                Update,
                "update the price of a game",
                "ugp",
                "vapor.update_game_price(?, ?)",
                vec![id("game_id", "game id"), money("price", "new price")],
            ),
            Action::new(
                Mutate,
                Delete,
                "remove a game from the store",
                "dg",
                "vapor.delete_game(?)",
                vec![id("game_id", "game id")],
            ),
            Action::new(
                Mutate,
                Insert,
                "grant possession of a game",
                "gg",
                "vapor.insert_game_ownership(?, ?, ?)",
                vec![
                    id("user_id", "user id"),
                    id("game_id", "game id"),
                    Parameter::new(Date, "acquired_on", "date acquired", &[&NONEMPTY, &ISO_DATE]),
                ],
            ),
            Action::new(
                Query,
                Select,
                "list comments on a user's profile, newest to oldest",
                "gpc",
                "vapor.get_profile_comments(?)",
                vec![id("user_id", "user id")],
            ),
            Action::new(
                Query,
                Select,
                "view games owned by a user",
                "vgu",
                "vapor.get_owned_games_for_user(?)",
                vec![id("user_id", "user id")],
            ),
            Action::new(
                Query,
                Select,
                "list games with a specific ESRB rating",
                "lge",
                "vapor.get_games_with_esrb(?)",
                vec![id("esrb_id", "ESRB rating id")],
            ),
            Action::new(
                Query,
                Select,
                "list games from high to low review average",
                "lgr",
                "vapor.games_ordered_by_review()",
                vec![],
            ),
            Action::new(
                Query,
                Select,
                "view game details",
                "vgd",
                "vapor.get_game_details(?)",
                vec![id("game_id", "game id")],
            ),
            Action::new(
                Query,
                Select,
                "list users followed by a user that own a game",
                "vfuog",
                "vapor.get_followed_users_that_own_game(?, ?)",
                vec![id("user_id", "user id"), id("game_id", "game id")],
            ),
            Action::new(
                Query,
                Select,
                "view N top selling games of the past seven days",
                "vtsg",
                "vapor.get_best_selling_past_seven_days(?)",
                vec![id("limit", "N (as in top N)")],
            ),
            Action::new(
                Query,
                Select,
                "list all the ESRB ratings",
                "lesrb",
                "vapor.get_all_esrb_rating_details()",
                vec![],
            ),
            Action::new(
                Query,
                Select,
                "list the genres of a game",
                "lgg",
                "vapor.get_game_genres(?)",
                vec![id("game_id", "game id")],
            ),
        ])
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

// Parameter shorthands for the table above

fn id(binding_name: &'static str, display_label: &'static str) -> Parameter {
    Parameter::new(
        SemanticType::Integer,
        binding_name,
        display_label,
        &[&NONEMPTY, &POSITIVE_INTEGER, &INTEGER_RANGE],
    )
}

fn text(
    binding_name: &'static str,
    display_label: &'static str,
    length: &'static Requirement,
) -> Parameter {
    Parameter::new(SemanticType::String, binding_name, display_label, &[&NONEMPTY, length])
}

fn money(binding_name: &'static str, display_label: &'static str) -> Parameter {
    Parameter::new(
        SemanticType::Money,
        binding_name,
        display_label,
        &[&NONEMPTY, &MONEY_AMOUNT],
    )
}
