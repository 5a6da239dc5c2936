use serde::{Deserialize, Serialize};

/// Identifier of one user in the relationship graph
pub type UserId = u64;

/// A user stored in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

/// A user with their friends resolved, as returned by the query API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithFriends {
    pub id: UserId,
    pub name: String,
    pub friends: Vec<User>,
}

impl UserWithFriends {
    /// Attach a resolved friend list to a user
    pub fn new(user: User, friends: Vec<User>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            friends,
        }
    }
}
