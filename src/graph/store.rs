use crate::types::{User, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory relationship graph shared across requests
///
/// An explicit data-source object: constructed once at startup and passed
/// into every component that reads or mutates it, never reached through
/// global state. Cloning produces another handle to the same graph.
#[derive(Clone)]
pub struct GraphStore {
    inner: Arc<RwLock<GraphData>>,
}

#[derive(Default)]
struct GraphData {
    users: HashMap<UserId, User>,
    friends: HashMap<UserId, Vec<UserId>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(GraphData::default())),
        }
    }

    /// A store pre-populated with the demo fixture: three users in a
    /// friendship cycle (1 -> 2 -> 3 -> 1)
    pub fn seeded() -> Self {
        let mut data = GraphData::default();
        for (id, name) in [(1, "Elon Musk"), (2, "Steve Jobs"), (3, "Bill Gates")] {
            data.users.insert(
                id,
                User {
                    id,
                    name: name.to_string(),
                },
            );
        }
        data.friends.insert(1, vec![2]);
        data.friends.insert(2, vec![3]);
        data.friends.insert(3, vec![1]);

        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    pub async fn get_user(&self, id: UserId) -> Option<User> {
        let data = self.inner.read().await;
        data.users.get(&id).cloned()
    }

    /// All users, sorted by id for deterministic output
    pub async fn list_users(&self) -> Vec<User> {
        let data = self.inner.read().await;
        let mut users: Vec<User> = data.users.values().cloned().collect();
        users.sort_by_key(|user| user.id);
        users
    }

    /// Insert or overwrite a user
    pub async fn insert_user(&self, user: User) {
        let mut data = self.inner.write().await;
        data.users.insert(user.id, user);
    }

    pub async fn set_friends(&self, id: UserId, friends: Vec<UserId>) {
        let mut data = self.inner.write().await;
        data.friends.insert(id, friends);
    }

    /// Resolve the friend lists of several users in one read
    ///
    /// Returns one list per input id, positionally aligned. An id with no
    /// friend entry, and friend ids with no user record, contribute nothing:
    /// absence is an empty list, not an error.
    pub async fn friends_of_many(&self, ids: &[UserId]) -> Vec<Vec<User>> {
        let data = self.inner.read().await;
        ids.iter()
            .map(|id| {
                data.friends
                    .get(id)
                    .map(|friend_ids| {
                        friend_ids
                            .iter()
                            .filter_map(|friend_id| data.users.get(friend_id).cloned())
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_store_contains_the_demo_cycle() {
        let store = GraphStore::seeded();

        let users = store.list_users().await;
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].name, "Elon Musk");

        let friends = store.friends_of_many(&[1, 2, 3]).await;
        assert_eq!(friends[0][0].id, 2);
        assert_eq!(friends[1][0].id, 3);
        assert_eq!(friends[2][0].id, 1);
    }

    #[tokio::test]
    async fn test_missing_entries_resolve_to_empty_lists() {
        let store = GraphStore::seeded();

        // Unknown user id, and a friend entry pointing at a missing user
        store.set_friends(1, vec![99]).await;
        let friends = store.friends_of_many(&[1, 42]).await;
        assert!(friends[0].is_empty());
        assert!(friends[1].is_empty());
    }

    #[tokio::test]
    async fn test_insert_user_overwrites_existing_entry() {
        let store = GraphStore::seeded();

        store
            .insert_user(User {
                id: 2,
                name: "Steve Wozniak".to_string(),
            })
            .await;

        let user = store.get_user(2).await.unwrap();
        assert_eq!(user.name, "Steve Wozniak");
        assert_eq!(store.list_users().await.len(), 3);
    }
}
