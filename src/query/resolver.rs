//! Query Resolver Module
//!
//! Resolves graph queries in two levels: the users themselves, then their
//! friend lists through a request-scoped [`Loader`]. The flush boundary
//! between the two levels is what makes batching work: all friend loads for
//! one query are registered before any of them is awaited, so the fetcher
//! sees one deduplicated key list per query instead of one call per user.

use crate::graph::{FriendFetcher, GraphStore};
use crate::loader::{BatchFn, LoadError, Loader};
use crate::types::{User, UserId, UserWithFriends};
use futures::future;
use std::sync::Arc;
use tracing::debug;

/// Resolver for the graph query API
///
/// Holds the shared store and the batch fetcher; every query builds its own
/// loader scope around that fetcher, so concurrent queries never share a
/// cache or a batch.
pub struct QueryResolver {
    store: GraphStore,
    fetcher: Arc<dyn BatchFn<UserId, Vec<User>>>,
}

impl QueryResolver {
    pub fn new(store: GraphStore) -> Self {
        let fetcher = Arc::new(FriendFetcher::new(store.clone()));
        Self::with_fetcher(store, fetcher)
    }

    /// Resolver with a caller-supplied batch fetcher
    ///
    /// Lets embedders (and tests) wrap or replace the friend fetcher, e.g.
    /// to observe how many dispatches a query actually performs.
    pub fn with_fetcher(store: GraphStore, fetcher: Arc<dyn BatchFn<UserId, Vec<User>>>) -> Self {
        Self { store, fetcher }
    }

    /// Resolve all users with their friend lists
    pub async fn list_users(&self) -> Result<Vec<UserWithFriends>, LoadError> {
        let users = self.store.list_users().await;
        self.resolve_friends(users).await
    }

    /// Resolve one user with their friend list
    ///
    /// Returns `None` for an unknown id (absence is not an error).
    pub async fn get_user(&self, id: UserId) -> Result<Option<UserWithFriends>, LoadError> {
        match self.store.get_user(id).await {
            Some(user) => {
                let mut resolved = self.resolve_friends(vec![user]).await?;
                Ok(resolved.pop())
            }
            None => Ok(None),
        }
    }

    /// Insert (or overwrite) a user and return it
    pub async fn sign_up(&self, id: UserId, name: String) -> User {
        let user = User { id, name };
        self.store.insert_user(user.clone()).await;
        debug!("Signed up user {}", user.id);
        user
    }

    /// Resolve the friends level for a list of parent users
    ///
    /// Fresh scope, one load per parent, one flush, then await: the loads
    /// are all registered before the window closes, so the whole level is
    /// served by a single batched fetch.
    async fn resolve_friends(
        &self,
        users: Vec<User>,
    ) -> Result<Vec<UserWithFriends>, LoadError> {
        let scope = Loader::new(self.fetcher.clone());

        let thunks = scope.load_many(users.iter().map(|user| user.id));
        scope.flush().await;

        let friend_lists = future::join_all(thunks).await;
        users
            .into_iter()
            .zip(friend_lists)
            .map(|(user, friends)| Ok(UserWithFriends::new(user, friends?)))
            .collect()
    }
}
