use crate::graph::GraphStore;
use crate::loader::{BatchFn, FetchResult};
use crate::types::{User, UserId};
use async_trait::async_trait;
use tracing::debug;

/// Batch fetcher resolving friend lists through the graph store
///
/// One invocation performs a single store read for the whole key list, which
/// is the point of routing friend resolution through the loader: N users on
/// one resolution level cost one lookup, not N.
pub struct FriendFetcher {
    store: GraphStore,
}

impl FriendFetcher {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchFn<UserId, Vec<User>> for FriendFetcher {
    async fn fetch(&self, keys: &[UserId]) -> Vec<FetchResult<Vec<User>>> {
        debug!("Fetching friend lists for {} users", keys.len());
        self.store
            .friends_of_many(keys)
            .await
            .into_iter()
            .map(Ok)
            .collect()
    }
}
