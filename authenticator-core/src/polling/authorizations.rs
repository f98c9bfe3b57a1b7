use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::Utc;
use rst_common::with_logging::log::debug;

use crate::authorization::AuthorizationItem;
use crate::connection::types::ConnectionStoreBuilder;
use crate::connection::{build_rich_connections, RichConnection};
use crate::errors::ApiError;
use crate::keystore::types::KeyStoreBuilder;
use crate::protocol::types::{FetchResult, TransportBuilder};
use crate::protocol::ProtocolClient;

use super::types::{PollingSource, PollingStep};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizationEvent {
    Added(AuthorizationItem),
    Updated(AuthorizationItem),
    Removed(AuthorizationItem),
    Failed {
        connection_id: Option<String>,
        error: ApiError,
    },
}

type ItemKey = (String, String);

fn key_of(item: &AuthorizationItem) -> ItemKey {
    (item.connection_id.clone(), item.id.clone())
}

/// `AuthorizationsSource` polls every active connection of the store
///
/// Items are tracked by connection and id. A connection whose request failed keeps its
/// previously seen items, expired items are dropped and reported as removed.
pub struct AuthorizationsSource<TTransport, TStore>
where
    TTransport: TransportBuilder,
    TStore: ConnectionStoreBuilder + 'static,
{
    client: ProtocolClient<TTransport>,
    store: TStore,
    keystore: Arc<dyn KeyStoreBuilder>,
}

impl<TTransport, TStore> AuthorizationsSource<TTransport, TStore>
where
    TTransport: TransportBuilder,
    TStore: ConnectionStoreBuilder + 'static,
{
    pub fn new(
        client: ProtocolClient<TTransport>,
        store: TStore,
        keystore: Arc<dyn KeyStoreBuilder>,
    ) -> Self {
        Self {
            client,
            store,
            keystore,
        }
    }

    async fn riches(&self) -> Result<Vec<RichConnection>, ApiError> {
        let connections = self
            .store
            .list_active()
            .await
            .map_err(|err| ApiError::request(err.to_string()))?;

        Ok(build_rich_connections(&connections, self.keystore.as_ref())
            .into_values()
            .collect())
    }
}

#[async_trait]
impl<TTransport, TStore> PollingSource for AuthorizationsSource<TTransport, TStore>
where
    TTransport: TransportBuilder,
    TStore: ConnectionStoreBuilder + 'static,
{
    type Output = Result<FetchResult<AuthorizationItem>, ApiError>;
    type Event = AuthorizationEvent;
    type State = HashMap<ItemKey, AuthorizationItem>;

    async fn fetch(&self) -> Self::Output {
        let riches = self.riches().await?;
        Ok(self.client.fetch_authorizations(riches).await)
    }

    fn apply(
        &self,
        state: &mut Self::State,
        output: Self::Output,
    ) -> PollingStep<AuthorizationEvent> {
        apply_authorizations(state, output)
    }
}

pub(super) fn apply_authorizations(
    state: &mut HashMap<ItemKey, AuthorizationItem>,
    output: Result<FetchResult<AuthorizationItem>, ApiError>,
) -> PollingStep<AuthorizationEvent> {
    let result = match output {
        Ok(result) => result,
        Err(error) => {
            return PollingStep::next(vec![AuthorizationEvent::Failed {
                connection_id: None,
                error,
            }])
        }
    };

    let now = Utc::now();
    let failed = result
        .errors
        .iter()
        .map(|failure| failure.connection_id.clone())
        .collect::<HashSet<String>>();

    let mut current = result
        .items
        .into_iter()
        .filter(|item| !item.is_expired_at(now))
        .map(|item| (key_of(&item), item))
        .collect::<HashMap<ItemKey, AuthorizationItem>>();

    state
        .iter()
        .filter(|(key, item)| failed.contains(&key.0) && !item.is_expired_at(now))
        .for_each(|(key, item)| {
            current.entry(key.clone()).or_insert_with(|| item.clone());
        });

    let mut events = Vec::new();
    let mut removed = state
        .iter()
        .filter(|(key, _)| !current.contains_key(*key))
        .map(|(_, item)| item.clone())
        .collect::<Vec<AuthorizationItem>>();
    removed.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    events.extend(removed.into_iter().map(AuthorizationEvent::Removed));

    let mut changed = current
        .iter()
        .filter_map(|(key, item)| match state.get(key) {
            None => Some(AuthorizationEvent::Added(item.clone())),
            Some(previous) if previous.status != item.status => {
                Some(AuthorizationEvent::Updated(item.clone()))
            }
            Some(_) => None,
        })
        .collect::<Vec<AuthorizationEvent>>();
    changed.sort_by_key(|event| match event {
        AuthorizationEvent::Added(item) | AuthorizationEvent::Updated(item) => item.created_at,
        _ => now,
    });
    events.extend(changed);

    events.extend(
        result
            .errors
            .into_iter()
            .map(|failure| AuthorizationEvent::Failed {
                connection_id: Some(failure.connection_id),
                error: failure.error,
            }),
    );

    debug!(
        "[polling:authorizations] {} tracked, {} events",
        current.len(),
        events.len()
    );

    *state = current;
    PollingStep::next(events)
}
