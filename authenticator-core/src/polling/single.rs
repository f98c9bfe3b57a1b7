use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::debug;

use crate::authorization::types::AuthorizationStatus;
use crate::connection::RichConnection;
use crate::errors::ApiError;
use crate::protocol::types::{AuthorizationSnapshot, TransportBuilder};
use crate::protocol::ProtocolClient;

use super::types::{PollingSource, PollingStep};

#[derive(Debug, Clone, PartialEq)]
pub enum SingleAuthorizationEvent {
    Updated(AuthorizationSnapshot),
    Expired {
        authorization_id: String,
    },
    NotFound {
        authorization_id: String,
        error: ApiError,
    },
    Failed(ApiError),
}

/// `SingleAuthorizationSource` follows one authorization until it is final, expired or gone
pub struct SingleAuthorizationSource<TTransport: TransportBuilder> {
    client: ProtocolClient<TTransport>,
    rich: RichConnection,
    authorization_id: String,
}

impl<TTransport: TransportBuilder> SingleAuthorizationSource<TTransport> {
    pub fn new(
        client: ProtocolClient<TTransport>,
        rich: RichConnection,
        authorization_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            rich,
            authorization_id: authorization_id.into(),
        }
    }

    pub fn authorization_id(&self) -> &str {
        &self.authorization_id
    }
}

#[async_trait]
impl<TTransport: TransportBuilder> PollingSource for SingleAuthorizationSource<TTransport> {
    type Output = Result<AuthorizationSnapshot, ApiError>;
    type Event = SingleAuthorizationEvent;
    type State = Option<AuthorizationStatus>;

    async fn fetch(&self) -> Self::Output {
        self.client
            .fetch_authorization(&self.rich, &self.authorization_id)
            .await
    }

    fn apply(
        &self,
        state: &mut Self::State,
        output: Self::Output,
    ) -> PollingStep<SingleAuthorizationEvent> {
        apply_single(&self.authorization_id, state, output)
    }
}

pub(super) fn apply_single(
    authorization_id: &str,
    state: &mut Option<AuthorizationStatus>,
    output: Result<AuthorizationSnapshot, ApiError>,
) -> PollingStep<SingleAuthorizationEvent> {
    let snapshot = match output {
        Ok(snapshot) => snapshot,
        Err(error) if error.is_authorization_not_found() => {
            return PollingStep::last(vec![SingleAuthorizationEvent::NotFound {
                authorization_id: authorization_id.to_string(),
                error,
            }])
        }
        Err(error) if error.is_connection_not_found() => {
            return PollingStep::last(vec![SingleAuthorizationEvent::Failed(error)])
        }
        Err(error) => return PollingStep::next(vec![SingleAuthorizationEvent::Failed(error)]),
    };

    let status = snapshot.status;
    let expired = snapshot
        .item
        .as_ref()
        .map(|item| item.is_expired())
        .unwrap_or(false);

    if expired && !status.is_terminal() {
        debug!("[polling:single] authorization expired: {}", authorization_id);
        *state = Some(status);
        return PollingStep::last(vec![SingleAuthorizationEvent::Expired {
            authorization_id: authorization_id.to_string(),
        }]);
    }

    let mut events = Vec::new();
    if *state != Some(status) {
        *state = Some(status);
        events.push(SingleAuthorizationEvent::Updated(snapshot));
    }

    if status.is_terminal() {
        return PollingStep::last(events);
    }

    PollingStep::next(events)
}
