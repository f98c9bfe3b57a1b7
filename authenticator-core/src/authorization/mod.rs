//! `authorization` holds the items a provider asks the user to confirm or deny, plus the
//! consents the user granted to third party providers.
pub mod types;

mod authorization;
pub use authorization::{AuthorizationData, AuthorizationItem};

mod consent;
pub use consent::{ConsentAccount, ConsentItem, ConsentSharedData};
