//! HTTP side of the Nexkontrol client.
//!
//! [`Gateway`] translates domain operations into authenticated API calls,
//! [`Session`] carries the bearer credential, and [`TransactionStore`] keeps
//! the canonical transaction collection in sync with the server.

pub use error::{ClientError, StoreError};
pub use gateway::{DEFAULT_TIMEOUT, Gateway};
pub use session::{Credential, Session, SessionManager};
pub use store::{
    DerivedViews, Notification, NotificationLevel, StoreState, TransactionDraft, TransactionStore,
};

mod error;
mod gateway;
mod session;
mod store;
