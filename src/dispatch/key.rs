//! # Type-level dispatch keys.
//!
//! A [`Topic`] ties a [`DispatchKey`] to the payload type its listeners receive.
//! The mapping is fixed here, so a listener can never be handed a payload of the
//! wrong shape and no runtime casting is needed.
//!
//! | Topic               | Key        | Payload                                      |
//! |---------------------|------------|----------------------------------------------|
//! | [`topic::Identity`] | `identity` | [`IdentityEvent`]                            |
//! | [`topic::Account`]  | `account`  | [`AccountEvent`]                             |
//! | [`topic::Create`]   | `create`   | [`CreateEvent`](crate::model::CreateEvent)   |
//! | [`topic::Update`]   | `update`   | [`UpdateEvent`](crate::model::UpdateEvent)   |
//! | [`topic::Delete`]   | `delete`   | [`DeleteEvent`](crate::model::DeleteEvent)   |
//!
//! [`topic::Identity`]: crate::topic::Identity
//! [`topic::Account`]: crate::topic::Account
//! [`topic::Create`]: crate::topic::Create
//! [`topic::Update`]: crate::topic::Update
//! [`topic::Delete`]: crate::topic::Delete

use crate::model::{AccountEvent, DispatchKey, IdentityEvent};

use super::dispatcher::Dispatcher;
use super::registry::ListenerList;

mod sealed {
    pub trait Sealed {}
}

/// A dispatch key with its payload type. Sealed: the five topics are the only ones.
pub trait Topic: sealed::Sealed + 'static {
    /// Runtime key.
    const KEY: DispatchKey;

    /// Payload handed to listeners of this topic.
    type Payload: Send + Sync + 'static;

    #[doc(hidden)]
    #[allow(private_interfaces)]
    fn listeners(dispatcher: &Dispatcher) -> &ListenerList<Self::Payload>;
}

/// Topic markers. These types have no values; use them as type parameters.
///
/// ```rust
/// use jetvisor::{Dispatcher, topic};
///
/// let dispatcher = Dispatcher::new();
/// let _handle = dispatcher.on::<topic::Create>(|ev| println!("{}", ev.commit.rkey));
/// assert_eq!(dispatcher.listener_count::<topic::Create>(), 1);
/// ```
pub mod topic {
    use super::*;
    use crate::model::{CreateEvent, DeleteEvent, UpdateEvent};

    macro_rules! topic {
        ($(#[$doc:meta])* $name:ident, $key:ident, $payload:ty, $field:ident) => {
            $(#[$doc])*
            #[derive(Debug)]
            pub enum $name {}

            impl sealed::Sealed for $name {}

            impl Topic for $name {
                const KEY: DispatchKey = DispatchKey::$key;
                type Payload = $payload;

                #[inline]
                fn listeners(dispatcher: &Dispatcher) -> &ListenerList<Self::Payload> {
                    &dispatcher.$field
                }
            }
        };
    }

    topic!(
        /// `identity` events.
        Identity, Identity, IdentityEvent, identity
    );
    topic!(
        /// `account` events.
        Account, Account, AccountEvent, account
    );
    topic!(
        /// Record creations.
        Create, Create, CreateEvent, create
    );
    topic!(
        /// Record updates.
        Update, Update, UpdateEvent, update
    );
    topic!(
        /// Record deletions.
        Delete, Delete, DeleteEvent, delete
    );
}
