//! Event data model: identifiers, decoded events and dispatch keys.
//!
//! ## Contents
//! - [`Did`], [`Nsid`] identifier newtypes (not validated)
//! - [`Event`], [`Commit`] and the per-key payload types
//! - [`DispatchKey`], [`DispatchedEvent`] routing metadata

mod event;
mod ids;

pub use event::{
    Account, AccountEvent, Commit, CommitEvent, Create, CreateEvent, Delete, DeleteEvent,
    DispatchKey, DispatchedEvent, Event, EventKind, Identity, IdentityEvent, Operation, Update,
    UpdateEvent,
};
pub use ids::{Did, Nsid};
