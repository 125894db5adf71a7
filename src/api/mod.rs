//! # API Module
//!
//! The client core of the pet care application. Everything above the
//! collaborators (document store, identity provider, blob storage) lives
//! here.
//!
//! ## Modules
//!
//! - [`session`] - Signed-in identity and its profile, as a watchable state
//! - [`live`] - Live collections bound to the session
//! - [`mutation`] - Single write path: owner stamping and ownership checks
//! - [`schedule`] - Derived appointment views (today, next days, past due...)
//! - [`pet`], [`appointment`], [`contact`], [`nearby`], [`health`] - Entity operations
//! - [`user`] - Registration and sign-in flows
//! - [`errors`] - User facing error taxonomy

pub mod appointment;
pub mod contact;
pub mod errors;
pub mod health;
pub mod live;
pub mod mutation;
pub mod nearby;
pub mod pet;
pub mod schedule;
pub mod session;
pub mod user;
