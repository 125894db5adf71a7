//! # Pet Care
//!
//! Client core of a pet care application: owners catalog their pets,
//! schedule care appointments, browse nearby pets and local pet services.
//!
//! Data lives in a document store with live queries; the identity provider
//! and blob storage are collaborators behind traits so they can be swapped.

pub mod action;
pub mod api;
pub mod app;
pub mod config;
pub mod consts;
pub mod logger;
pub mod metric;
pub mod models;
pub mod repo;
pub mod services;
pub mod utils;
