//! Platform-API package handling
//!
//! [`reconcile::ApiVersionReconciler`] is the only part of a run with a
//! side effect on the project: it may install a different version of the
//! API package. Everything it talks to sits behind the traits in
//! [`package_manager`] and [`resolver`] so tests can swap them out.

pub mod package_manager;
pub mod reconcile;
pub mod resolver;
