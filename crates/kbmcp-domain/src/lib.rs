//! # Domain Layer
//!
//! Core entities, the error taxonomy and the port traits for the
//! knowledge base service. Contains no I/O: every fallible operation
//! returns [`error::Result`], and every capability the application layer
//! needs from the outside world is expressed as a trait in [`ports`].
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`entities`] | Knowledge base, document, search and crawl-job entities |
//! | [`value_objects`] | Types exchanged across the port boundaries |
//! | [`ports`] | Backend, container and web-probe capability traits |
//! | [`error`] | The shared error taxonomy |

/// Knowledge base, document, search and crawl-job entities.
pub mod entities;
/// The shared error taxonomy.
pub mod error;
/// Backend, container and web-probe capability traits.
pub mod ports;
/// Types exchanged across the port boundaries.
pub mod value_objects;

pub use entities::*;
pub use error::{Error, Result};
pub use ports::{BackendPort, ContainerPort, WebProbePort};
