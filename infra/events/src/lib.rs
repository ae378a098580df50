//! # Event Bus
//!
//! Type-indexed broadcast channels shared by the pipeline components.
//!
//! The watcher publishes a signal after each rebuild and the dev server turns
//! it into a browser reload. Publishing with no subscribers is not an error:
//! the event is dropped and `0` is returned, so producers never depend on
//! consumers being up.
//!
//! # Example
//!
//! ```rust
//! use aflow_event_bus::{EventBus, EventReceiverExt, EventBusError};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Rebuilt { task: &'static str }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!
//!     let mut rx = bus.subscribe::<Rebuilt>()?;
//!     bus.publish(Rebuilt { task: "minJs" })?;
//!
//!     let event = rx.recv_event().await.unwrap();
//!     assert_eq!(event.task, "minJs");
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;
