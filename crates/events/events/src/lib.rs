//! # Agora Events
//!
//! Post lifecycle events for the Agora forum:
//! - The canonical `{ event, timestamp, data }` event model
//! - An async handler seam for subscribers such as the webhook engine
//! - A fire-and-forget emitter for the post mutation path
//!
//! ## Example
//!
//! ```rust,ignore
//! use agora_events::{EventEmitter, EventKind, PostEvent};
//!
//! let emitter = EventEmitter::new();
//! emitter.on(webhooks.clone()).await;
//!
//! let event = PostEvent::builder(EventKind::PostCreated, "p1")
//!     .title("Hello")
//!     .build();
//! emitter.emit(event).await;
//! ```

mod event;
mod handler;
mod emitter;
mod error;

pub use event::{EventKind, PostEvent, PostEventBuilder, format_timestamp};
pub use handler::{EventHandler, HandlerResult};
pub use emitter::EventEmitter;
pub use error::{EventError, EventResult};
