//! Process-wide tracing setup shared by the pingo binaries.

mod subscriber;

pub use subscriber::{LogFormat, SubscriberError, init_tracing, try_init_tracing};
