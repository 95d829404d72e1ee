pub mod clock;
pub mod retry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use retry::{retry_on_transient, IsTransient, RetryConfig, RetryResult};
