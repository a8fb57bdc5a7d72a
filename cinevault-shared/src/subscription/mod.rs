/// Subscription lifecycle management
///
/// - [`manager`]: purchase, cancellation, and idempotent payment processing

pub mod manager;

pub use manager::{PaymentOutcome, SubscriptionError, SubscriptionManager};
