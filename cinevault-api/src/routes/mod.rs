/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, logout, password reset, session restore
/// - `subscription`: Subscription purchase, cancellation, history
/// - `billing`: Payment provider webhook
/// - `admin`: Back-office creator review

pub mod admin;
pub mod auth;
pub mod billing;
pub mod health;
pub mod subscription;
