/// Data models for CineVault
///
/// This module contains the data structures persisted by the identity and
/// application stores, plus the enums describing roles and subscription state.
///
/// # Models
///
/// - `account`: Identity-store account records (credentials and profile text)
/// - `profile`: Application-owned role and subscription state, keyed by account id
/// - `subscription`: Append-only subscription ledger records
/// - `payment`: Payment provider notifications and processed-transaction rows

pub mod account;
pub mod payment;
pub mod profile;
pub mod subscription;
