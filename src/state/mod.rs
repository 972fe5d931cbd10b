// State isolation module
//
// This module provides IsolatedDomain, which confines a value to one serialized
// executor, and the hop operations that are the only way to reach that value.

pub mod account;
pub mod domain;

pub use account::{AccountError, AccountEvent, BankAccount, Ledger};
pub use domain::{DEFAULT_QUEUE_CAPACITY, DomainError, IsolatedDomain, hop, in_any_domain};
