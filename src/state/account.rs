// Bank account isolated in its own domain
//
// The balance lives inside an IsolatedDomain; every deposit, withdrawal and
// read is a hop. Static bank info and logging are non-isolated and never
// touch the balance.

use super::domain::{DEFAULT_QUEUE_CAPACITY, DomainError, IsolatedDomain};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors returned by [`BankAccount`] operations
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Change events emitted from inside the account domain, in execution order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountEvent {
    Deposited { amount: i64, balance: i64 },
    Withdrew { amount: i64, balance: i64 },
    Rejected { requested: i64, balance: i64 },
}

/// The isolated state of a [`BankAccount`]
#[derive(Debug)]
pub struct Ledger {
    balance: i64,
    events: broadcast::Sender<AccountEvent>,
}

impl Ledger {
    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn deposit(&mut self, amount: i64) -> Result<i64, AccountError> {
        if amount <= 0 {
            return Err(AccountError::InvalidAmount(amount));
        }
        self.balance += amount;
        log(&format!("Deposited {amount}, balance {}", self.balance));
        self.emit(AccountEvent::Deposited {
            amount,
            balance: self.balance,
        });
        Ok(self.balance)
    }

    pub fn withdraw(&mut self, amount: i64) -> Result<i64, AccountError> {
        if amount <= 0 {
            return Err(AccountError::InvalidAmount(amount));
        }
        if amount > self.balance {
            log(&format!(
                "Withdrawal of {amount} rejected, balance {}",
                self.balance
            ));
            self.emit(AccountEvent::Rejected {
                requested: amount,
                balance: self.balance,
            });
            return Err(AccountError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        log(&format!("Withdrew {amount}, balance {}", self.balance));
        self.emit(AccountEvent::Withdrew {
            amount,
            balance: self.balance,
        });
        Ok(self.balance)
    }

    fn emit(&self, event: AccountEvent) {
        // Ignore send errors - it's OK if no one is listening
        let _ = self.events.send(event);
    }
}

// Non-isolated: touches nothing but its argument
fn log(message: &str) {
    tracing::info!(target: "bank_account", "{}", message);
}

/// An account whose balance is confined to a serialized domain.
///
/// # Example
/// ```ignore
/// let account = BankAccount::new("savings")?;
/// account.deposit(1000).await?;
/// account.withdraw(300).await?;
/// assert_eq!(account.balance().await?, 700);
/// ```
#[derive(Clone, Debug)]
pub struct BankAccount {
    domain: IsolatedDomain<Ledger>,
    events: broadcast::Sender<AccountEvent>,
}

impl BankAccount {
    /// Open an empty account
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        Self::with_balance(name, 0)
    }

    /// Open an account with an opening balance
    pub fn with_balance(name: impl Into<String>, opening: i64) -> Result<Self, DomainError> {
        Self::with_capacity(name, opening, DEFAULT_QUEUE_CAPACITY)
    }

    /// Open an account whose domain admits at most `capacity` queued operations
    pub fn with_capacity(
        name: impl Into<String>,
        opening: i64,
        capacity: usize,
    ) -> Result<Self, DomainError> {
        let (events, _) = broadcast::channel(100);
        let ledger = Ledger {
            balance: opening,
            events: events.clone(),
        };
        Ok(Self {
            domain: IsolatedDomain::with_capacity(name, ledger, capacity)?,
            events,
        })
    }

    pub async fn deposit(&self, amount: i64) -> Result<i64, AccountError> {
        self.domain.hop(move |ledger| ledger.deposit(amount)).await?
    }

    pub async fn withdraw(&self, amount: i64) -> Result<i64, AccountError> {
        self.domain.hop(move |ledger| ledger.withdraw(amount)).await?
    }

    pub async fn balance(&self) -> Result<i64, AccountError> {
        Ok(self.domain.hop(|ledger| ledger.balance()).await?)
    }

    /// Move `amount` from this account into `to`
    ///
    /// Two hops: out of this domain, then into the other. There is no moment
    /// where both balances are held at once. If the deposit side is gone, the
    /// amount is put back.
    pub async fn transfer(&self, to: &BankAccount, amount: i64) -> Result<i64, AccountError> {
        let remaining = self.withdraw(amount).await?;

        if let Err(error) = to.deposit(amount).await {
            tracing::warn!(
                from = self.name(),
                to = to.name(),
                %error,
                "Transfer failed, refunding"
            );
            self.deposit(amount).await?;
            return Err(error);
        }

        Ok(remaining)
    }

    /// The domain holding the ledger, for custom hops
    pub fn domain(&self) -> &IsolatedDomain<Ledger> {
        &self.domain
    }

    pub fn name(&self) -> &str {
        self.domain.name()
    }

    /// Subscribe to balance changes
    pub fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.events.subscribe()
    }

    /// Static information about the bank; needs no isolation
    pub fn bank_info() -> &'static str {
        "Bank system v1.0"
    }
}
