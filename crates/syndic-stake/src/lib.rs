pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod store;
pub mod token;

pub use config::LedgerConfig;
pub use error::{Result, StakeError};
pub use events::{StakeEvent, StakeEventKind, StakePool};
pub use ledger::{LedgerStats, MembershipHook, OperatorAccount, PendingExit, StakeLedger};
pub use store::{LedgerStore, MemoryLedgerStore};
pub use token::{MemoryToken, TokenTransfer};
