//! Data models for savings goals, their schedules and deposits.
//!
//! Entities mirror the JSON documents exchanged with the persistence
//! gateway (camelCase keys, enum values as numeric ids). Request types
//! are the payloads of the gateway's write operations.

mod deposit;
mod enums;
mod goal;
mod ids;
mod installment;
mod requests;

pub use deposit::Deposit;
pub use enums::{GoalStatus, InstallmentStatus, ProgressionType};
pub use goal::SavingsGoal;
pub use ids::{CurrencyId, DepositId, GoalId, InstallmentId};
pub use installment::Installment;
pub use requests::{
    AddInstallmentsRequest, CreateGoalRequest, FreeFormDepositRequest, PayInstallmentRequest,
    UpdateGoalRequest,
};

/// Today's date in UTC, used for paid and deposit dates.
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
