//! Deposit model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DepositId, GoalId, InstallmentId};

/// A recorded payment event that increases a goal's accumulated amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    /// Backend identity.
    pub id: DepositId,
    /// Owning goal.
    pub goal_id: GoalId,
    /// Installment this deposit paid, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_id: Option<InstallmentId>,
    /// Deposited amount.
    pub amount: Decimal,
    /// Optional note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Day the deposit was recorded.
    pub deposit_date: NaiveDate,
}
