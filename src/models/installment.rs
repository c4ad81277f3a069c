//! Scheduled installment model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{GoalId, InstallmentId, InstallmentStatus};

/// One scheduled, numbered payment slot belonging to a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    /// Backend identity.
    pub id: InstallmentId,
    /// Owning goal.
    pub goal_id: GoalId,
    /// 1-based position in the schedule.
    pub installment_number: u32,
    /// Amount due for this slot.
    pub amount: Decimal,
    /// Current status.
    pub status_id: InstallmentStatus,
    /// Set when the installment is paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
}

impl Installment {
    /// Returns `true` while the installment can still be paid or skipped.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status_id == InstallmentStatus::Pending
    }

    /// Marks the installment paid on the given date.
    #[inline]
    pub const fn mark_paid(&mut self, date: NaiveDate) {
        self.status_id = InstallmentStatus::Paid;
        self.paid_date = Some(date);
    }

    /// Marks the installment skipped.
    #[inline]
    pub const fn mark_skipped(&mut self) {
        self.status_id = InstallmentStatus::Skipped;
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn deserialize_pending_installment() {
        let json = r#"{
            "id": 5,
            "goalId": 1,
            "installmentNumber": 3,
            "amount": 2000,
            "statusId": 1
        }"#;
        let installment: Installment = serde_json::from_str(json).unwrap();
        assert!(installment.is_pending());
        assert_eq!(installment.amount, dec!(2000));
        assert!(installment.paid_date.is_none());
    }

    #[test]
    fn mark_paid_sets_date() {
        let mut installment = Installment {
            id: InstallmentId::new(1),
            goal_id: GoalId::new(1),
            installment_number: 1,
            amount: dec!(100),
            status_id: InstallmentStatus::Pending,
            paid_date: None,
        };
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        installment.mark_paid(date);
        assert_eq!(installment.status_id, InstallmentStatus::Paid);
        assert_eq!(installment.paid_date, Some(date));
        assert!(!installment.is_pending());
    }
}
