//! Savings goal model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CurrencyId, GoalId, GoalStatus, ProgressionType};
use crate::calculator::{self, ProgressionPlan};

/// A savings target with a progression schedule.
///
/// For every progression type except [`ProgressionType::FreeForm`],
/// `target_amount` is derived from the base/increment/count fields and
/// must match what [`calculator::calculate_target_amount`] produces for
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    /// Backend identity; absent for unsaved goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<GoalId>,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Currency the goal is denominated in.
    pub currency_id: CurrencyId,
    /// Progression rule.
    pub progression_type_id: ProgressionType,
    /// Lifecycle status.
    pub status_id: GoalStatus,
    /// First day of the plan.
    pub start_date: NaiveDate,
    /// Expected completion date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_end_date: Option<NaiveDate>,
    /// Total the goal aims to accumulate.
    pub target_amount: Decimal,
    /// Sum of all recorded deposits.
    #[serde(default)]
    pub current_amount: Decimal,
    /// Per-installment base (Fixed) or first slot (Ascending/Random).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<Decimal>,
    /// Common difference between consecutive installments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_amount: Option<Decimal>,
    /// Scheduled installment count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_installments: Option<u32>,
}

impl SavingsGoal {
    /// Progress towards the target as a percentage in `[0, 100]`.
    #[inline]
    #[must_use]
    pub fn progress(&self) -> u8 {
        calculator::calculate_progress(self.current_amount, self.target_amount)
    }

    /// Amount still missing to reach the target (never negative).
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        calculator::calculate_remaining(self.current_amount, self.target_amount)
    }

    /// Progression parameters stored on the goal.
    #[inline]
    #[must_use]
    pub const fn plan(&self) -> ProgressionPlan {
        ProgressionPlan {
            progression: self.progression_type_id,
            base_amount: self.base_amount,
            increment_amount: self.increment_amount,
            number_of_installments: self.number_of_installments,
        }
    }

    /// Returns `true` if the goal has no schedule.
    #[inline]
    #[must_use]
    pub fn is_free_form(&self) -> bool {
        self.progression_type_id == ProgressionType::FreeForm
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn deserialize_goal() {
        let json = r#"{
            "id": 12,
            "name": "Holiday",
            "currencyId": 1,
            "progressionTypeId": 2,
            "statusId": 1,
            "startDate": "2024-01-01",
            "targetAmount": 7000,
            "currentAmount": 1000,
            "baseAmount": 1000,
            "incrementAmount": 500,
            "numberOfInstallments": 4
        }"#;
        let goal: SavingsGoal = serde_json::from_str(json).unwrap();
        assert_eq!(goal.id, Some(GoalId::new(12)));
        assert_eq!(goal.progression_type_id, ProgressionType::Ascending);
        assert_eq!(goal.target_amount, dec!(7000));
        assert_eq!(goal.number_of_installments, Some(4));
        assert!(goal.expected_end_date.is_none());
        assert_eq!(goal.plan().target_amount().unwrap(), goal.target_amount);
    }

    #[test]
    fn progress_and_remaining_delegate_to_calculator() {
        let json = r#"{
            "name": "Laptop",
            "currencyId": 1,
            "progressionTypeId": 5,
            "statusId": 1,
            "startDate": "2024-03-01",
            "targetAmount": 2000,
            "currentAmount": 500
        }"#;
        let goal: SavingsGoal = serde_json::from_str(json).unwrap();
        assert!(goal.is_free_form());
        assert_eq!(goal.progress(), 25);
        assert_eq!(goal.remaining(), dec!(1500));
    }

    #[test]
    fn amounts_keep_every_digit_on_the_wire() {
        let json = r#"{
            "name": "Treasury",
            "currencyId": 1,
            "progressionTypeId": 5,
            "statusId": 1,
            "startDate": "2024-03-01",
            "targetAmount": 12345678901234567.89,
            "currentAmount": 0.1
        }"#;
        let goal: SavingsGoal = serde_json::from_str(json).unwrap();
        assert_eq!(goal.target_amount, dec!(12345678901234567.89));
        assert_eq!(goal.current_amount, dec!(0.1));
        let written = serde_json::to_string(&goal).unwrap();
        assert!(written.contains("\"targetAmount\":12345678901234567.89"));
        assert!(written.contains("\"currentAmount\":0.1"));
    }

    #[test]
    fn serialize_omits_absent_optionals() {
        let goal = SavingsGoal {
            id: None,
            name: "Car".to_owned(),
            description: None,
            currency_id: CurrencyId::new(2),
            progression_type_id: ProgressionType::Fixed,
            status_id: GoalStatus::Active,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expected_end_date: None,
            target_amount: dec!(10000),
            current_amount: Decimal::ZERO,
            base_amount: Some(dec!(1000)),
            increment_amount: None,
            number_of_installments: Some(10),
        };
        let json = serde_json::to_string(&goal).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("incrementAmount"));
        assert!(json.contains("\"startDate\":\"2024-01-01\""));
    }
}
