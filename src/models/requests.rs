//! Request payloads sent to the persistence gateway.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CurrencyId, GoalStatus, Installment, ProgressionType, SavingsGoal};
use crate::calculator::ProgressionPlan;
use crate::error::{Result, SavingsError};

/// Payload for creating a savings goal.
///
/// Prefer [`CreateGoalRequest::planned`] and
/// [`CreateGoalRequest::free_form`], which fill `target_amount` the same
/// way the calculator does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    /// Currency the goal is denominated in.
    pub currency_id: CurrencyId,
    /// Display name.
    pub name: String,
    /// Total the goal aims to accumulate.
    pub target_amount: Decimal,
    /// Progression rule.
    pub progression_type_id: ProgressionType,
    /// First day of the plan.
    pub start_date: NaiveDate,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Scheduled installment count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_installments: Option<u32>,
    /// Per-installment base amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<Decimal>,
    /// Common difference between installments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_amount: Option<Decimal>,
    /// Expected completion date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_end_date: Option<NaiveDate>,
}

impl CreateGoalRequest {
    /// Builds a request for a scheduled goal, deriving the target amount
    /// from the plan.
    ///
    /// # Errors
    ///
    /// Returns the calculator error if the plan is incomplete or is a
    /// free-form plan.
    pub fn planned<N: Into<String>>(
        name: N,
        currency_id: CurrencyId,
        start_date: NaiveDate,
        plan: &ProgressionPlan,
    ) -> Result<Self> {
        let target_amount = plan.target_amount()?;
        let normalized = plan.normalized();
        Ok(Self {
            currency_id,
            name: name.into(),
            target_amount,
            progression_type_id: normalized.progression,
            start_date,
            description: None,
            number_of_installments: normalized.number_of_installments,
            base_amount: normalized.base_amount,
            increment_amount: normalized.increment_amount,
            expected_end_date: None,
        })
    }

    /// Builds a request for a free-form goal with a user-supplied target.
    ///
    /// # Errors
    ///
    /// Returns [`SavingsError::InvalidArgument`] if the target is not
    /// positive.
    pub fn free_form<N: Into<String>>(
        name: N,
        currency_id: CurrencyId,
        start_date: NaiveDate,
        target_amount: Decimal,
    ) -> Result<Self> {
        if target_amount <= Decimal::ZERO {
            return Err(SavingsError::InvalidArgument(
                "free-form target amount must be positive".to_owned(),
            ));
        }
        Ok(Self {
            currency_id,
            name: name.into(),
            target_amount,
            progression_type_id: ProgressionType::FreeForm,
            start_date,
            description: None,
            number_of_installments: None,
            base_amount: None,
            increment_amount: None,
            expected_end_date: None,
        })
    }

    /// Sets the description.
    #[inline]
    #[must_use]
    pub fn description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the expected completion date.
    #[inline]
    #[must_use]
    pub const fn expected_end_date(mut self, date: NaiveDate) -> Self {
        self.expected_end_date = Some(date);
        self
    }

    /// Progression parameters carried by the request.
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
}

/// Payload for updating a savings goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    /// Currency the goal is denominated in.
    pub currency_id: CurrencyId,
    /// Display name.
    pub name: String,
    /// Total the goal aims to accumulate.
    pub target_amount: Decimal,
    /// Progression rule.
    pub progression_type_id: ProgressionType,
    /// Lifecycle status.
    pub status_id: GoalStatus,
    /// First day of the plan.
    pub start_date: NaiveDate,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Scheduled installment count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_installments: Option<u32>,
    /// Per-installment base amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<Decimal>,
    /// Common difference between installments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_amount: Option<Decimal>,
    /// Expected completion date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_end_date: Option<NaiveDate>,
}

impl UpdateGoalRequest {
    /// Starts an update that keeps every field of `goal`.
    #[must_use]
    pub fn from_goal(goal: &SavingsGoal) -> Self {
        Self {
            currency_id: goal.currency_id,
            name: goal.name.clone(),
            target_amount: goal.target_amount,
            progression_type_id: goal.progression_type_id,
            status_id: goal.status_id,
            start_date: goal.start_date,
            description: goal.description.clone(),
            number_of_installments: goal.number_of_installments,
            base_amount: goal.base_amount,
            increment_amount: goal.increment_amount,
            expected_end_date: goal.expected_end_date,
        }
    }

    /// Replaces the progression parameters and re-derives the target.
    ///
    /// # Errors
    ///
    /// Returns the calculator error if the plan is incomplete or is a
    /// free-form plan; use [`Self::free_form_target`] for those.
    pub fn with_plan(mut self, plan: &ProgressionPlan) -> Result<Self> {
        self.target_amount = plan.target_amount()?;
        let normalized = plan.normalized();
        self.progression_type_id = normalized.progression;
        self.base_amount = normalized.base_amount;
        self.increment_amount = normalized.increment_amount;
        self.number_of_installments = normalized.number_of_installments;
        Ok(self)
    }

    /// Switches to a free-form goal with the given target.
    ///
    /// # Errors
    ///
    /// Returns [`SavingsError::InvalidArgument`] if the target is not
    /// positive.
    pub fn free_form_target(mut self, target_amount: Decimal) -> Result<Self> {
        if target_amount <= Decimal::ZERO {
            return Err(SavingsError::InvalidArgument(
                "free-form target amount must be positive".to_owned(),
            ));
        }
        self.target_amount = target_amount;
        self.progression_type_id = ProgressionType::FreeForm;
        self.base_amount = None;
        self.increment_amount = None;
        self.number_of_installments = None;
        Ok(self)
    }

    /// Sets the lifecycle status.
    #[inline]
    #[must_use]
    pub const fn status(mut self, status: GoalStatus) -> Self {
        self.status_id = status;
        self
    }

    /// Sets the display name.
    #[inline]
    #[must_use]
    pub fn name<T: Into<String>>(mut self, name: T) -> Self {
        self.name = name.into();
        self
    }

    /// Progression parameters carried by the request.
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
}

/// Payload for paying a scheduled installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayInstallmentRequest {
    /// Amount actually paid; defaults to the scheduled amount.
    pub amount: Decimal,
    /// Optional note stored on the deposit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PayInstallmentRequest {
    /// Pays exactly the scheduled amount.
    #[inline]
    #[must_use]
    pub const fn for_installment(installment: &Installment) -> Self {
        Self {
            amount: installment.amount,
            description: None,
        }
    }

    /// Overrides the paid amount.
    #[inline]
    #[must_use]
    pub const fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the deposit note.
    #[inline]
    #[must_use]
    pub fn description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Payload for extending a goal's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddInstallmentsRequest {
    /// Number of slots to append.
    pub count: u32,
}

/// Payload for a free-standing deposit on a free-form goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeFormDepositRequest {
    /// Deposited amount.
    pub amount: Decimal,
    /// Optional note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FreeFormDepositRequest {
    /// Creates a deposit request without a note.
    #[inline]
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self {
            amount,
            description: None,
        }
    }

    /// Sets the deposit note.
    #[inline]
    #[must_use]
    pub fn description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self
    }
}
