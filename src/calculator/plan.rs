//! Progression parameters bundled for validation and preview.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SavingsError};
use crate::models::ProgressionType;

/// The parameters that define a goal's schedule.
///
/// Both goal creation and live previews go through the same
/// [`super::calculate_target_amount`] call via this type, so the stored
/// target can never drift from a previewed one.
///
/// For [`ProgressionType::Descending`] the base amount is not an input:
/// the series base is the increment, so slot 1 is
/// `increment × number_of_installments` and the last slot is the
/// increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionPlan {
    /// Progression rule.
    #[serde(rename = "progressionTypeId")]
    pub progression: ProgressionType,
    /// Base amount (Fixed, Ascending, Random).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<Decimal>,
    /// Increment (required for Ascending and Descending, optional for
    /// Random).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_amount: Option<Decimal>,
    /// Installment count (required for every type but FreeForm).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_installments: Option<u32>,
}

impl ProgressionPlan {
    /// Same amount for every installment.
    #[inline]
    #[must_use]
    pub const fn fixed(base_amount: Decimal, number_of_installments: u32) -> Self {
        Self {
            progression: ProgressionType::Fixed,
            base_amount: Some(base_amount),
            increment_amount: None,
            number_of_installments: Some(number_of_installments),
        }
    }

    /// Installments growing from `base_amount` by `increment_amount`.
    #[inline]
    #[must_use]
    pub const fn ascending(
        base_amount: Decimal,
        increment_amount: Decimal,
        number_of_installments: u32,
    ) -> Self {
        Self {
            progression: ProgressionType::Ascending,
            base_amount: Some(base_amount),
            increment_amount: Some(increment_amount),
            number_of_installments: Some(number_of_installments),
        }
    }

    /// Installments shrinking by `increment_amount` down to
    /// `increment_amount`.
    #[inline]
    #[must_use]
    pub const fn descending(increment_amount: Decimal, number_of_installments: u32) -> Self {
        Self {
            progression: ProgressionType::Descending,
            base_amount: None,
            increment_amount: Some(increment_amount),
            number_of_installments: Some(number_of_installments),
        }
    }

    /// Ascending amounts (or flat ones without an increment) in shuffled
    /// order.
    #[inline]
    #[must_use]
    pub const fn random(
        base_amount: Decimal,
        increment_amount: Option<Decimal>,
        number_of_installments: u32,
    ) -> Self {
        Self {
            progression: ProgressionType::Random,
            base_amount: Some(base_amount),
            increment_amount,
            number_of_installments: Some(number_of_installments),
        }
    }

    /// No schedule at all.
    #[inline]
    #[must_use]
    pub const fn free_form() -> Self {
        Self {
            progression: ProgressionType::FreeForm,
            base_amount: None,
            increment_amount: None,
            number_of_installments: None,
        }
    }

    /// Checks that every parameter the progression type requires is
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`SavingsError::MissingParameter`] naming the first absent
    /// parameter, or [`SavingsError::InvalidArgument`] for a zero count.
    pub fn validate(&self) -> Result<()> {
        let _resolved = self.resolve()?;
        Ok(())
    }

    /// Total amount of the plan.
    ///
    /// # Errors
    ///
    /// Returns [`SavingsError::UnsupportedOperation`] for free-form plans
    /// and the validation errors of [`Self::validate`].
    pub fn target_amount(&self) -> Result<Decimal> {
        let (base, count) = self.resolve()?;
        super::calculate_target_amount(self.progression, base, count, self.increment_amount)
    }

    /// Per-slot amounts in slot order (Random unshuffled).
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::target_amount`].
    pub fn installment_amounts(&self) -> Result<Vec<Decimal>> {
        let (base, count) = self.resolve()?;
        super::installment_amounts(self.progression, base, count, self.increment_amount)
    }

    /// Per-slot amounts as materialized into a schedule (Random
    /// shuffled with `rng`).
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::target_amount`].
    pub fn schedule<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Decimal>> {
        let (base, count) = self.resolve()?;
        super::schedule_amounts(self.progression, base, count, self.increment_amount, rng)
    }

    /// Amounts of `count` slots appended after the current schedule.
    ///
    /// # Errors
    ///
    /// Returns [`SavingsError::UnsupportedOperation`] for Descending and
    /// FreeForm plans, plus the validation errors of [`Self::validate`].
    pub fn continuation(&self, count: u32) -> Result<Vec<Decimal>> {
        let (base, existing) = self.resolve()?;
        super::continuation_amounts(
            self.progression,
            base,
            self.increment_amount,
            existing,
            count,
        )
    }

    /// Copy of the plan grown by `count` installments.
    ///
    /// # Errors
    ///
    /// Returns [`SavingsError::InvalidArgument`] if the count overflows.
    pub fn extended(&self, count: u32) -> Result<Self> {
        let existing = self.number_of_installments.unwrap_or(0);
        let grown = existing.checked_add(count).ok_or_else(|| {
            SavingsError::InvalidArgument("installment count overflows".to_owned())
        })?;
        Ok(Self {
            number_of_installments: Some(grown),
            ..*self
        })
    }

    /// The plan with parameters the progression type ignores removed.
    #[must_use]
    pub const fn normalized(&self) -> Self {
        match self.progression {
            ProgressionType::FreeForm => Self::free_form(),
            ProgressionType::Fixed => Self {
                increment_amount: None,
                ..*self
            },
            ProgressionType::Descending => Self {
                base_amount: None,
                ..*self
            },
            ProgressionType::Ascending | ProgressionType::Random => *self,
        }
    }

    /// Resolves the series base and installment count.
    fn resolve(&self) -> Result<(Decimal, u32)> {
        if self.progression == ProgressionType::FreeForm {
            return Err(SavingsError::UnsupportedOperation(
                "the target of a free-form goal is supplied by the user".to_owned(),
            ));
        }
        let count = self
            .number_of_installments
            .ok_or(SavingsError::MissingParameter {
                progression: self.progression,
                parameter: "a number of installments",
            })?;
        if count == 0 {
            return Err(SavingsError::InvalidArgument(
                "number of installments must be positive".to_owned(),
            ));
        }
        if super::requires_increment(self.progression) && self.increment_amount.is_none() {
            return Err(SavingsError::MissingParameter {
                progression: self.progression,
                parameter: "an increment amount",
            });
        }
        let base = if self.progression == ProgressionType::Descending {
            self.increment_amount.unwrap_or(Decimal::ZERO)
        } else {
            self.base_amount.ok_or(SavingsError::MissingParameter {
                progression: self.progression,
                parameter: "a base amount",
            })?
        };
        Ok((base, count))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn descending_plan_uses_increment_as_base() {
        let plan = ProgressionPlan::descending(dec!(1000), 5);
        assert_eq!(plan.target_amount().unwrap(), dec!(15000));
        assert_eq!(
            plan.installment_amounts().unwrap(),
            vec![dec!(5000), dec!(4000), dec!(3000), dec!(2000), dec!(1000)]
        );
    }

    #[test]
    fn descending_plan_ignores_stored_base() {
        let plan = ProgressionPlan {
            base_amount: Some(dec!(5000)),
            ..ProgressionPlan::descending(dec!(1000), 5)
        };
        assert_eq!(plan.target_amount().unwrap(), dec!(15000));
        assert!(plan.normalized().base_amount.is_none());
    }

    #[test]
    fn validate_reports_missing_parameters() {
        let missing_count = ProgressionPlan {
            number_of_installments: None,
            ..ProgressionPlan::fixed(dec!(10), 1)
        };
        assert!(matches!(
            missing_count.validate().unwrap_err(),
            SavingsError::MissingParameter {
                parameter: "a number of installments",
                ..
            }
        ));

        let missing_increment = ProgressionPlan {
            increment_amount: None,
            ..ProgressionPlan::ascending(dec!(10), dec!(1), 3)
        };
        assert!(matches!(
            missing_increment.validate().unwrap_err(),
            SavingsError::MissingParameter {
                parameter: "an increment amount",
                ..
            }
        ));

        let missing_base = ProgressionPlan {
            base_amount: None,
            ..ProgressionPlan::random(dec!(10), None, 3)
        };
        assert!(matches!(
            missing_base.validate().unwrap_err(),
            SavingsError::MissingParameter {
                parameter: "a base amount",
                ..
            }
        ));
    }

    #[test]
    fn free_form_plan_has_no_target() {
        let err = ProgressionPlan::free_form().target_amount().unwrap_err();
        assert!(matches!(err, SavingsError::UnsupportedOperation(_)));
    }

    #[test]
    fn extended_plan_adds_continuation_to_target() {
        let plan = ProgressionPlan::random(dec!(100), Some(dec!(10)), 4);
        let added = plan.continuation(3).unwrap();
        let grown = plan.extended(3).unwrap();
        assert_eq!(grown.number_of_installments, Some(7));
        assert_eq!(
            plan.target_amount().unwrap() + added.iter().copied().sum::<Decimal>(),
            grown.target_amount().unwrap()
        );
    }

    #[test]
    fn schedule_sum_matches_target() {
        let plan = ProgressionPlan::random(dec!(50), Some(dec!(5)), 12);
        let mut rng = StdRng::seed_from_u64(99);
        let schedule = plan.schedule(&mut rng).unwrap();
        assert_eq!(
            schedule.iter().copied().sum::<Decimal>(),
            plan.target_amount().unwrap()
        );
    }
}
