//! Progression calculator.
//!
//! Pure functions over decimal amounts: target amount, progress,
//! remaining balance, per-installment amounts and the policy predicates
//! deciding which parameters a progression type needs. Nothing here
//! performs I/O or holds state.

mod plan;

pub use plan::ProgressionPlan;

use rand::Rng;
use rand::seq::SliceRandom;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Result, SavingsError};
use crate::models::ProgressionType;

/// Computes the total a scheduled goal accumulates.
///
/// - Fixed: `n × base`.
/// - Ascending / Descending: `n × base + n × (n − 1) × increment / 2`,
///   where `base` is the smallest slot.
/// - Random: the arithmetic series when an increment is given,
///   otherwise `n × base`.
///
/// # Errors
///
/// - [`SavingsError::UnsupportedOperation`] for
///   [`ProgressionType::FreeForm`], whatever the other arguments.
/// - [`SavingsError::MissingParameter`] if Ascending or Descending lack an
///   increment.
/// - [`SavingsError::InvalidArgument`] for zero installments, negative
///   amounts or overflow.
pub fn calculate_target_amount(
    progression: ProgressionType,
    base_amount: Decimal,
    number_of_installments: u32,
    increment_amount: Option<Decimal>,
) -> Result<Decimal> {
    let step = series_step(progression, increment_amount)?;
    check_inputs(base_amount, number_of_installments, step)?;
    series_total(base_amount, number_of_installments, step)
}

/// Progress as a whole percentage in `[0, 100]`.
///
/// A non-positive target yields `0`; over-funding never reports more
/// than `100`.
#[must_use]
pub fn calculate_progress(current_amount: Decimal, target_amount: Decimal) -> u8 {
    if target_amount <= Decimal::ZERO {
        return 0;
    }
    let Some(ratio) = current_amount
        .checked_div(target_amount)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    else {
        return if current_amount < Decimal::ZERO { 0 } else { 100 };
    };
    ratio
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        .to_u8()
        .unwrap_or(0)
}

/// Amount still missing: `max(target − current, 0)`.
#[inline]
#[must_use]
pub fn calculate_remaining(current_amount: Decimal, target_amount: Decimal) -> Decimal {
    target_amount
        .saturating_sub(current_amount)
        .max(Decimal::ZERO)
}

/// Returns `true` if the progression type needs an increment amount.
#[inline]
#[must_use]
pub const fn requires_increment(progression: ProgressionType) -> bool {
    matches!(
        progression,
        ProgressionType::Ascending | ProgressionType::Descending
    )
}

/// Returns `true` if the progression type needs an installment count.
#[inline]
#[must_use]
pub const fn requires_installments(progression: ProgressionType) -> bool {
    !matches!(progression, ProgressionType::FreeForm)
}

/// Returns `true` if a schedule of this type may be extended.
///
/// Descending amounts are defined against a fixed total count, so
/// appending slots would change amounts that may already be paid.
#[inline]
#[must_use]
pub const fn can_add_installments(progression: ProgressionType) -> bool {
    !matches!(
        progression,
        ProgressionType::Descending | ProgressionType::FreeForm
    )
}

/// Per-slot amounts in slot order, before any shuffling.
///
/// Slot `k` (1-based) is `base + (k − 1) × increment` for Ascending and
/// Random, `base + (n − k) × increment` for Descending and `base` for
/// Fixed. The sum always equals [`calculate_target_amount`] for the same
/// arguments.
///
/// # Errors
///
/// Same conditions as [`calculate_target_amount`].
pub fn installment_amounts(
    progression: ProgressionType,
    base_amount: Decimal,
    number_of_installments: u32,
    increment_amount: Option<Decimal>,
) -> Result<Vec<Decimal>> {
    let step = series_step(progression, increment_amount)?;
    check_inputs(base_amount, number_of_installments, step)?;
    (1..=number_of_installments)
        .map(|slot| {
            let offset = if progression == ProgressionType::Descending {
                number_of_installments - slot
            } else {
                slot - 1
            };
            slot_amount(base_amount, offset, step)
        })
        .collect()
}

/// Per-slot amounts as they are materialized into a schedule: Random
/// plans are shuffled across positions, every other type keeps slot
/// order.
///
/// Only the sum and the multiset of amounts are meaningful for Random.
///
/// # Errors
///
/// Same conditions as [`calculate_target_amount`].
pub fn schedule_amounts<R: Rng + ?Sized>(
    progression: ProgressionType,
    base_amount: Decimal,
    number_of_installments: u32,
    increment_amount: Option<Decimal>,
    rng: &mut R,
) -> Result<Vec<Decimal>> {
    let mut amounts = installment_amounts(
        progression,
        base_amount,
        number_of_installments,
        increment_amount,
    )?;
    if progression == ProgressionType::Random {
        amounts.shuffle(rng);
    }
    Ok(amounts)
}

/// Amounts for slots `existing + 1 ..= existing + count` when extending
/// a schedule.
///
/// # Errors
///
/// - [`SavingsError::UnsupportedOperation`] if the type cannot be
///   extended (see [`can_add_installments`]).
/// - [`SavingsError::InvalidArgument`] if `count` is zero or amounts
///   overflow.
pub fn continuation_amounts(
    progression: ProgressionType,
    base_amount: Decimal,
    increment_amount: Option<Decimal>,
    existing: u32,
    count: u32,
) -> Result<Vec<Decimal>> {
    if !can_add_installments(progression) {
        return Err(SavingsError::UnsupportedOperation(format!(
            "{progression} schedules cannot be extended"
        )));
    }
    let step = series_step(progression, increment_amount)?;
    check_inputs(base_amount, count, step)?;
    let last = existing
        .checked_add(count)
        .ok_or_else(|| overflow("installment count"))?;
    ((existing + 1)..=last)
        .map(|slot| slot_amount(base_amount, slot - 1, step))
        .collect()
}

/// Resolves the common difference of the series for a progression type.
fn series_step(progression: ProgressionType, increment_amount: Option<Decimal>) -> Result<Decimal> {
    match progression {
        ProgressionType::FreeForm => Err(SavingsError::UnsupportedOperation(
            "the target of a free-form goal is supplied by the user".to_owned(),
        )),
        ProgressionType::Fixed => Ok(Decimal::ZERO),
        ProgressionType::Ascending | ProgressionType::Descending => {
            increment_amount.ok_or(SavingsError::MissingParameter {
                progression,
                parameter: "an increment amount",
            })
        }
        ProgressionType::Random => Ok(increment_amount.unwrap_or(Decimal::ZERO)),
    }
}

/// Rejects inputs outside the calculator's domain.
fn check_inputs(base_amount: Decimal, number_of_installments: u32, step: Decimal) -> Result<()> {
    if number_of_installments == 0 {
        return Err(SavingsError::InvalidArgument(
            "number of installments must be positive".to_owned(),
        ));
    }
    if base_amount < Decimal::ZERO {
        return Err(SavingsError::InvalidArgument(
            "base amount must not be negative".to_owned(),
        ));
    }
    if step < Decimal::ZERO {
        return Err(SavingsError::InvalidArgument(
            "increment amount must not be negative".to_owned(),
        ));
    }
    Ok(())
}

/// Arithmetic-series sum `n × base + n × (n − 1) × step / 2`.
fn series_total(base_amount: Decimal, number_of_installments: u32, step: Decimal) -> Result<Decimal> {
    let count = Decimal::from(number_of_installments);
    let gaps = Decimal::from(number_of_installments.saturating_sub(1));
    let flat = count
        .checked_mul(base_amount)
        .ok_or_else(|| overflow("target amount"))?;
    let growth = count
        .checked_mul(gaps)
        .and_then(|pairs| pairs.checked_mul(step))
        .and_then(|doubled| doubled.checked_div(Decimal::TWO))
        .ok_or_else(|| overflow("target amount"))?;
    flat.checked_add(growth)
        .ok_or_else(|| overflow("target amount"))
}

/// Amount of the slot `offset` steps above the base.
fn slot_amount(base_amount: Decimal, offset: u32, step: Decimal) -> Result<Decimal> {
    Decimal::from(offset)
        .checked_mul(step)
        .and_then(|raise| base_amount.checked_add(raise))
        .ok_or_else(|| overflow("installment amount"))
}

/// Builds the overflow error for the named quantity.
fn overflow(what: &str) -> SavingsError {
    SavingsError::InvalidArgument(format!("{what} overflows the decimal range"))
}
