//! In-memory persistence backend.
//!
//! Provides [`InMemoryGateway`], a thread-safe implementation of both
//! gateway traits that behaves like the authoritative REST backend:
//! it assigns ids, materializes installment schedules through the
//! calculator and re-validates payments and deposits.

use std::sync::{Mutex, PoisonError};

#[cfg(feature = "async")]
use core::future::{self, Future};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;

use crate::calculator::{self, ProgressionPlan};
use crate::error::{GatewayError, Result, SavingsError};
use crate::models::{
    self, AddInstallmentsRequest, CreateGoalRequest, Deposit, DepositId, FreeFormDepositRequest,
    GoalId, GoalStatus, Installment, InstallmentId, InstallmentStatus, PayInstallmentRequest,
    ProgressionType, SavingsGoal, UpdateGoalRequest,
};

/// Status reported for requests the backend refuses.
const BAD_REQUEST: u16 = 400;

/// Thread-safe in-memory savings backend.
///
/// Implements [`super::Gateway`] (async) and [`super::BlockingGateway`]
/// (blocking). Rejected requests fail with
/// [`GatewayError::Api`] status 400, unknown entities with
/// [`GatewayError::NotFound`], the same shapes the HTTP gateways produce.
///
/// Updating a goal does not rewrite its existing installments.
///
/// # Example
///
/// ```rust
/// use savings_rs::gateway::InMemoryGateway;
///
/// // Seeded so Random schedules are reproducible.
/// let gateway = InMemoryGateway::with_seed(42);
/// ```
#[derive(Debug)]
pub struct InMemoryGateway {
    /// All state behind a single mutex for thread-safe interior mutability.
    inner: Mutex<Inner>,
}

/// Inner mutable state.
#[derive(Debug)]
struct Inner {
    /// Stored goals in creation order.
    goals: Vec<SavingsGoal>,
    /// Installments of every goal.
    installments: Vec<Installment>,
    /// Deposits of every goal.
    deposits: Vec<Deposit>,
    /// Next identity value, shared by all entity kinds.
    next_id: i64,
    /// Shuffles Random schedules.
    rng: StdRng,
    /// When set, every call fails with a backend error.
    offline: bool,
}

impl Default for InMemoryGateway {
    #[inline]
    fn default() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }
}

impl InMemoryGateway {
    /// Creates an empty backend with an entropy-seeded shuffle.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend whose Random schedules are reproducible.
    #[inline]
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Simulates an unreachable backend.
    #[inline]
    pub fn set_offline(&self, offline: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.offline = offline;
    }

    /// Wraps the given generator in an empty backend.
    fn from_rng(rng: StdRng) -> Self {
        Self {
            inner: Mutex::new(Inner {
                goals: Vec::new(),
                installments: Vec::new(),
                deposits: Vec::new(),
                next_id: 1,
                rng,
                offline: false,
            }),
        }
    }

    /// Acquires the inner lock and applies a fallible closure.
    fn with_lock<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Inner) -> Result<R>,
    {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        if inner.offline {
            return Err(GatewayError::Backend("savings backend is offline".to_owned()).into());
        }
        f(&mut inner)
    }
}

impl Inner {
    /// Hands out the next identity value.
    const fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Looks up a goal.
    fn goal(&self, id: GoalId) -> Result<&SavingsGoal> {
        self.goals
            .iter()
            .find(|goal| goal.id == Some(id))
            .ok_or_else(|| not_found("goal", id.into_inner()))
    }

    /// Looks up a goal for mutation.
    fn goal_mut(&mut self, id: GoalId) -> Result<&mut SavingsGoal> {
        self.goals
            .iter_mut()
            .find(|goal| goal.id == Some(id))
            .ok_or_else(|| not_found("goal", id.into_inner()))
    }

    /// Looks up a pending installment of a goal for mutation.
    fn pending_installment_mut(
        &mut self,
        goal_id: GoalId,
        installment_id: InstallmentId,
    ) -> Result<&mut Installment> {
        let installment = self
            .installments
            .iter_mut()
            .find(|candidate| candidate.id == installment_id && candidate.goal_id == goal_id)
            .ok_or_else(|| not_found("installment", installment_id.into_inner()))?;
        if !installment.is_pending() {
            return Err(rejected(format!(
                "installment {installment_id} is {}",
                installment.status_id
            )));
        }
        Ok(installment)
    }

    /// Returns a copy of a goal.
    fn get_goal(&self, id: GoalId) -> Result<SavingsGoal> {
        self.goal(id).cloned()
    }

    /// Stores a goal and materializes its schedule.
    fn create_goal(&mut self, request: &CreateGoalRequest) -> Result<SavingsGoal> {
        let plan = request.plan();
        let amounts = if plan.progression == ProgressionType::FreeForm {
            check_free_form_target(request.target_amount)?;
            Vec::new()
        } else {
            check_target(&plan, request.target_amount)?;
            plan.schedule(&mut self.rng).map_err(rejection)?
        };

        let id = GoalId::new(self.allocate_id());
        let goal = SavingsGoal {
            id: Some(id),
            name: request.name.clone(),
            description: request.description.clone(),
            currency_id: request.currency_id,
            progression_type_id: request.progression_type_id,
            status_id: GoalStatus::Active,
            start_date: request.start_date,
            expected_end_date: request.expected_end_date,
            target_amount: request.target_amount,
            current_amount: Decimal::ZERO,
            base_amount: request.base_amount,
            increment_amount: request.increment_amount,
            number_of_installments: request.number_of_installments,
        };
        for (number, amount) in (1_u32..).zip(amounts) {
            let installment = Installment {
                id: InstallmentId::new(self.allocate_id()),
                goal_id: id,
                installment_number: number,
                amount,
                status_id: InstallmentStatus::Pending,
                paid_date: None,
            };
            self.installments.push(installment);
        }
        tracing::debug!(goal = %id, progression = %goal.progression_type_id, "goal created");
        self.goals.push(goal.clone());
        Ok(goal)
    }

    /// Overwrites a goal's editable fields.
    fn update_goal(&mut self, id: GoalId, request: &UpdateGoalRequest) -> Result<SavingsGoal> {
        let plan = request.plan();
        if plan.progression == ProgressionType::FreeForm {
            check_free_form_target(request.target_amount)?;
        } else {
            check_target(&plan, request.target_amount)?;
        }
        let goal = self.goal_mut(id)?;
        goal.name.clone_from(&request.name);
        goal.description.clone_from(&request.description);
        goal.currency_id = request.currency_id;
        goal.progression_type_id = request.progression_type_id;
        goal.status_id = request.status_id;
        goal.start_date = request.start_date;
        goal.expected_end_date = request.expected_end_date;
        goal.target_amount = request.target_amount;
        goal.base_amount = request.base_amount;
        goal.increment_amount = request.increment_amount;
        goal.number_of_installments = request.number_of_installments;
        Ok(goal.clone())
    }

    /// Removes a goal with everything it owns.
    fn delete_goal(&mut self, id: GoalId) -> Result<()> {
        let position = self
            .goals
            .iter()
            .position(|goal| goal.id == Some(id))
            .ok_or_else(|| not_found("goal", id.into_inner()))?;
        let _removed = self.goals.remove(position);
        self.installments.retain(|installment| installment.goal_id != id);
        self.deposits.retain(|deposit| deposit.goal_id != id);
        Ok(())
    }

    /// Returns a goal's schedule in slot order.
    fn list_installments(&self, goal_id: GoalId) -> Result<Vec<Installment>> {
        let _goal = self.goal(goal_id)?;
        let mut schedule: Vec<Installment> = self
            .installments
            .iter()
            .filter(|installment| installment.goal_id == goal_id)
            .cloned()
            .collect();
        schedule.sort_by_key(|installment| installment.installment_number);
        Ok(schedule)
    }

    /// Marks an installment paid and records its deposit.
    fn pay_installment(
        &mut self,
        goal_id: GoalId,
        installment_id: InstallmentId,
        request: &PayInstallmentRequest,
    ) -> Result<Deposit> {
        if request.amount <= Decimal::ZERO {
            return Err(rejected("payment amount must be positive"));
        }
        let current_amount = self
            .goal(goal_id)?
            .current_amount
            .checked_add(request.amount)
            .ok_or_else(|| rejected("goal amount overflows"))?;
        let today = models::today();
        self.pending_installment_mut(goal_id, installment_id)?
            .mark_paid(today);
        let deposit_id = DepositId::new(self.allocate_id());

        let deposit = Deposit {
            id: deposit_id,
            goal_id,
            installment_id: Some(installment_id),
            amount: request.amount,
            description: request.description.clone(),
            deposit_date: today,
        };
        self.deposits.push(deposit.clone());
        self.goal_mut(goal_id)?.current_amount = current_amount;
        Ok(deposit)
    }

    /// Marks an installment skipped.
    fn skip_installment(
        &mut self,
        goal_id: GoalId,
        installment_id: InstallmentId,
    ) -> Result<Installment> {
        let _goal = self.goal(goal_id)?;
        let installment = self.pending_installment_mut(goal_id, installment_id)?;
        installment.mark_skipped();
        Ok(installment.clone())
    }

    /// Appends continuation slots and grows the target.
    fn add_installments(
        &mut self,
        goal_id: GoalId,
        request: &AddInstallmentsRequest,
    ) -> Result<Vec<Installment>> {
        let plan = self.goal(goal_id)?.plan();
        if !calculator::can_add_installments(plan.progression) {
            return Err(rejected(format!(
                "{} schedules cannot be extended",
                plan.progression
            )));
        }
        if request.count == 0 {
            return Err(rejected("installment count must be positive"));
        }
        let mut amounts = plan.continuation(request.count).map_err(rejection)?;
        let grown = plan.extended(request.count).map_err(rejection)?;
        let target_amount = grown.target_amount().map_err(rejection)?;
        if plan.progression == ProgressionType::Random {
            amounts.shuffle(&mut self.rng);
        }

        let last_number = self
            .installments
            .iter()
            .filter(|installment| installment.goal_id == goal_id)
            .map(|installment| installment.installment_number)
            .max()
            .unwrap_or(0);
        let mut added = Vec::with_capacity(amounts.len());
        for (number, amount) in (last_number.saturating_add(1)..).zip(amounts) {
            added.push(Installment {
                id: InstallmentId::new(self.allocate_id()),
                goal_id,
                installment_number: number,
                amount,
                status_id: InstallmentStatus::Pending,
                paid_date: None,
            });
        }
        self.installments.extend(added.iter().cloned());

        let goal = self.goal_mut(goal_id)?;
        goal.number_of_installments = grown.number_of_installments;
        goal.target_amount = target_amount;
        tracing::debug!(goal = %goal_id, added = added.len(), "schedule extended");
        Ok(added)
    }

    /// Returns a goal's deposits in recording order.
    fn list_deposits(&self, goal_id: GoalId) -> Result<Vec<Deposit>> {
        let _goal = self.goal(goal_id)?;
        Ok(self
            .deposits
            .iter()
            .filter(|deposit| deposit.goal_id == goal_id)
            .cloned()
            .collect())
    }

    /// Records a deposit on a free-form goal.
    fn create_free_form_deposit(
        &mut self,
        goal_id: GoalId,
        request: &FreeFormDepositRequest,
    ) -> Result<Deposit> {
        let goal = self.goal(goal_id)?;
        if !goal.is_free_form() {
            return Err(rejected(format!(
                "{} goals only accept installment payments",
                goal.progression_type_id
            )));
        }
        if request.amount <= Decimal::ZERO {
            return Err(rejected("deposit amount must be positive"));
        }
        let remaining = goal.remaining();
        if request.amount > remaining {
            return Err(rejected(format!(
                "deposit of {} exceeds the remaining {remaining}",
                request.amount
            )));
        }
        let current_amount = goal.current_amount.saturating_add(request.amount);

        let deposit = Deposit {
            id: DepositId::new(self.allocate_id()),
            goal_id,
            installment_id: None,
            amount: request.amount,
            description: request.description.clone(),
            deposit_date: models::today(),
        };
        self.deposits.push(deposit.clone());
        self.goal_mut(goal_id)?.current_amount = current_amount;
        Ok(deposit)
    }

    /// Removes a deposit and recomputes its goal's amount.
    fn delete_deposit(&mut self, deposit_id: DepositId) -> Result<()> {
        let position = self
            .deposits
            .iter()
            .position(|deposit| deposit.id == deposit_id)
            .ok_or_else(|| not_found("deposit", deposit_id.into_inner()))?;
        let removed = self.deposits.remove(position);
        let total: Decimal = self
            .deposits
            .iter()
            .filter(|deposit| deposit.goal_id == removed.goal_id)
            .map(|deposit| deposit.amount)
            .sum();
        if let Some(goal) = self
            .goals
            .iter_mut()
            .find(|goal| goal.id == Some(removed.goal_id))
        {
            goal.current_amount = total;
        }
        Ok(())
    }
}

/// Verifies that a scheduled request's target is the calculator's total.
fn check_target(plan: &ProgressionPlan, target_amount: Decimal) -> Result<()> {
    let expected = plan.target_amount().map_err(rejection)?;
    if expected == target_amount {
        Ok(())
    } else {
        Err(rejected(format!(
            "target amount {target_amount} does not match the {} schedule total {expected}",
            plan.progression
        )))
    }
}

/// Verifies that a free-form target is positive.
fn check_free_form_target(target_amount: Decimal) -> Result<()> {
    if target_amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(rejected("free-form target amount must be positive"))
    }
}

/// Builds the rejection returned for an invalid request.
fn rejected<M: Into<String>>(message: M) -> SavingsError {
    GatewayError::Api {
        status: BAD_REQUEST,
        message: message.into(),
    }
    .into()
}

/// Turns a calculator error into a request rejection.
fn rejection(err: SavingsError) -> SavingsError {
    rejected(err.to_string())
}

/// Builds a not-found error.
fn not_found(entity: &'static str, id: i64) -> SavingsError {
    GatewayError::NotFound { entity, id }.into()
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &PoisonError<T>) -> SavingsError {
    GatewayError::Backend(err.to_string()).into()
}

// ── BlockingGateway implementation ──────────────────────────────────────

#[cfg(feature = "blocking")]
impl super::BlockingGateway for InMemoryGateway {
    #[inline]
    fn list_goals(&self) -> Result<Vec<SavingsGoal>> {
        self.with_lock(|inner| Ok(inner.goals.clone()))
    }

    #[inline]
    fn get_goal(&self, id: GoalId) -> Result<SavingsGoal> {
        self.with_lock(|inner| inner.get_goal(id))
    }

    #[inline]
    fn create_goal(&self, request: &CreateGoalRequest) -> Result<SavingsGoal> {
        self.with_lock(|inner| inner.create_goal(request))
    }

    #[inline]
    fn update_goal(&self, id: GoalId, request: &UpdateGoalRequest) -> Result<SavingsGoal> {
        self.with_lock(|inner| inner.update_goal(id, request))
    }

    #[inline]
    fn delete_goal(&self, id: GoalId) -> Result<()> {
        self.with_lock(|inner| inner.delete_goal(id))
    }

    #[inline]
    fn list_installments(&self, goal_id: GoalId) -> Result<Vec<Installment>> {
        self.with_lock(|inner| inner.list_installments(goal_id))
    }

    #[inline]
    fn pay_installment(
        &self,
        goal_id: GoalId,
        installment_id: InstallmentId,
        request: &PayInstallmentRequest,
    ) -> Result<Deposit> {
        self.with_lock(|inner| inner.pay_installment(goal_id, installment_id, request))
    }

    #[inline]
    fn skip_installment(
        &self,
        goal_id: GoalId,
        installment_id: InstallmentId,
    ) -> Result<Installment> {
        self.with_lock(|inner| inner.skip_installment(goal_id, installment_id))
    }

    #[inline]
    fn add_installments(
        &self,
        goal_id: GoalId,
        request: &AddInstallmentsRequest,
    ) -> Result<Vec<Installment>> {
        self.with_lock(|inner| inner.add_installments(goal_id, request))
    }

    #[inline]
    fn list_deposits(&self, goal_id: GoalId) -> Result<Vec<Deposit>> {
        self.with_lock(|inner| inner.list_deposits(goal_id))
    }

    #[inline]
    fn create_free_form_deposit(
        &self,
        goal_id: GoalId,
        request: &FreeFormDepositRequest,
    ) -> Result<Deposit> {
        self.with_lock(|inner| inner.create_free_form_deposit(goal_id, request))
    }

    #[inline]
    fn delete_deposit(&self, deposit_id: DepositId) -> Result<()> {
        self.with_lock(|inner| inner.delete_deposit(deposit_id))
    }
}

// ── Gateway (async) implementation ──────────────────────────────────────

#[cfg(feature = "async")]
impl super::Gateway for InMemoryGateway {
    #[inline]
    fn list_goals(&self) -> impl Future<Output = Result<Vec<SavingsGoal>>> + Send {
        future::ready(self.with_lock(|inner| Ok(inner.goals.clone())))
    }

    #[inline]
    fn get_goal(&self, id: GoalId) -> impl Future<Output = Result<SavingsGoal>> + Send {
        future::ready(self.with_lock(|inner| inner.get_goal(id)))
    }

    #[inline]
    fn create_goal(
        &self,
        request: &CreateGoalRequest,
    ) -> impl Future<Output = Result<SavingsGoal>> + Send {
        future::ready(self.with_lock(|inner| inner.create_goal(request)))
    }

    #[inline]
    fn update_goal(
        &self,
        id: GoalId,
        request: &UpdateGoalRequest,
    ) -> impl Future<Output = Result<SavingsGoal>> + Send {
        future::ready(self.with_lock(|inner| inner.update_goal(id, request)))
    }

    #[inline]
    fn delete_goal(&self, id: GoalId) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.with_lock(|inner| inner.delete_goal(id)))
    }

    #[inline]
    fn list_installments(
        &self,
        goal_id: GoalId,
    ) -> impl Future<Output = Result<Vec<Installment>>> + Send {
        future::ready(self.with_lock(|inner| inner.list_installments(goal_id)))
    }

    #[inline]
    fn pay_installment(
        &self,
        goal_id: GoalId,
        installment_id: InstallmentId,
        request: &PayInstallmentRequest,
    ) -> impl Future<Output = Result<Deposit>> + Send {
        future::ready(
            self.with_lock(|inner| inner.pay_installment(goal_id, installment_id, request)),
        )
    }

    #[inline]
    fn skip_installment(
        &self,
        goal_id: GoalId,
        installment_id: InstallmentId,
    ) -> impl Future<Output = Result<Installment>> + Send {
        future::ready(self.with_lock(|inner| inner.skip_installment(goal_id, installment_id)))
    }

    #[inline]
    fn add_installments(
        &self,
        goal_id: GoalId,
        request: &AddInstallmentsRequest,
    ) -> impl Future<Output = Result<Vec<Installment>>> + Send {
        future::ready(self.with_lock(|inner| inner.add_installments(goal_id, request)))
    }

    #[inline]
    fn list_deposits(&self, goal_id: GoalId) -> impl Future<Output = Result<Vec<Deposit>>> + Send {
        future::ready(self.with_lock(|inner| inner.list_deposits(goal_id)))
    }

    #[inline]
    fn create_free_form_deposit(
        &self,
        goal_id: GoalId,
        request: &FreeFormDepositRequest,
    ) -> impl Future<Output = Result<Deposit>> + Send {
        future::ready(self.with_lock(|inner| inner.create_free_form_deposit(goal_id, request)))
    }

    #[inline]
    fn delete_deposit(&self, deposit_id: DepositId) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.with_lock(|inner| inner.delete_deposit(deposit_id)))
    }
}
