//! Cached goal state, its derived views and the patches applied to it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;

use super::LoadOutcome;
use crate::calculator;
use crate::error::{Result, SavingsError};
use crate::models::{
    self, Deposit, DepositId, GoalId, GoalStatus, Installment, InstallmentId, ProgressionType,
    SavingsGoal,
};

/// Everything the goal store caches.
///
/// Installments and deposits are scoped to one goal (normally the
/// selected one); selecting a different goal drops them.
#[derive(Debug, Clone, Default)]
pub struct GoalState {
    /// Goals in load/creation order.
    goals: Vec<SavingsGoal>,
    /// Goal the scoped lists belong to.
    selected_goal: Option<SavingsGoal>,
    /// Schedule of the scoped goal.
    installments: Vec<Installment>,
    /// Deposits of the scoped goal.
    deposits: Vec<Deposit>,
    /// Last failure message.
    error: Option<String>,
    /// Client-side status filter.
    filter_status: Option<GoalStatus>,
    /// Client-side progression filter.
    filter_progression_type: Option<ProgressionType>,
    /// Goal `installments` were loaded for.
    installments_goal: Option<GoalId>,
    /// Goal `deposits` were loaded for.
    deposits_goal: Option<GoalId>,
    /// Change counters used to detect stale responses.
    revisions: Revisions,
    /// Patch revision of every goal patched since the last reset.
    patched: HashMap<GoalId, u64>,
}

/// Per-collection change counters.
#[derive(Debug, Clone, Copy, Default)]
struct Revisions {
    /// Bumped when `goals` is written or a goal load is dispatched.
    goals: u64,
    /// Bumped when the user navigates: a selection change or a goal
    /// fetch being dispatched. Patching the selected goal does not count.
    navigation: u64,
    /// Bumped whenever a confirmed mutation patches a goal's fields.
    patches: u64,
    /// Bumped when `installments` is written or a load is dispatched.
    installments: u64,
    /// Bumped when `deposits` is written or a load is dispatched.
    deposits: u64,
}

/// Revisions captured when a replacement load was dispatched.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ticket {
    /// Revision of the list the load replaces.
    list: u64,
    /// Navigation revision at dispatch.
    navigation: u64,
    /// Goal patch revision at dispatch.
    patches: u64,
}

/// New schedule size and target after installments are appended.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Extension {
    /// Installment count including the new slots.
    number_of_installments: Option<u32>,
    /// Recomputed target amount.
    target_amount: Decimal,
}

/// Advances a counter and returns its new value.
const fn bump(counter: &mut u64) -> u64 {
    *counter = counter.wrapping_add(1);
    *counter
}

/// Builds a goal-store rule violation.
const fn violation(message: String) -> SavingsError {
    SavingsError::DomainValidation(message)
}

/// Returns `true` if a scoped list may take a patch for `goal_id`,
/// adopting the scope when the list is unscoped and the goal is selected.
fn adopts(scope: &mut Option<GoalId>, selected: Option<GoalId>, goal_id: GoalId) -> bool {
    match *scope {
        Some(current) => current == goal_id,
        None if selected == Some(goal_id) => {
            *scope = Some(goal_id);
            true
        }
        None => false,
    }
}

impl GoalState {
    /// Goals in load/creation order.
    #[inline]
    #[must_use]
    pub fn goals(&self) -> &[SavingsGoal] {
        &self.goals
    }

    /// The selected goal, if any.
    #[inline]
    #[must_use]
    pub const fn selected_goal(&self) -> Option<&SavingsGoal> {
        self.selected_goal.as_ref()
    }

    /// Cached installments in slot order.
    #[inline]
    #[must_use]
    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    /// Cached deposits in recording order.
    #[inline]
    #[must_use]
    pub fn deposits(&self) -> &[Deposit] {
        &self.deposits
    }

    /// Message of the last failed operation.
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Active status filter.
    #[inline]
    #[must_use]
    pub const fn filter_status(&self) -> Option<GoalStatus> {
        self.filter_status
    }

    /// Active progression filter.
    #[inline]
    #[must_use]
    pub const fn filter_progression_type(&self) -> Option<ProgressionType> {
        self.filter_progression_type
    }

    /// Goals with status [`GoalStatus::Active`].
    #[must_use]
    pub fn active_goals(&self) -> Vec<&SavingsGoal> {
        self.goals_with_status(GoalStatus::Active)
    }

    /// Goals with status [`GoalStatus::Completed`].
    #[must_use]
    pub fn completed_goals(&self) -> Vec<&SavingsGoal> {
        self.goals_with_status(GoalStatus::Completed)
    }

    /// Goals matching every filter that is set.
    #[must_use]
    pub fn filtered_goals(&self) -> Vec<&SavingsGoal> {
        self.goals
            .iter()
            .filter(|goal| self.filter_status.is_none_or(|status| goal.status_id == status))
            .filter(|goal| {
                self.filter_progression_type
                    .is_none_or(|progression| goal.progression_type_id == progression)
            })
            .collect()
    }

    /// Installments still awaiting payment or skip.
    #[must_use]
    pub fn pending_installments(&self) -> Vec<&Installment> {
        self.installments
            .iter()
            .filter(|installment| installment.is_pending())
            .collect()
    }

    /// Installments that were paid.
    #[must_use]
    pub fn paid_installments(&self) -> Vec<&Installment> {
        self.installments
            .iter()
            .filter(|installment| installment.status_id == models::InstallmentStatus::Paid)
            .collect()
    }

    /// Progress of the selected goal, `0` without a selection.
    #[must_use]
    pub fn selected_goal_progress(&self) -> u8 {
        self.selected_goal.as_ref().map_or(0, SavingsGoal::progress)
    }

    /// Remaining amount of the selected goal, zero without a selection.
    #[must_use]
    pub fn selected_goal_remaining(&self) -> Decimal {
        self.selected_goal
            .as_ref()
            .map_or(Decimal::ZERO, SavingsGoal::remaining)
    }

    /// Deposits, most recent first.
    #[must_use]
    pub fn sorted_deposits(&self) -> Vec<&Deposit> {
        let mut sorted: Vec<&Deposit> = self.deposits.iter().collect();
        sorted.sort_by(|left, right| {
            right
                .deposit_date
                .cmp(&left.deposit_date)
                .then_with(|| right.id.cmp(&left.id))
        });
        sorted
    }

    /// Partition helper for the status views.
    fn goals_with_status(&self, status: GoalStatus) -> Vec<&SavingsGoal> {
        self.goals
            .iter()
            .filter(|goal| goal.status_id == status)
            .collect()
    }

    /// Id of the selected goal.
    fn selected_id(&self) -> Option<GoalId> {
        self.selected_goal.as_ref().and_then(|goal| goal.id)
    }

    /// Goal with the given id, preferring the selected copy.
    fn known_goal(&self, goal_id: GoalId) -> Option<&SavingsGoal> {
        self.selected_goal
            .as_ref()
            .filter(|goal| goal.id == Some(goal_id))
            .or_else(|| self.goals.iter().find(|goal| goal.id == Some(goal_id)))
    }

    // ── Failure bookkeeping ─────────────────────────────────────────────

    /// Records a failed operation.
    fn record_failure(&mut self, err: &SavingsError) {
        tracing::warn!(error = %err, client_side = err.is_client_side(), "savings operation failed");
        self.error = Some(err.user_message());
    }

    // ── Local edits ─────────────────────────────────────────────────────

    /// Replaces the selection, dropping scoped lists of other goals.
    fn set_selection(&mut self, goal: Option<SavingsGoal>) {
        let selected = goal.as_ref().and_then(|candidate| candidate.id);
        if self.installments_goal.is_some() && self.installments_goal != selected {
            self.installments.clear();
            self.installments_goal = None;
        }
        if self.deposits_goal.is_some() && self.deposits_goal != selected {
            self.deposits.clear();
            self.deposits_goal = None;
        }
        self.selected_goal = goal;
    }

    /// Selects a goal without any I/O.
    pub(crate) fn select(&mut self, goal: SavingsGoal) {
        let _revision = bump(&mut self.revisions.navigation);
        self.set_selection(Some(goal));
    }

    /// Clears the selection and its scoped lists.
    pub(crate) fn clear_selection(&mut self) {
        let _revision = bump(&mut self.revisions.navigation);
        self.set_selection(None);
    }

    /// Sets or clears the status filter.
    pub(crate) const fn set_status_filter(&mut self, status: Option<GoalStatus>) {
        self.filter_status = status;
    }

    /// Sets or clears the progression filter.
    pub(crate) const fn set_progression_type_filter(
        &mut self,
        progression: Option<ProgressionType>,
    ) {
        self.filter_progression_type = progression;
    }

    /// Clears both filters.
    pub(crate) const fn clear_filters(&mut self) {
        self.filter_status = None;
        self.filter_progression_type = None;
    }

    /// Forgets the last failure.
    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }

    /// Empties the cache; responses still in flight are discarded.
    pub(crate) fn reset(&mut self) {
        let mut revisions = self.revisions;
        let _goals = bump(&mut revisions.goals);
        let _navigation = bump(&mut revisions.navigation);
        let _patches = bump(&mut revisions.patches);
        let _installments = bump(&mut revisions.installments);
        let _deposits = bump(&mut revisions.deposits);
        *self = Self {
            revisions,
            ..Self::default()
        };
    }

    // ── Replacement loads ───────────────────────────────────────────────

    /// Registers a goal list load.
    pub(crate) const fn begin_goals_load(&mut self) -> Ticket {
        Ticket {
            list: bump(&mut self.revisions.goals),
            navigation: self.revisions.navigation,
            patches: self.revisions.patches,
        }
    }

    /// Applies a goal list unless the list changed since dispatch.
    pub(crate) fn finish_goals_load(&mut self, ticket: Ticket, goals: Vec<SavingsGoal>) -> LoadOutcome {
        if ticket.list != self.revisions.goals {
            tracing::debug!("discarding stale goal list");
            return LoadOutcome::Discarded;
        }
        self.goals = goals;
        LoadOutcome::Applied
    }

    /// Registers a single-goal fetch.
    pub(crate) const fn begin_goal_load(&mut self) -> Ticket {
        let navigation = bump(&mut self.revisions.navigation);
        Ticket {
            list: navigation,
            navigation,
            patches: self.revisions.patches,
        }
    }

    /// Selects a fetched goal unless the user navigated elsewhere since
    /// dispatch.
    ///
    /// If a confirmed mutation patched the same goal while the fetch was in
    /// flight, the patched cached copy is selected instead of the response.
    /// A goal deleted meanwhile is not selected.
    pub(crate) fn finish_goal_load(&mut self, ticket: Ticket, goal: SavingsGoal) -> LoadOutcome {
        let raw_id = goal.id.map_or(0, GoalId::into_inner);
        if ticket.navigation != self.revisions.navigation {
            tracing::debug!(goal = raw_id, "discarding stale goal");
            return LoadOutcome::Discarded;
        }
        let patched_since = goal
            .id
            .filter(|id| self.patched.get(id).is_some_and(|&revision| revision > ticket.patches));
        let Some(id) = patched_since else {
            self.set_selection(Some(goal));
            return LoadOutcome::Applied;
        };
        let Some(cached) = self.known_goal(id).cloned() else {
            tracing::debug!(goal = raw_id, "discarding goal deleted during fetch");
            return LoadOutcome::Discarded;
        };
        tracing::debug!(goal = raw_id, "keeping goal patched during fetch");
        self.set_selection(Some(cached));
        LoadOutcome::Applied
    }

    /// Registers an installment load.
    pub(crate) const fn begin_installments_load(&mut self) -> Ticket {
        Ticket {
            list: bump(&mut self.revisions.installments),
            navigation: self.revisions.navigation,
            patches: self.revisions.patches,
        }
    }

    /// Applies a schedule unless it was patched since dispatch or another
    /// goal got selected meanwhile.
    pub(crate) fn finish_installments_load(
        &mut self,
        ticket: Ticket,
        goal_id: GoalId,
        installments: Vec<Installment>,
    ) -> LoadOutcome {
        if ticket.list != self.revisions.installments || self.moved_away(ticket, goal_id) {
            tracing::debug!(goal = %goal_id, "discarding stale installments");
            return LoadOutcome::Discarded;
        }
        self.installments = installments;
        self.installments_goal = Some(goal_id);
        LoadOutcome::Applied
    }

    /// Registers a deposit load.
    pub(crate) const fn begin_deposits_load(&mut self) -> Ticket {
        Ticket {
            list: bump(&mut self.revisions.deposits),
            navigation: self.revisions.navigation,
            patches: self.revisions.patches,
        }
    }

    /// Applies deposits unless they were patched since dispatch or another
    /// goal got selected meanwhile.
    pub(crate) fn finish_deposits_load(
        &mut self,
        ticket: Ticket,
        goal_id: GoalId,
        deposits: Vec<Deposit>,
    ) -> LoadOutcome {
        if ticket.list != self.revisions.deposits || self.moved_away(ticket, goal_id) {
            tracing::debug!(goal = %goal_id, "discarding stale deposits");
            return LoadOutcome::Discarded;
        }
        self.deposits = deposits;
        self.deposits_goal = Some(goal_id);
        LoadOutcome::Applied
    }

    /// Returns `true` if the user navigated after the ticket was issued
    /// and `goal_id` is no longer the selected goal.
    fn moved_away(&self, ticket: Ticket, goal_id: GoalId) -> bool {
        ticket.navigation != self.revisions.navigation && self.selected_id() != Some(goal_id)
    }

    // ── Pre-submit validation ───────────────────────────────────────────

    /// Checks that a cached installment of `goal_id` is still pending.
    pub(crate) fn check_pending(&self, goal_id: GoalId, installment_id: InstallmentId) -> Result<()> {
        let installment = self
            .installments
            .iter()
            .find(|installment| installment.id == installment_id)
            .ok_or_else(|| violation(format!("installment {installment_id} is not loaded")))?;
        if installment.goal_id != goal_id {
            return Err(violation(format!(
                "installment {installment_id} does not belong to goal {goal_id}"
            )));
        }
        if !installment.is_pending() {
            return Err(violation(format!(
                "installment {installment_id} is already {}",
                installment.status_id
            )));
        }
        Ok(())
    }

    /// Checks a payment before it is submitted.
    pub(crate) fn check_payable(
        &self,
        goal_id: GoalId,
        installment_id: InstallmentId,
        amount: Decimal,
    ) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(violation("payment amount must be positive".to_owned()));
        }
        self.check_pending(goal_id, installment_id)
    }

    /// Checks a schedule extension and computes the goal's new shape.
    pub(crate) fn check_extendable(&self, goal_id: GoalId, count: u32) -> Result<Extension> {
        let goal = self
            .known_goal(goal_id)
            .ok_or_else(|| violation(format!("goal {goal_id} is not loaded")))?;
        if !calculator::can_add_installments(goal.progression_type_id) {
            return Err(violation(format!(
                "installments cannot be added to {} goals",
                goal.progression_type_id
            )));
        }
        if count == 0 {
            return Err(violation(
                "at least one installment must be added".to_owned(),
            ));
        }
        let grown = goal.plan().extended(count)?;
        Ok(Extension {
            number_of_installments: grown.number_of_installments,
            target_amount: grown.target_amount()?,
        })
    }

    /// Checks a free-form deposit against the goal's remaining balance.
    pub(crate) fn check_free_form_deposit(&self, goal_id: GoalId, amount: Decimal) -> Result<()> {
        let goal = self
            .known_goal(goal_id)
            .ok_or_else(|| violation(format!("goal {goal_id} is not loaded")))?;
        if !goal.is_free_form() {
            return Err(violation(format!(
                "free-form deposits are not allowed on {} goals",
                goal.progression_type_id
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(violation("deposit amount must be positive".to_owned()));
        }
        let remaining = goal.remaining();
        if amount > remaining {
            return Err(violation(format!(
                "deposit of {amount} exceeds the remaining {remaining}"
            )));
        }
        Ok(())
    }

    // ── Confirmed mutations ─────────────────────────────────────────────

    /// Appends and selects a created goal.
    pub(crate) fn apply_created(&mut self, goal: &SavingsGoal) {
        self.goals.push(goal.clone());
        let _goals = bump(&mut self.revisions.goals);
        self.select(goal.clone());
    }

    /// Replaces a goal in place in the list and in the selection.
    pub(crate) fn apply_updated(&mut self, id: GoalId, goal: &SavingsGoal) {
        if let Some(entry) = self.goals.iter_mut().find(|entry| entry.id == Some(id)) {
            entry.clone_from(goal);
            let _goals = bump(&mut self.revisions.goals);
        }
        if self.selected_id() == Some(id) {
            self.selected_goal = Some(goal.clone());
        }
        self.mark_patched(id);
    }

    /// Forgets a deleted goal and everything scoped to it.
    pub(crate) fn apply_deleted(&mut self, id: GoalId) {
        let before = self.goals.len();
        self.goals.retain(|goal| goal.id != Some(id));
        if self.goals.len() != before {
            let _goals = bump(&mut self.revisions.goals);
        }
        if self.selected_id() == Some(id) {
            self.clear_selection();
        }
        self.mark_patched(id);
        if self.installments_goal == Some(id) {
            self.installments.clear();
            self.installments_goal = None;
            let _installments = bump(&mut self.revisions.installments);
        }
        if self.deposits_goal == Some(id) {
            self.deposits.clear();
            self.deposits_goal = None;
            let _deposits = bump(&mut self.revisions.deposits);
        }
    }

    /// Marks an installment paid, records its deposit and raises the
    /// goal's current amount, all in one step.
    pub(crate) fn apply_payment(
        &mut self,
        goal_id: GoalId,
        installment_id: InstallmentId,
        deposit: &Deposit,
    ) {
        if let Some(installment) = self
            .installments
            .iter_mut()
            .find(|installment| installment.id == installment_id && installment.goal_id == goal_id)
        {
            installment.mark_paid(models::today());
            let _installments = bump(&mut self.revisions.installments);
        }
        self.record_deposit(goal_id, deposit);
    }

    /// Marks an installment skipped.
    pub(crate) fn apply_skipped(&mut self, goal_id: GoalId, installment_id: InstallmentId) {
        if let Some(installment) = self
            .installments
            .iter_mut()
            .find(|installment| installment.id == installment_id && installment.goal_id == goal_id)
        {
            installment.mark_skipped();
            let _installments = bump(&mut self.revisions.installments);
        }
    }

    /// Appends new installments and grows the goal's schedule.
    pub(crate) fn apply_extension(
        &mut self,
        goal_id: GoalId,
        extension: Extension,
        added: &[Installment],
    ) {
        let selected = self.selected_id();
        if adopts(&mut self.installments_goal, selected, goal_id) {
            self.installments.extend_from_slice(added);
            let _installments = bump(&mut self.revisions.installments);
        }
        self.patch_goal(goal_id, |goal| {
            goal.number_of_installments = extension.number_of_installments;
            goal.target_amount = extension.target_amount;
        });
    }

    /// Records a deposit and raises the goal's current amount.
    pub(crate) fn record_deposit(&mut self, goal_id: GoalId, deposit: &Deposit) {
        let selected = self.selected_id();
        if adopts(&mut self.deposits_goal, selected, goal_id) {
            self.deposits.push(deposit.clone());
            let _deposits = bump(&mut self.revisions.deposits);
        }
        self.patch_goal(goal_id, |goal| {
            goal.current_amount = goal.current_amount.saturating_add(deposit.amount);
        });
    }

    /// Drops a deleted deposit and lowers its goal's current amount.
    pub(crate) fn apply_deposit_deleted(&mut self, deposit_id: DepositId) {
        let Some(position) = self
            .deposits
            .iter()
            .position(|deposit| deposit.id == deposit_id)
        else {
            return;
        };
        let removed = self.deposits.remove(position);
        let _deposits = bump(&mut self.revisions.deposits);
        self.patch_goal(removed.goal_id, |goal| {
            goal.current_amount = goal
                .current_amount
                .saturating_sub(removed.amount)
                .max(Decimal::ZERO);
        });
    }

    /// Applies `patch` to the goal's list entry and selected copy.
    fn patch_goal<F>(&mut self, goal_id: GoalId, patch: F)
    where
        F: Fn(&mut SavingsGoal),
    {
        if let Some(entry) = self.goals.iter_mut().find(|goal| goal.id == Some(goal_id)) {
            patch(entry);
            let _goals = bump(&mut self.revisions.goals);
        }
        if let Some(selected) = self
            .selected_goal
            .as_mut()
            .filter(|goal| goal.id == Some(goal_id))
        {
            patch(selected);
        }
        self.mark_patched(goal_id);
    }

    /// Records that a confirmed mutation touched `goal_id`.
    fn mark_patched(&mut self, goal_id: GoalId) {
        let revision = bump(&mut self.revisions.patches);
        let _previous = self.patched.insert(goal_id, revision);
    }
}

/// The store's state behind a mutex.
///
/// Every read and every patch takes the lock once, so readers never see
/// a half-applied operation.
#[derive(Debug, Default)]
pub(crate) struct StateCell(Mutex<GoalState>);

impl StateCell {
    /// Locks the state, recovering it if a previous holder panicked.
    fn lock(&self) -> MutexGuard<'_, GoalState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a read-only closure on the state.
    pub(crate) fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&GoalState) -> R,
    {
        f(&self.lock())
    }

    /// Runs a mutating closure on the state.
    pub(crate) fn write<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut GoalState) -> R,
    {
        f(&mut self.lock())
    }

    /// Runs a pre-submit check, recording its failure.
    pub(crate) fn validate<T, F>(&self, check: F) -> Result<T>
    where
        F: FnOnce(&GoalState) -> Result<T>,
    {
        let mut state = self.lock();
        match check(&state) {
            Ok(value) => Ok(value),
            Err(err) => {
                state.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Applies a gateway result: patches the state on success, records
    /// the failure otherwise.
    pub(crate) fn settle<T, R, F>(&self, result: Result<T>, apply: F) -> Result<R>
    where
        F: FnOnce(&mut GoalState, T) -> R,
    {
        let mut state = self.lock();
        match result {
            Ok(value) => {
                state.error = None;
                Ok(apply(&mut state, value))
            }
            Err(err) => {
                state.record_failure(&err);
                Err(err)
            }
        }
    }
}
