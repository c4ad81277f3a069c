//! Goal state cache over a persistence gateway.
//!
//! [`GoalStore`] (async) and [`BlockingGoalStore`] (blocking) hold the
//! user's goals, the selected goal and that goal's installments and
//! deposits. Every operation validates what it can locally, calls the
//! gateway and, on success, patches the cache in one step. Failures
//! leave the cache untouched apart from [`GoalState::error`].
//!
//! Replacement loads that lose a race against a newer load, a confirmed
//! mutation of the same list, or a change of selection report
//! [`LoadOutcome::Discarded`] instead of overwriting fresher data.

mod state;

pub use state::GoalState;

#[cfg(any(feature = "async", feature = "blocking"))]
use state::StateCell;

/// What happened to the response of a replacement load.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the cached data.
    Applied,
    /// The response was older than the cached data and was dropped.
    Discarded,
}

impl LoadOutcome {
    /// Returns `true` if the response was applied.
    #[inline]
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Generates a goal store over either gateway flavour.
///
/// The async variant passes `async_kw: async` and `await_kw: await`;
/// the blocking one passes neither.
#[cfg(any(feature = "async", feature = "blocking"))]
macro_rules! define_goal_store {
    (
        store_name: $store:ident,
        gateway_trait: $gateway:ident,
        store_doc: $store_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $store_doc]
        #[derive(Debug)]
        pub struct $store<G: $gateway> {
            /// Authoritative backend.
            gateway: G,
            /// Cached state.
            state: StateCell,
        }

        impl<G: $gateway> $store<G> {
            /// Creates an empty store over `gateway`.
            #[inline]
            #[must_use]
            pub fn new(gateway: G) -> Self {
                Self {
                    gateway,
                    state: StateCell::default(),
                }
            }

            /// The backing gateway.
            #[inline]
            #[must_use]
            pub const fn gateway(&self) -> &G {
                &self.gateway
            }

            /// A consistent copy of the whole cache.
            #[inline]
            #[must_use]
            pub fn snapshot(&self) -> GoalState {
                self.state.read(GoalState::clone)
            }

            // ── Reads ───────────────────────────────────────────────────

            /// Cached goals.
            #[inline]
            #[must_use]
            pub fn goals(&self) -> Vec<SavingsGoal> {
                self.state.read(|state| state.goals().to_vec())
            }

            /// The selected goal.
            #[inline]
            #[must_use]
            pub fn selected_goal(&self) -> Option<SavingsGoal> {
                self.state.read(|state| state.selected_goal().cloned())
            }

            /// Cached installments of the selected goal.
            #[inline]
            #[must_use]
            pub fn installments(&self) -> Vec<Installment> {
                self.state.read(|state| state.installments().to_vec())
            }

            /// Cached deposits of the selected goal.
            #[inline]
            #[must_use]
            pub fn deposits(&self) -> Vec<Deposit> {
                self.state.read(|state| state.deposits().to_vec())
            }

            /// Message of the last failed operation.
            #[inline]
            #[must_use]
            pub fn error(&self) -> Option<String> {
                self.state.read(|state| state.error().map(str::to_owned))
            }

            /// Active status filter.
            #[inline]
            #[must_use]
            pub fn filter_status(&self) -> Option<GoalStatus> {
                self.state.read(GoalState::filter_status)
            }

            /// Active progression filter.
            #[inline]
            #[must_use]
            pub fn filter_progression_type(&self) -> Option<ProgressionType> {
                self.state.read(GoalState::filter_progression_type)
            }

            /// Goals that are [`GoalStatus::Active`].
            #[inline]
            #[must_use]
            pub fn active_goals(&self) -> Vec<SavingsGoal> {
                self.state.read(|state| owned(state.active_goals()))
            }

            /// Goals that are [`GoalStatus::Completed`].
            #[inline]
            #[must_use]
            pub fn completed_goals(&self) -> Vec<SavingsGoal> {
                self.state.read(|state| owned(state.completed_goals()))
            }

            /// Goals matching both filters.
            #[inline]
            #[must_use]
            pub fn filtered_goals(&self) -> Vec<SavingsGoal> {
                self.state.read(|state| owned(state.filtered_goals()))
            }

            /// Pending installments of the selected goal.
            #[inline]
            #[must_use]
            pub fn pending_installments(&self) -> Vec<Installment> {
                self.state.read(|state| owned(state.pending_installments()))
            }

            /// Paid installments of the selected goal.
            #[inline]
            #[must_use]
            pub fn paid_installments(&self) -> Vec<Installment> {
                self.state.read(|state| owned(state.paid_installments()))
            }

            /// Progress of the selected goal in percent.
            #[inline]
            #[must_use]
            pub fn selected_goal_progress(&self) -> u8 {
                self.state.read(GoalState::selected_goal_progress)
            }

            /// Remaining amount of the selected goal.
            #[inline]
            #[must_use]
            pub fn selected_goal_remaining(&self) -> Decimal {
                self.state.read(GoalState::selected_goal_remaining)
            }

            /// Deposits of the selected goal, newest first.
            #[inline]
            #[must_use]
            pub fn sorted_deposits(&self) -> Vec<Deposit> {
                self.state.read(|state| owned(state.sorted_deposits()))
            }

            // ── Local operations ────────────────────────────────────────

            /// Selects a goal without fetching it.
            #[inline]
            pub fn select_goal(&self, goal: SavingsGoal) {
                self.state.write(|state| state.select(goal));
            }

            /// Clears the selection together with its installments and deposits.
            #[inline]
            pub fn clear_selected_goal(&self) {
                self.state.write(GoalState::clear_selection);
            }

            /// Sets or clears the status filter.
            #[inline]
            pub fn set_status_filter(&self, status: Option<GoalStatus>) {
                self.state.write(|state| state.set_status_filter(status));
            }

            /// Sets or clears the progression filter.
            #[inline]
            pub fn set_progression_type_filter(&self, progression: Option<ProgressionType>) {
                self.state
                    .write(|state| state.set_progression_type_filter(progression));
            }

            /// Clears both filters.
            #[inline]
            pub fn clear_filters(&self) {
                self.state.write(GoalState::clear_filters);
            }

            /// Forgets the last failure.
            #[inline]
            pub fn clear_error(&self) {
                self.state.write(GoalState::clear_error);
            }

            /// Empties the cache. Loads still in flight will be discarded.
            #[inline]
            pub fn clear_all(&self) {
                self.state.write(GoalState::reset);
            }

            // ── Loads ───────────────────────────────────────────────────

            /// Replaces the goal list with the backend's.
            ///
            /// # Errors
            ///
            /// Returns the gateway error; the cached list is kept.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn load_goals(&self) -> Result<LoadOutcome> {
                let ticket = self.state.write(GoalState::begin_goals_load);
                let result = self.gateway.list_goals() $(.$await_ext)?;
                self.state
                    .settle(result, |state, goals| state.finish_goals_load(ticket, goals))
            }

            /// Fetches a goal and makes it the selection. The goal list is
            /// not touched.
            ///
            /// # Errors
            ///
            /// Returns the gateway error; the selection is kept.
            #[tracing::instrument(skip(self))]
            pub $($async_kw)? fn load_goal_by_id(&self, id: GoalId) -> Result<LoadOutcome> {
                let ticket = self.state.write(GoalState::begin_goal_load);
                let result = self.gateway.get_goal(id) $(.$await_ext)?;
                self.state
                    .settle(result, |state, goal| state.finish_goal_load(ticket, goal))
            }

            /// Replaces the cached installments with the goal's schedule.
            ///
            /// # Errors
            ///
            /// Returns the gateway error; the cached schedule is kept.
            #[tracing::instrument(skip(self))]
            pub $($async_kw)? fn load_installments(&self, goal_id: GoalId) -> Result<LoadOutcome> {
                let ticket = self.state.write(GoalState::begin_installments_load);
                let result = self.gateway.list_installments(goal_id) $(.$await_ext)?;
                self.state.settle(result, |state, installments| {
                    state.finish_installments_load(ticket, goal_id, installments)
                })
            }

            /// Replaces the cached deposits with the goal's deposits.
            ///
            /// # Errors
            ///
            /// Returns the gateway error; the cached deposits are kept.
            #[tracing::instrument(skip(self))]
            pub $($async_kw)? fn load_deposits(&self, goal_id: GoalId) -> Result<LoadOutcome> {
                let ticket = self.state.write(GoalState::begin_deposits_load);
                let result = self.gateway.list_deposits(goal_id) $(.$await_ext)?;
                self.state.settle(result, |state, deposits| {
                    state.finish_deposits_load(ticket, goal_id, deposits)
                })
            }

            // ── Goal mutations ──────────────────────────────────────────

            /// Creates a goal, appends it to the list and selects it.
            ///
            /// The request's target amount is the caller's responsibility;
            /// [`CreateGoalRequest::planned`] derives it from the plan.
            ///
            /// # Errors
            ///
            /// Returns the gateway error; the cache is unchanged.
            #[tracing::instrument(skip_all, fields(name = %request.name))]
            pub $($async_kw)? fn create_goal(&self, request: &CreateGoalRequest) -> Result<SavingsGoal> {
                let result = self.gateway.create_goal(request) $(.$await_ext)?;
                self.state.settle(result, |state, goal| {
                    tracing::info!(goal = goal.id.map_or(0, GoalId::into_inner), "goal created");
                    state.apply_created(&goal);
                    goal
                })
            }

            /// Updates a goal in place, in the list and in the selection.
            ///
            /// # Errors
            ///
            /// Returns the gateway error; the cache is unchanged.
            #[tracing::instrument(skip(self, request))]
            pub $($async_kw)? fn update_goal(
                &self,
                id: GoalId,
                request: &UpdateGoalRequest,
            ) -> Result<SavingsGoal> {
                let result = self.gateway.update_goal(id, request) $(.$await_ext)?;
                self.state.settle(result, |state, goal| {
                    state.apply_updated(id, &goal);
                    goal
                })
            }

            /// Deletes a goal and forgets everything cached for it.
            ///
            /// # Errors
            ///
            /// Returns the gateway error; the cache is unchanged.
            #[tracing::instrument(skip(self))]
            pub $($async_kw)? fn delete_goal(&self, id: GoalId) -> Result<()> {
                let result = self.gateway.delete_goal(id) $(.$await_ext)?;
                self.state.settle(result, |state, ()| state.apply_deleted(id))
            }

            // ── Installment mutations ───────────────────────────────────

            /// Pays a pending installment.
            ///
            /// On success the installment becomes paid today, the deposit
            /// is appended and the goal's current amount rises by the
            /// deposited amount.
            ///
            /// # Errors
            ///
            /// Returns [`SavingsError::DomainValidation`](crate::error::SavingsError::DomainValidation) without calling
            /// the gateway if the installment is not cached for the goal,
            /// is not pending, or the amount is not positive. Otherwise
            /// returns the gateway error.
            #[tracing::instrument(skip(self, request))]
            pub $($async_kw)? fn pay_installment(
                &self,
                goal_id: GoalId,
                installment_id: InstallmentId,
                request: &PayInstallmentRequest,
            ) -> Result<Deposit> {
                self.state.validate(|state| {
                    state.check_payable(goal_id, installment_id, request.amount)
                })?;
                let result = self
                    .gateway
                    .pay_installment(goal_id, installment_id, request) $(.$await_ext)?;
                self.state.settle(result, |state, deposit| {
                    state.apply_payment(goal_id, installment_id, &deposit);
                    deposit
                })
            }

            /// Skips a pending installment.
            ///
            /// # Errors
            ///
            /// Returns [`SavingsError::DomainValidation`](crate::error::SavingsError::DomainValidation) without calling
            /// the gateway if the installment is not cached for the goal
            /// or is not pending. Otherwise returns the gateway error.
            #[tracing::instrument(skip(self))]
            pub $($async_kw)? fn skip_installment(
                &self,
                goal_id: GoalId,
                installment_id: InstallmentId,
            ) -> Result<Installment> {
                self.state
                    .validate(|state| state.check_pending(goal_id, installment_id))?;
                let result = self
                    .gateway
                    .skip_installment(goal_id, installment_id) $(.$await_ext)?;
                self.state.settle(result, |state, installment| {
                    state.apply_skipped(goal_id, installment_id);
                    installment
                })
            }

            /// Appends installments to a Fixed or Random goal.
            ///
            /// The goal's installment count and target amount are grown to
            /// match the extended plan.
            ///
            /// # Errors
            ///
            /// Returns [`SavingsError::DomainValidation`](crate::error::SavingsError::DomainValidation) without calling
            /// the gateway if the goal is not cached, cannot be extended,
            /// or `count` is zero. Otherwise returns the gateway error.
            #[tracing::instrument(skip(self, request), fields(count = request.count))]
            pub $($async_kw)? fn add_installments(
                &self,
                goal_id: GoalId,
                request: &AddInstallmentsRequest,
            ) -> Result<Vec<Installment>> {
                let extension = self
                    .state
                    .validate(|state| state.check_extendable(goal_id, request.count))?;
                let result = self.gateway.add_installments(goal_id, request) $(.$await_ext)?;
                self.state.settle(result, |state, added| {
                    state.apply_extension(goal_id, extension, &added);
                    added
                })
            }

            // ── Deposit mutations ───────────────────────────────────────

            /// Records a deposit on a free-form goal.
            ///
            /// # Errors
            ///
            /// Returns [`SavingsError::DomainValidation`](crate::error::SavingsError::DomainValidation) without calling
            /// the gateway if the goal is not cached, is not free-form, or
            /// the amount is not in `(0, remaining]`. Otherwise returns the
            /// gateway error.
            #[tracing::instrument(skip(self, request))]
            pub $($async_kw)? fn create_free_form_deposit(
                &self,
                goal_id: GoalId,
                request: &FreeFormDepositRequest,
            ) -> Result<Deposit> {
                self.state
                    .validate(|state| state.check_free_form_deposit(goal_id, request.amount))?;
                let result = self
                    .gateway
                    .create_free_form_deposit(goal_id, request) $(.$await_ext)?;
                self.state.settle(result, |state, deposit| {
                    state.record_deposit(goal_id, &deposit);
                    deposit
                })
            }

            /// Deletes a deposit and lowers its goal's current amount by
            /// the deposited amount when the deposit is cached.
            ///
            /// # Errors
            ///
            /// Returns the gateway error; the cache is unchanged.
            #[tracing::instrument(skip(self))]
            pub $($async_kw)? fn delete_deposit(&self, deposit_id: DepositId) -> Result<()> {
                let result = self.gateway.delete_deposit(deposit_id) $(.$await_ext)?;
                self.state
                    .settle(result, |state, ()| state.apply_deposit_deleted(deposit_id))
            }
        }
    };
}

/// Clones borrowed view items.
#[cfg(any(feature = "async", feature = "blocking"))]
fn owned<T: Clone>(items: Vec<&T>) -> Vec<T> {
    items.into_iter().cloned().collect()
}

#[cfg(feature = "async")]
mod async_store {
    //! Async goal store.

    use rust_decimal::Decimal;

    use super::{GoalState, LoadOutcome, StateCell, owned};
    use crate::error::Result;
    use crate::gateway::Gateway;
    use crate::models::{
        AddInstallmentsRequest, CreateGoalRequest, Deposit, DepositId, FreeFormDepositRequest,
        GoalId, GoalStatus, Installment, InstallmentId, PayInstallmentRequest, ProgressionType,
        SavingsGoal, UpdateGoalRequest,
    };

    define_goal_store! {
        store_name: GoalStore,
        gateway_trait: Gateway,
        store_doc: "Goal state cache over an async [`Gateway`].\n\nShare it behind an `Arc`; every method takes `&self` and may be awaited\nconcurrently.\n\n# Example\n\n```rust,no_run\nuse savings_rs::gateway::InMemoryGateway;\nuse savings_rs::store::GoalStore;\n\n# async fn run() -> savings_rs::error::Result<()> {\nlet store = GoalStore::new(InMemoryGateway::new());\nlet _outcome = store.load_goals().await?;\nprintln!(\"{} goals\", store.goals().len());\n# Ok(())\n# }\n```",
        async_kw: async,
        await_kw: await,
    }
}

#[cfg(feature = "blocking")]
mod blocking_store {
    //! Blocking goal store.

    use rust_decimal::Decimal;

    use super::{GoalState, LoadOutcome, StateCell, owned};
    use crate::error::Result;
    use crate::gateway::BlockingGateway;
    use crate::models::{
        AddInstallmentsRequest, CreateGoalRequest, Deposit, DepositId, FreeFormDepositRequest,
        GoalId, GoalStatus, Installment, InstallmentId, PayInstallmentRequest, ProgressionType,
        SavingsGoal, UpdateGoalRequest,
    };

    define_goal_store! {
        store_name: BlockingGoalStore,
        gateway_trait: BlockingGateway,
        store_doc: "Goal state cache over a [`BlockingGateway`].\n\n# Example\n\n```rust\nuse savings_rs::gateway::InMemoryGateway;\nuse savings_rs::store::BlockingGoalStore;\n\nlet store = BlockingGoalStore::new(InMemoryGateway::new());\nassert!(store.load_goals()?.is_applied());\nassert!(store.goals().is_empty());\n# Ok::<(), savings_rs::error::SavingsError>(())\n```",
    }
}

#[cfg(feature = "async")]
pub use async_store::GoalStore;
#[cfg(feature = "blocking")]
pub use blocking_store::BlockingGoalStore;

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::calculator::ProgressionPlan;
    use crate::error::SavingsError;
    use crate::models::{CreateGoalRequest, CurrencyId, GoalId, Installment, ProgressionType};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn fixed_request() -> CreateGoalRequest {
        CreateGoalRequest::planned(
            "Holiday",
            CurrencyId::new(1),
            start(),
            &ProgressionPlan::fixed(dec!(1000), 10),
        )
        .unwrap()
    }

    fn free_form_request(target: rust_decimal::Decimal) -> CreateGoalRequest {
        CreateGoalRequest::free_form("Rainy day", CurrencyId::new(1), start(), target).unwrap()
    }

    fn is_domain_violation<T>(result: &crate::error::Result<T>) -> bool {
        matches!(*result, Err(SavingsError::DomainValidation(_)))
    }

    fn first_pending(installments: &[Installment]) -> &Installment {
        installments.iter().find(|slot| slot.is_pending()).unwrap()
    }

    // ── Blocking tests ──────────────────────────────────────────────────

    #[cfg(feature = "blocking")]
    mod blocking_tests {
        use super::*;
        use crate::gateway::{BlockingGateway, InMemoryGateway};
        use crate::models::{
            AddInstallmentsRequest, FreeFormDepositRequest, GoalStatus, PayInstallmentRequest,
            UpdateGoalRequest,
        };
        use crate::store::{BlockingGoalStore, LoadOutcome};

        fn store() -> BlockingGoalStore<InMemoryGateway> {
            BlockingGoalStore::new(InMemoryGateway::with_seed(7))
        }

        fn goal_id(store: &BlockingGoalStore<InMemoryGateway>) -> GoalId {
            store.selected_goal().unwrap().id.unwrap()
        }

        #[test]
        fn paying_three_fixed_installments() {
            let store = store();
            let _goal = store.create_goal(&fixed_request()).unwrap();
            let id = goal_id(&store);
            assert_eq!(store.load_installments(id).unwrap(), LoadOutcome::Applied);
            assert_eq!(store.load_deposits(id).unwrap(), LoadOutcome::Applied);

            for _ in 0..3 {
                let installments = store.installments();
                let slot = first_pending(&installments);
                let request = PayInstallmentRequest::for_installment(slot);
                let _deposit = store.pay_installment(id, slot.id, &request).unwrap();
            }

            assert_eq!(store.selected_goal_progress(), 30);
            assert_eq!(store.selected_goal_remaining(), dec!(7000));
            assert_eq!(store.paid_installments().len(), 3);
            assert_eq!(store.pending_installments().len(), 7);
            assert_eq!(store.deposits().len(), 3);
            assert_eq!(store.goals().first().unwrap().current_amount, dec!(3000));
            assert!(store.error().is_none());
        }

        #[test]
        fn create_appends_and_selects() {
            let store = store();
            let first = store.create_goal(&fixed_request()).unwrap();
            let second = store
                .create_goal(&free_form_request(dec!(500)))
                .unwrap();
            let ids: Vec<_> = store.goals().iter().map(|goal| goal.id).collect();
            assert_eq!(ids, vec![first.id, second.id]);
            assert_eq!(store.selected_goal().unwrap().id, second.id);
        }

        #[test]
        fn load_goal_by_id_leaves_goal_list_alone() {
            let store = store();
            let created = store.gateway().create_goal(&fixed_request()).unwrap();
            let outcome = store.load_goal_by_id(created.id.unwrap()).unwrap();
            assert!(outcome.is_applied());
            assert!(store.goals().is_empty());
            assert_eq!(store.selected_goal(), Some(created));
        }

        #[test]
        fn failed_load_keeps_state_and_records_error() {
            let store = store();
            let _first = store.create_goal(&fixed_request()).unwrap();
            let _second = store.create_goal(&free_form_request(dec!(100))).unwrap();
            store.gateway().set_offline(true);

            assert!(store.load_goals().is_err());
            assert_eq!(store.goals().len(), 2);
            assert_eq!(
                store.error().as_deref(),
                Some("the savings service is unavailable")
            );

            store.gateway().set_offline(false);
            assert!(store.load_goals().unwrap().is_applied());
            assert!(store.error().is_none());
        }

        #[test]
        fn missing_goal_reports_not_found() {
            let store = store();
            assert!(store.load_goal_by_id(GoalId::new(404)).is_err());
            assert_eq!(store.error().as_deref(), Some("goal 404 was not found"));
            store.clear_error();
            assert!(store.error().is_none());
        }

        #[test]
        fn payment_rules_checked_before_submit() {
            let store = store();
            let _goal = store.create_goal(&fixed_request()).unwrap();
            let id = goal_id(&store);

            // Nothing loaded yet.
            let request = PayInstallmentRequest {
                amount: dec!(1000),
                description: None,
            };
            let unknown = crate::models::InstallmentId::new(999);
            assert!(is_domain_violation(&store.pay_installment(id, unknown, &request)));
            assert!(store.error().unwrap().contains("not loaded"));

            let _outcome = store.load_installments(id).unwrap();
            let installments = store.installments();
            let slot = first_pending(&installments);
            let zero = PayInstallmentRequest::for_installment(slot).amount(dec!(0));
            assert!(is_domain_violation(&store.pay_installment(id, slot.id, &zero)));

            let full = PayInstallmentRequest::for_installment(slot);
            let _deposit = store.pay_installment(id, slot.id, &full).unwrap();
            assert!(is_domain_violation(&store.pay_installment(id, slot.id, &full)));
            assert!(is_domain_violation(&store.skip_installment(id, slot.id)));
            assert!(is_domain_violation(&store.pay_installment(
                GoalId::new(id.into_inner() + 100),
                slot.id,
                &full
            )));
            assert_eq!(store.selected_goal().unwrap().current_amount, dec!(1000));
        }

        #[test]
        fn skipping_leaves_amount_unchanged() {
            let store = store();
            let _goal = store.create_goal(&fixed_request()).unwrap();
            let id = goal_id(&store);
            let _outcome = store.load_installments(id).unwrap();
            let installments = store.installments();
            let slot = first_pending(&installments);

            let skipped = store.skip_installment(id, slot.id).unwrap();
            assert_eq!(skipped.status_id, crate::models::InstallmentStatus::Skipped);
            assert_eq!(store.pending_installments().len(), 9);
            assert_eq!(store.selected_goal().unwrap().current_amount, dec!(0));
        }

        #[test]
        fn adding_installments_grows_schedule_and_target() {
            let store = store();
            let _goal = store.create_goal(&fixed_request()).unwrap();
            let id = goal_id(&store);
            let _outcome = store.load_installments(id).unwrap();

            let added = store
                .add_installments(id, &AddInstallmentsRequest { count: 2 })
                .unwrap();
            assert_eq!(added.len(), 2);
            assert_eq!(store.installments().len(), 12);
            let goal = store.selected_goal().unwrap();
            assert_eq!(goal.number_of_installments, Some(12));
            assert_eq!(goal.target_amount, dec!(12000));
            assert_eq!(store.goals().first().unwrap().target_amount, dec!(12000));
        }

        #[test]
        fn adding_installments_rejected_for_descending_and_free_form() {
            let store = store();
            let request = CreateGoalRequest::planned(
                "Countdown",
                CurrencyId::new(1),
                start(),
                &ProgressionPlan::descending(dec!(100), 4),
            )
            .unwrap();
            let _goal = store.create_goal(&request).unwrap();
            let descending = goal_id(&store);
            let _outcome = store.load_installments(descending).unwrap();

            let result = store.add_installments(descending, &AddInstallmentsRequest { count: 1 });
            assert!(is_domain_violation(&result));
            assert_eq!(store.installments().len(), 4);
            assert_eq!(store.gateway().list_installments(descending).unwrap().len(), 4);
            assert_eq!(store.selected_goal().unwrap().number_of_installments, Some(4));

            let _goal = store.create_goal(&free_form_request(dec!(500))).unwrap();
            let free_form = goal_id(&store);
            let result = store.add_installments(free_form, &AddInstallmentsRequest { count: 1 });
            assert!(is_domain_violation(&result));
            assert!(store.gateway().list_installments(free_form).unwrap().is_empty());
            assert!(store.error().unwrap().contains("cannot be added"));
        }

        #[test]
        fn adding_zero_installments_rejected() {
            let store = store();
            let _goal = store.create_goal(&fixed_request()).unwrap();
            let id = goal_id(&store);
            let none = store.add_installments(id, &AddInstallmentsRequest { count: 0 });
            assert!(is_domain_violation(&none));
            assert_eq!(store.gateway().list_installments(id).unwrap().len(), 10);
        }

        #[test]
        fn failed_payment_leaves_cache_untouched() {
            let store = store();
            let _goal = store.create_goal(&fixed_request()).unwrap();
            let id = goal_id(&store);
            let _installments = store.load_installments(id).unwrap();
            let _deposits = store.load_deposits(id).unwrap();
            let installments = store.installments();
            let slot = first_pending(&installments);
            store.gateway().set_offline(true);

            let request = PayInstallmentRequest::for_installment(slot);
            assert!(store.pay_installment(id, slot.id, &request).is_err());
            assert_eq!(
                store.error().as_deref(),
                Some("the savings service is unavailable")
            );
            let cached = store.installments();
            let same = cached.iter().find(|entry| entry.id == slot.id).unwrap();
            assert!(same.is_pending());
            assert_eq!(store.pending_installments().len(), 10);
            assert_eq!(store.selected_goal().unwrap().current_amount, dec!(0));
            assert_eq!(store.goals().first().unwrap().current_amount, dec!(0));
            assert!(store.deposits().is_empty());
        }

        #[test]
        fn failed_create_leaves_goals_unchanged() {
            let store = store();
            let existing = store.create_goal(&fixed_request()).unwrap();
            store.gateway().set_offline(true);

            assert!(store.create_goal(&free_form_request(dec!(500))).is_err());
            assert_eq!(store.goals().len(), 1);
            assert_eq!(store.selected_goal().unwrap().id, existing.id);
            assert!(store.error().is_some());
        }

        #[test]
        fn failed_free_form_deposit_leaves_cache_untouched() {
            let store = store();
            let _goal = store.create_goal(&free_form_request(dec!(500))).unwrap();
            let id = goal_id(&store);
            let _outcome = store.load_deposits(id).unwrap();
            store.gateway().set_offline(true);

            let request = FreeFormDepositRequest::new(dec!(200));
            assert!(store.create_free_form_deposit(id, &request).is_err());
            assert!(store.deposits().is_empty());
            assert_eq!(store.selected_goal().unwrap().current_amount, dec!(0));
            assert_eq!(store.selected_goal_remaining(), dec!(500));
            assert_eq!(
                store.error().as_deref(),
                Some("the savings service is unavailable")
            );
        }

        #[test]
        fn free_form_deposits_bounded_by_remaining() {
            let store = store();
            let _goal = store.create_goal(&free_form_request(dec!(500))).unwrap();
            let id = goal_id(&store);
            let _outcome = store.load_deposits(id).unwrap();

            let too_much = FreeFormDepositRequest::new(dec!(600));
            assert!(is_domain_violation(
                &store.create_free_form_deposit(id, &too_much)
            ));

            let first = store
                .create_free_form_deposit(id, &FreeFormDepositRequest::new(dec!(200)))
                .unwrap();
            let second = store
                .create_free_form_deposit(id, &FreeFormDepositRequest::new(dec!(300)).description("rest"))
                .unwrap();

            assert_eq!(store.selected_goal_progress(), 100);
            assert_eq!(store.selected_goal_remaining(), dec!(0));
            let newest: Vec<_> = store.sorted_deposits().iter().map(|deposit| deposit.id).collect();
            assert_eq!(newest, vec![second.id, first.id]);

            let over = FreeFormDepositRequest::new(dec!(1));
            assert!(is_domain_violation(&store.create_free_form_deposit(id, &over)));
        }

        #[test]
        fn free_form_deposit_rejected_on_scheduled_goal() {
            let store = store();
            let _goal = store.create_goal(&fixed_request()).unwrap();
            let id = goal_id(&store);
            let request = FreeFormDepositRequest::new(dec!(10));
            assert!(is_domain_violation(&store.create_free_form_deposit(id, &request)));
        }

        #[test]
        fn delete_deposit_subtracts_amount_from_goal() {
            let store = store();
            let _goal = store.create_goal(&free_form_request(dec!(500))).unwrap();
            let id = goal_id(&store);
            let _outcome = store.load_deposits(id).unwrap();
            let deposit = store
                .create_free_form_deposit(id, &FreeFormDepositRequest::new(dec!(120)))
                .unwrap();

            store.delete_deposit(deposit.id).unwrap();
            assert!(store.deposits().is_empty());
            assert_eq!(store.selected_goal().unwrap().current_amount, dec!(0));
            assert_eq!(store.goals().first().unwrap().current_amount, dec!(0));
        }

        #[test]
        fn update_replaces_in_place() {
            let store = store();
            let first = store.create_goal(&fixed_request()).unwrap();
            let _second = store.create_goal(&free_form_request(dec!(100))).unwrap();

            let request = UpdateGoalRequest::from_goal(&first).status(GoalStatus::Paused);
            let updated = store.update_goal(first.id.unwrap(), &request).unwrap();
            assert_eq!(updated.status_id, GoalStatus::Paused);
            assert_eq!(store.goals().first().unwrap().status_id, GoalStatus::Paused);
            // Selection stays on the second goal.
            assert_ne!(store.selected_goal().unwrap().id, first.id);
        }

        #[test]
        fn delete_goal_clears_matching_selection() {
            let store = store();
            let first = store.create_goal(&fixed_request()).unwrap();
            let second = store.create_goal(&fixed_request()).unwrap();
            let second_id = second.id.unwrap();
            let _outcome = store.load_installments(second_id).unwrap();

            store.delete_goal(first.id.unwrap()).unwrap();
            assert_eq!(store.selected_goal().unwrap().id, second.id);
            assert_eq!(store.installments().len(), 10);

            store.delete_goal(second_id).unwrap();
            assert!(store.goals().is_empty());
            assert!(store.selected_goal().is_none());
            assert!(store.installments().is_empty());
        }

        #[test]
        fn selecting_another_goal_drops_its_lists() {
            let store = store();
            let first = store.create_goal(&fixed_request()).unwrap();
            let _second = store.create_goal(&fixed_request()).unwrap();
            let _outcome = store.load_installments(goal_id(&store)).unwrap();
            assert_eq!(store.installments().len(), 10);

            store.select_goal(first);
            assert!(store.installments().is_empty());
            store.clear_selected_goal();
            assert!(store.selected_goal().is_none());
        }

        #[test]
        fn filters_narrow_goal_list() {
            let store = store();
            let first = store.create_goal(&fixed_request()).unwrap();
            let _free = store.create_goal(&free_form_request(dec!(100))).unwrap();
            let request = UpdateGoalRequest::from_goal(&first).status(GoalStatus::Completed);
            let _updated = store.update_goal(first.id.unwrap(), &request).unwrap();

            assert_eq!(store.active_goals().len(), 1);
            assert_eq!(store.completed_goals().len(), 1);

            store.set_status_filter(Some(GoalStatus::Active));
            store.set_progression_type_filter(Some(ProgressionType::Fixed));
            assert!(store.filtered_goals().is_empty());
            assert_eq!(store.filter_status(), Some(GoalStatus::Active));

            store.set_status_filter(None);
            assert_eq!(store.filtered_goals().len(), 1);
            store.clear_filters();
            assert_eq!(store.filter_progression_type(), None);
            assert_eq!(store.filtered_goals().len(), 2);
        }

        #[test]
        fn clear_all_resets_everything() {
            let store = store();
            let _goal = store.create_goal(&fixed_request()).unwrap();
            store.set_status_filter(Some(GoalStatus::Paused));
            store.clear_all();

            let snapshot = store.snapshot();
            assert!(snapshot.goals().is_empty());
            assert!(snapshot.selected_goal().is_none());
            assert!(snapshot.filter_status().is_none());
            // The backend still has the goal.
            assert!(store.load_goals().unwrap().is_applied());
            assert_eq!(store.goals().len(), 1);
        }
    }

    // ── Async tests ─────────────────────────────────────────────────────

    #[cfg(feature = "async")]
    mod async_tests {
        use core::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        use tokio::sync::Notify;

        use super::*;
        use crate::error::Result;
        use crate::gateway::{Gateway, InMemoryGateway};
        use crate::models::{
            AddInstallmentsRequest, Deposit, DepositId, FreeFormDepositRequest, InstallmentId,
            InstallmentStatus, PayInstallmentRequest, SavingsGoal, UpdateGoalRequest,
        };
        use crate::store::{GoalStore, LoadOutcome};

        /// Backend whose installment listing can be parked after it has
        /// read its data.
        #[derive(Debug, Default)]
        struct ParkedGateway {
            /// Real backend.
            inner: InMemoryGateway,
            /// Parks the next installment listing.
            park: AtomicBool,
            /// Signalled once a listing is parked.
            parked: Notify,
            /// Releases the parked listing.
            resume: Notify,
        }

        impl Gateway for ParkedGateway {
            async fn list_goals(&self) -> Result<Vec<SavingsGoal>> {
                self.inner.list_goals().await
            }

            async fn get_goal(&self, id: GoalId) -> Result<SavingsGoal> {
                self.inner.get_goal(id).await
            }

            async fn create_goal(&self, request: &CreateGoalRequest) -> Result<SavingsGoal> {
                self.inner.create_goal(request).await
            }

            async fn update_goal(
                &self,
                id: GoalId,
                request: &UpdateGoalRequest,
            ) -> Result<SavingsGoal> {
                self.inner.update_goal(id, request).await
            }

            async fn delete_goal(&self, id: GoalId) -> Result<()> {
                self.inner.delete_goal(id).await
            }

            async fn list_installments(&self, goal_id: GoalId) -> Result<Vec<Installment>> {
                let result = self.inner.list_installments(goal_id).await;
                if self.park.swap(false, Ordering::SeqCst) {
                    self.parked.notify_one();
                    self.resume.notified().await;
                }
                result
            }

            async fn pay_installment(
                &self,
                goal_id: GoalId,
                installment_id: InstallmentId,
                request: &PayInstallmentRequest,
            ) -> Result<Deposit> {
                self.inner
                    .pay_installment(goal_id, installment_id, request)
                    .await
            }

            async fn skip_installment(
                &self,
                goal_id: GoalId,
                installment_id: InstallmentId,
            ) -> Result<Installment> {
                self.inner.skip_installment(goal_id, installment_id).await
            }

            async fn add_installments(
                &self,
                goal_id: GoalId,
                request: &AddInstallmentsRequest,
            ) -> Result<Vec<Installment>> {
                self.inner.add_installments(goal_id, request).await
            }

            async fn list_deposits(&self, goal_id: GoalId) -> Result<Vec<Deposit>> {
                self.inner.list_deposits(goal_id).await
            }

            async fn create_free_form_deposit(
                &self,
                goal_id: GoalId,
                request: &FreeFormDepositRequest,
            ) -> Result<Deposit> {
                self.inner.create_free_form_deposit(goal_id, request).await
            }

            async fn delete_deposit(&self, deposit_id: DepositId) -> Result<()> {
                self.inner.delete_deposit(deposit_id).await
            }
        }

        #[tokio::test]
        async fn async_store_pays_installment() {
            let store = GoalStore::new(InMemoryGateway::with_seed(3));
            let goal = store.create_goal(&fixed_request()).await.unwrap();
            let id = goal.id.unwrap();
            assert!(store.load_installments(id).await.unwrap().is_applied());

            let installments = store.installments();
            let slot = first_pending(&installments);
            let request = PayInstallmentRequest::for_installment(slot);
            let deposit = store.pay_installment(id, slot.id, &request).await.unwrap();
            assert_eq!(deposit.installment_id, Some(slot.id));
            assert_eq!(store.selected_goal_progress(), 10);
        }

        #[tokio::test]
        async fn stale_installment_load_loses_to_payment() {
            let store = Arc::new(GoalStore::new(ParkedGateway::default()));
            let goal = store.create_goal(&fixed_request()).await.unwrap();
            let id = goal.id.unwrap();
            let _outcome = store.load_installments(id).await.unwrap();
            let installments = store.installments();
            let slot = first_pending(&installments).clone();

            store.gateway().park.store(true, Ordering::SeqCst);
            let loader = {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.load_installments(id).await })
            };
            store.gateway().parked.notified().await;

            let request = PayInstallmentRequest::for_installment(&slot);
            let _deposit = store.pay_installment(id, slot.id, &request).await.unwrap();
            store.gateway().resume.notify_one();

            let outcome = loader.await.unwrap().unwrap();
            assert_eq!(outcome, LoadOutcome::Discarded);
            let cached = store
                .installments()
                .into_iter()
                .find(|installment| installment.id == slot.id)
                .unwrap();
            assert_eq!(cached.status_id, InstallmentStatus::Paid);
            assert_eq!(store.selected_goal().unwrap().current_amount, dec!(1000));
        }
    }
}
