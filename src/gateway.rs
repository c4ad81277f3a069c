//! Persistence gateways backing the goal store.
//!
//! This module defines the [`Gateway`] (async) and [`BlockingGateway`]
//! (blocking) traits via a shared macro, so both variants expose the same
//! twelve operations with the same documentation.

mod memory;

pub use memory::InMemoryGateway;

/// Generates a gateway trait (async or blocking) with every operation.
///
/// Uses `@methods` to define the operation list once, and `@method` to
/// render each one in async (`impl Future + Send`) or blocking (`fn`)
/// style.
macro_rules! define_gateway {
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: async_mode,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_gateway!(@methods async_mode);
        }
    };
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: blocking,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_gateway!(@methods blocking);
        }
    };

    (@methods $mode:ident) => {
        // Goals
        define_gateway!(@method $mode, list_goals,
            "Returns every goal of the current user.\n\n# Errors\n\nReturns an error if the backend cannot be reached or answers with a failure.",
            -> Result<Vec<SavingsGoal>>);
        define_gateway!(@method $mode, get_goal,
            "Returns a single goal.\n\n# Errors\n\nReturns a not-found error if the goal does not exist, or any transport failure.",
            id: GoalId, -> Result<SavingsGoal>);
        define_gateway!(@method $mode, create_goal,
            "Creates a goal and, for scheduled types, its installment batch.\n\n# Errors\n\nReturns an error if the backend rejects the request.",
            request: &CreateGoalRequest, -> Result<SavingsGoal>);
        define_gateway!(@method $mode, update_goal,
            "Replaces the editable fields of a goal.\n\n# Errors\n\nReturns an error if the goal does not exist or the backend rejects the request.",
            id: GoalId, request: &UpdateGoalRequest, -> Result<SavingsGoal>);
        define_gateway!(@method $mode, delete_goal,
            "Deletes a goal with its installments and deposits.\n\n# Errors\n\nReturns an error if the goal does not exist or the backend fails.",
            id: GoalId, -> Result<()>);

        // Installments
        define_gateway!(@method $mode, list_installments,
            "Returns the installment schedule of a goal.\n\n# Errors\n\nReturns an error if the backend cannot be reached or answers with a failure.",
            goal_id: GoalId, -> Result<Vec<Installment>>);
        define_gateway!(@method $mode, pay_installment,
            "Pays a pending installment and returns the recorded deposit.\n\n# Errors\n\nReturns an error if the installment is unknown, not pending, or the backend fails.",
            goal_id: GoalId, installment_id: InstallmentId, request: &PayInstallmentRequest, -> Result<Deposit>);
        define_gateway!(@method $mode, skip_installment,
            "Skips a pending installment and returns it updated.\n\n# Errors\n\nReturns an error if the installment is unknown, not pending, or the backend fails.",
            goal_id: GoalId, installment_id: InstallmentId, -> Result<Installment>);
        define_gateway!(@method $mode, add_installments,
            "Appends installments to a goal's schedule and returns the new ones.\n\n# Errors\n\nReturns an error if the goal's progression type cannot be extended or the backend fails.",
            goal_id: GoalId, request: &AddInstallmentsRequest, -> Result<Vec<Installment>>);

        // Deposits
        define_gateway!(@method $mode, list_deposits,
            "Returns every deposit recorded against a goal.\n\n# Errors\n\nReturns an error if the backend cannot be reached or answers with a failure.",
            goal_id: GoalId, -> Result<Vec<Deposit>>);
        define_gateway!(@method $mode, create_free_form_deposit,
            "Records a free-standing deposit on a free-form goal.\n\n# Errors\n\nReturns an error if the goal is not free-form, the amount exceeds the remaining balance, or the backend fails.",
            goal_id: GoalId, request: &FreeFormDepositRequest, -> Result<Deposit>);
        define_gateway!(@method $mode, delete_deposit,
            "Deletes a deposit.\n\n# Errors\n\nReturns an error if the deposit does not exist or the backend fails.",
            deposit_id: DepositId, -> Result<()>);
    };

    (@method blocking, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*) -> $ret;
    };

    (@method async_mode, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*)
            -> impl core::future::Future<Output = $ret> + Send;
    };
}

#[cfg(feature = "async")]
mod async_gateway {
    //! Async gateway trait definition.

    use crate::error::Result;
    use crate::models::{
        AddInstallmentsRequest, CreateGoalRequest, Deposit, DepositId, FreeFormDepositRequest,
        GoalId, Installment, InstallmentId, PayInstallmentRequest, SavingsGoal,
        UpdateGoalRequest,
    };

    define_gateway! {
        trait_name: Gateway,
        trait_doc: "Async persistence backend for savings goals.\n\nAll methods take `&self`; implementations use interior mutability\nor a shared HTTP client.",
        mode: async_mode,
    }
}

#[cfg(feature = "blocking")]
mod blocking_gateway {
    //! Blocking gateway trait definition.

    use crate::error::Result;
    use crate::models::{
        AddInstallmentsRequest, CreateGoalRequest, Deposit, DepositId, FreeFormDepositRequest,
        GoalId, Installment, InstallmentId, PayInstallmentRequest, SavingsGoal,
        UpdateGoalRequest,
    };

    define_gateway! {
        trait_name: BlockingGateway,
        trait_doc: "Blocking persistence backend for savings goals.\n\nAll methods take `&self`; implementations use interior mutability\nor a shared HTTP client.",
        mode: blocking,
    }
}

#[cfg(feature = "async")]
pub use async_gateway::Gateway;
#[cfg(feature = "blocking")]
pub use blocking_gateway::BlockingGateway;
