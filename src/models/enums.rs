//! Enumeration types transmitted as numeric ids.

use serde::{Deserialize, Serialize};

use crate::error::SavingsError;

/// Defines an enum that travels as a `u8` id and parses from its
/// lowercase name.
macro_rules! define_id_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $id:literal => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// All variants in id order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the numeric id used on the wire.
            #[inline]
            #[must_use]
            pub const fn id(self) -> u8 {
                match self {
                    $(Self::$variant => $id,)+
                }
            }

            /// Returns the lowercase name.
            #[inline]
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = SavingsError;

            #[inline]
            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($id => Ok(Self::$variant),)+
                    other => Err(SavingsError::InvalidArgument(format!(
                        "unknown {} id {other}",
                        $label
                    ))),
                }
            }
        }

        impl From<$name> for u8 {
            #[inline]
            fn from(value: $name) -> Self {
                value.id()
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $name {
            type Err = SavingsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized: String = s
                    .chars()
                    .filter(|ch| ch.is_ascii_alphanumeric())
                    .map(|ch| ch.to_ascii_lowercase())
                    .collect();
                if let Ok(id) = normalized.parse::<u8>() {
                    return Self::try_from(id);
                }
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str() == normalized)
                    .ok_or_else(|| {
                        SavingsError::InvalidArgument(format!("unknown {} `{s}`", $label))
                    })
            }
        }
    };
}

define_id_enum! {
    /// Rule governing how a goal's target and installment amounts are
    /// derived.
    ProgressionType, "progression type" {
        /// Every installment has the same amount.
        Fixed = 1 => "fixed",
        /// Each installment grows by the increment.
        Ascending = 2 => "ascending",
        /// Each installment shrinks by the increment.
        Descending = 3 => "descending",
        /// Ascending amounts in shuffled order.
        Random = 4 => "random",
        /// No schedule; the target is supplied directly.
        FreeForm = 5 => "freeform",
    }
}

define_id_enum! {
    /// Lifecycle status of a savings goal.
    GoalStatus, "goal status" {
        /// Goal is being funded.
        Active = 1 => "active",
        /// Goal reached its target.
        Completed = 2 => "completed",
        /// Funding is temporarily suspended.
        Paused = 3 => "paused",
        /// Goal was abandoned.
        Cancelled = 4 => "cancelled",
    }
}

define_id_enum! {
    /// Status of a single scheduled installment.
    InstallmentStatus, "installment status" {
        /// Not yet paid or skipped.
        Pending = 1 => "pending",
        /// Paid; a deposit was recorded.
        Paid = 2 => "paid",
        /// Deliberately skipped; no deposit.
        Skipped = 3 => "skipped",
    }
}
