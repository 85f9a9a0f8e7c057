//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{
    DEFAULT_BALANCE_TOLERANCE, MONEY_SCALE, is_whole_cents, round_money, within_tolerance,
};
