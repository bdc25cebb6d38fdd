//! Operator implementations.
//!
//! Each operator is a struct wrapping its source plus an observer struct that
//! does the work per subscription. The constructors live on
//! [`ObservableExt`](crate::observable::ObservableExt).

pub mod audit;
pub mod catch_error;
pub mod combine_latest;
pub mod concat;
pub mod debounce;
pub mod delay;
pub mod delay_when;
pub mod distinct;
pub mod exhaust_map;
pub mod expand;
pub mod filter;
pub mod first;
pub mod fork_join;
pub mod group_by;
pub mod last;
pub mod lifecycle;
pub mod map;
pub mod map_err;
pub mod merge;
pub mod merge_map;
pub mod pluck;
pub mod race;
pub mod reduce;
pub mod retry;
pub mod sample;
pub mod scan;
pub mod share;
pub mod skip;
pub mod skip_while;
pub mod switch_map;
pub mod take;
pub mod take_while;
pub mod throttle_time;
pub mod try_map;
pub mod zip;
