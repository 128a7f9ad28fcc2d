//! Client-side query cache for the admin console.
//!
//! Keyed, de-duplicated fetches with stale-while-revalidate, invalidation
//! broadcast, self-polling subscriptions, plus the small async primitives
//! the console's views are built from ([`LatestSlot`], [`Debouncer`]).

pub mod cache;
pub mod debounce;
pub mod error;
pub mod key;
pub mod latest;
pub mod subscription;

pub use cache::{CacheEvent, QueryCache, QueryConfig, QueryState};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use error::QueryError;
pub use key::{Invalidation, QueryKey};
pub use latest::LatestSlot;
pub use subscription::QuerySubscription;
