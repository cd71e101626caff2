//! Single-threaded reactive primitives.
//!
//! All change propagation in the engine (attribute value → display value →
//! node label, attribute value → validator → node validation result, tree
//! revision → render scheduling) runs through these types. Teardown is
//! structural: an owner drops its [`Subscriptions`] bag and everything it
//! subscribed to stops firing.

mod observable;

#[cfg(test)]
mod observable_tests;

pub use observable::{Observable, Subscription, Subscriptions, combine_into, derive};
