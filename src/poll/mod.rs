//! Poll lifecycle rules: which questions voters may see, how votes land,
//! and the read projections built on top of them.

pub mod admin;
pub mod query;
pub mod visibility;
pub mod vote;
