//! TCP front end: accepts connections and hands each to the HTTP layer.

pub mod listener;
