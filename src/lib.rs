//! Runtime core of the portfolio site: scroll-driven hero layering and the
//! consent gate in front of analytics.

pub mod analytics;
pub mod clock;
pub mod config;
pub mod consent;
pub mod layout;
pub mod scroll;

#[cfg(test)]
mod testing;
