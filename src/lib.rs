//! Focus timer for the terminal. Time what you work on, save it as a session, and see how much
//! you did today, this week, this month and this year.
//!

pub mod account;
pub mod cli;
pub mod config;
pub mod statistics;
pub mod storage;
pub mod timer;
pub mod utils;
pub mod view;
