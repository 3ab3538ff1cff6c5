//! Pocket Zoo: tasks, Pomodoro focus sessions and a virtual zoo paid for with
//! the coins they earn.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod notify;
pub mod store;
