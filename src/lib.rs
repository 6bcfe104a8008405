pub mod account;
pub mod api;
pub mod config;
pub mod cross_field;
pub mod diff;
pub mod error;
pub mod form;
pub mod forms;
pub mod http_client;
pub mod match_edit;
pub mod model;
pub mod notice;
pub mod persist;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod team_edit;
pub mod validate;
pub mod worker;
