//! Wiring below the services: connection bootstrap, `DbErr` mapping and the
//! `AppState` builder.

pub mod db;
pub mod db_errors;
pub mod state;
