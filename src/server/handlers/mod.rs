pub mod capture;
pub mod database;
pub mod health;
pub mod history;
pub mod query;
pub mod ui;
