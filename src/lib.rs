pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod models;
pub mod repository;
pub mod routes;
pub mod scheduler;
pub mod service;
pub mod utils;
