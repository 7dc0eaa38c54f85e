pub mod analytics;
pub mod audit;
pub mod config;
pub mod courier;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod storefront;
pub mod validation;
pub mod wilaya;
