pub mod app;
pub mod catalog;
pub mod config;
pub mod display;
pub mod pages;
