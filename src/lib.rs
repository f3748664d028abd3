pub mod catalog;
pub mod commands;
pub mod config;
pub mod constants;
pub mod db;
pub mod entity;
pub mod lineage;
pub mod metadata;
