//! different utility modules used throughout the project
/// tiny module to switch on log output, to console or console plus file
pub mod logger;
