//! Request gates. `access` authenticates, `admin` authorizes; compose
//! `admin` inside `access`.
pub mod access;
pub mod admin;
