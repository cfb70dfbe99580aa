//! Document model for the user directory: field names, request-body validation and
//! conversions between client JSON, stored BSON and portable JSON.

pub mod errors;
pub mod db;
pub mod document;
pub mod user;
pub mod contact;
pub mod message;
