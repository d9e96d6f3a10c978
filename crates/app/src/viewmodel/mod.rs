//! View models for the text front-end

pub mod chat;
