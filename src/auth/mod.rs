pub mod adapter;
pub mod password;
pub mod services;
pub mod social;
