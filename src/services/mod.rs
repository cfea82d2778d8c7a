pub mod account_service;
pub mod validation;

pub use account_service::{
    AccountError, AccountService, LoginOutcome, RegisterAccount, UpdateAccount, UpdateOutcome,
};
