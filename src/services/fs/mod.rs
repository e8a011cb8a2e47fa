pub mod age;
pub mod detect;
pub mod listing;
pub mod provider;
pub mod tail;
