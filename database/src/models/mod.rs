// Database row types

pub mod account;

pub use account::AccountRow;
