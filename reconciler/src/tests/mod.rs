pub mod common;

pub mod hooks;
pub mod ledger;
pub mod storage;
