pub mod coordinator;
pub mod merger;
pub mod worker;
