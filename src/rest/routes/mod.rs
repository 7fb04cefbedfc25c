pub mod answers;
pub mod audit;
pub mod health;
