pub mod order;
pub mod role;
