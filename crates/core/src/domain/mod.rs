pub mod analysis;
pub mod candidate;
pub mod cart;
pub mod customer;
pub mod notification;
pub mod order;
pub mod product;
