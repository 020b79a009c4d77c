pub mod user;
pub mod product;
pub mod order;
pub mod timestamp;

pub use user::*;
pub use product::*;
pub use order::*;
