pub mod account;
pub mod category;
pub mod product;

pub use account::{Account, Role};
pub use category::Category;
pub use product::Product;
