pub use self::{amount::*, network::*, price::*, reward::*};

mod amount;
pub mod constants;
mod network;
mod price;
mod reward;
