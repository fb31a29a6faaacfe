pub mod customer;
pub mod payment;
pub mod sale;
pub mod sequence;

pub use customer::*;
pub use payment::*;
pub use sale::*;
pub use sequence::*;
