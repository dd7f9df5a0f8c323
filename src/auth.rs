//! Identity primitives shared by the acquisition chain.

pub mod resource;
pub use resource::*;

pub mod secret;
pub use secret::*;

pub mod token;
pub use token::*;
