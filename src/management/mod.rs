mod token;

pub use token::TokenCache;
