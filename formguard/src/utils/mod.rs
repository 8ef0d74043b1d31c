pub mod css;

pub use css::css;
