pub mod admin;
pub mod enter;
pub mod health;
pub mod leave;

pub use self::health::health;
