pub mod conversion;
pub mod handlers;
pub mod machine;
pub mod persistence;
pub mod projection;
pub mod validation;
