pub mod image;
pub mod plan;
pub mod qr_record;
pub mod user;
