pub mod comment;
pub mod like;
pub mod shared;
pub mod subscription;
pub mod user;
pub mod video;
