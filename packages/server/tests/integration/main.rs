mod auth;
mod common;
mod video;
