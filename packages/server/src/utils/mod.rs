pub mod cookies;
pub mod hash;
pub mod jwt;
pub mod lookup;
pub mod media;
pub mod probe;
pub mod session;
