mod hashing;
pub use self::hashing::*;
