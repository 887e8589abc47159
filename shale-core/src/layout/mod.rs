mod attribute;
pub use self::attribute::*;
