mod data_buffer;
pub use self::data_buffer::*;
