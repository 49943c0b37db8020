pub mod keyword;
pub mod serialization;

pub use keyword::{Comment, Keyword, KeywordValue};
pub use serialization::{
    LINE_SEPARATOR, format_exponent_c, format_real, join_lines, write_lines,
};
