pub mod bucket;
pub mod object;
