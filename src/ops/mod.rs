pub mod check;
pub mod page_ops;
pub mod reducer;
pub mod search;
