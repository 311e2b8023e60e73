//! Filters and paging shared by repositories and services.

mod filter;
mod page;

pub use filter::{Condition, Filter};
pub use page::Page;
