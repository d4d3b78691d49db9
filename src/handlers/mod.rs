pub mod employee;
pub mod metric;
