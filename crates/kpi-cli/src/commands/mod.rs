pub mod admin;
pub mod cell;
pub mod contract;
pub mod contractor;
pub mod rollover;
pub mod view;
