pub mod action;
pub mod cascade;
pub mod event;
pub mod session;

#[cfg(test)]
mod fixtures;
