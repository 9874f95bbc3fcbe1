pub mod demo;
pub mod error;
pub mod launch;
pub mod mgr;
pub mod module;
pub mod port;
pub mod proto;
pub mod route;

#[cfg(test)]
mod test;
