//! Hostname resolution for hopgate.
//!
//! A shared, caching resolver backed by
//! [`hickory-resolver`](https://crates.io/crates/hickory-resolver), using
//! either the system configuration or custom UDP/TCP nameservers.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hopgate_dns::{DnsConfig, DnsResolver};
//!
//! # async fn example() -> Result<(), hopgate_dns::DnsError> {
//! let resolver = DnsResolver::new(&DnsConfig::default())?;
//!
//! let candidates = resolver.lookup("example.com").await?;
//! println!("first candidate: {}", candidates[0]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod resolver;

pub use config::{DnsConfig, DnsStrategy};
pub use error::DnsError;
pub use resolver::DnsResolver;
