//! Discovery and typed register access for modules sharing an instrument
//! bus.
//!
//! A [`Bus`] finds the single module of a requested kind, or refuses when
//! the topology is ambiguous, and hands out a [`RegisterAccess`] bound to it.
//! Everything below goes through the [`Transport`] trait, which the physical
//! driver (or [`sim::SimulatedBus`]) implements.

pub mod access;
pub mod bus;
pub mod codec;
pub mod config;
pub mod devices;
pub mod discovery;
pub mod error;
pub mod probe;
pub mod register;
pub mod resolver;
pub mod result;
pub mod sim;
pub mod status;
pub mod tracing;
pub mod transport;

pub use access::{RegisterAccess, RegisterValue};
pub use bus::Bus;
pub use codec::{RawPair, Scale, TypedValue, WireType};
pub use discovery::{AddressRange, TargetSignature};
pub use error::{CommError, DiscoveryError, EncodingError, Error, Result};
pub use probe::DiscoveryConfig;
pub use register::{ModuleBinding, RegisterDescriptor};
pub use transport::{Port, Transport};
