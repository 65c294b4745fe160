//! Cluster-id and machine-id providers for [`kubeflake`].
//!
//! - [`StatefulSetOrdinal`]: machine id from a Kubernetes StatefulSet pod's
//!   ordinal suffix
//! - [`CloudZoneProvider`]: cluster id from the GCP zone or AWS region the
//!   process runs in, mapped through a static [`ZoneIndex`]
//!
//! ```no_run
//! use kubeflake::{KubeflakeGenerator, Settings};
//! use kubeflake_discovery::{CloudZoneProvider, StatefulSetOrdinal};
//!
//! let settings = Settings::new(CloudZoneProvider::gcp(), StatefulSetOrdinal::new())
//!     .with_cluster_bits(8);
//! let generator = KubeflakeGenerator::new(settings)?;
//! # Ok::<(), kubeflake::Error>(())
//! ```

mod cloud;
mod env;
mod error;
mod statefulset;

pub use crate::cloud::*;
pub use crate::env::EnvLookup;
pub use crate::error::*;
pub use crate::statefulset::*;
