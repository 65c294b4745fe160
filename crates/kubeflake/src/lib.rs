//! Cluster-aware 64-bit unique ID generation.
//!
//! A kubeflake ID packs four fields into a `u64`, most significant first:
//! elapsed time since an epoch, a per-tick sequence, a cluster id and a
//! machine id. IDs from one generator are strictly increasing; IDs from
//! generators holding distinct `(cluster, machine)` pairs never collide.
//!
//! ```
//! use kubeflake::{KubeflakeGenerator, Settings, StaticId};
//!
//! let generator = KubeflakeGenerator::new(Settings::new(StaticId(1), StaticId(9))).unwrap();
//! let key = generator.next_key().unwrap();
//! let parts = generator.decompose_key(&key).unwrap();
//! assert_eq!(parts.machine_id, 9);
//! ```
//!
//! ## Features
//! - `parking-lot`: use `parking_lot::Mutex` for the generator state
//! - `cache-padded`: pad the generator state to a cache line
//! - `tracing`: emit `tracing` spans and events
//! - `serde`: `Serialize`/`Deserialize` for [`Parts`] and [`Codec`]

mod error;
mod generator;
mod id;
mod provider;
mod radix;
mod settings;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::provider::*;
pub use crate::radix::*;
pub use crate::settings::*;
pub use crate::time::*;
