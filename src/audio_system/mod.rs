//! Audio system module
//!
//! Everything between a role and the speakers:
//! - Decoded buffers, cached per file
//! - One engine session with a global panner strategy
//! - A shared reverb bus
//! - One persistent emitter per role
//!
//! ## Architecture
//!
//! ```text
//! EmitterRegistry
//!   ├── AudioContext ── Box<dyn AudioEngine>  (RodioEngine | HeadlessEngine)
//!   ├── ReverbBus    ── gain, T60 (read live by every send)
//!   ├── BufferCache  ── path → Arc<Buffer>
//!   └── Role → RoleEmitter
//!                └── Box<dyn Voice>
//!                      └── BufferSource → Spatializer → ReverbSendSource
//! ```

pub mod buffer;
pub mod context;
pub mod effects;
pub mod emitter;
pub mod engine;
pub mod headless;
pub mod registry;
pub mod reverb;
pub mod rodio_backend;
pub mod source;

// Re-export commonly used types
pub use buffer::{Buffer, BufferCache};
pub use context::{AudioContext, SessionHandle};
pub use emitter::RoleEmitter;
pub use engine::{AudioEngine, DistanceModel, PannerStrategy, SourceKind, Voice, VoiceSpec};
pub use headless::{HeadlessEngine, HeadlessProbe, VoiceSnapshot};
pub use registry::EmitterRegistry;
pub use reverb::{ReverbBus, ReverbSend};
pub use rodio_backend::RodioEngine;
