//! Buffer collaborator contract and leak-aware decorators.

mod composite;
mod leak_aware;
mod traits;

pub use composite::{track_composite, LeakAwareCompositeBuf};
pub use leak_aware::{track, LeakAwareBuf};
pub use traits::{ByteOrder, RcBuf, RcCompositeBuf};
