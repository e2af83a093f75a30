//! The badge core: a fixed-capacity pool of badges, their slide animation, the color palette,
//! and the engine that drives the registered provider groups once per tick.

mod anim;
pub use anim::*;

mod engine;
pub use engine::*;

mod palette;
pub use palette::*;

mod pool;
pub use pool::*;
