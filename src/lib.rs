//! Pixoo Max LED matrix protocol.
//!
//! Turns 32x32 pixel grids into palette-compressed frames and wraps them,
//! along with plain device commands, in the checksummed messages the display
//! accepts over its serial link.

pub mod bitpack;
pub mod canvas;
pub mod config;
pub mod error;
pub mod frame;
pub mod output;
pub mod palette;
pub mod protocol;

pub use canvas::{PixelGrid, Rgb, HEIGHT, WIDTH};
pub use error::{CodecError, CodecResult};
pub use protocol::{encode_animation, encode_brightness, encode_command, encode_static_image};
