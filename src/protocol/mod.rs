mod animation;
mod command;
mod message;

pub use animation::{build_animation_chunks, ANIMATION_COMMAND, CHUNK_SIZE, MAX_CHUNKS};
pub use command::{
    encode_animation, encode_brightness, encode_command, encode_static_image,
    BRIGHTNESS_COMMAND, CHANNEL_COMMAND, MAX_BRIGHTNESS, STATIC_IMAGE_COMMAND,
    STATIC_IMAGE_PREFIX,
};
pub use message::{build_message, checksum, parse_message, MESSAGE_END, MESSAGE_START};
