pub mod audio;
#[cfg(feature = "voice")]
pub mod device;
pub mod pipeline;
pub mod playback;
pub mod speech;
