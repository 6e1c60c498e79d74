mod audio_track_source;
mod media_source;

pub use audio_track_source::*;
pub use media_source::*;
