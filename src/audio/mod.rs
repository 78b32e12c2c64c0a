// Audio playback module
// Symphonia decoding, rubato resampling and cpal output for recorded sessions

pub mod decoder;
pub mod loader;
#[cfg(feature = "native-audio")]
pub mod output;
pub mod player;
pub mod resampler;

pub use loader::NativeAudioLoader;
#[cfg(feature = "native-audio")]
pub use output::{cpal_sink_factory, output_available};
pub use player::{NativeAudioChannel, PcmSink, SinkFactory};
