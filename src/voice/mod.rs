/*!
 * Voice cache: content-addressed audio entries plus the fill service that
 * keeps them in sync with a timeline.
 */

pub mod pacer;
pub mod service;
pub mod store;

pub use service::VoiceCache;
pub use store::{VoiceEntry, VoiceStore, voice_key};
