mod handler;

pub use handler::{generate_dialog, generate_speech, languages, voices, AUDIO_DURATION_HEADER};
