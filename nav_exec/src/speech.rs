//! # Speech
//!
//! Alerts are spoken through a [`SpeechSink`]. The sink is created once at start up and lives for
//! the whole run, so an announcement is a cheap write rather than an engine start up.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
#[cfg(feature = "espeak")]
use log::warn;

#[cfg(feature = "espeak")]
use std::{
    io::Write,
    process::{Child, ChildStdin, Command, Stdio},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Speech sink which only writes announcements to the log.
#[derive(Debug, Default)]
pub struct LogSpeech {
    /// Every announcement made so far
    pub history: Vec<String>,
}

/// Speech sink which feeds announcements to a long-running espeak process, one per line.
#[cfg(feature = "espeak")]
pub struct EspeakSpeech {
    child: Child,
    stdin: Option<ChildStdin>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Could not start the speech engine \"{0}\": {1}")]
    SpawnError(String, std::io::Error),

    #[error("Could not send the announcement to the speech engine: {0}")]
    WriteError(std::io::Error),

    #[error("The speech engine has exited")]
    EngineExited,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait SpeechSink {
    /// Queue a sentence to be spoken. This shall not block until the sentence has been spoken.
    fn announce(&mut self, text: &str) -> Result<(), SpeechError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SpeechSink for LogSpeech {
    fn announce(&mut self, text: &str) -> Result<(), SpeechError> {
        info!("[SPEECH] {}", text);
        self.history.push(text.to_string());
        Ok(())
    }
}

#[cfg(feature = "espeak")]
impl EspeakSpeech {
    /// Start the speech engine, e.g. `espeak`, reading sentences from its stdin.
    pub fn new(command: &str, voice: &str) -> Result<Self, SpeechError> {
        let mut child = Command::new(command)
            .arg("--stdin")
            .arg("-v")
            .arg(voice)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| SpeechError::SpawnError(command.to_string(), e))?;

        let stdin = child.stdin.take();

        info!("Speech engine \"{}\" started with voice {}", command, voice);

        Ok(Self { child, stdin })
    }
}

#[cfg(feature = "espeak")]
impl SpeechSink for EspeakSpeech {
    fn announce(&mut self, text: &str) -> Result<(), SpeechError> {
        if let Ok(Some(status)) = self.child.try_wait() {
            warn!("Speech engine exited with {}", status);
            self.stdin = None;
        }

        let stdin = self.stdin.as_mut().ok_or(SpeechError::EngineExited)?;

        // Newlines in the text would split it into separate utterances
        writeln!(stdin, "{}", text.replace('\n', " ")).map_err(SpeechError::WriteError)?;
        stdin.flush().map_err(SpeechError::WriteError)
    }
}

#[cfg(feature = "espeak")]
impl Drop for EspeakSpeech {
    fn drop(&mut self) {
        // Closing stdin lets the engine finish the queue and exit
        self.stdin = None;

        if let Err(e) = self.child.wait() {
            warn!("Could not wait for the speech engine to exit: {}", e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
