use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub const DEFAULT_TTS_COMMAND: &str = "espeak";

/// Alerts waiting to be spoken. Further alerts are dropped until one finishes.
const SPEECH_QUEUE: usize = 4;

/// Text-to-speech backend.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, message: &str) -> anyhow::Result<()>;
}

/// Speaks by running an external program with the message as its last
/// argument, e.g. `espeak "Intruder at 60.00 cm.."`.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// `command` is split on whitespace into program and leading arguments.
    pub fn from_command_line(command: &str) -> anyhow::Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_owned);
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("TTS command must not be empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl Speaker for CommandSpeaker {
    async fn speak(&self, message: &str) -> anyhow::Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(message)
            .status()
            .await?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}

pub fn alert_message(distance: f64) -> String {
    format!("Intruder at {:.2} cm..", distance)
}

/// Fire and forget handle to the speech worker.
///
/// Messages are queued on a bounded channel and spoken one after another by a
/// background task, so callers on the frame loop never wait for audio.
#[derive(Clone)]
pub struct SpeechNotifier {
    sender: mpsc::Sender<String>,
}

impl SpeechNotifier {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(speaker: Arc<dyn Speaker>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<String>(SPEECH_QUEUE);
        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                tracing::info!(%message, "Speaking message");
                if let Err(e) = speaker.speak(&message).await {
                    tracing::error!(error = %e, "Failed to speak message");
                }
            }
            tracing::debug!("Speech worker stopped");
        });
        Self { sender }
    }

    pub fn notify(&self, message: impl Into<String>) {
        match self.sender.try_send(message.into()) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                tracing::warn!(%message, "Speech queue is full, dropping message");
            }
            Err(TrySendError::Closed(message)) => {
                tracing::warn!(%message, "Speech worker is gone, dropping message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingSpeaker {
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Speaker for RecordingSpeaker {
        async fn speak(&self, message: &str) -> anyhow::Result<()> {
            self.spoken.lock().await.push(message.to_owned());
            Ok(())
        }
    }

    struct FailingSpeaker;

    #[async_trait]
    impl Speaker for FailingSpeaker {
        async fn speak(&self, _message: &str) -> anyhow::Result<()> {
            anyhow::bail!("no audio device")
        }
    }

    /// Never finishes speaking, so the queue behind it only fills up.
    struct StuckSpeaker;

    #[async_trait]
    impl Speaker for StuckSpeaker {
        async fn speak(&self, _message: &str) -> anyhow::Result<()> {
            std::future::pending().await
        }
    }

    #[test]
    fn alert_message_rounds_to_two_places() {
        assert_eq!(alert_message(60.456), "Intruder at 60.46 cm..");
    }

    #[test]
    fn command_line_is_split_into_program_and_args() {
        let speaker = CommandSpeaker::from_command_line("espeak -s 150").unwrap();
        assert_eq!(speaker.program(), "espeak");
        assert_eq!(speaker.args(), ["-s".to_string(), "150".to_string()]);
        assert!(CommandSpeaker::from_command_line("   ").is_err());
    }

    #[tokio::test]
    async fn notifier_delivers_messages_in_order() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let notifier = SpeechNotifier::spawn(speaker.clone());

        notifier.notify("first");
        notifier.notify("second");

        for _ in 0..100 {
            if speaker.spoken.lock().await.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*speaker.spoken.lock().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failing_speaker_keeps_worker_alive() {
        let notifier = SpeechNotifier::spawn(Arc::new(FailingSpeaker));
        notifier.notify("one");
        notifier.notify("two");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!notifier.sender.is_closed());
    }

    #[tokio::test]
    async fn full_queue_drops_messages_without_blocking() {
        let notifier = SpeechNotifier::spawn(Arc::new(StuckSpeaker));
        for i in 0..SPEECH_QUEUE + 3 {
            notifier.notify(format!("alert {i}"));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(notifier.sender.capacity(), 0);

        notifier.notify("one more");
        assert_eq!(notifier.sender.capacity(), 0);
        assert!(!notifier.sender.is_closed());
    }
}
