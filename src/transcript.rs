//! Per-channel chat transcripts.
//!
//! Every inbound line that names a channel is appended, prefixed with its UTC
//! receive time, to `<dir>/<channel>.txt`. Files are opened lazily and
//! written by one background task so the read loop never touches the disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::handshake::channel_name;

enum Record {
    Line { channel: String, line: String },
    Flush(oneshot::Sender<()>),
}

/// Handle to the transcript writer task.
#[derive(Clone)]
pub struct Transcript {
    tx: mpsc::UnboundedSender<Record>,
}

impl Transcript {
    /// Start the writer task for `dir`. The directory is created on first use.
    pub fn spawn(dir: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = TranscriptWriter {
            dir: dir.into(),
            files: HashMap::new(),
            rx,
        };
        tokio::spawn(writer.run());
        Self { tx }
    }

    /// Queue `line` for the transcript of `channel`, stamped with the current time.
    ///
    /// Channels whose name could escape the directory are ignored.
    pub fn record(&self, channel: &str, line: &str) {
        let channel = channel_name(channel);
        if !is_file_safe(&channel) {
            debug!(channel = %channel, "not transcribing channel");
            return;
        }
        let stamped = format!("{} {line}\n", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        let _ = self.tx.send(Record::Line {
            channel,
            line: stamped,
        });
    }

    /// Wait until everything queued so far has been written out.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Record::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

fn is_file_safe(channel: &str) -> bool {
    !channel.is_empty()
        && channel
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

struct TranscriptWriter {
    dir: PathBuf,
    files: HashMap<String, BufWriter<File>>,
    rx: mpsc::UnboundedReceiver<Record>,
}

impl TranscriptWriter {
    async fn run(mut self) {
        info!(dir = %self.dir.display(), "transcript writer started");
        while let Some(record) = self.rx.recv().await {
            match record {
                Record::Line { channel, line } => self.write(channel, &line).await,
                Record::Flush(ack) => {
                    self.flush_all().await;
                    let _ = ack.send(());
                }
            }
        }
        self.flush_all().await;
        debug!("transcript writer stopped");
    }

    async fn write(&mut self, channel: String, line: &str) {
        if !self.files.contains_key(&channel) {
            match open(&self.dir, &channel).await {
                Ok(file) => {
                    self.files.insert(channel.clone(), BufWriter::new(file));
                }
                Err(e) => {
                    warn!(channel = %channel, error = %e, "failed to open transcript");
                    return;
                }
            }
        }
        if let Some(writer) = self.files.get_mut(&channel)
            && let Err(e) = writer.write_all(line.as_bytes()).await
        {
            warn!(channel = %channel, error = %e, "transcript write failed");
        }
    }

    async fn flush_all(&mut self) {
        for (channel, writer) in &mut self.files {
            if let Err(e) = writer.flush().await {
                warn!(channel = %channel, error = %e, "transcript flush failed");
            }
        }
    }
}

async fn open(dir: &Path, channel: &str) -> std::io::Result<File> {
    tokio::fs::create_dir_all(dir).await?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("{channel}.txt")))
        .await
}
