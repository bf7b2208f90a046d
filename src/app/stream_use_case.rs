use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, info_span, Instrument};

use crate::app::outreach_use_case::OutreachWriter;
use crate::app::ports::RecordStore;
use crate::pipeline::processing::CanonicalField;

/// One progress message on the outreach stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    Processing { id: String, message: String },
    Result { id: String, text: String },
    Error { error: String },
    Done,
}

enum Halt {
    /// The consumer went away.
    Closed,
    Failed(String),
}

async fn emit(tx: &mpsc::Sender<ProgressEvent>, event: ProgressEvent) -> Result<(), Halt> {
    tx.send(event).await.map_err(|_| Halt::Closed)
}

async fn process_batch(
    store: &dyn RecordStore,
    writer: &OutreachWriter,
    list_id: &str,
    pause: Duration,
    tx: &mpsc::Sender<ProgressEvent>,
) -> Result<usize, Halt> {
    let records = store
        .get(list_id)
        .await
        .map_err(|e| Halt::Failed(e.to_string()))?;
    info!("Generating outreach text for {} records", records.len());

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(pause).await;
        }
        let company = record
            .display(CanonicalField::CompanyName.id())
            .unwrap_or_else(|| "不明".to_string());
        emit(
            tx,
            ProgressEvent::Processing {
                id: record.id.clone(),
                message: format!("{company}の営業文面を生成中..."),
            },
        )
        .await?;

        let text = writer.write(record).await;
        store
            .attach_text(list_id, &record.id, &text)
            .await
            .map_err(|e| Halt::Failed(e.to_string()))?;

        emit(
            tx,
            ProgressEvent::Result {
                id: record.id.clone(),
                text,
            },
        )
        .await?;
    }
    Ok(records.len())
}

/// Generates text for every record of `list_id`, in order, reporting each
/// step. The stream always ends with `Done` unless the consumer drops it
/// first; a failure mid-batch is reported as `Error` right before `Done`.
/// Text already attached to the store stays attached if the consumer leaves.
pub fn stream_outreach(
    store: Arc<dyn RecordStore>,
    writer: Arc<OutreachWriter>,
    list_id: String,
    pause: Duration,
) -> ReceiverStream<ProgressEvent> {
    let (tx, rx) = mpsc::channel(16);
    let span = info_span!("outreach_stream", list_id = %list_id);

    tokio::spawn(
        async move {
            match process_batch(store.as_ref(), &writer, &list_id, pause, &tx).await {
                Ok(count) => {
                    info!("Stream finished after {} records", count);
                    let _ = tx.send(ProgressEvent::Done).await;
                }
                Err(Halt::Failed(message)) => {
                    error!("Stream aborted: {}", message);
                    let _ = tx.send(ProgressEvent::Error { error: message }).await;
                    let _ = tx.send(ProgressEvent::Done).await;
                }
                Err(Halt::Closed) => info!("Consumer closed the stream early"),
            }
        }
        .instrument(span),
    );

    ReceiverStream::new(rx)
}
