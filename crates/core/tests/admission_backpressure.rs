//! Admission queue backpressure tests.
//!
//! Workers are left stopped so the queue fills deterministically.

use std::sync::Arc;

use futures::channel::mpsc;
use futures::{stream, SinkExt, StreamExt};

use mediaferry_core::{
    testing::{
        fixtures::{chunks, payload},
        MockContentStore, MockTranscoder,
    },
    AckMode, AdmissionQueue, ChunkMessage, IngestConfig, IngestService, TransportError,
    UploadStatus,
};

fn paused_service(queue_capacity: usize) -> Arc<IngestService> {
    Arc::new(IngestService::new(
        IngestConfig::default().with_queue_capacity(queue_capacity),
        Arc::new(MockContentStore::new()),
        Arc::new(MockTranscoder::new()),
    ))
}

async fn upload(service: Arc<IngestService>, filename: String, data: Vec<u8>) -> UploadStatus {
    let messages: Vec<Result<ChunkMessage, TransportError>> =
        chunks(&filename, &data, 4096).into_iter().map(Ok).collect();
    let (tx, rx) = mpsc::unbounded();
    let sink = tx.sink_map_err(|e| TransportError::Send(e.to_string()));

    let status = service
        .handle_session(stream::iter(messages), sink, AckMode::PerChunk)
        .await
        .expect("session should not abort");
    let responses: Vec<_> = rx.collect().await;
    assert_eq!(responses.last().map(|r| r.status), Some(status));
    status
}

async fn upload_concurrently(service: &Arc<IngestService>, count: u8) -> Vec<UploadStatus> {
    let tasks: Vec<_> = (0..count)
        .map(|seed| {
            tokio::spawn(upload(
                Arc::clone(service),
                format!("clip{}.mp4", seed),
                payload(seed, 10_000),
            ))
        })
        .collect();

    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }
    statuses
}

fn count(statuses: &[UploadStatus], wanted: UploadStatus) -> usize {
    statuses.iter().filter(|s| **s == wanted).count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_two_with_three_uploads() {
    let service = paused_service(2);
    let statuses = upload_concurrently(&service, 3).await;

    assert_eq!(count(&statuses, UploadStatus::Success), 2);
    assert_eq!(count(&statuses, UploadStatus::QueueFull), 1);
    assert_eq!(service.queue_status().depth, 2);
    // Only the admitted uploads keep a reservation.
    assert_eq!(service.dedup().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_uploads_shed_exactly_overflow() {
    let service = paused_service(5);
    let statuses = upload_concurrently(&service, 20).await;

    assert_eq!(count(&statuses, UploadStatus::Success), 5);
    assert_eq!(count(&statuses, UploadStatus::QueueFull), 15);
    assert_eq!(service.queue_status().depth, 5);
}

#[tokio::test]
async fn test_rejected_content_admitted_once_space_frees() {
    let service = paused_service(1);
    let first = payload(1, 512);
    let second = payload(2, 512);

    assert_eq!(
        upload(Arc::clone(&service), "a.mp4".into(), first).await,
        UploadStatus::Success
    );
    assert_eq!(
        upload(Arc::clone(&service), "b.mp4".into(), second.clone()).await,
        UploadStatus::QueueFull
    );

    // Draining the queue makes room for the previously shed upload.
    service.start().await;
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        service.wait_for_completed(1),
    )
    .await
    .expect("first job should complete");

    assert_eq!(
        upload(Arc::clone(&service), "b.mp4".into(), second).await,
        UploadStatus::Success
    );
    service.shutdown().await;
    assert_eq!(service.catalog().len().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queue_length_bounded_under_contention() {
    let queue = Arc::new(AdmissionQueue::new(3));
    let producers: Vec<_> = (0..8)
        .map(|p| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                for i in 0..100 {
                    let _ = queue.try_enqueue(p * 1000 + i);
                    assert!(queue.len() <= queue.capacity());
                }
            })
        })
        .collect();

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            let mut taken = 0usize;
            while queue.dequeue().await.is_some() {
                taken += 1;
            }
            taken
        })
    };

    for producer in producers {
        producer.await.unwrap();
    }
    assert!(queue.len() <= 3);
    queue.close();
    let taken = consumer.await.unwrap();
    assert!(taken >= 3);
}
