//! Off-thread WAV encoding
//!
//! Each encode gets its own freshly spawned thread, which owns the sample
//! buffer it was given and exits after sending exactly one reply. Nothing is
//! pooled or reused between calls, and an encode that has started cannot be
//! cancelled: if the caller stops waiting, the worker still runs to the end
//! and its result is dropped.

use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::audio::encoder::encode_wav;
use crate::audio::types::{EncodedAudio, SampleBuffer};
use crate::config::TrimConfig;
use crate::error::{AudioError, Result, WorkerError};

/// A single in-flight WAV encode running on its own thread
///
/// # Example
/// ```
/// use wavetrim_lib::audio::{EncodeWorker, SampleBuffer};
/// use wavetrim_lib::config::TrimConfig;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let audio = SampleBuffer::silent(44100, 2, 4410);
/// let wav = EncodeWorker::spawn(audio, &TrimConfig::default())?.finish().await?;
/// assert_eq!(wav.len(), 44 + 4410 * 2 * 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EncodeWorker {
    inner: Worker<EncodedAudio>,
}

impl EncodeWorker {
    /// Start encoding `audio` on a new thread. Ownership of the buffer moves
    /// to the worker.
    pub fn spawn(audio: SampleBuffer, config: &TrimConfig) -> Result<Self> {
        let frames = audio.frame_count();
        let channels = audio.channel_count();

        let inner = Worker::spawn(
            &config.worker_thread_name,
            config.worker_timeout(),
            move || {
                tracing::debug!(frames, channels, "Worker encoding WAV");
                encode_wav(&audio)
            },
        )?;

        Ok(Self { inner })
    }

    /// Wait for the encoded bytes or the error the encode produced
    pub async fn finish(self) -> Result<EncodedAudio> {
        self.inner.finish().await
    }
}

/// Encode on a single-use worker thread and wait for the result
pub async fn encode_wav_off_thread(audio: SampleBuffer, config: &TrimConfig) -> Result<EncodedAudio> {
    EncodeWorker::spawn(audio, config)?.finish().await
}

/// One job, one thread, one reply
#[derive(Debug)]
struct Worker<T> {
    name: String,
    reply: oneshot::Receiver<Result<T>>,
    timeout: Option<Duration>,
}

impl<T: Send + 'static> Worker<T> {
    fn spawn<F>(name: &str, timeout: Option<Duration>, job: F) -> Result<Self>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let thread_name = name.to_string();

        // The handle is dropped: the thread is detached and exits after its reply
        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let result = job();
                if tx.send(result).is_err() {
                    tracing::debug!(worker = %thread_name, "Caller stopped waiting, result discarded");
                }
            })
            .map_err(|e| {
                tracing::error!(worker = name, error = %e, "Failed to start worker thread");
                WorkerError::Spawn(e)
            })?;

        Ok(Self {
            name: name.to_string(),
            reply: rx,
            timeout,
        })
    }

    async fn finish(self) -> Result<T> {
        let reply = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.reply).await {
                Ok(reply) => reply,
                Err(_) => {
                    tracing::error!(worker = %self.name, ?limit, "Worker did not reply in time");
                    return Err(WorkerError::TimedOut(limit).into());
                }
            },
            None => self.reply.await,
        };

        reply.map_err(|_| {
            tracing::error!(worker = %self.name, "Worker exited without a reply");
            AudioError::from(WorkerError::Terminated)
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_encodes_on_worker() {
        let audio = SampleBuffer::new(8000, vec![vec![1.0, -1.0], vec![0.0, 0.5]]);
        let expected = encode_wav(&audio).unwrap();

        let wav = encode_wav_off_thread(audio, &TrimConfig::default()).await.unwrap();

        assert_eq!(wav, expected);
    }

    #[tokio::test]
    async fn test_encode_error_passes_through() {
        let ragged = SampleBuffer::new(8000, vec![vec![0.0; 3], vec![0.0; 2]]);

        let result = encode_wav_off_thread(ragged, &TrimConfig::default()).await;

        assert!(matches!(result, Err(AudioError::Encode(_))));
    }

    #[tokio::test]
    async fn test_panicking_worker_is_terminated() {
        let worker: Worker<()> = Worker::spawn("panics", None, || panic!("boom")).unwrap();

        let result = worker.finish().await;

        assert!(matches!(result, Err(AudioError::Worker(WorkerError::Terminated))));
    }

    #[tokio::test]
    async fn test_slow_worker_times_out() {
        let limit = Duration::from_millis(20);
        let worker = Worker::spawn("slow", Some(limit), || {
            thread::sleep(Duration::from_millis(500));
            Ok(1u8)
        })
        .unwrap();

        let result = worker.finish().await;

        assert!(matches!(result, Err(AudioError::Worker(WorkerError::TimedOut(d))) if d == limit));
    }

    #[tokio::test]
    async fn test_each_call_gets_its_own_thread() {
        let first = Worker::spawn("one", None, || Ok(thread::current().id())).unwrap();
        let second = Worker::spawn("two", None, || Ok(thread::current().id())).unwrap();

        let a = first.finish().await.unwrap();
        let b = second.finish().await.unwrap();

        assert_ne!(a, b);
        assert_ne!(a, thread::current().id());
    }
}
