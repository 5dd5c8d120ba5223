//! Image encoding and the pending-completion join point.

use crate::error::Result;
use crate::scene::RawImage;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageEncoder as _;
use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

/// A boxed future returning a `Result`.
///
/// The futures are not self-driving; the exporter polls them when it is
/// finished, so they only need to live on the exporting thread.
pub type EncodeFuture<T> = Pin<Box<dyn Future<Output = Result<T>>>>;

/// Turns raw images into encoded bytes.
pub trait ImageEncoder {
    /// Encode the image. The returned future runs when polled.
    fn encode(&self, image: &RawImage) -> EncodeFuture<Vec<u8>>;

    /// MIME type of the bytes produced by [`encode`](ImageEncoder::encode).
    fn mime_type(&self) -> &'static str {
        "image/png"
    }

    /// File extension for externally written images.
    fn extension(&self) -> &'static str {
        "png"
    }

    /// Encode synchronously into a base64 data URI.
    fn data_uri(&self, image: &RawImage) -> Result<String> {
        let bytes = pollster::block_on(self.encode(image))?;
        Ok(data_uri(self.mime_type(), &bytes))
    }
}

/// PNG encoder backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn encode(&self, image: &RawImage) -> EncodeFuture<Vec<u8>> {
        let image = image.clone();
        Box::pin(async move { encode_png(&image) })
    }
}

/// Encode RGBA pixels as PNG.
pub fn encode_png(raw: &RawImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let cursor = std::io::Cursor::new(&mut bytes);
    let encoder = image::codecs::png::PngEncoder::new(cursor);

    encoder.write_image(
        raw.pixels().as_raw(),
        raw.width(),
        raw.height(),
        image::ExtendedColorType::Rgba8,
    )?;

    Ok(bytes)
}

/// Build a base64 data URI.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Poll every future until all have resolved, round-robin.
///
/// Results come back in completion order. The first failure aborts the join
/// and drops the remaining futures.
pub async fn join_all<T>(futures: Vec<EncodeFuture<T>>) -> Result<Vec<T>> {
    let mut slots: Vec<Option<EncodeFuture<T>>> = futures.into_iter().map(Some).collect();
    let mut done = Vec::with_capacity(slots.len());

    std::future::poll_fn(move |cx| {
        for slot in slots.iter_mut() {
            let Some(future) = slot.as_mut() else {
                continue;
            };
            if let Poll::Ready(result) = future.as_mut().poll(cx) {
                *slot = None;
                match result {
                    Ok(value) => done.push(value),
                    Err(e) => return Poll::Ready(Err(e)),
                }
            }
        }

        if slots.iter().all(Option::is_none) {
            Poll::Ready(Ok(std::mem::take(&mut done)))
        } else {
            Poll::Pending
        }
    })
    .await
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::ExportError;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::task::Context;

    /// Future that stays pending for a number of polls.
    pub struct YieldTimes {
        remaining: usize,
    }

    impl Future for YieldTimes {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.remaining == 0 {
                return Poll::Ready(());
            }
            self.remaining -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    /// Encoder returning fixed bytes per image after a per-image delay,
    /// recording the order in which encodes complete.
    #[derive(Clone, Default)]
    pub struct ScriptedEncoder {
        pub bytes: HashMap<usize, Vec<u8>>,
        pub delays: HashMap<usize, usize>,
        pub completed: Rc<RefCell<Vec<usize>>>,
        pub fail: bool,
    }

    impl ScriptedEncoder {
        pub fn with_image(mut self, image: &RawImage, bytes: Vec<u8>, delay: usize) -> Self {
            self.bytes.insert(image.id(), bytes);
            self.delays.insert(image.id(), delay);
            self
        }
    }

    impl ImageEncoder for ScriptedEncoder {
        fn encode(&self, image: &RawImage) -> EncodeFuture<Vec<u8>> {
            let id = image.id();
            let bytes = self.bytes.get(&id).cloned().unwrap_or_else(|| vec![1, 2, 3]);
            let remaining = self.delays.get(&id).copied().unwrap_or(0);
            let completed = Rc::clone(&self.completed);
            let fail = self.fail;
            Box::pin(async move {
                YieldTimes { remaining }.await;
                if fail {
                    return Err(ExportError::Encode("scripted failure".to_string()));
                }
                completed.borrow_mut().push(id);
                Ok(bytes)
            })
        }
    }
}
