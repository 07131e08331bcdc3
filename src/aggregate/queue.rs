//! Queue of synthetic pages waiting to be rendered.

use std::sync::Arc;

use parking_lot::Mutex;

use super::BuildId;
use crate::content::{DocumentPath, DocumentRecord, Metadata};
use crate::render::Values;

/// A virtual page scheduled by the pagination planner.
#[derive(Debug, Clone)]
pub struct SyntheticRenderRequest {
    /// Copied from the page that started the series
    pub content: Arc<str>,
    pub path: DocumentPath,
    pub metadata: Metadata,
    /// Seeds passed down as ancestor values when the page is rendered
    pub values: Values,
    pub build_id: BuildId,
}

impl SyntheticRenderRequest {
    /// The document this request renders as.
    pub fn to_document(&self) -> DocumentRecord {
        DocumentRecord {
            content: Arc::clone(&self.content),
            path: self.path.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Append-only queue, safe to fill from many render threads at once.
#[derive(Debug, Default)]
pub struct RenderQueue {
    pending: Mutex<Vec<SyntheticRenderRequest>>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, request: SyntheticRenderRequest) {
        self.pending.lock().push(request);
    }

    /// Take every pending request, in enqueue order.
    pub fn drain(&self) -> Vec<SyntheticRenderRequest> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(pathname: &str) -> SyntheticRenderRequest {
        SyntheticRenderRequest {
            content: Arc::from("<html></html>"),
            path: DocumentPath::new(pathname),
            metadata: Metadata::new(),
            values: Values::new(),
            build_id: BuildId::next(),
        }
    }

    #[test]
    fn test_drain_empties_queue() {
        let queue = RenderQueue::new();
        queue.enqueue(request("/page/2.html"));
        queue.enqueue(request("/page/3.html"));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        let paths: Vec<_> = drained.iter().map(|r| r.path.pathname.as_str()).collect();
        assert_eq!(paths, ["/page/2.html", "/page/3.html"]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_concurrent_enqueue() {
        let queue = RenderQueue::new();
        std::thread::scope(|s| {
            for i in 0..8 {
                let queue = &queue;
                s.spawn(move || queue.enqueue(request(&format!("/page/{i}.html"))));
            }
        });
        assert_eq!(queue.len(), 8);
    }

    #[test]
    fn test_to_document_shares_content() {
        let req = request("/blog/page/2.html");
        let doc = req.to_document();
        assert!(Arc::ptr_eq(&doc.content, &req.content));
        assert_eq!(doc.path.dirname, "/blog/page");
    }
}
