//! One guest's capture run.

/// Backend session id plus the photos captured so far, in capture order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    id: Option<String>,
    photos: Vec<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend id, known after the first capture
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn photo_refs(&self) -> &[String] {
        &self.photos
    }

    pub fn photos_taken(&self) -> usize {
        self.photos.len()
    }

    /// Record a capture. The first capture fixes the session id; later ids
    /// that disagree are logged and ignored.
    pub fn record_capture(&mut self, session_id: String, photo_ref: String) {
        match &self.id {
            None => self.id = Some(session_id),
            Some(id) if *id != session_id => {
                log::warn!(
                    "Backend returned session {} for capture in session {}",
                    session_id,
                    id
                );
            }
            Some(_) => {}
        }
        self.photos.push(photo_ref);
    }

    pub fn clear(&mut self) {
        self.id = None;
        self.photos.clear();
    }
}
