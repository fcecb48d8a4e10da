use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

/// A synthesized clip served back to the provider for `<Play>`
#[derive(Debug, Clone)]
pub struct StoredClip {
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

/// Bounded clip store; the oldest clip is evicted once `capacity` is reached
#[derive(Debug)]
pub struct ClipStore {
    capacity: usize,
    inner: Mutex<ClipStoreInner>,
}

#[derive(Debug, Default)]
struct ClipStoreInner {
    clips: HashMap<String, StoredClip>,
    order: VecDeque<String>,
}

impl ClipStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(ClipStoreInner::default()),
        }
    }

    /// Store an MP3 clip and return its id
    pub fn insert_mp3(&self, data: Vec<u8>) -> String {
        self.insert(StoredClip {
            content_type: "audio/mpeg",
            data,
        })
    }

    pub fn insert(&self, clip: StoredClip) -> String {
        let id = Uuid::new_v4().to_string();
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        while inner.order.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.clips.remove(&oldest);
            }
        }

        inner.order.push_back(id.clone());
        inner.clips.insert(id.clone(), clip);
        id
    }

    pub fn get(&self, id: &str) -> Option<StoredClip> {
        let inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.clips.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.clips.len(),
            Err(poisoned) => poisoned.into_inner().clips.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_clip_evicted() {
        let store = ClipStore::new(2);
        let a = store.insert_mp3(vec![1]);
        let b = store.insert_mp3(vec![2]);
        let c = store.insert_mp3(vec![3]);

        assert!(store.get(&a).is_none());
        assert_eq!(store.get(&b).unwrap().data, vec![2]);
        assert_eq!(store.get(&c).unwrap().content_type, "audio/mpeg");
        assert_eq!(store.len(), 2);
    }
}
