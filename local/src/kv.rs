//! Typed values stored under a key in a [`KeyValueStore`].

use coffer_types::{ResourceCoder, ResourceDecoder, ResourceEncoder, ResourceError};

use crate::store::{KeyValueStore, default_store};

/// A typed value stored under a key in a [`KeyValueStore`].
pub trait KeyValueResource {
    type Content;
    type Coder: ResourceCoder<Self::Content> + Default;

    fn coder(&self) -> Self::Coder {
        Self::Coder::default()
    }

    fn key(&self) -> &str;

    fn store(&self) -> &dyn KeyValueStore {
        default_store()
    }

    /// `Ok(None)` when nothing is stored under the key.
    fn read(&self) -> Result<Option<Self::Content>, ResourceError> {
        match self.store().get(self.key())? {
            Some(bytes) => self.coder().decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// `None`, or content the coder encodes to no body, removes the key.
    fn write(&self, content: Option<&Self::Content>) -> Result<(), ResourceError> {
        let encoded = match content {
            Some(content) => self.coder().encode(content)?,
            None => None,
        };
        match encoded {
            Some(bytes) => self.store().set(self.key(), bytes),
            None => self.store().remove(self.key()),
        }
    }

    fn delete(&self) -> Result<(), ResourceError> {
        self.write(None)
    }
}

#[cfg(test)]
mod tests {
    use coffer_types::{EmptyCoder, JsonCoder, StringCoder};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::store::MemoryStore;

    struct Nickname<'a>(&'a MemoryStore);

    impl KeyValueResource for Nickname<'_> {
        type Content = String;
        type Coder = StringCoder;

        fn key(&self) -> &str {
            "nickname"
        }

        fn store(&self) -> &dyn KeyValueStore {
            self.0
        }
    }

    struct Visits<'a>(&'a MemoryStore);

    impl KeyValueResource for Visits<'_> {
        type Content = Vec<u32>;
        type Coder = JsonCoder<Vec<u32>>;

        fn key(&self) -> &str {
            "visits"
        }

        fn store(&self) -> &dyn KeyValueStore {
            self.0
        }
    }

    struct Flag<'a>(&'a MemoryStore);

    impl KeyValueResource for Flag<'_> {
        type Content = ();
        type Coder = EmptyCoder;

        fn key(&self) -> &str {
            "flag"
        }

        fn store(&self) -> &dyn KeyValueStore {
            self.0
        }
    }

    #[test]
    fn missing_key_reads_none() {
        let store = MemoryStore::new();
        assert_eq!(Nickname(&store).read().expect("read"), None);
    }

    #[test]
    fn write_read_delete() {
        let store = MemoryStore::new();
        let nickname = Nickname(&store);

        nickname.write(Some(&"Pickle Rick".to_string())).expect("write");
        assert_eq!(
            nickname.read().expect("read").as_deref(),
            Some("Pickle Rick")
        );

        nickname.delete().expect("delete");
        assert_eq!(nickname.read().expect("read"), None);
    }

    #[test]
    fn json_content() {
        let store = MemoryStore::new();
        let visits = Visits(&store);

        visits.write(Some(&vec![1, 2, 3])).expect("write");

        assert_eq!(visits.read().expect("read"), Some(vec![1, 2, 3]));
        assert_eq!(store.get("visits").expect("raw"), Some(b"[1,2,3]".to_vec()));
    }

    #[test]
    fn no_body_removes_key() {
        let store = MemoryStore::new();
        store.set("flag", vec![1]).expect("seed");

        Flag(&store).write(Some(&())).expect("write");

        assert_eq!(store.get("flag").expect("raw"), None);
    }

    #[test]
    fn decode_failure_surfaces() {
        let store = MemoryStore::new();
        store.set("visits", b"not json".to_vec()).expect("seed");

        let err = Visits(&store).read().expect_err("bad json");
        assert!(matches!(err, ResourceError::JsonDecodingFailed(_)));
    }
}
