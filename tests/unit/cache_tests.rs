/*!
 * Tests for translation stores
 */

use chunkwise::translation::chunk::hash_texts;
use chunkwise::translation::{MemoryStore, SqliteStore, TranslationStore};

use crate::common::{create_temp_dir, texts};

#[test]
fn test_memoryStore_shouldTrackHitsAndMisses() {
    let store = MemoryStore::new();
    let hash = hash_texts("fr", [&texts(&["Hello"])]);

    assert!(store.get(&hash).unwrap().is_none());
    store.put(&hash, &texts(&["Bonjour"])).unwrap();
    assert_eq!(store.get(&hash).unwrap(), Some(texts(&["Bonjour"])));

    let (hits, misses, rate) = store.stats();
    assert_eq!((hits, misses), (1, 1));
    assert!((rate - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_memoryStore_withPutTwice_shouldReplaceEntry() {
    let store = MemoryStore::new();
    store.put(b"key", &texts(&["one"])).unwrap();
    store.put(b"key", &texts(&["two", ""])).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get(b"key").unwrap(), Some(texts(&["two", ""])));
}

#[test]
fn test_sqliteStore_shouldPersistAcrossReopen() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("cache.db");
    let hash = hash_texts("de", [&texts(&["Good", "morning"])]);

    {
        let store = SqliteStore::open(&path).unwrap();
        store.put(&hash, &texts(&["Guten", "Morgen", ""])).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.get(&hash).unwrap(), Some(texts(&["Guten", "Morgen", ""])));
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_sqliteStore_withUnknownHash_shouldMiss() {
    let store = SqliteStore::in_memory().unwrap();
    assert!(store.get(&[0u8; 64]).unwrap().is_none());
}
