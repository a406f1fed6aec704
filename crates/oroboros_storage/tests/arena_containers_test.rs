//! Integration tests for the arena and its containers.

use oroboros_storage::{
    Arena, ArenaArray, ArenaHashMap, ArenaList, ArenaQueue, PtrCache, StorageConfig,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[test]
fn test_alloc_resolve_round_trip_all_sizes() {
    let mut arena = Arena::new(4096);
    let mut live = Vec::new();
    for size in (0..3000).step_by(37) {
        let handle = arena.alloc(size);
        let pattern: Vec<u8> = (0..size).map(|i| (i * 31 + size) as u8).collect();
        arena.bytes_mut(handle).copy_from_slice(&pattern);
        live.push((handle, pattern));
    }
    // Growth added blocks; nothing moved.
    assert!(arena.stats().blocks > 1);
    for (handle, pattern) in &live {
        assert_eq!(arena.bytes(*handle), pattern.as_slice());
        let ptr = arena.resolve(*handle);
        assert_eq!(ptr.as_ptr() as usize % oroboros_storage::memory::ALIGN, 0);
    }
}

#[test]
fn test_scenario_array_resize_clears_only_new_region() {
    let mut arena = Arena::default();
    let mut array = ArenaArray::<u32>::new(&mut arena, 10);
    for i in 0..10 {
        array.set(&mut arena, i, i as u32 * 2);
    }

    array.resize(&mut arena, 20, true);

    let data = array.as_slice(&arena);
    assert_eq!(data.len(), 20);
    assert!((0..10).all(|i| data[i] == i as u32 * 2));
    assert!(data[10..].iter().all(|&v| v == 0));
}

#[test]
fn test_growth_preserves_content_after_free_list_churn() {
    let mut arena = Arena::new(1024);
    // Leave dirty blocks on the free lists.
    for _ in 0..8 {
        let junk = ArenaArray::<u64>::from_slice(&mut arena, &[u64::MAX; 30]);
        junk.free(&mut arena);
    }

    let mut list = ArenaList::<u64>::with_capacity(&mut arena, 1);
    for i in 0..200 {
        list.push(&mut arena, i);
    }
    assert!(list.iter(&arena).eq(0..200));

    let mut array = ArenaArray::<u64>::from_slice(&mut arena, &[1, 2, 3]);
    array.resize(&mut arena, 64, true);
    assert_eq!(&array.as_slice(&arena)[..3], &[1, 2, 3]);
    assert!(array.as_slice(&arena)[3..].iter().all(|&v| v == 0));
}

#[test]
fn test_ptr_cache_tracks_relocation() {
    let mut arena = Arena::new(4096);
    let mut cache = PtrCache::new();
    let mut list = ArenaList::<u32>::with_capacity(&mut arena, 4);
    list.push(&mut arena, 11);

    let first = cache.resolve(&arena, list.handle());
    assert!(cache.is_valid(&arena));

    for i in 0..100 {
        list.push(&mut arena, i);
    }
    assert!(!cache.is_valid(&arena));
    let second = cache.resolve(&arena, list.handle());
    assert_ne!(first, second);
    // SAFETY: the arena is not mutated while `second` is read.
    #[allow(unsafe_code)]
    let head = unsafe { *second.cast::<u32>().as_ptr() };
    assert_eq!(head, 11);
}

#[test]
fn test_stable_scope_slices() {
    let mut arena = Arena::new(4096);
    let array = ArenaArray::<u16>::from_slice(&mut arena, &[5, 6, 7]);
    let mut cache = PtrCache::new();
    let scope = arena.stable();
    let view = scope.slice::<u16>(&mut cache, array.handle(), 3);
    assert_eq!(view, &[5, 6, 7]);
    assert_eq!(scope.version(), arena.version());
}

#[test]
fn test_queue_and_map_under_random_ops() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let config = StorageConfig::default();
    let mut arena = Arena::from_config(&config).unwrap();

    let mut queue = ArenaQueue::<u32>::with_capacity(&mut arena, 2);
    let mut queue_model = std::collections::VecDeque::new();
    let mut map = ArenaHashMap::<u32, u64>::new(&mut arena);
    let mut map_model = std::collections::HashMap::new();

    for step in 0..5_000u32 {
        if rng.gen_bool(0.6) {
            queue.push_back(&mut arena, step);
            queue_model.push_back(step);
        } else {
            assert_eq!(queue.pop_front(&arena), queue_model.pop_front());
        }

        let key = rng.gen_range(0..300);
        match rng.gen_range(0..3) {
            0 => assert_eq!(map.remove(&mut arena, &key), map_model.remove(&key)),
            1 => {
                let updated = map.update(&mut arena, key, |v| *v += 1);
                let model_updated = map_model.get_mut(&key).map(|v| *v += 1).is_some();
                assert_eq!(updated, model_updated);
            }
            _ => {
                let value = u64::from(step);
                assert_eq!(
                    map.insert(&mut arena, key, value),
                    map_model.insert(key, value)
                );
            }
        }
    }

    assert!(queue.iter(&arena).eq(queue_model.iter().copied()));
    assert_eq!(map.len(), map_model.len());
    for (k, v) in map.iter(&arena) {
        assert_eq!(map_model.get(&k), Some(&v));
    }
}

#[test]
fn test_reset_reclaims_everything() {
    let mut arena = Arena::new(512);
    let mut list = ArenaList::<u64>::new(&mut arena);
    for i in 0..500 {
        list.push(&mut arena, i);
    }
    let before = arena.version();
    arena.reset();
    assert!(arena.version() > before);
    let stats = arena.stats();
    assert_eq!(stats.blocks, 1);
    assert_eq!(stats.live_allocations, 0);
}
