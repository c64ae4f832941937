// crates/tmedia-core/tests/playlist_properties.rs
//
// Cross-module property check: after any sequence of shuffle/unshuffle/move
// with no insert/remove, play_order remains a permutation of 0..n.

use std::path::PathBuf;
use tmedia_core::playlist::{LoopMode, MoveCmd, Playlist};

fn is_permutation(order: &[usize], n: usize) -> bool {
    let mut seen = vec![false; n];
    for &i in order {
        if i >= n || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    seen.iter().all(|&s| s)
}

#[test]
fn play_order_is_always_a_permutation() {
    let n = 7;
    let entries: Vec<PathBuf> = (0..n).map(|i| PathBuf::from(format!("f{i}"))).collect();
    let mut p = Playlist::new(entries, LoopMode::Repeat);

    let ops = [
        MoveCmd::Skip,
        MoveCmd::Skip,
        MoveCmd::Rewind,
        MoveCmd::Next,
        MoveCmd::Skip,
        MoveCmd::Rewind,
        MoveCmd::Rewind,
    ];

    for (i, &op) in ops.iter().enumerate() {
        if i % 3 == 0 {
            p.shuffle(i % 2 == 0);
        }
        if i % 4 == 0 {
            p.unshuffle();
        }
        p.move_cursor(op);
        assert!(is_permutation(p.play_order(), n), "not a permutation after step {i}");
    }
}

#[test]
fn ring_buffer_time_contract_matches_rational_arithmetic() {
    use tmedia_core::audio::AudioRingBuffer;
    let mut rb = AudioRingBuffer::new(16, 2, 44100, 3.5);
    let data: Vec<f32> = (0..20).map(|i| i as f32).collect();
    rb.write_into(10, &data);
    let mut out = [0.0f32; 8];
    rb.read_into(4, &mut out);
    let expected = 3.5 + 4.0 / 44100.0;
    assert!((rb.current_time() - expected).abs() < 1e-12);
}
