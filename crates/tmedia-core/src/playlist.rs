// crates/tmedia-core/src/playlist.rs
//
// Deterministic traversal over a list of media paths under shuffle/loop
// semantics. Modeled on the `Queue<T>` found in the sibling `amuseing`
// players, but keeps entries and play order as two separate vectors — a
// `play_order` permutation of `0..entries.len()` — because callers need to
// inspect and restore that permutation directly (e.g. to display "up next"
// in original import order even while shuffled).

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::thread_rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    NoLoop,
    Repeat,
    RepeatOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCmd {
    Skip,
    Next,
    Rewind,
}

#[derive(Debug, Clone)]
pub struct Playlist {
    entries: Vec<PathBuf>,
    /// Permutation of `0..entries.len()`; `entries[play_order[i]]` is the
    /// i-th file in play order.
    play_order: Vec<usize>,
    qi: usize,
    loop_mode: LoopMode,
    shuffled: bool,
}

impl Playlist {
    pub fn new(entries: Vec<PathBuf>, loop_mode: LoopMode) -> Self {
        let play_order = (0..entries.len()).collect();
        Self { entries, play_order, qi: 0, loop_mode, shuffled: false }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), LoopMode::NoLoop)
    }

    /// Builds a playlist from a non-recursive directory listing, sorted by
    /// file name, keeping only entries for which `is_playable` returns true.
    /// Convenience supplementing the spec's bare `entries: Vec<PathBuf>`
    /// construction with the original tmedia's directory-argument behavior.
    pub fn from_dir(dir: &Path, loop_mode: LoopMode, is_playable: impl Fn(&Path) -> bool) -> std::io::Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_playable(p))
            .collect();
        files.sort();
        Ok(Self::new(files, loop_mode))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    pub fn shuffled(&self) -> bool {
        self.shuffled
    }

    /// Index into `entries` of the current file, or `None` if empty.
    pub fn index(&self) -> Option<usize> {
        if self.entries.is_empty() { None } else { Some(self.play_order[self.qi]) }
    }

    pub fn current(&self) -> Option<&Path> {
        self.index().map(|i| self.entries[i].as_path())
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn play_order(&self) -> &[usize] {
        &self.play_order
    }

    /// Appends `p`. Preserves the shuffle invariant by appending the new
    /// index at the end of `play_order` rather than at a random position —
    /// callers that want the new entry genuinely randomized must call
    /// `shuffle` again afterward.
    pub fn push_back(&mut self, p: PathBuf) {
        let new_idx = self.entries.len();
        self.entries.push(p);
        self.play_order.push(new_idx);
    }

    /// Removes the entry at `entries[i]`.
    pub fn remove(&mut self, i: usize) {
        assert!(i < self.entries.len());
        self.entries.remove(i);

        let pos = self.play_order.iter().position(|&e| e == i).expect("play_order missing entry");
        self.play_order.remove(pos);
        for e in self.play_order.iter_mut() {
            if *e > i {
                *e -= 1;
            }
        }
        if pos < self.qi {
            self.qi -= 1;
        } else if pos == self.qi && self.qi >= self.play_order.len() && !self.play_order.is_empty() {
            self.qi = self.play_order.len() - 1;
        }
    }

    /// Randomly permutes `play_order`. If `keep_current_first`, the entry
    /// that was current before shuffling is moved to position 0 and `qi`
    /// is reset to 0, so playback continues on the same file.
    pub fn shuffle(&mut self, keep_current_first: bool) {
        if self.entries.is_empty() {
            self.shuffled = true;
            return;
        }
        let current_entry = self.index();
        self.play_order.shuffle(&mut thread_rng());
        self.shuffled = true;

        if keep_current_first {
            if let Some(entry) = current_entry {
                let pos = self.play_order.iter().position(|&e| e == entry).unwrap();
                self.play_order.swap(0, pos);
                self.qi = 0;
            }
        }
    }

    /// Restores identity order; `qi` is recomputed so the current entry is
    /// still current.
    pub fn unshuffle(&mut self) {
        let current_entry = self.index();
        self.play_order = (0..self.entries.len()).collect();
        self.shuffled = false;
        if let Some(entry) = current_entry {
            self.qi = entry;
        }
    }

    pub fn can_move(&self, cmd: MoveCmd) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let n = self.entries.len();
        match (self.loop_mode, cmd) {
            (LoopMode::RepeatOne, _) => true,
            (LoopMode::NoLoop, MoveCmd::Skip) | (LoopMode::NoLoop, MoveCmd::Next) => self.qi + 1 < n,
            (LoopMode::NoLoop, MoveCmd::Rewind) => true, // stays in place if at 0
            (LoopMode::Repeat, _) => true,
        }
    }

    /// Advances the cursor per spec.md's move table. See the RepeatOne+Skip
    /// decision recorded in DESIGN.md: skipping out of RepeatOne first
    /// demotes `loop_mode` to `Repeat`, then performs the Repeat move.
    pub fn move_cursor(&mut self, cmd: MoveCmd) {
        if self.entries.is_empty() {
            return;
        }
        let n = self.entries.len();

        if self.loop_mode == LoopMode::RepeatOne {
            match cmd {
                MoveCmd::Next | MoveCmd::Rewind => return, // stay
                MoveCmd::Skip => {
                    self.loop_mode = LoopMode::Repeat;
                    self.qi = (self.qi + 1) % n;
                    return;
                }
            }
        }

        match (self.loop_mode, cmd) {
            (LoopMode::NoLoop, MoveCmd::Skip) | (LoopMode::NoLoop, MoveCmd::Next) => {
                if self.qi + 1 < n {
                    self.qi += 1;
                }
            }
            (LoopMode::NoLoop, MoveCmd::Rewind) => {
                if self.qi > 0 {
                    self.qi -= 1;
                }
            }
            (LoopMode::Repeat, MoveCmd::Skip) | (LoopMode::Repeat, MoveCmd::Next) => {
                self.qi = (self.qi + 1) % n;
            }
            (LoopMode::Repeat, MoveCmd::Rewind) => {
                self.qi = (self.qi + n - 1) % n;
            }
            (LoopMode::RepeatOne, _) => unreachable!("handled above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pl(names: &[&str], mode: LoopMode) -> Playlist {
        Playlist::new(names.iter().map(PathBuf::from).collect(), mode)
    }

    fn cur(p: &Playlist) -> &str {
        p.current().unwrap().to_str().unwrap()
    }

    #[test]
    fn scenario_s3_no_loop() {
        let mut p = pl(&["A", "B", "C"], LoopMode::NoLoop);
        assert_eq!(cur(&p), "A");
        p.move_cursor(MoveCmd::Skip);
        assert_eq!(cur(&p), "B");
        p.move_cursor(MoveCmd::Skip);
        assert_eq!(cur(&p), "C");
        assert!(!p.can_move(MoveCmd::Skip));
        p.move_cursor(MoveCmd::Rewind);
        assert_eq!(cur(&p), "B");
    }

    #[test]
    fn scenario_s4_repeat_wraps() {
        let mut p = pl(&["A", "B", "C"], LoopMode::Repeat);
        p.move_cursor(MoveCmd::Skip);
        p.move_cursor(MoveCmd::Skip);
        assert_eq!(cur(&p), "C");
        p.move_cursor(MoveCmd::Skip);
        assert_eq!(cur(&p), "A");
    }

    #[test]
    fn repeat_one_stays_then_demotes_on_skip() {
        let mut p = pl(&["A", "B", "C"], LoopMode::RepeatOne);
        p.move_cursor(MoveCmd::Next);
        assert_eq!(cur(&p), "A");
        p.move_cursor(MoveCmd::Rewind);
        assert_eq!(cur(&p), "A");
        p.move_cursor(MoveCmd::Skip);
        assert_eq!(cur(&p), "B");
        assert_eq!(p.loop_mode(), LoopMode::Repeat);
    }

    #[test]
    fn play_order_stays_a_permutation_after_shuffle_and_moves() {
        let mut p = pl(&["A", "B", "C", "D"], LoopMode::Repeat);
        p.shuffle(false);
        p.move_cursor(MoveCmd::Skip);
        p.move_cursor(MoveCmd::Rewind);
        p.unshuffle();
        let mut sorted = p.play_order().to_vec();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }

    #[test]
    fn shuffle_keep_current_first_preserves_current_entry() {
        let mut p = pl(&["A", "B", "C", "D"], LoopMode::NoLoop);
        p.move_cursor(MoveCmd::Skip); // now at B
        let before = cur(&p).to_string();
        p.shuffle(true);
        assert_eq!(cur(&p), before);
        assert_eq!(p.index(), Some(1));
    }

    #[test]
    fn remove_before_cursor_shifts_cursor_back() {
        let mut p = pl(&["A", "B", "C"], LoopMode::NoLoop);
        p.move_cursor(MoveCmd::Skip); // at B
        p.remove(0); // remove A
        assert_eq!(cur(&p), "B");
    }

    #[test]
    fn move_guarantee_changes_entry_unless_single_or_repeat_one() {
        let mut p = pl(&["A", "B"], LoopMode::Repeat);
        let before = cur(&p).to_string();
        p.move_cursor(MoveCmd::Skip);
        assert_ne!(cur(&p), before);
    }
}
