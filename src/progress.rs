// src/progress.rs
//
// Per-item progress reporting for multi-asset operations (form analysis,
// export payload fetches). The session drives one of these; the CLI plugs in
// the console reporter, tests use the silent one.

pub trait Progress {
    /// A batch of `total` items is starting.
    fn begin(&mut self, what: &str, total: usize);
    fn item_done(&mut self, label: &str);
    fn item_failed(&mut self, label: &str, why: &str);
    fn finish(&mut self);
}

/// Discards everything.
#[derive(Default)]
pub struct NullProgress;

impl Progress for NullProgress {
    fn begin(&mut self, _what: &str, _total: usize) {}
    fn item_done(&mut self, _label: &str) {}
    fn item_failed(&mut self, _label: &str, _why: &str) {}
    fn finish(&mut self) {}
}

/// Line-per-item console output for the CLI.
#[derive(Default)]
pub struct ConsoleProgress {
    total: usize,
    done: usize,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, what: &str, total: usize) {
        self.total = total;
        self.done = 0;
        eprintln!("{what}: {total} item(s)");
    }

    fn item_done(&mut self, label: &str) {
        self.done += 1;
        eprintln!("  [{}/{}] {label}", self.done, self.total);
    }

    fn item_failed(&mut self, label: &str, why: &str) {
        self.done += 1;
        eprintln!("  [{}/{}] {label}: {why}", self.done, self.total);
    }

    fn finish(&mut self) {
        eprintln!("done.");
    }
}
