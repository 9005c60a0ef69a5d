//! Minimal TAP (Test Anything Protocol) writer for the conformance runner.

pub struct Tap {
    count: usize,
    failures: usize,
}

impl Tap {
    pub fn new() -> Self {
        println!("TAP version 13");
        Tap {
            count: 0,
            failures: 0,
        }
    }

    pub fn ok(&mut self, name: impl AsRef<str>) {
        self.count += 1;
        println!("ok {} - {}", self.count, name.as_ref());
    }

    /// Record a failure; every line of `detail` is printed as a diagnostic.
    pub fn not_ok(&mut self, name: impl AsRef<str>, detail: impl AsRef<str>) {
        self.count += 1;
        self.failures += 1;
        println!("not ok {} - {}", self.count, name.as_ref());
        for line in detail.as_ref().lines() {
            println!("  # {}", line);
        }
    }

    pub fn failure_count(&self) -> usize {
        self.failures
    }

    pub fn finish(self) {
        println!("1..{}", self.count);
        println!(
            "# {} passed, {} failed",
            self.count - self.failures,
            self.failures
        );
    }
}
