use std::time::Instant;

pub struct ProgressIndicator {
    total: usize,
    archived: usize,
    failed: usize,
    files: usize,
    start_time: Instant,
}

impl ProgressIndicator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            archived: 0,
            failed: 0,
            files: 0,
            start_time: Instant::now(),
        }
    }

    pub fn start_item(&self, name: &str) {
        if self.total > 1 {
            println!(
                "Extracting: {} ({}/{})",
                name,
                self.archived + self.failed + 1,
                self.total
            );
        }
    }

    /// `files` is the number of archive entries written for the input, zero
    /// when it produced no archive.
    pub fn complete_item(&mut self, files: usize) {
        if files > 0 {
            self.archived += 1;
            self.files += files;
        } else {
            self.failed += 1;
        }
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn finish(&self) {
        let elapsed = self.start_time.elapsed();
        println!("\n{}", "=".repeat(60));
        println!("Summary:");
        println!("  Inputs:    {}", self.total);
        println!("  Archived:  {}", self.archived);
        println!("  No code:   {}", self.failed);
        println!("  Files:     {}", self.files);
        println!("  Duration:  {:.2}s", elapsed.as_secs_f64());
        println!("{}", "=".repeat(60));
    }
}
