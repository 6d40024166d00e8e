use indicatif::{ProgressBar, ProgressStyle};
use zesec_rs::Progress;

const TEMPLATE: &str = "{msg:>10} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

pub struct Bar {
    bar: ProgressBar,
}

impl Bar {
    pub fn new(description: &str) -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar().template(TEMPLATE).map_or_else(|_| ProgressStyle::default_bar(), |style| style.progress_chars("●○ "));

        bar.set_style(style);
        bar.set_message(description.to_owned());

        Self { bar }
    }

    /// Mirrors one engine progress report onto the bar.
    pub fn update(&self, progress: Progress) {
        if self.bar.length() != Some(progress.total) {
            self.bar.set_length(progress.total);
            self.bar.set_message(progress.phase.to_string());
        }
        self.bar.set_position(progress.processed);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}
