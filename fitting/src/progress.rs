use indicatif::{ProgressBar, ProgressStyle};

use crate::error::Result;

/// One tick per epoch.
pub struct FitProgress {
    bar: ProgressBar,
}

impl FitProgress {
    pub fn new(max_epoch: usize) -> Result<Self> {
        let bar = ProgressBar::new(max_epoch as u64);
        bar.set_style(ProgressStyle::default_bar().template(
            "{spinner:.cyan} {pos}/{len} [{wide_bar:.cyan/blue}] {eta_precise} | {msg}",
        )?);
        Ok(Self { bar })
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn update(&self, loss: f64, min_loss: f64) {
        self.bar.set_message(format!("loss: {:.5}, best: {:.5}", loss, min_loss));
        self.bar.inc(1);
    }

    pub fn finish(&self, epochs: usize, min_loss: f64) {
        self.bar.set_message(format!("{} epochs, best: {:.5}", epochs, min_loss));
        self.bar.finish();
    }
}
