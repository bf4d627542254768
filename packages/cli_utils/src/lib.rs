#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal helpers for the `eclipse_map` binary.
//!
//! Pipeline stages report through
//! [`eclipse_map_pipeline::progress::ProgressCallback`]; this crate draws
//! those reports as `indicatif` bars and routes `log` output around them.

use std::sync::Arc;
use std::time::Duration;

use eclipse_map_pipeline::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

const TWEETS_SPINNER: &str = "{spinner:.yellow} {msg}";
const TWEETS_TEMPLATE: &str = "  {msg} {wide_bar:.yellow/dim} {pos}/{len} tweets [{eta}]";
const STEPS_TEMPLATE: &str = "{msg} {wide_bar:.green/dim} {pos}/{len} stages [{elapsed_precise}]";

/// Progress bar for one pipeline stage.
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Applied by `set_total`; a tweets bar spins until the count is known.
    sized_style: ProgressStyle,
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

impl IndicatifProgress {
    /// Bar counting tweets through geocoding and county extraction.
    #[must_use]
    pub fn tweets_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template(TWEETS_SPINNER)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        Arc::new(Self {
            bar,
            sized_style: bar_style(TWEETS_TEMPLATE),
        })
    }

    /// Bar counting finished stages out of `total`.
    #[must_use]
    pub fn steps_bar(multi: &MultiProgress, message: &str, total: u64) -> Arc<dyn ProgressCallback> {
        let sized_style = bar_style(STEPS_TEMPLATE);
        let bar = multi.add(ProgressBar::new(total));
        bar.set_style(sized_style.clone());
        bar.set_message(message.to_string());

        Arc::new(Self { bar, sized_style })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.sized_style.clone());
    }

    fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Installs `pretty_env_logger` (filtered by `RUST_LOG`) behind
/// `indicatif-log-bridge`.
///
/// Every bar must be added to the returned [`MultiProgress`] or log lines
/// will tear through it.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // A second call (tests, repeated init) keeps the first logger.
    let _ = indicatif_log_bridge::LogWrapper::new(multi.clone(), logger).try_init();
    log::set_max_level(level);

    multi
}
