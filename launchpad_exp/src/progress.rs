#[derive(Clone)]
pub struct TracingProgressBar {
    progress: indicatif::ProgressBar,
}

impl TracingProgressBar {
    /// Creates a progress bar and installs a tracing subscriber that writes
    /// through it. The length can be set later with `set_len`.
    pub fn init(len: u64) -> Self {
        let style = indicatif::ProgressStyle::default_bar().template(
            "[{elapsed_precise}] {wide_bar:.green} {pos:>2}/{len:2} {msg}",
        );
        let progress = indicatif::ProgressBar::new(len);
        progress.set_style(style);
        let progress = Self { progress };

        // init tracing subscriber
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            // redirect all tracing logs to self; this makes sure that there's a
            // single progress bar, and not one scattered in between tracing
            // logs
            .with_writer(progress.clone())
            .init();

        progress
    }

    /// A progress bar that draws nothing; used when no subscriber should be
    /// installed (e.g. in tests).
    pub fn hidden() -> Self {
        Self {
            progress: indicatif::ProgressBar::hidden(),
        }
    }

    pub fn set_len(&self, len: u64) {
        self.progress.set_length(len);
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.progress.set_message(message.into());
    }

    pub fn inc(&self) {
        self.progress.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.progress.position()
    }

    pub fn finish(&self) {
        self.progress.finish();
    }
}

impl std::io::Write for TracingProgressBar {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        self.progress.println(line.trim_end());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for TracingProgressBar {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
