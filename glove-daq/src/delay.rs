use std::time::Duration;

/// Blocking pause between bus transactions.
pub trait Delay {
    fn delay(&mut self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration);
    }
}

/// Records requested pauses instead of sleeping.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingDelay(pub Vec<Duration>);

#[cfg(test)]
impl Delay for RecordingDelay {
    fn delay(&mut self, duration: Duration) {
        self.0.push(duration);
    }
}
