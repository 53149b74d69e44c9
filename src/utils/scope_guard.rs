/// Runs a closure when dropped, whichever way the enclosing scope exits.
#[must_use = "the closure runs as soon as the guard is dropped"]
pub struct ScopeGuard<F: FnOnce()> {
    on_exit: Option<F>,
}

impl<F: FnOnce()> ScopeGuard<F> {
    pub fn new(on_exit: F) -> Self {
        Self { on_exit: Some(on_exit) }
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(on_exit) = self.on_exit.take() {
            on_exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn runs_once_on_early_return() {
        let runs = Cell::new(0);
        let exit_early = |bail: bool| {
            let _guard = ScopeGuard::new(|| runs.set(runs.get() + 1));
            if bail {
                return;
            }
            runs.set(runs.get() + 10);
        };
        exit_early(true);
        assert_eq!(runs.get(), 1);
        exit_early(false);
        assert_eq!(runs.get(), 12);
    }
}
