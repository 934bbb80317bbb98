use parking_lot::RwLock;
use std::sync::Arc;

/// Shared, lock-protected state.
pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

pub trait ReadExecutor<T: ?Sized> {
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R;
}

impl<T> ReadExecutor<T> for Atomic<T> {
    #[inline]
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let read_guard = self.read();
        f(&*read_guard)
    }
}

pub trait WriteExecutor<T: ?Sized> {
    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

impl<T> WriteExecutor<T> for Atomic<T> {
    #[inline]
    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut write_guard = self.write();
        f(&mut *write_guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_write_through_atomic() {
        let counter = atomic(0usize);
        counter.write_with(|c| *c += 2);
        assert_eq!(counter.read_with(|c| *c), 2);
    }

    #[test]
    fn clones_share_state() {
        let names = atomic(Vec::<String>::new());
        let other = names.clone();
        other.write_with(|n| n.push("ft1".to_string()));
        assert_eq!(names.read_with(|n| n.len()), 1);
    }
}
